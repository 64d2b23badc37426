//! Render fingerprint: one string that changes whenever the pixels would.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::mode::Content;
use crate::platform::screens::ScreenGeometry;

const FIELD_SEPARATOR: char = '|';

/// Everything that affects the rendered wallpaper, gathered once per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInputs {
    pub screens: ScreenGeometry,
    /// Configured intensity after clamping, before the overlay cap.
    pub intensity: f32,
    pub mode_index: usize,
    /// Content actually drawn, after the empty-catalog fallback.
    pub content: Content,
    /// Local wall-clock time; only its hour enters the fingerprint.
    pub local_time: NaiveDateTime,
    pub overlay_image: Option<PathBuf>,
    pub font_family: String,
    pub holiday_digest: u64,
}

impl RenderInputs {
    pub fn hour_bucket(&self) -> String {
        self.local_time.format("%Y%m%d%H").to_string()
    }

    pub fn fingerprint(&self) -> String {
        let overlay = self
            .overlay_image
            .as_ref()
            .map_or_else(|| "-".to_string(), |p| p.display().to_string());
        let fields = [
            self.screens.count.to_string(),
            self.screens.width.to_string(),
            self.screens.height.to_string(),
            self.intensity.to_string(),
            self.mode_index.to_string(),
            self.content.identity(),
            self.hour_bucket(),
            overlay,
            self.font_family.clone(),
            format!("{:016x}", self.holiday_digest),
        ];
        fields
            .iter()
            .map(|field| escape_field(field))
            .collect::<Vec<_>>()
            .join(&FIELD_SEPARATOR.to_string())
    }
}

/// Backslash-escape `\\` and the separator inside one field.
fn escape_field(field: &str) -> String {
    let mut escaped = String::with_capacity(field.len());
    for ch in field.chars() {
        if ch == '\\' || ch == FIELD_SEPARATOR {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Order-sensitive digest of the custom holiday records.
pub fn holiday_digest<S: AsRef<str>>(records: &[S]) -> u64 {
    let mut hasher = DefaultHasher::new();
    records.len().hash(&mut hasher);
    for record in records {
        record.as_ref().hash(&mut hasher);
    }
    hasher.finish()
}
