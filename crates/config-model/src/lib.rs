use std::path::PathBuf;

use anyhow::{Result, ensure};
use chrono::Weekday;
use serde::Deserialize;

pub use captions::CaptionConfig;
pub use holidays::{BuiltinHolidays, HolidayConfig};
pub use intensity::IntensityPolicy;
pub use modes::{DEFAULT_SINGLE_COLOR, ModeConfig, ModeKindConfig, ModeSchedule};
pub use overlay::OverlayRule;

/// How a picture is scaled onto the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PictureFit {
    /// Scale up or down until the canvas is covered; excess is cropped evenly.
    #[default]
    Cover,
    /// Scale until the whole picture fits; the rest stays background.
    Contain,
    /// Draw at native size, centered.
    Center,
}

mod modes {
    use super::*;

    pub const DEFAULT_SINGLE_COLOR: [u8; 3] = [32, 40, 48];

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub struct ModeConfig {
        #[serde(default)]
        pub title: Option<String>,
        /// First local hour (0..=23) at which this mode becomes current.
        #[serde(default)]
        pub from_hour: u32,
        #[serde(flatten)]
        pub kind: ModeKindConfig,
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    #[serde(tag = "type", rename_all = "kebab-case")]
    pub enum ModeKindConfig {
        SingleColor {
            #[serde(default = "ModeKindConfig::default_color")]
            color: [u8; 3],
        },
        PictureRotation {
            /// Falls back to the settings' picture directory when absent.
            #[serde(default)]
            directory: Option<PathBuf>,
        },
    }

    impl ModeKindConfig {
        const fn default_color() -> [u8; 3] {
            DEFAULT_SINGLE_COLOR
        }
    }

    /// Ordered list of modes keyed by the hour at which each takes over.
    #[derive(Debug, Clone, PartialEq, Deserialize)]
    #[serde(transparent)]
    pub struct ModeSchedule(Vec<ModeConfig>);

    impl Default for ModeSchedule {
        fn default() -> Self {
            Self(vec![
                ModeConfig {
                    title: Some("Architect mode".to_string()),
                    from_hour: 0,
                    kind: ModeKindConfig::SingleColor {
                        color: DEFAULT_SINGLE_COLOR,
                    },
                },
                ModeConfig {
                    title: None,
                    from_hour: 11,
                    kind: ModeKindConfig::PictureRotation { directory: None },
                },
            ])
        }
    }

    impl ModeSchedule {
        pub fn new(modes: Vec<ModeConfig>) -> Self {
            Self(modes)
        }

        pub fn modes(&self) -> &[ModeConfig] {
            &self.0
        }

        pub fn validate(&self) -> Result<()> {
            ensure!(!self.0.is_empty(), "modes must contain at least one entry");
            ensure!(
                self.0[0].from_hour == 0,
                "modes[0].from-hour must be 0 so every hour resolves to a mode"
            );
            let mut previous: Option<u32> = None;
            for (idx, mode) in self.0.iter().enumerate() {
                ensure!(
                    mode.from_hour < 24,
                    "modes[{}].from-hour must be within 0..=23",
                    idx
                );
                if let Some(prev) = previous {
                    ensure!(
                        mode.from_hour > prev,
                        "modes[{}].from-hour must be greater than the previous entry",
                        idx
                    );
                }
                previous = Some(mode.from_hour);
            }
            Ok(())
        }

        /// Index of the mode current at `hour`: the last entry whose
        /// `from-hour` is not after it.
        pub fn index_for_hour(&self, hour: u32) -> usize {
            self.0
                .iter()
                .rposition(|mode| mode.from_hour <= hour)
                .unwrap_or(0)
        }
    }
}

mod intensity {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
    #[serde(rename_all = "kebab-case", default)]
    pub struct IntensityPolicy {
        pub min: f32,
        pub max: f32,
        /// Increment applied by a single nudge.
        pub step: f32,
        /// Upper bound while an overlay image is active; `None` leaves it unclamped.
        pub overlay_cap: Option<f32>,
    }

    impl Default for IntensityPolicy {
        fn default() -> Self {
            Self {
                min: 0.2,
                max: 1.0,
                step: 0.2,
                overlay_cap: Some(0.4),
            }
        }
    }

    impl IntensityPolicy {
        pub fn validate(&self) -> Result<()> {
            ensure!(
                self.min.is_finite() && self.max.is_finite(),
                "intensity.min and intensity.max must be finite"
            );
            ensure!(
                (0.0..=1.0).contains(&self.min) && (0.0..=1.0).contains(&self.max),
                "intensity.min and intensity.max must be within [0, 1]"
            );
            ensure!(
                self.min <= self.max,
                "intensity.min must not exceed intensity.max"
            );
            ensure!(
                self.step.is_finite() && self.step > 0.0,
                "intensity.step must be positive"
            );
            if let Some(cap) = self.overlay_cap {
                ensure!(
                    cap.is_finite() && (0.0..=1.0).contains(&cap),
                    "intensity.overlay-cap must be within [0, 1]"
                );
            }
            Ok(())
        }

        /// Clamp a persisted intensity into the configured range.
        pub fn clamp(&self, raw: f32) -> f32 {
            if raw.is_finite() {
                raw.clamp(self.min, self.max)
            } else {
                self.max
            }
        }

        /// Result of adding `delta` to `current`: clamped, then rounded to a
        /// whole percent.
        pub fn nudge(&self, current: f32, delta: f32) -> f32 {
            let next = self.clamp(self.clamp(current) + delta);
            (next * 100.0).round() / 100.0
        }

        /// Intensity actually applied to the picture.
        pub fn effective(&self, raw: f32, overlay_active: bool) -> f32 {
            let clamped = self.clamp(raw);
            match self.overlay_cap {
                Some(cap) if overlay_active => clamped.min(cap),
                _ => clamped,
            }
        }
    }
}

mod holidays {
    use super::*;

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum BuiltinHolidays {
        #[default]
        UnitedStates,
        #[serde(rename = "none")]
        Disabled,
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    #[serde(rename_all = "kebab-case", default)]
    pub struct HolidayConfig {
        pub builtin: BuiltinHolidays,
        /// Holidays further away than this are not listed.
        pub window_days: i64,
        pub limit: usize,
        /// Substring in a holiday name that selects emphasized styling.
        pub emphasis_marker: Option<String>,
        /// `<rule>|<name>` records, e.g. `12-24|Christmas Eve*`.
        pub custom: Vec<String>,
    }

    impl Default for HolidayConfig {
        fn default() -> Self {
            Self {
                builtin: BuiltinHolidays::default(),
                window_days: 60,
                limit: 5,
                emphasis_marker: Some("*".to_string()),
                custom: Vec::new(),
            }
        }
    }

    impl HolidayConfig {
        pub fn validate(&self) -> Result<()> {
            ensure!(
                self.window_days > 0,
                "holidays.window-days must be greater than zero"
            );
            if let Some(marker) = &self.emphasis_marker {
                ensure!(
                    !marker.is_empty(),
                    "holidays.emphasis-marker must not be empty when provided"
                );
            }
            Ok(())
        }
    }
}

mod overlay {
    use super::*;

    /// Shows `image` while a process named `process` is running.
    #[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub struct OverlayRule {
        pub process: String,
        pub image: PathBuf,
    }

    impl OverlayRule {
        pub fn validate(&self, idx: usize) -> Result<()> {
            ensure!(
                !self.process.trim().is_empty(),
                "overlays[{}].process must not be blank",
                idx
            );
            Ok(())
        }
    }
}

mod captions {
    use super::*;

    /// Per-weekday caption overrides; absent days keep the built-in list.
    #[derive(Debug, Clone, Default, PartialEq, Deserialize)]
    #[serde(rename_all = "kebab-case", default)]
    pub struct CaptionConfig {
        monday: Option<Vec<String>>,
        tuesday: Option<Vec<String>>,
        wednesday: Option<Vec<String>>,
        thursday: Option<Vec<String>>,
        friday: Option<Vec<String>>,
        saturday: Option<Vec<String>>,
        sunday: Option<Vec<String>>,
    }

    impl CaptionConfig {
        pub fn for_weekday(&self, weekday: Weekday) -> Option<&[String]> {
            let list = match weekday {
                Weekday::Mon => self.monday.as_ref(),
                Weekday::Tue => self.tuesday.as_ref(),
                Weekday::Wed => self.wednesday.as_ref(),
                Weekday::Thu => self.thursday.as_ref(),
                Weekday::Fri => self.friday.as_ref(),
                Weekday::Sat => self.saturday.as_ref(),
                Weekday::Sun => self.sunday.as_ref(),
            };
            list.filter(|captions| !captions.is_empty())
                .map(Vec::as_slice)
        }
    }
}
