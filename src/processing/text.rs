//! Font lookup and glyph rasterization onto RGBA canvases.

use ab_glyph::{Font, FontArc, FontVec, PxScale, ScaleFont, point};
use fontdb::{Database, Family, Query, Weight};
use image::{Rgba, RgbaImage};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// The three text sizes of the overlay, as fractions of canvas height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSize {
    Large,
    Medium,
    Small,
}

impl FontSize {
    pub fn fraction(self) -> f32 {
        match self {
            Self::Large => 0.059,
            Self::Medium => 0.0395,
            Self::Small => 0.0173,
        }
    }

    pub fn px(self, canvas_height: u32) -> f32 {
        (canvas_height as f32 * self.fraction()).max(1.0)
    }
}

/// One line of text positioned by its top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: FontSize,
    pub px: f32,
    pub bold: bool,
    pub color: Rgba<u8>,
}

/// Draws text runs onto a canvas.
pub trait TextPainter: Send + Sync {
    /// Family the runs are drawn with.
    fn font_family(&self) -> &str;
    fn draw(&self, canvas: &mut RgbaImage, run: &TextRun);
}

/// Regular and (when installed) bold faces of one family.
#[derive(Clone)]
pub struct FontSet {
    family: String,
    regular: FontArc,
    bold: Option<FontArc>,
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet")
            .field("family", &self.family)
            .field("bold", &self.bold.is_some())
            .finish()
    }
}

impl FontSet {
    /// Resolve `family` among the system fonts.
    pub fn load(family: &str) -> Result<Self> {
        let mut db = Database::new();
        db.load_system_fonts();
        debug!(faces = db.len(), "loaded system font database");

        let families = [Family::Name(family)];
        let regular_id = db
            .query(&Query {
                families: &families,
                ..Default::default()
            })
            .ok_or_else(|| Error::FontUnavailable(family.to_string()))?;
        let regular = load_face(&db, regular_id, family)?;

        let bold = match db.query(&Query {
            families: &families,
            weight: Weight::BOLD,
            ..Default::default()
        }) {
            Some(id) if id != regular_id => Some(load_face(&db, id, family)?),
            _ => None,
        };
        info!(family, bold = bold.is_some(), "resolved overlay font");

        Ok(Self {
            family: family.to_string(),
            regular,
            bold,
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn face(&self, bold: bool) -> &FontArc {
        if bold {
            self.bold.as_ref().unwrap_or(&self.regular)
        } else {
            &self.regular
        }
    }
}

fn load_face(db: &Database, id: fontdb::ID, family: &str) -> Result<FontArc> {
    db.with_face_data(id, |data, index| {
        FontVec::try_from_vec_and_index(data.to_vec(), index).ok()
    })
    .flatten()
    .map(FontArc::new)
    .ok_or_else(|| Error::FontDecode {
        family: family.to_string(),
    })
}

/// Rasterizes runs with `ab_glyph`.
#[derive(Debug, Clone)]
pub struct GlyphPainter {
    fonts: FontSet,
}

impl GlyphPainter {
    pub fn new(fonts: FontSet) -> Self {
        Self { fonts }
    }
}

impl TextPainter for GlyphPainter {
    fn font_family(&self) -> &str {
        self.fonts.family()
    }

    fn draw(&self, canvas: &mut RgbaImage, run: &TextRun) {
        let font = self.fonts.face(run.bold);
        let scale = PxScale::from(run.px);
        let baseline = run.y + font.as_scaled(scale).ascent();
        draw_text(canvas, font, &run.text, run.color, run.x, baseline, scale);
    }
}

fn draw_text(
    canvas: &mut RgbaImage,
    font: &FontArc,
    text: &str,
    color: Rgba<u8>,
    left: f32,
    baseline: f32,
    scale: PxScale,
) {
    let scaled = font.as_scaled(scale);
    let mut cursor_x = left;
    let mut previous = None;
    for ch in text.chars() {
        if ch.is_control() {
            continue;
        }
        let glyph = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            cursor_x += scaled.kern(prev, glyph);
        }
        let advance = scaled.h_advance(glyph);
        let mut positioned = scaled.scaled_glyph(ch);
        positioned.position = point(cursor_x, baseline);
        if let Some(outline) = font.outline_glyph(positioned) {
            let bounds = outline.px_bounds();
            outline.draw(|x, y, coverage| {
                blend_pixel(
                    canvas,
                    bounds.min.x + x as f32,
                    bounds.min.y + y as f32,
                    color,
                    coverage,
                );
            });
        }
        cursor_x += advance;
        previous = Some(glyph);
    }
}

fn blend_pixel(canvas: &mut RgbaImage, x: f32, y: f32, color: Rgba<u8>, coverage: f32) {
    if coverage <= 0.0 {
        return;
    }
    let xi = x.floor() as i64;
    let yi = y.floor() as i64;
    if xi < 0 || yi < 0 || xi >= i64::from(canvas.width()) || yi >= i64::from(canvas.height()) {
        return;
    }
    let alpha = (f32::from(color[3]) / 255.0 * coverage).clamp(0.0, 1.0);
    let dst = canvas.get_pixel_mut(xi as u32, yi as u32);
    for c in 0..3 {
        let blended = f32::from(color[c]) * alpha + f32::from(dst[c]) * (1.0 - alpha);
        dst[c] = blended.round().clamp(0.0, 255.0) as u8;
    }
}
