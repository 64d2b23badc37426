//! Layout of the informational text overlay.
//!
//! Positions are fractions of the canvas so the design is identical at every
//! resolution. Planning is separate from painting, which keeps the layout
//! testable without installed fonts.

use chrono::{Datelike, NaiveDate};
use image::{Rgba, RgbaImage};

use crate::processing::brightness::{Ink, PixelView, Region};
use crate::processing::text::{FontSize, TextPainter, TextRun};

/// Lower band that holds the date, caption and holidays, sampled for ink.
const LOWER_BAND: (f32, f32, f32, f32) = (0.0667, 0.70, 0.533, 0.185);
/// Top of the week header.
const UPPER_BAND_Y: f32 = 0.20;

const LINE_SPACING: f32 = 1.3;
const SOFT_ALPHA: u8 = 144;
const SOLID_ALPHA: u8 = 224;

/// Holiday row columns, in multiples of the small font size.
const DAYS_COLUMN: f32 = 8.0;
const NAME_COLUMN: f32 = 11.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidayLine {
    pub date: NaiveDate,
    pub days_left: i64,
    pub name: String,
    pub emphasized: bool,
}

/// Everything the overlay shows for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayText {
    pub today: NaiveDate,
    pub caption: String,
    pub holidays: Vec<HolidayLine>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPlan {
    pub ink: Ink,
    pub runs: Vec<TextRun>,
}

/// Status line: mode title and, when not at full strength, the intensity.
pub fn status_line(mode_title: Option<&str>, intensity: f32) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(title) = mode_title.filter(|t| !t.trim().is_empty()) {
        parts.push(title.to_string());
    }
    let percent = (intensity * 100.0).round() as i32;
    if percent != 100 {
        parts.push(format!("Intensity {percent}%"));
    }
    (!parts.is_empty()).then(|| parts.join("; "))
}

pub fn week_header(today: NaiveDate) -> String {
    let week = today.iso_week();
    format!("Week {}, {}", week.week(), week.year())
}

pub fn sample_region(canvas_w: u32, canvas_h: u32) -> Option<Region> {
    let (x, y, w, h) = LOWER_BAND;
    Region::fraction(x, y, w, h, canvas_w, canvas_h)
}

/// Pick the ink from the rendered background and lay out every line.
pub fn plan(canvas: &RgbaImage, text: &OverlayText) -> OverlayPlan {
    let (width, height) = canvas.dimensions();
    let lightness = sample_region(width, height)
        .and_then(|region| PixelView::of(canvas).mean_lightness(region));
    let ink = lightness.map_or(Ink::Light, Ink::for_lightness);

    let [r, g, b] = ink.rgb();
    let soft = Rgba([r, g, b, SOFT_ALPHA]);
    let solid = Rgba([r, g, b, SOLID_ALPHA]);
    let left = LOWER_BAND.0 * width as f32;
    let run = |line: String, x: f32, y: f32, size: FontSize, bold: bool, color: Rgba<u8>| TextRun {
        text: line,
        x,
        y,
        size,
        px: size.px(height),
        bold,
        color,
    };

    let mut runs = Vec::new();
    let medium = FontSize::Medium.px(height);
    let small = FontSize::Small.px(height);
    let large = FontSize::Large.px(height);

    let mut y = LOWER_BAND.1 * height as f32;
    runs.push(run(
        text.today.format("%A, %B %-d, %Y").to_string(),
        left,
        y,
        FontSize::Medium,
        false,
        solid,
    ));
    y += medium * LINE_SPACING;
    runs.push(run(
        text.caption.clone(),
        left,
        y,
        FontSize::Small,
        false,
        soft,
    ));
    y += small * LINE_SPACING * 1.5;

    for holiday in &text.holidays {
        let color = if holiday.emphasized { solid } else { soft };
        let bold = holiday.emphasized;
        runs.push(run(
            holiday.date.format("%b %-d").to_string(),
            left,
            y,
            FontSize::Small,
            bold,
            color,
        ));
        runs.push(run(
            format!("{} d", holiday.days_left),
            left + small * DAYS_COLUMN,
            y,
            FontSize::Small,
            bold,
            color,
        ));
        runs.push(run(
            holiday.name.clone(),
            left + small * NAME_COLUMN,
            y,
            FontSize::Small,
            bold,
            color,
        ));
        y += small * LINE_SPACING;
    }

    let top = UPPER_BAND_Y * height as f32;
    runs.push(run(
        week_header(text.today),
        left,
        top,
        FontSize::Large,
        false,
        solid,
    ));
    if let Some(status) = &text.status {
        runs.push(run(
            status.clone(),
            left,
            top + large * LINE_SPACING,
            FontSize::Small,
            false,
            soft,
        ));
    }

    OverlayPlan { ink, runs }
}

pub fn draw(canvas: &mut RgbaImage, plan: &OverlayPlan, painter: &dyn TextPainter) {
    for run in &plan.runs {
        painter.draw(canvas, run);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn text() -> OverlayText {
        OverlayText {
            today: date(2024, 12, 2),
            caption: "Close the tabs.".to_string(),
            holidays: vec![
                HolidayLine {
                    date: date(2024, 12, 24),
                    days_left: 22,
                    name: "Christmas Eve*".to_string(),
                    emphasized: true,
                },
                HolidayLine {
                    date: date(2024, 12, 25),
                    days_left: 23,
                    name: "Christmas Day".to_string(),
                    emphasized: false,
                },
            ],
            status: status_line(Some("Architect mode"), 0.6),
        }
    }

    #[test]
    fn status_line_hides_full_intensity() {
        assert_eq!(status_line(None, 1.0), None);
        assert_eq!(
            status_line(Some("Architect mode"), 1.0).as_deref(),
            Some("Architect mode")
        );
        assert_eq!(
            status_line(Some("Architect mode"), 0.4).as_deref(),
            Some("Architect mode; Intensity 40%")
        );
        assert_eq!(status_line(Some("  "), 0.8).as_deref(), Some("Intensity 80%"));
    }

    #[test]
    fn week_header_uses_iso_week_year() {
        assert_eq!(week_header(date(2024, 12, 30)), "Week 1, 2025");
        assert_eq!(week_header(date(2024, 12, 2)), "Week 49, 2024");
    }

    #[test]
    fn dark_background_gets_light_ink() {
        let canvas = RgbaImage::from_pixel(300, 200, Rgba([0, 0, 0, 255]));
        let plan = plan(&canvas, &text());
        assert_eq!(plan.ink, Ink::Light);
        assert!(plan.runs.iter().all(|r| r.color[0] == 255));
    }

    #[test]
    fn light_background_gets_dark_ink() {
        let canvas = RgbaImage::from_pixel(300, 200, Rgba([255, 255, 255, 255]));
        let plan = plan(&canvas, &text());
        assert_eq!(plan.ink, Ink::Dark);
        assert!(plan.runs.iter().all(|r| r.color[0] == 0));
    }

    #[test]
    fn only_the_sampled_band_decides_ink() {
        let mut canvas = RgbaImage::from_pixel(300, 200, Rgba([255, 255, 255, 255]));
        let region = sample_region(300, 200).unwrap();
        for y in region.y()..region.y() + region.height() {
            for x in region.x()..region.x() + region.width() {
                canvas.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        assert_eq!(plan(&canvas, &text()).ink, Ink::Light);
    }

    #[test]
    fn lines_follow_fixed_order_and_styling() {
        let canvas = RgbaImage::from_pixel(300, 200, Rgba([0, 0, 0, 255]));
        let plan = plan(&canvas, &text());
        let texts: Vec<&str> = plan.runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Monday, December 2, 2024",
                "Close the tabs.",
                "Dec 24",
                "22 d",
                "Christmas Eve*",
                "Dec 25",
                "23 d",
                "Christmas Day",
                "Week 49, 2024",
                "Architect mode; Intensity 60%",
            ]
        );
        assert_eq!(plan.runs[0].size, FontSize::Medium);
        assert_eq!(plan.runs[1].size, FontSize::Small);
        assert_eq!(plan.runs[8].size, FontSize::Large);
        assert!(plan.runs[4].bold);
        assert_eq!(plan.runs[4].color[3], SOLID_ALPHA);
        assert!(!plan.runs[7].bold);
        assert_eq!(plan.runs[7].color[3], SOFT_ALPHA);
        assert!(plan.runs[8].y < plan.runs[0].y);
        assert!(plan.runs[5].y > plan.runs[2].y);
    }

    #[test]
    fn layout_scales_with_resolution() {
        let small = plan(&RgbaImage::new(400, 300), &text());
        let large = plan(&RgbaImage::new(800, 600), &text());
        for (a, b) in small.runs.iter().zip(&large.runs) {
            assert!((a.x * 2.0 - b.x).abs() < 0.01);
            assert!((a.y * 2.0 - b.y).abs() < 0.01);
            assert!((a.px * 2.0 - b.px).abs() < 0.01);
        }
    }
}
