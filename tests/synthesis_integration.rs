use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Local, TimeZone};
use image::{ImageReader, Rgb, RgbImage, RgbaImage};
use tempfile::{TempDir, tempdir};
use wallpaper_companion::config::{
    Configuration, ModeConfig, ModeKindConfig, ModeSchedule, OverlayRule,
};
use wallpaper_companion::error::{Error, Result};
use wallpaper_companion::platform::installer::WallpaperInstaller;
use wallpaper_companion::platform::processes::StaticProcesses;
use wallpaper_companion::platform::screens::{FixedScreens, ScreenGeometry};
use wallpaper_companion::processing::text::{TextPainter, TextRun};
use wallpaper_companion::settings::{MemorySettings, SettingsProvider};
use wallpaper_companion::synthesis::{Collaborators, Synthesizer, UpdateOutcome};

const WIDTH: u32 = 96;
const HEIGHT: u32 = 64;

#[derive(Clone, Default)]
struct RecordingPainter {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingPainter {
    fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl TextPainter for RecordingPainter {
    fn font_family(&self) -> &str {
        "Test Sans"
    }

    fn draw(&self, _canvas: &mut RgbaImage, run: &TextRun) {
        self.lines.lock().unwrap().push(run.text.clone());
    }
}

/// Installer that fails while `broken` is set and counts its calls.
#[derive(Clone, Default)]
struct SwitchableInstaller {
    broken: Arc<AtomicBool>,
    installed: Arc<Mutex<Vec<PathBuf>>>,
}

impl WallpaperInstaller for SwitchableInstaller {
    fn install(&self, path: &Path) -> Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(Error::Install("display unavailable".to_string()));
        }
        self.installed.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

struct Harness {
    _tmp: TempDir,
    pictures: PathBuf,
    output: PathBuf,
    settings: Arc<MemorySettings>,
    painter: RecordingPainter,
    installer: SwitchableInstaller,
    synth: Synthesizer,
}

fn rotation_only() -> ModeSchedule {
    ModeSchedule::new(vec![ModeConfig {
        title: None,
        from_hour: 0,
        kind: ModeKindConfig::PictureRotation { directory: None },
    }])
}

fn harness(modes: ModeSchedule, running: &[&str]) -> Harness {
    let tmp = tempdir().unwrap();
    let pictures = tmp.path().join("pictures");
    std::fs::create_dir_all(&pictures).unwrap();
    let output = tmp.path().join("out").join("wallpaper.jpg");
    std::fs::create_dir_all(output.parent().unwrap()).unwrap();

    let cfg = Configuration {
        output_path: output.clone(),
        picture_directory: pictures.clone(),
        modes,
        ..Configuration::default()
    }
    .validated()
    .unwrap();

    let settings = Arc::new(MemorySettings::new(&pictures));
    let painter = RecordingPainter::default();
    let installer = SwitchableInstaller::default();
    let synth = Synthesizer::new(
        &cfg,
        Collaborators {
            settings: settings.clone(),
            processes: Box::new(StaticProcesses::new(running.iter().copied())),
            screens: Box::new(FixedScreens(ScreenGeometry {
                count: 1,
                width: WIDTH,
                height: HEIGHT,
            })),
            installer: Box::new(installer.clone()),
            painter: Box::new(painter.clone()),
        },
    );
    Harness {
        _tmp: tmp,
        pictures,
        output,
        settings,
        painter,
        installer,
        synth,
    }
}

fn write_picture(dir: &Path, name: &str, color: [u8; 3]) {
    RgbImage::from_pixel(16, 12, Rgb(color))
        .save(dir.join(name))
        .unwrap();
}

/// 1970-04-11 12:00 local, day number 100.
fn day_100_noon() -> DateTime<Local> {
    Local.with_ymd_and_hms(1970, 4, 11, 12, 0, 0).single().unwrap()
}

fn content_field(synth: &Synthesizer) -> String {
    let fingerprint = synth.committed_fingerprint().expect("committed fingerprint");
    let path = Path::new(fingerprint.split('|').nth(5).unwrap());
    path.file_name().unwrap().to_string_lossy().into_owned()
}

#[test]
fn second_tick_with_same_inputs_is_a_no_op() {
    let mut h = harness(rotation_only(), &[]);
    write_picture(&h.pictures, "a.jpg", [200, 10, 10]);
    let now = day_100_noon();

    assert_eq!(h.synth.update_if_changed_at(now), UpdateOutcome::Rendered);
    let first = h.synth.committed_fingerprint().map(str::to_string);
    assert_eq!(
        h.synth.update_if_changed_at(now + Duration::minutes(20)),
        UpdateOutcome::Unchanged
    );
    assert_eq!(h.synth.committed_fingerprint().map(str::to_string), first);
    assert_eq!(h.synth.render_count(), 1);
    assert_eq!(h.installer.installed.lock().unwrap().len(), 1);
}

#[test]
fn offset_steps_through_sorted_catalog() {
    let mut h = harness(rotation_only(), &[]);
    write_picture(&h.pictures, "b.png", [10, 200, 10]);
    write_picture(&h.pictures, "a.jpg", [200, 10, 10]);
    let now = day_100_noon();

    let mut shown = Vec::new();
    for offset in 0..3 {
        h.settings.set_rotation_offset(offset).unwrap();
        assert_eq!(h.synth.update_if_changed_at(now), UpdateOutcome::Rendered);
        shown.push(content_field(&h.synth));
    }
    assert_eq!(shown, ["a.jpg", "b.png", "a.jpg"]);
}

#[test]
fn new_picture_is_seen_on_next_render() {
    let mut h = harness(rotation_only(), &[]);
    write_picture(&h.pictures, "b.png", [10, 200, 10]);
    let now = day_100_noon();
    assert_eq!(h.synth.update_if_changed_at(now), UpdateOutcome::Rendered);
    assert_eq!(content_field(&h.synth), "b.png");

    write_picture(&h.pictures, "a.jpg", [200, 10, 10]);
    // The rescan only happens on render, so force one.
    assert_eq!(h.synth.update_at(now), UpdateOutcome::Rendered);
    assert_eq!(content_field(&h.synth), "a.jpg");
}

#[test]
fn empty_catalog_renders_flat_fallback_color() {
    let mut h = harness(rotation_only(), &[]);
    assert_eq!(
        h.synth.update_if_changed_at(day_100_noon()),
        UpdateOutcome::Rendered
    );
    assert_eq!(content_field(&h.synth), "#202830");

    let written = ImageReader::open(&h.output)
        .unwrap()
        .decode()
        .unwrap()
        .to_rgb8();
    assert_eq!(written.dimensions(), (WIDTH, HEIGHT));
    let corner = written.get_pixel(0, 0).0;
    for (got, want) in corner.iter().zip([32u8, 40, 48]) {
        assert!(got.abs_diff(want) <= 6, "corner {corner:?}");
    }
    assert!(!h.output.with_extension("tmp").exists());
}

#[test]
fn failed_install_is_not_committed_and_retries() {
    let mut h = harness(rotation_only(), &[]);
    write_picture(&h.pictures, "a.jpg", [200, 10, 10]);
    let now = day_100_noon();

    h.installer.broken.store(true, Ordering::SeqCst);
    assert_eq!(h.synth.update_if_changed_at(now), UpdateOutcome::Failed);
    assert_eq!(h.synth.committed_fingerprint(), None);
    assert_eq!(h.synth.render_count(), 0);

    h.installer.broken.store(false, Ordering::SeqCst);
    assert_eq!(h.synth.update_if_changed_at(now), UpdateOutcome::Rendered);
    assert!(h.synth.committed_fingerprint().is_some());
}

#[test]
fn forced_update_renders_even_when_unchanged() {
    let mut h = harness(rotation_only(), &[]);
    let now = day_100_noon();
    assert_eq!(h.synth.update_at(now), UpdateOutcome::Rendered);
    assert_eq!(h.synth.update_at(now), UpdateOutcome::Rendered);
    assert_eq!(h.synth.update_if_changed_at(now), UpdateOutcome::Unchanged);
    assert_eq!(h.synth.render_count(), 2);
}

#[test]
fn hour_change_triggers_render() {
    let mut h = harness(rotation_only(), &[]);
    let now = day_100_noon();
    assert_eq!(h.synth.update_if_changed_at(now), UpdateOutcome::Rendered);
    assert_eq!(
        h.synth.update_if_changed_at(now + Duration::hours(1)),
        UpdateOutcome::Rendered
    );
}

#[test]
fn schedule_switches_mode_by_hour() {
    let modes = ModeSchedule::new(vec![
        ModeConfig {
            title: Some("Morning".to_string()),
            from_hour: 0,
            kind: ModeKindConfig::SingleColor { color: [1, 2, 3] },
        },
        ModeConfig {
            title: None,
            from_hour: 11,
            kind: ModeKindConfig::PictureRotation { directory: None },
        },
    ]);
    let mut h = harness(modes, &[]);
    write_picture(&h.pictures, "a.jpg", [200, 10, 10]);

    let morning = Local.with_ymd_and_hms(1970, 4, 11, 9, 30, 0).single().unwrap();
    assert_eq!(h.synth.update_if_changed_at(morning), UpdateOutcome::Rendered);
    assert_eq!(content_field(&h.synth), "#010203");
    assert!(h.painter.lines().iter().any(|line| line == "Morning"));

    assert_eq!(
        h.synth.update_if_changed_at(day_100_noon()),
        UpdateOutcome::Rendered
    );
    assert_eq!(content_field(&h.synth), "a.jpg");
}

#[test]
fn intensity_nudge_is_clamped_and_shown() {
    let mut h = harness(rotation_only(), &[]);
    let now = day_100_noon();
    assert_eq!(h.synth.update_if_changed_at(now), UpdateOutcome::Rendered);
    assert!(!h.painter.lines().iter().any(|l| l.contains("Intensity")));

    assert!((h.synth.adjust_intensity(0.2).unwrap() - 1.0).abs() < f32::EPSILON);
    assert!((h.synth.adjust_intensity(-0.2).unwrap() - 0.8).abs() < f32::EPSILON);
    assert!((h.settings.intensity() - 0.8).abs() < f32::EPSILON);
    assert_eq!(h.synth.update_if_changed_at(now), UpdateOutcome::Rendered);
    assert!(h.painter.lines().iter().any(|l| l == "Intensity 80%"));
}

#[test]
fn offset_adjustment_is_persisted() {
    let h = harness(rotation_only(), &[]);
    assert_eq!(h.synth.adjust_offset(3).unwrap(), 3);
    assert_eq!(h.synth.adjust_offset(-5).unwrap(), -2);
    assert_eq!(h.settings.rotation_offset(), -2);
}

#[test]
fn running_process_selects_overlay_image() {
    let mut h = harness(rotation_only(), &["bash", "zoom"]);
    let overlay = h.pictures.join("busy.png");
    write_picture(&h.pictures, "a.jpg", [200, 10, 10]);
    let now = day_100_noon();

    assert_eq!(h.synth.update_if_changed_at(now), UpdateOutcome::Rendered);
    let overlay_field = |synth: &Synthesizer| {
        synth
            .committed_fingerprint()
            .unwrap()
            .split('|')
            .nth(7)
            .unwrap()
            .to_string()
    };
    assert_eq!(overlay_field(&h.synth), "-");

    // A missing overlay file is skipped but still part of the fingerprint.
    h.settings.set_overlay_rules(vec![OverlayRule {
        process: "Zoom".to_string(),
        image: overlay.clone(),
    }]);
    assert_eq!(h.synth.update_if_changed_at(now), UpdateOutcome::Rendered);
    assert_eq!(overlay_field(&h.synth), overlay.display().to_string());
}

#[test]
fn custom_holidays_change_the_fingerprint_and_overlay() {
    let mut h = harness(rotation_only(), &[]);
    let now = day_100_noon();
    assert_eq!(h.synth.update_if_changed_at(now), UpdateOutcome::Rendered);

    h.settings
        .set_custom_holidays(vec!["04-20|Spring Fair*".to_string()]);
    assert_eq!(h.synth.update_if_changed_at(now), UpdateOutcome::Rendered);
    let lines = h.painter.lines();
    assert!(lines.iter().any(|l| l == "Spring Fair*"), "{lines:?}");
    assert!(lines.iter().any(|l| l == "9 d"), "{lines:?}");
}

#[test]
fn moving_the_picture_directory_rerenders_same_names() {
    let mut h = harness(rotation_only(), &[]);
    write_picture(&h.pictures, "a.jpg", [200, 10, 10]);
    let now = day_100_noon();
    assert_eq!(h.synth.update_if_changed_at(now), UpdateOutcome::Rendered);

    let other = h.pictures.with_file_name("other");
    std::fs::create_dir_all(&other).unwrap();
    write_picture(&other, "a.jpg", [10, 10, 200]);
    h.settings.set_picture_directory(&other);

    assert_eq!(h.synth.update_if_changed_at(now), UpdateOutcome::Rendered);
    let fingerprint = h.synth.committed_fingerprint().unwrap().to_string();
    assert!(
        fingerprint.contains(&other.join("a.jpg").display().to_string()),
        "{fingerprint}"
    );
    assert_eq!(h.synth.update_if_changed_at(now), UpdateOutcome::Unchanged);

    let written = ImageReader::open(&h.output)
        .unwrap()
        .decode()
        .unwrap()
        .to_rgb8();
    let center = written.get_pixel(WIDTH / 2, HEIGHT / 2).0;
    assert!(center[2] > center[0], "center {center:?}");
}

#[test]
fn font_field_comes_from_the_painter() {
    let mut h = harness(rotation_only(), &[]);
    assert_eq!(
        h.synth.update_if_changed_at(day_100_noon()),
        UpdateOutcome::Rendered
    );
    let fingerprint = h.synth.committed_fingerprint().unwrap();
    assert_eq!(fingerprint.split('|').nth(8), Some("Test Sans"));
}
