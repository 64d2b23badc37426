//! Scan, select, render and commit, gated by the render fingerprint.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Local};
use config_model::{HolidayConfig, IntensityPolicy, PictureFit};
use image::RgbaImage;
use tracing::{debug, error, info, warn};

use crate::captions::Captions;
use crate::config::Configuration;
use crate::error::{Error, Result};
use crate::fingerprint::{RenderInputs, holiday_digest};
use crate::holiday::{self, Holiday};
use crate::mode::{Content, ModeSet, day_number};
use crate::platform::installer::WallpaperInstaller;
use crate::platform::processes::{ProcessSnapshot, active_overlay};
use crate::platform::screens::ScreenProbe;
use crate::processing::compose;
use crate::processing::overlay::{self, HolidayLine, OverlayText};
use crate::processing::text::TextPainter;
use crate::settings::SettingsProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Fingerprint matched the committed one; nothing was done.
    Unchanged,
    /// A new wallpaper was written, installed and committed.
    Rendered,
    /// Rendering failed; nothing was committed and the next call retries.
    Failed,
}

/// External services the synthesizer talks to.
pub struct Collaborators {
    pub settings: Arc<dyn SettingsProvider>,
    pub processes: Box<dyn ProcessSnapshot>,
    pub screens: Box<dyn ScreenProbe>,
    pub installer: Box<dyn WallpaperInstaller>,
    pub painter: Box<dyn TextPainter>,
}

pub struct Synthesizer {
    modes: ModeSet,
    settings: Arc<dyn SettingsProvider>,
    processes: Box<dyn ProcessSnapshot>,
    screens: Box<dyn ScreenProbe>,
    installer: Box<dyn WallpaperInstaller>,
    painter: Box<dyn TextPainter>,
    policy: IntensityPolicy,
    holidays: HolidayConfig,
    builtin_holidays: Vec<Holiday>,
    captions: Captions,
    fit: PictureFit,
    output_path: PathBuf,
    committed: Option<String>,
    render_count: u64,
}

impl std::fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synthesizer")
            .field("modes", &self.modes)
            .field("output_path", &self.output_path)
            .field("committed", &self.committed)
            .field("render_count", &self.render_count)
            .finish_non_exhaustive()
    }
}

impl Synthesizer {
    pub fn new(cfg: &Configuration, collaborators: Collaborators) -> Self {
        let Collaborators {
            settings,
            processes,
            screens,
            installer,
            painter,
        } = collaborators;
        Self {
            modes: ModeSet::new(cfg.modes.clone()),
            settings,
            processes,
            screens,
            installer,
            painter,
            policy: cfg.intensity,
            holidays: cfg.holidays.clone(),
            builtin_holidays: holiday::builtin(cfg.holidays.builtin),
            captions: Captions::new(cfg.captions.clone()),
            fit: cfg.picture_fit,
            output_path: cfg.output_path.clone(),
            committed: None,
            render_count: 0,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Fingerprint of the last successful render.
    pub fn committed_fingerprint(&self) -> Option<&str> {
        self.committed.as_deref()
    }

    /// Number of successful renders since construction.
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    pub fn update_if_changed(&mut self) -> UpdateOutcome {
        self.update_if_changed_at(Local::now())
    }

    /// Render only when the fingerprint for `now` differs from the committed one.
    pub fn update_if_changed_at(&mut self, now: DateTime<Local>) -> UpdateOutcome {
        let inputs = match self.gather(&now) {
            Ok(inputs) => inputs,
            Err(err) => {
                warn!(%err, "failed to gather render inputs");
                return UpdateOutcome::Failed;
            }
        };
        let fingerprint = inputs.fingerprint();
        if self.committed.as_deref() == Some(fingerprint.as_str()) {
            debug!(fingerprint, "wallpaper up to date");
            return UpdateOutcome::Unchanged;
        }
        debug!(
            previous = self.committed.as_deref(),
            fingerprint, "wallpaper is stale"
        );
        self.render_and_commit(&now)
    }

    pub fn update(&mut self) -> UpdateOutcome {
        self.update_at(Local::now())
    }

    /// Render unconditionally, e.g. after the display layout changed.
    pub fn update_at(&mut self, now: DateTime<Local>) -> UpdateOutcome {
        self.render_and_commit(&now)
    }

    /// Shift the rotation by `delta` pictures and persist the new offset.
    pub fn adjust_offset(&self, delta: i64) -> Result<i64> {
        let offset = self.settings.rotation_offset().saturating_add(delta);
        self.settings.set_rotation_offset(offset)?;
        info!(offset, "rotation offset changed");
        Ok(offset)
    }

    /// Add `delta` to the intensity, clamped to the configured range.
    pub fn adjust_intensity(&self, delta: f32) -> Result<f32> {
        let next = self.policy.nudge(self.settings.intensity(), delta);
        self.settings.set_intensity(next)?;
        info!(intensity = next, "intensity changed");
        Ok(next)
    }

    fn render_and_commit(&mut self, now: &DateTime<Local>) -> UpdateOutcome {
        match self.try_render_and_commit(now) {
            Ok(fingerprint) => {
                info!(
                    fingerprint,
                    path = %self.output_path.display(),
                    "wallpaper rendered"
                );
                self.committed = Some(fingerprint);
                self.render_count += 1;
                UpdateOutcome::Rendered
            }
            Err(err) => {
                error!(%err, "wallpaper render failed; will retry");
                UpdateOutcome::Failed
            }
        }
    }

    fn try_render_and_commit(&mut self, now: &DateTime<Local>) -> Result<String> {
        let output = self.output_path.clone();
        let inputs = self.render_to(now, &output)?;
        self.installer.install(&output)?;
        Ok(inputs.fingerprint())
    }

    /// Rescan, render for `now` and write the JPEG to `output`. Nothing is
    /// installed or committed.
    pub fn render_to(&mut self, now: &DateTime<Local>, output: &Path) -> Result<RenderInputs> {
        self.rescan_current(now);
        let inputs = self.gather(now)?;
        let canvas = self.render(&inputs)?;
        compose::save_jpeg(&canvas, output)?;
        Ok(inputs)
    }

    fn rescan_current(&mut self, now: &DateTime<Local>) {
        let mode_index = self.modes.current_index(now);
        let fallback_dir = self.settings.picture_directory();
        if let Some(mode) = self.modes.get_mut(mode_index) {
            mode.rescan(&fallback_dir);
        }
    }

    /// Collect every render-affecting input for `now`.
    pub fn gather(&self, now: &DateTime<Local>) -> Result<RenderInputs> {
        let screens = self.screens.geometry()?;
        if screens.width == 0 || screens.height == 0 {
            return Err(Error::Probe(format!(
                "screen geometry {}x{} has no area",
                screens.width, screens.height
            )));
        }
        let mode_index = self.modes.current_index(now);
        let day = day_number(now.date_naive());
        let offset = self.settings.rotation_offset();
        let fallback_dir = self.settings.picture_directory();
        let content = match self.modes.get(mode_index) {
            // Catalog still lists an older directory; scan a copy.
            Some(mode) if mode.is_stale(&fallback_dir) => {
                let mut fresh = mode.clone();
                fresh.rescan(&fallback_dir);
                fresh.content(day, offset)
            }
            Some(mode) => mode.content(day, offset),
            None => None,
        }
        .unwrap_or_else(|| Content::Color(self.modes.fallback_color()));

        Ok(RenderInputs {
            screens,
            intensity: self.policy.clamp(self.settings.intensity()),
            mode_index,
            content,
            local_time: now.naive_local(),
            overlay_image: self.overlay_image(),
            font_family: self.painter.font_family().to_string(),
            holiday_digest: holiday_digest(&self.settings.custom_holidays()),
        })
    }

    fn overlay_image(&self) -> Option<PathBuf> {
        let rules = self.settings.overlay_rules();
        if rules.is_empty() {
            return None;
        }
        let running = match self.processes.running() {
            Ok(running) => running,
            Err(err) => {
                warn!(%err, "process snapshot failed; no overlay image");
                return None;
            }
        };
        active_overlay(&rules, &running).map(|rule| rule.image.clone())
    }

    /// Draw background, text overlay and overlay image for `inputs`.
    pub fn render(&self, inputs: &RenderInputs) -> Result<RgbaImage> {
        let mut canvas = RgbaImage::new(inputs.screens.width, inputs.screens.height);
        let effective = self
            .policy
            .effective(inputs.intensity, inputs.overlay_image.is_some());

        match &inputs.content {
            Content::Color(color) => compose::fill(&mut canvas, *color),
            Content::Picture { path, .. } => match compose::load_picture(path) {
                Ok(picture) => compose::blend_picture(&mut canvas, &picture, effective, self.fit),
                Err(err) => {
                    warn!(%err, "picture unreadable; using flat color");
                    compose::fill(&mut canvas, self.modes.fallback_color());
                }
            },
        }

        let text = self.overlay_text(inputs);
        let plan = overlay::plan(&canvas, &text);
        debug!(ink = ?plan.ink, lines = plan.runs.len(), "overlay planned");
        overlay::draw(&mut canvas, &plan, self.painter.as_ref());

        if let Some(path) = &inputs.overlay_image {
            match compose::load_picture(path) {
                Ok(image) => compose::overlay_centered(&mut canvas, &image.to_rgba8()),
                Err(err) => warn!(%err, "overlay image unreadable; skipping"),
            }
        }
        Ok(canvas)
    }

    fn overlay_text(&self, inputs: &RenderInputs) -> OverlayText {
        let today = inputs.local_time.date();
        let day = day_number(today);
        let custom = holiday::parse_records(&self.settings.custom_holidays());
        let mut all: Vec<Holiday> = custom;
        all.extend(self.builtin_holidays.iter().cloned());
        let marker = self.holidays.emphasis_marker.as_deref();
        let holidays = holiday::upcoming(
            &all,
            today,
            self.holidays.window_days,
            self.holidays.limit,
        )
        .into_iter()
        .map(|upcoming| HolidayLine {
            date: upcoming.date,
            days_left: upcoming.days_left,
            name: upcoming.holiday.name().to_string(),
            emphasized: upcoming.holiday.is_emphasized(marker),
        })
        .collect();

        let title = self
            .modes
            .get(inputs.mode_index)
            .and_then(|mode| mode.title());
        OverlayText {
            today,
            caption: self.captions.pick(today.weekday(), day).to_string(),
            holidays,
            status: overlay::status_line(title, inputs.intensity),
        }
    }
}
