use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

pub use config_model::{
    BuiltinHolidays, CaptionConfig, HolidayConfig, IntensityPolicy, ModeConfig, ModeKindConfig,
    ModeSchedule, OverlayRule, PictureFit,
};

use crate::platform::installer::{DEFAULT_INSTALL_COMMAND, PATH_PLACEHOLDER};
use crate::platform::screens::ScreenGeometry;

pub const DEFAULT_FONT_FAMILY: &str = "DejaVu Sans";
pub const DEFAULT_PICTURE_DIRECTORY: &str = "~/Pictures/Wallpapers";
pub const DEFAULT_STATE_PATH: &str = "~/.local/state/wallpaper-companion/state.yaml";
pub const OUTPUT_FILE_NAME: &str = "wallpaper-companion.jpg";

/// Geometry used when the screen probe cannot answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FallbackScreen {
    pub width: u32,
    pub height: u32,
    #[serde(default = "FallbackScreen::default_count")]
    pub count: u32,
}

impl FallbackScreen {
    const fn default_count() -> u32 {
        1
    }

    pub fn geometry(&self) -> ScreenGeometry {
        ScreenGeometry {
            count: self.count,
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Font family used for every overlay line.
    pub font: String,
    /// Directory of the picture rotation unless a mode names its own.
    pub picture_directory: PathBuf,
    /// YAML file holding the rotation offset and intensity.
    pub state_path: PathBuf,
    /// Where the rendered wallpaper is written.
    pub output_path: PathBuf,
    /// How often the daemon checks whether the wallpaper is stale.
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
    pub modes: ModeSchedule,
    pub intensity: IntensityPolicy,
    pub holidays: HolidayConfig,
    /// Process-triggered overlay images, checked in order.
    pub overlays: Vec<OverlayRule>,
    pub captions: CaptionConfig,
    pub picture_fit: PictureFit,
    /// Shell command that installs the file; `{path}` is replaced by its path.
    pub install_command: String,
    pub fallback_screen: Option<FallbackScreen>,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants and expand `~` in paths.
    pub fn validated(mut self) -> Result<Self> {
        ensure!(!self.font.trim().is_empty(), "font must not be blank");
        ensure!(
            self.tick_interval > Duration::ZERO,
            "tick-interval must be positive"
        );
        ensure!(
            self.install_command.contains(PATH_PLACEHOLDER),
            "install-command must contain the {} placeholder",
            PATH_PLACEHOLDER
        );
        ensure!(
            self.output_path.file_name().is_some(),
            "output-path must include a file name"
        );
        if let Some(screen) = &self.fallback_screen {
            ensure!(
                screen.width > 0 && screen.height > 0 && screen.count > 0,
                "fallback-screen width, height and count must be greater than zero"
            );
        }
        self.modes
            .validate()
            .context("invalid modes configuration")?;
        self.intensity
            .validate()
            .context("invalid intensity configuration")?;
        self.holidays
            .validate()
            .context("invalid holidays configuration")?;
        for (idx, rule) in self.overlays.iter().enumerate() {
            rule.validate(idx)?;
        }

        self.picture_directory = expand_home(&self.picture_directory);
        self.state_path = expand_home(&self.state_path);
        self.output_path = expand_home(&self.output_path);
        for rule in &mut self.overlays {
            rule.image = expand_home(&rule.image);
        }
        let modes: Vec<ModeConfig> = self
            .modes
            .modes()
            .iter()
            .cloned()
            .map(|mut mode| {
                if let ModeKindConfig::PictureRotation {
                    directory: Some(dir),
                } = &mut mode.kind
                {
                    *dir = expand_home(dir);
                }
                mode
            })
            .collect();
        self.modes = ModeSchedule::new(modes);
        Ok(self)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            font: DEFAULT_FONT_FAMILY.to_string(),
            picture_directory: PathBuf::from(DEFAULT_PICTURE_DIRECTORY),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            output_path: Self::default_output_path(),
            tick_interval: Self::default_tick_interval(),
            modes: ModeSchedule::default(),
            intensity: IntensityPolicy::default(),
            holidays: HolidayConfig::default(),
            overlays: Vec::new(),
            captions: CaptionConfig::default(),
            picture_fit: PictureFit::default(),
            install_command: DEFAULT_INSTALL_COMMAND.to_string(),
            fallback_screen: None,
        }
    }
}

impl Configuration {
    fn default_output_path() -> PathBuf {
        std::env::temp_dir().join(OUTPUT_FILE_NAME)
    }

    const fn default_tick_interval() -> Duration {
        Duration::from_secs(30)
    }
}

/// Replace a leading `~` with `$HOME`; other paths are returned unchanged.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}
