//! Visual modes and the hour-based schedule that picks between them.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, Timelike};
use config_model::{DEFAULT_SINGLE_COLOR, ModeKindConfig, ModeSchedule};

use crate::scan::Catalog;

/// `num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// Days since 1970-01-01 for a calendar date.
pub fn day_number(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE
}

/// What the background shows for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Color([u8; 3]),
    Picture { name: String, path: PathBuf },
}

impl Content {
    /// Stable identity fed into the render fingerprint: `#rrggbb` or the
    /// picture's full path.
    pub fn identity(&self) -> String {
        match self {
            Self::Color([r, g, b]) => format!("#{r:02x}{g:02x}{b:02x}"),
            Self::Picture { path, .. } => path.display().to_string(),
        }
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity())
    }
}

#[derive(Debug, Clone)]
pub enum Mode {
    SingleColor {
        title: Option<String>,
        color: [u8; 3],
    },
    PictureRotation {
        title: Option<String>,
        /// Explicit directory; `None` follows the settings' picture directory.
        directory: Option<PathBuf>,
        catalog: Catalog,
    },
}

impl Mode {
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::SingleColor { title, .. } | Self::PictureRotation { title, .. } => {
                title.as_deref()
            }
        }
    }

    /// Content for `day_number`; `None` when a rotation has no pictures.
    pub fn content(&self, day_number: i64, offset: i64) -> Option<Content> {
        match self {
            Self::SingleColor { color, .. } => Some(Content::Color(*color)),
            Self::PictureRotation { catalog, .. } => {
                catalog.select(day_number, offset).map(|name| Content::Picture {
                    name: name.to_string(),
                    path: catalog.path_of(name),
                })
            }
        }
    }

    /// `true` when a picture rotation's catalog lists another directory than
    /// the one it should show now.
    pub fn is_stale(&self, fallback_directory: &Path) -> bool {
        match self {
            Self::SingleColor { .. } => false,
            Self::PictureRotation {
                directory, catalog, ..
            } => catalog.directory() != directory.as_deref().unwrap_or(fallback_directory),
        }
    }

    /// Rebuild the catalog of a picture rotation. Single colors are unaffected.
    pub fn rescan(&mut self, fallback_directory: &Path) {
        if let Self::PictureRotation {
            directory, catalog, ..
        } = self
        {
            let dir = directory.as_deref().unwrap_or(fallback_directory);
            if catalog.directory() != dir {
                *catalog = Catalog::empty(dir);
            }
            catalog.rescan();
        }
    }
}

/// Modes in schedule order, built once at startup.
#[derive(Debug, Clone)]
pub struct ModeSet {
    schedule: ModeSchedule,
    modes: Vec<Mode>,
}

impl ModeSet {
    pub fn new(schedule: ModeSchedule) -> Self {
        let modes = schedule
            .modes()
            .iter()
            .map(|cfg| match &cfg.kind {
                ModeKindConfig::SingleColor { color } => Mode::SingleColor {
                    title: cfg.title.clone(),
                    color: *color,
                },
                ModeKindConfig::PictureRotation { directory } => Mode::PictureRotation {
                    title: cfg.title.clone(),
                    directory: directory.clone(),
                    catalog: Catalog::empty(directory.clone().unwrap_or_default()),
                },
            })
            .collect();
        Self { schedule, modes }
    }

    /// Index of the mode current at the wall-clock hour of `now`.
    pub fn current_index<T: Timelike>(&self, now: &T) -> usize {
        self.schedule.index_for_hour(now.hour())
    }

    pub fn current<T: Timelike>(&self, now: &T) -> &Mode {
        &self.modes[self.current_index(now)]
    }

    pub fn get(&self, idx: usize) -> Option<&Mode> {
        self.modes.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Mode> {
        self.modes.get_mut(idx)
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// Flat color used when the current mode has nothing to show.
    pub fn fallback_color(&self) -> [u8; 3] {
        self.modes
            .iter()
            .find_map(|mode| match mode {
                Mode::SingleColor { color, .. } => Some(*color),
                Mode::PictureRotation { .. } => None,
            })
            .unwrap_or(DEFAULT_SINGLE_COLOR)
    }
}
