use std::path::PathBuf;

use thiserror::Error;

/// Library error type for wallpaper synthesis.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured font family is not installed.
    #[error("font family '{0}' is not available")]
    FontUnavailable(String),

    /// A font face was found but could not be parsed.
    #[error("failed to decode font face for '{family}'")]
    FontDecode { family: String },

    /// A holiday record could not be decoded.
    #[error("invalid holiday record '{record}': {reason}")]
    InvalidHoliday { record: String, reason: String },

    /// Decoding or encoding an image failed.
    #[error("image error for {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The wallpaper installer rejected the rendered file.
    #[error("wallpaper install failed: {0}")]
    Install(String),

    /// A system probe (process list, screen layout) did not answer.
    #[error("probe failed: {0}")]
    Probe(String),

    /// The settings store could not be read or written.
    #[error("settings error: {0}")]
    Settings(String),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde error while persisting state.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
