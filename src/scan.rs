//! Directory scanning for the picture rotation catalog.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

const PICTURE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Return `true` if `path` has an allowed picture extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            PICTURE_EXTENSIONS.iter().any(|e| *e == ext)
        })
}

/// Sorted file names of the pictures directly inside one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    directory: PathBuf,
    names: Vec<String>,
}

impl Catalog {
    /// Catalog for `directory` that has not been scanned yet.
    pub fn empty(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            names: Vec::new(),
        }
    }

    /// List `directory` without recursing. Access failures yield an empty
    /// catalog.
    pub fn scan(directory: impl Into<PathBuf>) -> Self {
        let mut catalog = Self::empty(directory);
        catalog.rescan();
        catalog
    }

    /// Replace the contents with a fresh listing of the directory.
    pub fn rescan(&mut self) {
        self.names.clear();
        if !self.directory.is_dir() {
            warn!(dir = %self.directory.display(), "picture directory is not accessible");
            return;
        }

        for entry in WalkDir::new(&self.directory).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(dir = %self.directory.display(), %err, "failed to list picture directory");
                    self.names.clear();
                    return;
                }
            };
            if !entry.file_type().is_file() || !is_supported_image(entry.path()) {
                continue;
            }
            match entry.file_name().to_str() {
                Some(name) => self.names.push(name.to_string()),
                None => debug!(path = %entry.path().display(), "skipping non-UTF-8 file name"),
            }
        }
        self.names.sort_unstable();
        debug!(dir = %self.directory.display(), count = self.names.len(), "scanned pictures");
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Picture shown on `day_number` with the user's rotation `offset`.
    pub fn select(&self, day_number: i64, offset: i64) -> Option<&str> {
        let idx = rotation_index(day_number, offset, self.names.len())?;
        self.names.get(idx).map(String::as_str)
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }
}

/// `(day_number + offset) mod len`, normalized to a non-negative index.
pub fn rotation_index(day_number: i64, offset: i64, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let len = len as i64;
    let shifted = day_number.wrapping_add(offset);
    Some(shifted.rem_euclid(len) as usize)
}
