use std::fmt;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::platform::shell::{CommandRunner, default_runner, quote_path};

pub const DEFAULT_INSTALL_COMMAND: &str = "feh --bg-fill {path}";
pub const PATH_PLACEHOLDER: &str = "{path}";

/// Makes a rendered file the desktop background.
pub trait WallpaperInstaller: Send + Sync {
    fn install(&self, path: &Path) -> Result<()>;
}

/// Runs a shell template with `{path}` replaced by the quoted file path.
pub struct CommandInstaller {
    template: String,
    runner: CommandRunner,
}

impl fmt::Debug for CommandInstaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandInstaller")
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

impl CommandInstaller {
    pub fn new(template: impl Into<String>) -> Self {
        Self::with_runner(template, default_runner())
    }

    pub(crate) fn with_runner(template: impl Into<String>, runner: CommandRunner) -> Self {
        Self {
            template: template.into(),
            runner,
        }
    }

    pub fn command_for(&self, path: &Path) -> String {
        self.template.replace(PATH_PLACEHOLDER, &quote_path(path))
    }
}

impl WallpaperInstaller for CommandInstaller {
    fn install(&self, path: &Path) -> Result<()> {
        let command = self.command_for(path);
        debug!(command, "installing wallpaper");
        let output = (self.runner)(&command).map_err(|err| Error::Install(format!("{err:#}")))?;
        if !output.status.success() {
            return Err(Error::Install(format!(
                "`{command}` exited with {:?}: {}",
                output.status.code(),
                output.stderr.trim()
            )));
        }
        info!(path = %path.display(), "wallpaper installed");
        Ok(())
    }
}

/// Leaves the desktop alone; used for one-off renders.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInstaller;

impl WallpaperInstaller for NoopInstaller {
    fn install(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "skipping wallpaper install");
        Ok(())
    }
}
