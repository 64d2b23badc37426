//! Virtual screen geometry: every monitor merged into one bounding box.

use std::fmt;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::platform::shell::{CommandRunner, default_runner};

const XRANDR_COMMAND: &str = "xrandr --listmonitors";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    pub count: u32,
    pub width: u32,
    pub height: u32,
}

pub trait ScreenProbe: Send + Sync {
    fn geometry(&self) -> Result<ScreenGeometry>;
}

#[derive(Debug, Clone, Copy)]
pub struct FixedScreens(pub ScreenGeometry);

impl ScreenProbe for FixedScreens {
    fn geometry(&self) -> Result<ScreenGeometry> {
        Ok(self.0)
    }
}

/// Asks `xrandr` for the monitor layout, falling back to a fixed geometry
/// when it cannot.
pub struct XrandrProbe {
    runner: CommandRunner,
    fallback: Option<ScreenGeometry>,
}

impl fmt::Debug for XrandrProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XrandrProbe")
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl XrandrProbe {
    pub fn new(fallback: Option<ScreenGeometry>) -> Self {
        Self::with_runner(default_runner(), fallback)
    }

    pub(crate) fn with_runner(runner: CommandRunner, fallback: Option<ScreenGeometry>) -> Self {
        Self { runner, fallback }
    }

    fn query(&self) -> Result<ScreenGeometry> {
        let output =
            (self.runner)(XRANDR_COMMAND).map_err(|err| Error::Probe(format!("{err:#}")))?;
        if !output.status.success() {
            return Err(Error::Probe(format!(
                "{XRANDR_COMMAND} exited with {:?}: {}",
                output.status.code(),
                output.stderr.trim()
            )));
        }
        parse_listmonitors(&output.stdout)
            .ok_or_else(|| Error::Probe("xrandr reported no monitors".to_string()))
    }
}

impl ScreenProbe for XrandrProbe {
    fn geometry(&self) -> Result<ScreenGeometry> {
        match self.query() {
            Ok(geometry) => {
                debug!(?geometry, "probed screen layout");
                Ok(geometry)
            }
            Err(err) => match self.fallback {
                Some(fallback) => {
                    warn!(%err, ?fallback, "screen probe failed; using configured geometry");
                    Ok(fallback)
                }
                None => Err(err),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Monitor {
    x: i64,
    y: i64,
    width: u32,
    height: u32,
}

/// Parse lines like ` 0: +*DP-1 1920/527x1080/296+0+0  DP-1`.
fn parse_monitor(line: &str) -> Option<Monitor> {
    let (index, rest) = line.trim().split_once(':')?;
    index.trim().parse::<u32>().ok()?;
    rest.split_whitespace().find_map(parse_geometry_token)
}

fn parse_geometry_token(token: &str) -> Option<Monitor> {
    let (width_part, rest) = token.split_once('x')?;
    let width = width_part.split('/').next()?.parse::<u32>().ok()?;
    let mut parts = rest.splitn(3, '+');
    let height = parts.next()?.split('/').next()?.parse::<u32>().ok()?;
    let x = parts.next()?.parse::<i64>().ok()?;
    let y = parts.next()?.parse::<i64>().ok()?;
    Some(Monitor {
        x,
        y,
        width,
        height,
    })
}

fn parse_listmonitors(stdout: &str) -> Option<ScreenGeometry> {
    let monitors: Vec<Monitor> = stdout.lines().filter_map(parse_monitor).collect();
    if monitors.is_empty() {
        return None;
    }
    let min_x = monitors.iter().map(|m| m.x).min()?;
    let min_y = monitors.iter().map(|m| m.y).min()?;
    let max_x = monitors.iter().map(|m| m.x + i64::from(m.width)).max()?;
    let max_y = monitors.iter().map(|m| m.y + i64::from(m.height)).max()?;
    let width = u32::try_from(max_x - min_x).ok()?;
    let height = u32::try_from(max_y - min_y).ok()?;
    (width > 0 && height > 0).then_some(ScreenGeometry {
        count: monitors.len() as u32,
        width,
        height,
    })
}
