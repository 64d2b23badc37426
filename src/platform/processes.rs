//! Running-process snapshots used to trigger overlay images.

use std::collections::BTreeSet;
use std::fmt;

use config_model::OverlayRule;
use tracing::debug;

use crate::error::{Error, Result};
use crate::platform::shell::{CommandRunner, default_runner};

const PS_COMMAND: &str = "ps -A -o comm=";

/// Supplies the names of running processes, lowercased.
pub trait ProcessSnapshot: Send + Sync {
    fn running(&self) -> Result<BTreeSet<String>>;
}

/// Lists processes with `ps`.
pub struct PsSnapshot {
    runner: CommandRunner,
}

impl fmt::Debug for PsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PsSnapshot").finish_non_exhaustive()
    }
}

impl Default for PsSnapshot {
    fn default() -> Self {
        Self::with_runner(default_runner())
    }
}

impl PsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_runner(runner: CommandRunner) -> Self {
        Self { runner }
    }
}

impl ProcessSnapshot for PsSnapshot {
    fn running(&self) -> Result<BTreeSet<String>> {
        let output = (self.runner)(PS_COMMAND).map_err(|err| Error::Probe(format!("{err:#}")))?;
        if !output.status.success() {
            return Err(Error::Probe(format!(
                "{PS_COMMAND} exited with {:?}: {}",
                output.status.code(),
                output.stderr.trim()
            )));
        }
        let names = parse_ps(&output.stdout);
        debug!(count = names.len(), "listed running processes");
        Ok(names)
    }
}

/// Fixed process list.
#[derive(Debug, Clone, Default)]
pub struct StaticProcesses(BTreeSet<String>);

impl StaticProcesses {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            names
                .into_iter()
                .map(|name| name.as_ref().to_lowercase())
                .collect(),
        )
    }
}

impl ProcessSnapshot for StaticProcesses {
    fn running(&self) -> Result<BTreeSet<String>> {
        Ok(self.0.clone())
    }
}

fn parse_ps(stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            // Some systems report the full executable path.
            let base = line.rsplit('/').next().unwrap_or(line);
            base.to_lowercase()
        })
        .collect()
}

/// First rule whose process name equals a running process name, ignoring case.
pub fn active_overlay<'a>(
    rules: &'a [OverlayRule],
    running: &BTreeSet<String>,
) -> Option<&'a OverlayRule> {
    rules.iter().find(|rule| {
        let needle = rule.process.trim().to_lowercase();
        !needle.is_empty() && running.contains(&needle)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::shell::stub::StubRunner;
    use std::path::PathBuf;

    fn rule(process: &str, image: &str) -> OverlayRule {
        OverlayRule {
            process: process.to_string(),
            image: PathBuf::from(image),
        }
    }

    #[test]
    fn parses_ps_output_case_insensitively() {
        let stub = StubRunner::default().respond(
            PS_COMMAND,
            0,
            "systemd\n  Xorg\n/usr/bin/Zoom\n\nfirefox\n",
            "",
        );
        let names = PsSnapshot::with_runner(stub.runner()).running().unwrap();
        assert!(names.contains("xorg"));
        assert!(names.contains("zoom"));
        assert!(names.contains("firefox"));
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn failing_ps_is_an_error() {
        let stub = StubRunner::default().respond(PS_COMMAND, 1, "", "denied");
        assert!(PsSnapshot::with_runner(stub.runner()).running().is_err());
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = vec![rule("Zoom", "/a.png"), rule("obs", "/b.png")];
        let running = StaticProcesses::new(["OBS", "zoom"]).running().unwrap();
        assert_eq!(
            active_overlay(&rules, &running).map(|r| r.image.clone()),
            Some(PathBuf::from("/a.png"))
        );
        let idle = StaticProcesses::new(["bash"]).running().unwrap();
        assert_eq!(active_overlay(&rules, &idle), None);
        let partial = StaticProcesses::new(["obs-studio"]).running().unwrap();
        assert_eq!(active_overlay(&rules, &partial), None);
    }

    #[test]
    fn names_must_match_exactly() {
        let rules = vec![rule("code", "/o.png"), rule("  ", "/blank.png")];
        let running = StaticProcesses::new(["xcodebuild", "bash"]).running().unwrap();
        assert_eq!(active_overlay(&rules, &running), None);

        let padded = vec![rule(" Code ", "/o.png")];
        let editor = StaticProcesses::new(["CODE"]).running().unwrap();
        assert_eq!(
            active_overlay(&padded, &editor).map(|r| r.image.clone()),
            Some(PathBuf::from("/o.png"))
        );
    }
}
