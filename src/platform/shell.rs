use std::path::Path;
use std::process::{Command, ExitStatus};
use std::sync::Arc;

use anyhow::{Context, Result};

pub type CommandRunner = Arc<dyn Fn(&str) -> Result<CommandOutput> + Send + Sync>;

#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

pub fn default_runner() -> CommandRunner {
    Arc::new(run_shell)
}

pub fn run_shell(command: &str) -> Result<CommandOutput> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .output()
        .with_context(|| format!("failed to spawn shell for command: {command}"))?;

    Ok(CommandOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Single-quote `path` for `sh`.
pub fn quote_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    format!("'{}'", raw.replace('\'', r"'\''"))
}

#[cfg(test)]
pub(crate) mod stub {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    pub fn status(code: i32) -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw((code & 0xff) << 8)
    }

    pub fn output(code: i32, stdout: &str, stderr: &str) -> CommandOutput {
        CommandOutput {
            status: status(code),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    /// Runner answering from a fixed table and recording every command.
    #[derive(Clone, Default)]
    pub struct StubRunner {
        responses: Arc<Mutex<HashMap<String, (i32, String, String)>>>,
        pub calls: Arc<Mutex<Vec<String>>>,
    }

    impl StubRunner {
        pub fn respond(self, command: &str, code: i32, stdout: &str, stderr: &str) -> Self {
            self.responses.lock().unwrap().insert(
                command.to_string(),
                (code, stdout.to_string(), stderr.to_string()),
            );
            self
        }

        pub fn runner(&self) -> CommandRunner {
            let this = self.clone();
            Arc::new(move |command: &str| {
                this.calls.lock().unwrap().push(command.to_string());
                let guard = this.responses.lock().unwrap();
                let (code, stdout, stderr) = guard
                    .get(command)
                    .ok_or_else(|| anyhow::anyhow!("no stubbed response for command '{command}'"))?;
                Ok(output(*code, stdout, stderr))
            })
        }
    }
}
