//! `tar` process wrapper

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, warn};

use super::Archiver;

/// Runs the system `tar` for every request
pub struct TarArchiver {
    program: PathBuf,
}

impl TarArchiver {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, archive: &Path, args: &[&str]) -> Result<Output> {
        let mut command = Command::new(&self.program);
        command.args(args);
        command.arg(archive);
        self.run_command(archive, command)
    }

    fn run_command(&self, archive: &Path, mut command: Command) -> Result<Output> {
        let output = command.output().map_err(|e| Error::ExtractionFailed {
            archive: archive.to_path_buf(),
            reason: format!("failed to spawn {:?}: {}", self.program, e),
        })?;

        if !output.status.success() {
            return Err(Error::ExtractionFailed {
                archive: archive.to_path_buf(),
                reason: format!(
                    "{} ({})",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(output)
    }
}

/// Split `tar tf` output into member names
///
/// Names that are not valid UTF-8 cannot be passed back to `tar` as the
/// same member, so they are skipped with a warning.
fn parse_members(archive: &Path, stdout: &[u8]) -> Vec<String> {
    let mut members = Vec::new();
    for line in stdout.split(|&b| b == b'\n') {
        match std::str::from_utf8(line) {
            Ok(name) => {
                let name = name.trim_end_matches('\r');
                if !name.is_empty() {
                    members.push(name.to_string());
                }
            }
            Err(_) => warn!(
                "skipping non-UTF-8 member {:?} of {:?}",
                String::from_utf8_lossy(line),
                archive
            ),
        }
    }
    members
}

impl Default for TarArchiver {
    fn default() -> Self {
        Self::new("tar")
    }
}

impl Archiver for TarArchiver {
    fn list(&self, archive: &Path) -> Result<Vec<String>> {
        debug!("tar tf {:?}", archive);
        let output = self.run(archive, &["tf"])?;

        Ok(parse_members(archive, &output.stdout))
    }

    fn extract(&self, archive: &Path, member: &str) -> Result<Vec<u8>> {
        debug!("tar xfO {:?} {}", archive, member);
        let mut command = Command::new(&self.program);
        command.arg("xfO").arg(archive).arg(member);
        Ok(self.run_command(archive, command)?.stdout)
    }
}
