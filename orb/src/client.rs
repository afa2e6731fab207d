use std::path::PathBuf;

use orbman_cmd::{Command, CommandError};
use thiserror::Error;
use tracing::debug;

use crate::RawMachine;

#[derive(Error, Debug)]
pub enum OrbError {
    #[error("orb binary not found on PATH")]
    NotFound(#[source] which::Error),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("failed to parse `{command}` output: {source}")]
    Json {
        command: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Client for the external VM manager. Every method is one blocking
/// invocation of the `orb` binary; the only state here is where the
/// binary lives.
#[derive(Debug, Clone)]
pub struct OrbClient {
    program: PathBuf,
}

impl OrbClient {
    /// Locate `orb` on PATH.
    pub fn discover() -> Result<Self, OrbError> {
        let program = which::which("orb").map_err(OrbError::NotFound)?;
        debug!(program = %program.display(), "found orb binary");
        Ok(Self { program })
    }

    /// Use an explicit binary path instead of searching PATH.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self) -> Command {
        Command::new(&self.program)
    }

    pub async fn list(&self) -> Result<Vec<RawMachine>, OrbError> {
        let mut cmd = self.command();
        cmd.args(["list", "--format", "json"]);
        let output = cmd.run().await?;
        serde_json::from_slice(&output.stdout).map_err(|source| OrbError::Json {
            command: "orb list",
            source,
        })
    }

    pub async fn info(&self, name: &str) -> Result<RawMachine, OrbError> {
        let mut cmd = self.command();
        cmd.args(["info", name, "--format", "json"]);
        let output = cmd.run().await?;
        serde_json::from_slice(&output.stdout).map_err(|source| OrbError::Json {
            command: "orb info",
            source,
        })
    }

    /// `orb create <distro>[:<version>] <name> -a <arch>`. Nothing of the
    /// output is consumed; callers re-query with [`info`](Self::info).
    pub async fn create(
        &self,
        distro: &str,
        version: Option<&str>,
        name: &str,
        arch: &str,
    ) -> Result<(), OrbError> {
        let image = match version {
            Some(version) => format!("{distro}:{version}"),
            None => distro.to_owned(),
        };
        let mut cmd = self.command();
        cmd.arg("create").arg(image).arg(name).args(["-a", arch]);
        cmd.run().await?;
        Ok(())
    }

    pub async fn start(&self, name: &str) -> Result<(), OrbError> {
        let mut cmd = self.command();
        cmd.args(["start", name]);
        cmd.run().await?;
        Ok(())
    }

    pub async fn stop(&self, name: &str) -> Result<(), OrbError> {
        let mut cmd = self.command();
        cmd.args(["stop", name]);
        cmd.run().await?;
        Ok(())
    }

    pub async fn delete(&self, name: &str, force: bool) -> Result<(), OrbError> {
        let mut cmd = self.command();
        cmd.args(["delete", name]);
        if force {
            cmd.arg("--force");
        }
        cmd.run().await?;
        Ok(())
    }

    pub async fn rename(&self, name: &str, new_name: &str) -> Result<(), OrbError> {
        let mut cmd = self.command();
        cmd.args(["rename", name, new_name]);
        cmd.run().await?;
        Ok(())
    }

    /// Run a shell command string inside a machine. Guest stdout streams
    /// through to the terminal; stderr is captured for the error path.
    pub async fn exec(&self, name: &str, command: &str) -> Result<(), OrbError> {
        debug!(machine = name, command, "running command in machine");
        let mut cmd = self.command();
        cmd.args(["-m", name, "sh", "-c"]).arg(command).stdout(true);
        cmd.run().await?;
        Ok(())
    }

    /// Open an interactive session into a machine, passing the terminal
    /// straight through. The session's exit status is the user's own and
    /// is only logged.
    pub async fn shell(&self, name: &str) -> Result<(), OrbError> {
        let mut cmd = self.command();
        cmd.args(["-m", name]);
        let status = cmd.status().await?;
        debug!(machine = name, %status, "shell session ended");
        Ok(())
    }
}
