use std::ffi::OsStr;
use std::fmt::Display;
use std::process::{ExitStatus, Output, Stdio};
use tokio::process::Command as BaseCommand;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to spawn command: {command}")]
    Spawn {
        command: String,
        #[source]
        error: tokio::io::Error,
    },

    #[error("command failed: {command}\n{stderr}")]
    Failure { command: String, stderr: String },
}

/// Builder around [`tokio::process::Command`] that remembers the full
/// command line for error messages and captures stderr on failure.
#[derive(Debug)]
pub struct Command {
    cmd: BaseCommand,
    stdout: bool,
    stderr: bool,
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cmd = self.cmd.as_std();
        let program = cmd.get_program().to_string_lossy();
        let args = cmd
            .get_args()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        if args.is_empty() {
            write!(f, "{program}")
        } else {
            write!(f, "{program} {args}")
        }
    }
}

impl Command {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            cmd: BaseCommand::new(program),
            stdout: false,
            stderr: false,
        }
    }

    pub fn arg<S: AsRef<OsStr>>(&mut self, arg: S) -> &mut Self {
        self.cmd.arg(arg);
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.cmd.args(args);
        self
    }

    /// Let the child write straight to the terminal instead of a pipe.
    pub fn stdout(&mut self, stdout: bool) -> &mut Command {
        self.stdout = stdout;
        self
    }

    pub fn stderr(&mut self, stderr: bool) -> &mut Command {
        self.stderr = stderr;
        self
    }

    pub async fn output(&mut self) -> Result<Output, CommandError> {
        self.cmd
            .stdin(Stdio::null())
            .stdout(if self.stdout {
                Stdio::inherit()
            } else {
                Stdio::piped()
            })
            .stderr(if self.stderr {
                Stdio::inherit()
            } else {
                Stdio::piped()
            })
            .output()
            .await
            .map_err(|error| CommandError::Spawn {
                command: self.to_string(),
                error,
            })
    }

    pub async fn run(&mut self) -> Result<Output, CommandError> {
        self.output().await.and_then(|out| {
            if out.status.success() {
                Ok(out)
            } else {
                Err(CommandError::Failure {
                    command: self.to_string(),
                    stderr: String::from_utf8_lossy(&out.stderr).to_string(),
                })
            }
        })
    }

    /// Run fully interactive: stdin, stdout, and stderr are inherited from
    /// the parent. Returns the exit status without treating non-zero as an
    /// error, since the status of an interactive session is the user's.
    pub async fn status(&mut self) -> Result<ExitStatus, CommandError> {
        self.cmd
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|error| CommandError::Spawn {
                command: self.to_string(),
                error,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_command() {
        assert_eq!(Command::new("orb").to_string(), "orb")
    }

    #[test]
    fn test_get_command_with_one_arg() {
        assert_eq!(Command::new("orb").arg("list").to_string(), "orb list")
    }

    #[test]
    fn test_get_command_with_two_args() {
        assert_eq!(
            Command::new("orb").arg("start").arg("dev").to_string(),
            "orb start dev"
        )
    }
}
