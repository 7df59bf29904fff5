//! Backends that drive the desktop through command-line tools.
//!
//! Each submodule implements one of the traits in
//! [`traits`](crate::traits) on top of a [`CommandRunner`]:
//!
//! * [`bluetoothctl`]: [`BluetoothManager`](crate::traits::BluetoothManager)
//! * [`nmcli`]: [`WifiManager`](crate::traits::WifiManager)
//! * [`swww`]: [`WallpaperDaemon`](crate::traits::WallpaperDaemon)
//! * [`waybar`]: [`BarProcess`](crate::traits::BarProcess)
//! * [`session`]: [`SessionManager`](crate::traits::SessionManager)
//!
//! [`SystemRunner`] is the only place in the crate that starts processes.
//! Output parsing lives next to each backend as free functions so it can
//! be tested without the tools installed.

pub mod bluetoothctl;
pub mod nmcli;
pub mod session;
pub mod swww;
pub mod waybar;

use crate::traits::CommandRunner;
use log::debug;
use std::process::{Command, Stdio};

/// Errors from running an external program.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("{program} produced non-UTF-8 output")]
    Utf8 { program: String },
}

/// [`CommandRunner`] backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

fn spawn_error(program: &str, source: std::io::Error) -> CliError {
    CliError::Spawn {
        program: program.to_string(),
        source,
    }
}

impl CommandRunner for SystemRunner {
    type Error = CliError;

    fn output(&self, program: &str, args: &[&str]) -> Result<String, CliError> {
        debug!("run: {} {}", program, args.join(" "));
        let out = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| spawn_error(program, e))?;

        if !out.status.success() {
            return Err(CliError::Failed {
                program: program.to_string(),
                status: out.status,
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        String::from_utf8(out.stdout).map_err(|_| CliError::Utf8 {
            program: program.to_string(),
        })
    }

    fn status(&self, program: &str, args: &[&str]) -> Result<bool, CliError> {
        debug!("run (status): {} {}", program, args.join(" "));
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| spawn_error(program, e))?;
        Ok(status.success())
    }

    fn spawn(&self, program: &str, args: &[&str]) -> Result<(), CliError> {
        debug!("spawn: {} {}", program, args.join(" "));
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| spawn_error(program, e))?;

        // Reap the child when it exits so it never lingers as a zombie.
        let name = program.to_string();
        std::thread::spawn(move || match child.wait() {
            Ok(status) => debug!("{} exited: {}", name, status),
            Err(e) => debug!("wait for {} failed: {}", name, e),
        });
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedRunner;
    use super::*;

    #[test]
    fn system_runner_captures_stdout() {
        let out = SystemRunner::new().output("echo", &["hello"]).unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn system_runner_reports_non_zero_exit() {
        let err = SystemRunner::new().output("false", &[]).unwrap_err();
        assert!(matches!(err, CliError::Failed { .. }));
    }

    #[test]
    fn system_runner_reports_missing_program() {
        let err = SystemRunner::new()
            .output("deskpanels-definitely-not-installed", &[])
            .unwrap_err();
        assert!(matches!(err, CliError::Spawn { .. }));
    }

    #[test]
    fn system_runner_status_is_not_an_error() {
        assert!(!SystemRunner::new().status("false", &[]).unwrap());
        assert!(SystemRunner::new().status("true", &[]).unwrap());
    }

    #[test]
    fn scripted_runner_records_calls() {
        let r = ScriptedRunner::new().with_output("tool --list", "a\nb\n");
        assert_eq!(r.output("tool", &["--list"]).unwrap(), "a\nb\n");
        assert!(r.output("tool", &["--other"]).is_err());
        r.spawn("daemon", &[]).unwrap();
        assert_eq!(r.calls(), vec!["tool --list", "tool --other", "daemon &"]);
    }
}
