//! Launching the installed application.
//!
//! The launch target is a URI or path handed to the platform opener; the
//! opener decides which program handles it. The caller does not wait for the
//! child; a detached thread reaps it once it exits.

use std::io;
use std::process::{Child, Command, Stdio};
use std::thread;

use thiserror::Error;
use tracing::{debug, info, warn};

#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Result type for launch operations.
pub type LaunchResult<T> = Result<T, LaunchError>;

/// Errors raised while launching the application.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// No launch target is configured.
    #[error("no launch target configured")]
    NoTarget,

    /// The opener process could not be spawned.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Opens a launch target.
pub trait AppLauncher: Send + Sync {
    /// Launch `target` without waiting for it to exit.
    fn launch(&self, target: &str) -> LaunchResult<()>;
}

/// Launcher using the platform's default URI handler.
///
/// | Platform | Opener                                  |
/// |----------|-----------------------------------------|
/// | Windows  | `rundll32 url.dll,FileProtocolHandler`  |
/// | macOS    | `open`                                  |
/// | other    | `xdg-open`                              |
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl SystemLauncher {
    /// Create a new system launcher.
    pub fn new() -> Self {
        Self
    }

    /// Build the opener command for `target`.
    pub fn command(&self, target: &str) -> Command {
        let mut command = if cfg!(target_os = "windows") {
            let mut command = Command::new("rundll32");
            command.arg("url.dll,FileProtocolHandler");
            command
        } else if cfg!(target_os = "macos") {
            Command::new("open")
        } else {
            Command::new("xdg-open")
        };
        command
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        hide_console_window(&mut command);
        command
    }
}

#[inline]
fn hide_console_window(command: &mut Command) {
    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        command.creation_flags(CREATE_NO_WINDOW);
    }
    #[cfg(not(target_os = "windows"))]
    let _ = command;
}

/// Spawn `command` and hand the child to a reaper thread.
pub(crate) fn spawn_detached(command: &mut Command) -> LaunchResult<()> {
    let program = command.get_program().to_string_lossy().into_owned();
    let child = command
        .spawn()
        .map_err(|source| LaunchError::Spawn { program, source })?;
    reap(child);
    Ok(())
}

fn reap(mut child: Child) {
    let pid = child.id();
    let spawned = thread::Builder::new()
        .name("launch-reaper".to_string())
        .spawn(move || match child.wait() {
            Ok(status) => debug!(pid, %status, "Launcher process exited"),
            Err(e) => warn!(pid, error = %e, "Failed to wait for launcher process"),
        });
    if let Err(e) = spawned {
        warn!(pid, error = %e, "Failed to start reaper thread");
    }
}

impl AppLauncher for SystemLauncher {
    fn launch(&self, target: &str) -> LaunchResult<()> {
        spawn_detached(&mut self.command(target))?;
        info!(target = %target, "Launched application");
        Ok(())
    }
}
