//! Starting DaVinci Resolve.
//!
//! Launching is fire-and-forget: the child handle is dropped right after the
//! spawn and the process lives on outside of the engine.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::info;

/// Starts an external application without waiting for it.
pub trait Launcher {
    /// Succeeds once the OS has accepted the launch request.
    fn launch(&self, executable: &Path) -> io::Result<()>;
}

/// Spawns the executable as a detached child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&self, executable: &Path) -> io::Result<()> {
        // Does not reach the host's Resolve from inside a Flatpak sandbox.
        let child = Command::new(executable)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        info!("Started {:?} (pid {})", executable, child.id());
        Ok(())
    }
}

impl<L: Launcher + ?Sized> Launcher for &L {
    fn launch(&self, executable: &Path) -> io::Result<()> {
        (**self).launch(executable)
    }
}
