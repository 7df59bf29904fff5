//! [`BarProcess`] implementation that restarts Waybar.

use crate::traits::{BarProcess, CommandRunner};
use log::{debug, info};

/// Restarts Waybar with `pkill -x waybar` followed by a detached `waybar`.
#[derive(Debug, Clone, Default)]
pub struct WaybarProcess<R> {
    runner: R,
}

impl<R: CommandRunner> WaybarProcess<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> BarProcess for WaybarProcess<R> {
    type Error = R::Error;

    fn restart(&self) -> Result<(), Self::Error> {
        // pkill exits 1 when nothing matched; that is fine.
        if !self.runner.status("pkill", &["-x", "waybar"])? {
            debug!("no running waybar instance");
        }
        self.runner.spawn("waybar", &[])?;
        info!("waybar restarted");
        Ok(())
    }
}
