//! [`SessionManager`] implementation that runs the configured session
//! commands (`hyprlock`, `hyprctl dispatch exit`, `systemctl ...`).

use crate::command::SessionAction;
use crate::config::PowerPanelConfig;
use crate::traits::{CommandRunner, SessionManager};
use log::{info, warn};

/// Runs power menu entries through a [`CommandRunner`].
#[derive(Debug, Clone, Default)]
pub struct SessionCtl<R> {
    runner: R,
    commands: PowerPanelConfig,
}

impl<R: CommandRunner> SessionCtl<R> {
    pub fn new(runner: R, commands: PowerPanelConfig) -> Self {
        Self { runner, commands }
    }

    /// The command line `action` runs, joined by spaces.
    pub fn describe(&self, action: SessionAction) -> String {
        self.commands.command(action).join(" ")
    }
}

impl<R: CommandRunner> SessionManager for SessionCtl<R> {
    type Error = R::Error;

    fn run(&self, action: SessionAction) -> Result<(), Self::Error> {
        let argv = self.commands.command(action);
        let Some((program, args)) = argv.split_first() else {
            warn!("no command for {}", action);
            return Ok(());
        };
        info!("session {}: {}", action, argv.join(" "));
        if action.is_blocking() {
            // The locker only exits once the session is unlocked.
            self.runner.spawn(program, args)
        } else {
            self.runner.output(program, args).map(|_| ())
        }
    }
}
