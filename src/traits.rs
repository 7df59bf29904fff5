//! Core traits that decouple the panels from the command-line tools they
//! drive.
//!
//! The GTK windows only see [`BluetoothManager`], [`WifiManager`],
//! [`WallpaperDaemon`], [`BarProcess`] and [`SessionManager`].  The concrete implementations in
//! [`cli`](crate::cli) shell out through a [`CommandRunner`], which is the
//! single place where processes are actually started.  Tests swap the
//! runner for a scripted double.

use crate::command::{BluetoothAction, BluetoothDevice, SessionAction, Transition, WifiNetwork};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runs external programs.
///
/// Every backend funnels its subprocess calls through one of these three
/// methods, so the exact argument vectors can be asserted in tests.
pub trait CommandRunner {
    /// The error type produced by this runner.
    type Error: std::error::Error + Send + 'static;

    /// Run `program` to completion and return its standard output.
    ///
    /// A non-zero exit status is an error.
    fn output(&self, program: &str, args: &[&str]) -> Result<String, Self::Error>;

    /// Run `program` to completion and report whether it exited
    /// successfully.  Output is discarded.
    ///
    /// Only a failure to *start* the program is an error.
    fn status(&self, program: &str, args: &[&str]) -> Result<bool, Self::Error>;

    /// Start `program` detached and return immediately.
    fn spawn(&self, program: &str, args: &[&str]) -> Result<(), Self::Error>;
}

/// Abstraction over the Bluetooth controller.
///
/// Implementations block; the UI calls them from a worker thread.
pub trait BluetoothManager {
    /// The error type produced by this manager.
    type Error: std::error::Error + Send + 'static;

    /// Unblock the radio and power the controller on.
    fn prepare_adapter(&self) -> Result<(), Self::Error>;

    /// Discover nearby devices for `duration` so they show up in
    /// [`devices`](BluetoothManager::devices).
    fn scan(&self, duration: Duration) -> Result<(), Self::Error>;

    /// All known devices, connected ones first, then paired ones.
    fn devices(&self) -> Result<Vec<BluetoothDevice>, Self::Error>;

    /// Whether the controller is powered.
    fn powered(&self) -> Result<bool, Self::Error>;

    fn set_power(&self, on: bool) -> Result<(), Self::Error>;

    /// Apply `action` to the device with address `mac`.
    fn perform(&self, action: BluetoothAction, mac: &str) -> Result<(), Self::Error>;
}

/// Abstraction over the Wi-Fi stack.
pub trait WifiManager {
    /// The error type produced by this manager.
    type Error: std::error::Error + Send + 'static;

    /// Turn the Wi-Fi radio on or off.
    fn set_radio(&self, on: bool) -> Result<(), Self::Error>;

    /// Ask the driver for a fresh scan.
    fn rescan(&self) -> Result<(), Self::Error>;

    /// Visible access points, active first, then strongest first.
    /// SSIDs are unique.
    fn networks(&self) -> Result<Vec<WifiNetwork>, Self::Error>;

    /// Connect to `ssid`, replacing any saved profile of the same name.
    ///
    /// `password` is `None` for open networks.
    fn connect(&self, ssid: &str, password: Option<&str>) -> Result<(), Self::Error>;

    /// Delete the saved profile for `ssid`.
    fn forget(&self, ssid: &str) -> Result<(), Self::Error>;
}

/// Abstraction over the wallpaper daemon.
pub trait WallpaperDaemon {
    /// The error type produced by this daemon.
    type Error: std::error::Error + Send + 'static;

    /// Start the daemon if it is not answering.
    fn ensure_running(&self) -> Result<(), Self::Error>;

    /// The image currently shown, or `None` if the daemon does not say.
    fn current(&self) -> Result<Option<PathBuf>, Self::Error>;

    /// Switch the background to `path` with the given transition.
    fn apply(&self, path: &Path, transition: &Transition) -> Result<(), Self::Error>;
}

/// The status bar process that must be restarted after its config changes.
pub trait BarProcess {
    /// The error type produced by this process handle.
    type Error: std::error::Error + Send + 'static;

    /// Stop any running instance and start a fresh one in the background.
    fn restart(&self) -> Result<(), Self::Error>;
}

/// The user session behind the power menu.
pub trait SessionManager {
    /// The error type produced by this session handle.
    type Error: std::error::Error + Send + 'static;

    /// Lock, log out, reboot or power off.
    fn run(&self, action: SessionAction) -> Result<(), Self::Error>;
}
