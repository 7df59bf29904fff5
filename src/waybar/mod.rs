//! Waybar launcher configuration.
//!
//! [`jsonc`] reads the comment-tolerant config format, [`config`] edits
//! the launcher modules in it, and [`desktop`] lists installed
//! applications to pick new launchers from.

pub mod config;
pub mod desktop;
pub mod jsonc;

pub use config::{LauncherKind, LauncherModule, WaybarConfig, WaybarError};
pub use desktop::{filter_applications, scan_applications, DesktopApp};
