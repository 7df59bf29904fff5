//! **deskpanels**: small desktop panels for a Hyprland + Waybar setup.
//!
//! * A Waybar launcher editor that adds, edits and removes `image#…` and
//!   `custom/…` launcher modules and restarts Waybar.
//! * A Bluetooth panel on top of `bluetoothctl`.
//! * A Wi-Fi panel on top of `nmcli`.
//! * A wallpaper carousel that applies the chosen image with `swww`.
//! * A full-screen power menu (lock, log out, reboot, power off).
//!
//! # Architecture
//!
//! The panels never start processes themselves.  They talk to the traits
//! in [`traits`] ([`BluetoothManager`](traits::BluetoothManager),
//! [`WifiManager`](traits::WifiManager),
//! [`WallpaperDaemon`](traits::WallpaperDaemon),
//! [`BarProcess`](traits::BarProcess),
//! [`SessionManager`](traits::SessionManager)), whose implementations in [`cli`]
//! run the command-line tools through a
//! [`CommandRunner`](traits::CommandRunner).
//!
//! The data models ([`waybar`], [`wallpaper`]) are plain Rust and build
//! without GTK; the windows live in `ui` behind the `ui-gtk` feature.

pub mod cli;
pub mod command;
pub mod config;
pub mod easing;
pub mod gate;
pub mod traits;
pub mod wallpaper;
pub mod waybar;

#[cfg(feature = "ui-gtk")]
pub mod ui;
