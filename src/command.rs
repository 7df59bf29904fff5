//! Types shared by the panels and their backends.
//!
//! This module defines the vocabulary every component speaks:
//! [`BluetoothDevice`] / [`BluetoothAction`] for the Bluetooth panel,
//! [`WifiNetwork`] / [`SignalStrength`] for the Wi-Fi panel, and
//! [`Direction`] / [`TransitionType`] / [`Transition`] for the wallpaper
//! carousel, and [`SessionAction`] for the power menu.
//!
//! Transition types are accepted case-insensitively in the config file
//! (`"outer"`, `"Outer"`, `" grow "`).

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

//  Bluetooth

/// A device known to the Bluetooth controller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BluetoothDevice {
    /// Hardware address, e.g. `"AA:BB:CC:DD:EE:FF"`.
    pub mac: String,
    /// Alias reported by BlueZ.  May be empty.
    pub name: String,
    pub paired: bool,
    pub connected: bool,
    pub trusted: bool,
}

impl BluetoothDevice {
    /// Create an unpaired, disconnected, untrusted device.
    pub fn new(mac: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            mac: mac.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// The name to show in a list; `"Unknown Device"` when BlueZ has none.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Unknown Device"
        } else {
            &self.name
        }
    }

    /// The action behind the row's main button.
    ///
    /// Unpaired devices must be paired first; paired devices toggle
    /// between connected and disconnected.
    pub fn primary_action(&self) -> BluetoothAction {
        if !self.paired {
            BluetoothAction::Pair
        } else if self.connected {
            BluetoothAction::Disconnect
        } else {
            BluetoothAction::Connect
        }
    }

    /// `Trust` for an untrusted device, `Untrust` otherwise.
    pub fn trust_toggle(&self) -> BluetoothAction {
        if self.trusted {
            BluetoothAction::Untrust
        } else {
            BluetoothAction::Trust
        }
    }
}

/// A per-device `bluetoothctl` verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BluetoothAction {
    Connect,
    Disconnect,
    Pair,
    Trust,
    Untrust,
    Remove,
}

impl BluetoothAction {
    /// The `bluetoothctl` sub-command for this action.
    pub fn verb(self) -> &'static str {
        match self {
            BluetoothAction::Connect => "connect",
            BluetoothAction::Disconnect => "disconnect",
            BluetoothAction::Pair => "pair",
            BluetoothAction::Trust => "trust",
            BluetoothAction::Untrust => "untrust",
            BluetoothAction::Remove => "remove",
        }
    }

    /// Button / menu label.
    pub fn label(self) -> &'static str {
        match self {
            BluetoothAction::Connect => "Connect",
            BluetoothAction::Disconnect => "Disconnect",
            BluetoothAction::Pair => "Pair",
            BluetoothAction::Trust => "Trust Device",
            BluetoothAction::Untrust => "Untrust Device",
            BluetoothAction::Remove => "Remove/Unpair",
        }
    }
}

impl fmt::Display for BluetoothAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

//  Wi-Fi

/// One access point as reported by NetworkManager.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WifiNetwork {
    pub ssid: String,
    /// Whether this is the network we are currently connected to.
    pub active: bool,
    /// Signal quality in percent (`0..=100`).
    pub signal: u8,
    /// NetworkManager's bar glyphs, e.g. `"▂▄▆_"`.
    pub bars: String,
    /// Security summary (`"WPA2"`, `"WPA1 WPA2"`, …).  Empty for open networks.
    pub security: String,
}

impl WifiNetwork {
    /// `true` when the network needs no password.
    pub fn is_open(&self) -> bool {
        let s = self.security.trim();
        s.is_empty() || s == "--"
    }

    pub fn strength(&self) -> SignalStrength {
        SignalStrength::from_percent(self.signal)
    }
}

/// Coarse signal bucket used for colouring list rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalStrength {
    Strong,
    Fair,
    Weak,
}

impl SignalStrength {
    /// `> 75` is strong, `> 50` is fair, anything else is weak.
    pub fn from_percent(signal: u8) -> Self {
        if signal > 75 {
            SignalStrength::Strong
        } else if signal > 50 {
            SignalStrength::Fair
        } else {
            SignalStrength::Weak
        }
    }

    /// CSS class applied to the network label.
    pub fn css_class(self) -> &'static str {
        match self {
            SignalStrength::Strong => "signal-strong",
            SignalStrength::Fair => "signal-fair",
            SignalStrength::Weak => "signal-weak",
        }
    }
}

//  Wallpaper carousel

/// Direction of travel through the wallpaper list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// `-1` for left, `+1` for right.
    pub fn delta(self) -> isize {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
        }
    }
}

/// `swww img --transition-type` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionType {
    None,
    Simple,
    Fade,
    Left,
    Right,
    Top,
    Bottom,
    Wipe,
    Wave,
    Grow,
    Center,
    Any,
    Outer,
    Random,
}

impl TransitionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransitionType::None => "none",
            TransitionType::Simple => "simple",
            TransitionType::Fade => "fade",
            TransitionType::Left => "left",
            TransitionType::Right => "right",
            TransitionType::Top => "top",
            TransitionType::Bottom => "bottom",
            TransitionType::Wipe => "wipe",
            TransitionType::Wave => "wave",
            TransitionType::Grow => "grow",
            TransitionType::Center => "center",
            TransitionType::Any => "any",
            TransitionType::Outer => "outer",
            TransitionType::Random => "random",
        }
    }
}

impl fmt::Display for TransitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a transition name (case-insensitive, surrounding whitespace ignored).
pub fn parse_transition_type(s: &str) -> Option<TransitionType> {
    let normalized = s.trim().to_lowercase();
    let t = match normalized.as_str() {
        "none" => TransitionType::None,
        "simple" => TransitionType::Simple,
        "fade" => TransitionType::Fade,
        "left" => TransitionType::Left,
        "right" => TransitionType::Right,
        "top" => TransitionType::Top,
        "bottom" => TransitionType::Bottom,
        "wipe" => TransitionType::Wipe,
        "wave" => TransitionType::Wave,
        "grow" => TransitionType::Grow,
        "center" => TransitionType::Center,
        "any" => TransitionType::Any,
        "outer" => TransitionType::Outer,
        "random" => TransitionType::Random,
        _ => return None,
    };
    Some(t)
}

impl Serialize for TransitionType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransitionType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_transition_type(&s)
            .ok_or_else(|| DeError::custom(format!("invalid transition type: {:?}", s)))
    }
}

/// Everything `swww img` needs besides the image path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub kind: TransitionType,
    /// Seconds.
    pub duration: f32,
    pub fps: u32,
}

impl Default for Transition {
    fn default() -> Self {
        Self {
            kind: TransitionType::Outer,
            duration: 0.8,
            fps: 60,
        }
    }
}

//  Session

/// An entry of the power menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionAction {
    Lock,
    Logout,
    Reboot,
    PowerOff,
}

impl SessionAction {
    /// Menu order, left to right.
    pub const ALL: [SessionAction; 4] = [
        SessionAction::Lock,
        SessionAction::Logout,
        SessionAction::Reboot,
        SessionAction::PowerOff,
    ];

    /// Key used in the config file and in `--list` output.
    pub fn name(self) -> &'static str {
        match self {
            SessionAction::Lock => "lock",
            SessionAction::Logout => "logout",
            SessionAction::Reboot => "reboot",
            SessionAction::PowerOff => "poweroff",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SessionAction::Lock => "Lock",
            SessionAction::Logout => "Logout",
            SessionAction::Reboot => "Reboot",
            SessionAction::PowerOff => "Power",
        }
    }

    /// Nerd Font icon shown above the label.
    pub fn glyph(self) -> &'static str {
        match self {
            SessionAction::Lock => "\u{f033e}",
            SessionAction::Logout => "\u{f0523}",
            SessionAction::Reboot => "\u{f0709}",
            SessionAction::PowerOff => "\u{f0425}",
        }
    }

    /// Command line run when the config does not override it.
    pub fn default_command(self) -> &'static [&'static str] {
        match self {
            SessionAction::Lock => &["hyprlock"],
            SessionAction::Logout => &["hyprctl", "dispatch", "exit"],
            SessionAction::Reboot => &["systemctl", "reboot"],
            SessionAction::PowerOff => &["systemctl", "poweroff"],
        }
    }

    /// Whether the command keeps running until the user comes back, so it
    /// must be started detached.
    pub fn is_blocking(self) -> bool {
        self == SessionAction::Lock
    }
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
