//! Application configuration.
//!
//! The configuration is loaded from `$XDG_CONFIG_HOME/deskpanels/config.json`.
//! Each panel reads its own top-level section so the file can be extended
//! later without breaking older files.
//!
//! # Example
//!
//! ```json
//! {
//!   "waybar": { "config_path": "~/.config/waybar/config" },
//!   "bluetooth": { "refresh_interval_ms": 20000, "scan_ms": 1500 },
//!   "wifi": { "refresh_interval_ms": 15000 },
//!   "wallpaper": { "directory": "~/Pictures/wallpapers", "transition_type": "grow" },
//!   "power": { "lock": ["swaylock", "-f"] }
//! }
//! ```
//!
//! Paths may start with `~/`, which is expanded against `$HOME`.

use crate::command::{SessionAction, Transition, TransitionType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
///
/// Every field is optional; a minimal `{}` file is valid and all sections
/// fall back to their compiled-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub waybar: WaybarPanelConfig,

    #[serde(default)]
    pub bluetooth: BluetoothPanelConfig,

    #[serde(default)]
    pub wifi: WifiPanelConfig,

    #[serde(default)]
    pub wallpaper: WallpaperPanelConfig,

    #[serde(default)]
    pub power: PowerPanelConfig,
}

/// Settings for the Waybar launcher editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaybarPanelConfig {
    /// The Waybar config file being edited.
    pub config_path: String,
    /// Restart Waybar after saving.
    pub restart: bool,
}

impl Default for WaybarPanelConfig {
    fn default() -> Self {
        Self {
            config_path: "~/.config/waybar/config".into(),
            restart: true,
        }
    }
}

impl WaybarPanelConfig {
    pub fn config_path(&self) -> PathBuf {
        expand_home(&self.config_path)
    }
}

/// Bluetooth panel timing.  All durations are in **milliseconds**.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BluetoothPanelConfig {
    /// Period of the automatic device refresh.  `0` disables it.
    pub refresh_interval_ms: u64,
    /// How long each refresh scans for nearby devices.
    pub scan_ms: u64,
    /// Delay between a connect/pair/… and the follow-up refresh, so
    /// BlueZ has time to settle.
    pub settle_ms: u64,
}

impl Default for BluetoothPanelConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 20_000,
            scan_ms: 1_500,
            settle_ms: 4_000,
        }
    }
}

impl BluetoothPanelConfig {
    pub fn refresh_interval(&self) -> Option<Duration> {
        non_zero(self.refresh_interval_ms)
    }

    pub fn scan(&self) -> Duration {
        Duration::from_millis(self.scan_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Wi-Fi panel timing.  All durations are in **milliseconds**.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiPanelConfig {
    /// Period of the automatic network refresh.  `0` disables it.
    pub refresh_interval_ms: u64,
    /// Delay between a connect attempt and the follow-up refresh.
    pub settle_ms: u64,
}

impl Default for WifiPanelConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 15_000,
            settle_ms: 5_000,
        }
    }
}

impl WifiPanelConfig {
    pub fn refresh_interval(&self) -> Option<Duration> {
        non_zero(self.refresh_interval_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Wallpaper carousel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WallpaperPanelConfig {
    /// Directory scanned for images.
    pub directory: String,
    /// Used when `directory` does not exist.
    pub fallback_directory: String,
    /// `swww img --transition-type`.
    pub transition_type: TransitionType,
    /// `swww img --transition-duration`, in seconds.
    pub transition_duration: f32,
    /// `swww img --transition-fps`.
    pub transition_fps: u32,
    /// Duration of one carousel slide (ms).
    pub slide_ms: u64,
    /// Horizontal distance the slots travel per slide (px).
    pub slide_offset: f64,
    /// Thumbnails kept loaded on each side of the selection.
    pub preload_range: usize,
}

impl Default for WallpaperPanelConfig {
    fn default() -> Self {
        Self {
            directory: "~/Pictures/wallpapers".into(),
            fallback_directory: "~/Pictures".into(),
            transition_type: TransitionType::Outer,
            transition_duration: 0.8,
            transition_fps: 60,
            slide_ms: 300,
            slide_offset: 500.0,
            preload_range: 3,
        }
    }
}

impl WallpaperPanelConfig {
    pub fn directory(&self) -> PathBuf {
        expand_home(&self.directory)
    }

    pub fn fallback_directory(&self) -> PathBuf {
        expand_home(&self.fallback_directory)
    }

    pub fn transition(&self) -> Transition {
        Transition {
            kind: self.transition_type,
            duration: self.transition_duration,
            fps: self.transition_fps,
        }
    }

    pub fn slide_duration(&self) -> Duration {
        Duration::from_millis(self.slide_ms)
    }
}

/// Power menu commands, one argument vector per entry.  An empty vector
/// keeps the built-in command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerPanelConfig {
    pub lock: Vec<String>,
    pub logout: Vec<String>,
    pub reboot: Vec<String>,
    pub poweroff: Vec<String>,
}

impl PowerPanelConfig {
    /// Program and arguments run for `action`.
    pub fn command(&self, action: SessionAction) -> Vec<&str> {
        let configured = match action {
            SessionAction::Lock => &self.lock,
            SessionAction::Logout => &self.logout,
            SessionAction::Reboot => &self.reboot,
            SessionAction::PowerOff => &self.poweroff,
        };
        if configured.iter().any(|arg| !arg.trim().is_empty()) {
            configured.iter().map(String::as_str).collect()
        } else {
            action.default_command().to_vec()
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

fn non_zero(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// The user's home directory, falling back to `/tmp`.
pub fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".into()))
}

/// `$XDG_CONFIG_HOME`, falling back to `~/.config`.
pub fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// `$XDG_DATA_HOME`, falling back to `~/.local/share`.
pub fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Expand a leading `~/` (or a bare `~`) against `$HOME`.
pub fn expand_home(path: &str) -> PathBuf {
    expand_home_with(path, &home_dir())
}

fn expand_home_with(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        home.to_path_buf()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full_config() {
        let json = r#"{
            "waybar": { "config_path": "/etc/xdg/waybar/config", "restart": false },
            "bluetooth": { "refresh_interval_ms": 10000, "scan_ms": 3000, "settle_ms": 2000 },
            "wifi": { "refresh_interval_ms": 0, "settle_ms": 7000 },
            "wallpaper": {
                "directory": "/srv/walls",
                "transition_type": "Grow",
                "transition_duration": 1.5,
                "transition_fps": 144,
                "slide_ms": 200,
                "preload_range": 5
            }
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.waybar.config_path(), PathBuf::from("/etc/xdg/waybar/config"));
        assert!(!cfg.waybar.restart);
        assert_eq!(cfg.bluetooth.scan(), Duration::from_secs(3));
        assert_eq!(cfg.bluetooth.refresh_interval(), Some(Duration::from_secs(10)));
        assert_eq!(cfg.wifi.refresh_interval(), None);
        assert_eq!(cfg.wifi.settle(), Duration::from_secs(7));
        let t = cfg.wallpaper.transition();
        assert_eq!(t.kind, TransitionType::Grow);
        assert_eq!(t.duration, 1.5);
        assert_eq!(t.fps, 144);
        assert_eq!(cfg.wallpaper.slide_duration(), Duration::from_millis(200));
        assert_eq!(cfg.wallpaper.preload_range, 5);
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        let bd = BluetoothPanelConfig::default();
        assert_eq!(cfg.bluetooth.refresh_interval_ms, bd.refresh_interval_ms);
        assert_eq!(cfg.bluetooth.scan_ms, bd.scan_ms);
        assert_eq!(cfg.bluetooth.settle_ms, bd.settle_ms);
        let wd = WifiPanelConfig::default();
        assert_eq!(cfg.wifi.refresh_interval_ms, wd.refresh_interval_ms);
        let pd = WallpaperPanelConfig::default();
        assert_eq!(cfg.wallpaper.transition_type, pd.transition_type);
        assert_eq!(cfg.wallpaper.slide_offset, pd.slide_offset);
        assert!(cfg.waybar.restart);
    }

    #[test]
    fn deserialize_partial_section() {
        let json = r#"{ "bluetooth": { "scan_ms": 500 } }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.bluetooth.scan_ms, 500);
        assert_eq!(
            cfg.bluetooth.settle_ms,
            BluetoothPanelConfig::default().settle_ms
        );
    }

    #[test]
    fn invalid_transition_type_is_rejected() {
        let json = r#"{ "wallpaper": { "transition_type": "sideways" } }"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }

    #[test]
    fn unknown_top_level_keys_ignored() {
        let json = r#"{ "wifi": {}, "future_section": { "key": 42 } }"#;
        let _cfg: Config = serde_json::from_str(json).unwrap();
    }

    #[test]
    fn power_commands_fall_back_to_builtins() {
        let json = r#"{ "power": { "lock": ["swaylock", "-f"], "reboot": [] } }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.power.command(SessionAction::Lock), vec!["swaylock", "-f"]);
        assert_eq!(cfg.power.command(SessionAction::Reboot), vec!["systemctl", "reboot"]);
        assert_eq!(
            Config::default().power.command(SessionAction::Logout),
            vec!["hyprctl", "dispatch", "exit"]
        );
    }

    #[test]
    fn tilde_expansion() {
        let home = Path::new("/home/alice");
        assert_eq!(
            expand_home_with("~/Pictures/wallpapers", home),
            PathBuf::from("/home/alice/Pictures/wallpapers")
        );
        assert_eq!(expand_home_with("~", home), PathBuf::from("/home/alice"));
        assert_eq!(expand_home_with("/abs/path", home), PathBuf::from("/abs/path"));
        assert_eq!(expand_home_with("~bob/x", home), PathBuf::from("~bob/x"));
    }

    #[test]
    fn load_missing_file_is_error() {
        let path = std::env::temp_dir().join("deskpanels-no-such-config.json");
        assert!(Config::load(&path).is_err());
    }
}
