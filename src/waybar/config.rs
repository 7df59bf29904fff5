//! The Waybar config document and its launcher modules.
//!
//! A launcher is any top-level key named `image#<name>` (an icon file) or
//! `custom/<name>` (a text glyph):
//!
//! ```json
//! {
//!   "group/apps": { "modules": ["image#firefox", "custom/terminal"] },
//!   "image#firefox": { "path": "/usr/share/icons/firefox.png", "size": 22,
//!                      "on-click": "firefox", "tooltip": true },
//!   "custom/terminal": { "format": "", "on-click": "kitty", "tooltip": false }
//! }
//! ```
//!
//! Launchers are listed in `group/apps.modules` when that group exists,
//! otherwise in `modules-left`.  Key order of the document is preserved
//! on save; comments are not.

use super::desktop::DesktopApp;
use super::jsonc::{parse_jsonc, JsoncError};
use log::{debug, info};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

/// Group that collects the launcher modules.
pub const GROUP_KEY: &str = "group/apps";
/// List used when there is no launcher group.
pub const FALLBACK_LIST: &str = "modules-left";
/// Every top-level module list a launcher may be referenced from.
pub const MODULE_LISTS: [&str; 3] = ["modules-left", "modules-center", "modules-right"];
/// `size` written for new image launchers.
pub const DEFAULT_ICON_SIZE: u64 = 22;

const IMAGE_PREFIX: &str = "image#";
const CUSTOM_PREFIX: &str = "custom/";

/// Which Waybar module type backs a launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherKind {
    /// `image#…`: shows an icon file from `path`.
    Image,
    /// `custom/…`: shows the text in `format`.
    Custom,
}

impl LauncherKind {
    pub fn from_key(key: &str) -> Option<Self> {
        if key.starts_with(IMAGE_PREFIX) {
            Some(LauncherKind::Image)
        } else if key.starts_with(CUSTOM_PREFIX) {
            Some(LauncherKind::Custom)
        } else {
            None
        }
    }

    /// The field holding the icon.
    pub fn icon_field(self) -> &'static str {
        match self {
            LauncherKind::Image => "path",
            LauncherKind::Custom => "format",
        }
    }

    /// Caption for the icon entry in the editor.
    pub fn icon_caption(self) -> &'static str {
        match self {
            LauncherKind::Image => "ICON PATH",
            LauncherKind::Custom => "FORMAT",
        }
    }
}

/// One launcher module as shown in the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct LauncherModule {
    pub key: String,
    pub kind: LauncherKind,
    /// `path` for image launchers, `format` for custom ones.
    pub icon: String,
    /// `on-click` command.
    pub on_click: String,
    pub size: Option<u64>,
    pub tooltip: Option<bool>,
}

impl LauncherModule {
    fn from_entry(key: &str, value: &Value) -> Option<Self> {
        let kind = LauncherKind::from_key(key)?;
        let text = |field: &str| {
            value
                .get(field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Some(Self {
            key: key.to_string(),
            kind,
            icon: text(kind.icon_field()),
            on_click: text("on-click"),
            size: value.get("size").and_then(Value::as_u64),
            tooltip: value.get("tooltip").and_then(Value::as_bool),
        })
    }

    /// Human-readable name: `image#visual_studio_code` → `Visual Studio Code`.
    pub fn display_name(&self) -> String {
        let raw = self
            .key
            .split_once('#')
            .or_else(|| self.key.split_once('/'))
            .map(|(_, rest)| rest)
            .unwrap_or(&self.key);
        title_case(&raw.replace('_', " "))
    }
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn slug(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Key for an image launcher named `name`.
pub fn image_key(name: &str) -> String {
    format!("{}{}", IMAGE_PREFIX, slug(name))
}

/// Key for a custom launcher named `name`.
pub fn custom_key(name: &str) -> String {
    format!("{}{}", CUSTOM_PREFIX, slug(name))
}

/// Errors from loading, editing or saving the Waybar config.
#[derive(Debug, thiserror::Error)]
pub enum WaybarError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: JsoncError,
    },
    #[error("failed to serialise config: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("no launcher module named {0:?}")]
    UnknownLauncher(String),
}

/// An in-memory Waybar config.
#[derive(Debug, Clone, PartialEq)]
pub struct WaybarConfig {
    root: Map<String, Value>,
}

impl Default for WaybarConfig {
    /// The document used when no config file exists yet.
    fn default() -> Self {
        let mut root = Map::new();
        root.insert(FALLBACK_LIST.into(), json!([]));
        root.insert(GROUP_KEY.into(), json!({ "modules": [] }));
        Self { root }
    }
}

impl WaybarConfig {
    /// Parse a JSONC document.
    pub fn parse(text: &str) -> Result<Self, JsoncError> {
        Ok(Self {
            root: parse_jsonc(text)?,
        })
    }

    /// Load the config at `path`.  A missing file yields the default
    /// document.
    pub fn load(path: &Path) -> Result<Self, WaybarError> {
        if !path.exists() {
            info!("{} does not exist, starting from an empty config", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| WaybarError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text).map_err(|source| WaybarError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("loaded {} ({} top-level keys)", path.display(), config.root.len());
        Ok(config)
    }

    /// Pretty JSON with a 4-space indent and a trailing newline.
    pub fn to_pretty_string(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.root.serialize(&mut ser)?;
        buf.push(b'\n');
        // serde_json only emits UTF-8.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Write the config to `path`, creating its directory if needed.
    ///
    /// The file is written next to the target and renamed over it, so a
    /// failed write never leaves Waybar with a truncated config.  A symlinked
    /// `path` is followed and its target is replaced, the link stays.
    pub fn save(&self, path: &Path) -> Result<(), WaybarError> {
        let text = self.to_pretty_string()?;
        let write_err = |source| WaybarError::Write {
            path: path.to_path_buf(),
            source,
        };
        let target = resolve_link(path).map_err(write_err)?;
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let mut tmp = target.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, text).map_err(write_err)?;
        std::fs::rename(&tmp, &target).map_err(write_err)?;
        if target != path {
            info!("saved {} (via {})", target.display(), path.display());
        } else {
            info!("saved {}", path.display());
        }
        Ok(())
    }

    /// Raw access to a top-level value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Top-level keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    /// Every launcher module, in document order.
    pub fn launchers(&self) -> Vec<LauncherModule> {
        self.root
            .iter()
            .filter_map(|(k, v)| LauncherModule::from_entry(k, v))
            .collect()
    }

    pub fn launcher(&self, key: &str) -> Option<LauncherModule> {
        self.root
            .get(key)
            .and_then(|v| LauncherModule::from_entry(key, v))
    }

    /// Add an image launcher for `app` using the icon at `icon_path` and
    /// return its key.
    ///
    /// An existing launcher with the same key is replaced.
    pub fn add_launcher(&mut self, app: &DesktopApp, icon_path: &str) -> String {
        let key = image_key(&app.name);
        self.root.insert(
            key.clone(),
            json!({
                "path": icon_path,
                "size": DEFAULT_ICON_SIZE,
                "on-click": app.exec,
                "tooltip": true,
            }),
        );
        self.register_module(&key);
        info!("added launcher {}", key);
        key
    }

    /// Add a text launcher showing `glyph` and running `command`.
    pub fn add_custom_launcher(&mut self, name: &str, glyph: &str, command: &str) -> String {
        let key = custom_key(name);
        self.root.insert(
            key.clone(),
            json!({
                "format": glyph,
                "on-click": command,
                "tooltip": false,
            }),
        );
        self.register_module(&key);
        info!("added launcher {}", key);
        key
    }

    /// Set the icon (`path` or `format`) and `on-click` of an existing
    /// launcher.  Other fields are left untouched.
    pub fn update_launcher(&mut self, key: &str, icon: &str, on_click: &str) -> Result<(), WaybarError> {
        let kind = LauncherKind::from_key(key)
            .ok_or_else(|| WaybarError::UnknownLauncher(key.to_string()))?;
        let entry = self
            .root
            .get_mut(key)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| WaybarError::UnknownLauncher(key.to_string()))?;
        entry.insert(kind.icon_field().into(), Value::String(icon.to_string()));
        entry.insert("on-click".into(), Value::String(on_click.to_string()));
        Ok(())
    }

    /// Remove a launcher and every reference to it from the module lists.
    /// Unknown keys are ignored.
    pub fn remove_launcher(&mut self, key: &str) {
        if self.root.shift_remove(key).is_some() {
            info!("removed launcher {}", key);
        }
        let group_list = self
            .root
            .get_mut(GROUP_KEY)
            .and_then(|g| g.get_mut("modules"));
        if let Some(list) = group_list {
            remove_from_list(list, key);
        }
        for name in MODULE_LISTS {
            if let Some(list) = self.root.get_mut(name) {
                remove_from_list(list, key);
            }
        }
    }

    /// Module names listed in `group/apps`.
    pub fn group_modules(&self) -> Vec<String> {
        self.root
            .get(GROUP_KEY)
            .and_then(|g| g.get("modules"))
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Make sure `key` is listed once in the launcher group, or in
    /// `modules-left` when there is no group.
    fn register_module(&mut self, key: &str) {
        let has_group = self.root.get(GROUP_KEY).is_some_and(Value::is_object);
        let list = if has_group {
            self.root
                .get_mut(GROUP_KEY)
                .and_then(Value::as_object_mut)
                .map(|group| group.entry("modules").or_insert_with(|| Value::Array(Vec::new())))
        } else {
            Some(
                self.root
                    .entry(FALLBACK_LIST)
                    .or_insert_with(|| Value::Array(Vec::new())),
            )
        };
        if let Some(Value::Array(items)) = list {
            if !items.iter().any(|v| v.as_str() == Some(key)) {
                items.push(Value::String(key.to_string()));
            }
        }
    }
}

/// The file a save to `path` should replace.
///
/// Symlinks are followed, including dangling ones whose target does not
/// exist yet.  Anything else is returned unchanged.
fn resolve_link(path: &Path) -> std::io::Result<PathBuf> {
    let mut current = path.to_path_buf();
    // Bounded so a link loop cannot spin forever.
    for _ in 0..40 {
        match std::fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                let link = std::fs::read_link(&current)?;
                current = match current.parent() {
                    Some(dir) if link.is_relative() => dir.join(link),
                    _ => link,
                };
                debug!("following symlink to {}", current.display());
            }
            Ok(_) => return Ok(current),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(current),
            Err(e) => return Err(e),
        }
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("too many levels of symbolic links: {}", path.display()),
    ))
}

fn remove_from_list(list: &mut Value, key: &str) {
    if let Value::Array(items) = list {
        items.retain(|v| v.as_str() != Some(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        // Waybar config
        "layer": "top",
        "modules-left": ["group/apps", "clock"],
        "group/apps": { "orientation": "horizontal", "modules": ["image#firefox", "custom/terminal"] },
        "image#firefox": { "path": "/icons/firefox.png", "size": 22, "on-click": "firefox", "tooltip": true },
        "custom/terminal": { "format": "", "on-click": "kitty", "tooltip": false, },
        "clock": { "format": "{:%H:%M}" },
    }"#;

    fn app(name: &str, exec: &str) -> DesktopApp {
        DesktopApp {
            name: name.into(),
            exec: exec.into(),
            icon: None,
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("deskpanels-{}-{}", std::process::id(), name))
    }

    #[test]
    fn lists_launchers_in_document_order() {
        let cfg = WaybarConfig::parse(SAMPLE).unwrap();
        let launchers = cfg.launchers();
        assert_eq!(launchers.len(), 2);
        assert_eq!(launchers[0].key, "image#firefox");
        assert_eq!(launchers[0].kind, LauncherKind::Image);
        assert_eq!(launchers[0].icon, "/icons/firefox.png");
        assert_eq!(launchers[0].size, Some(22));
        assert_eq!(launchers[1].kind, LauncherKind::Custom);
        assert_eq!(launchers[1].icon, "");
        assert_eq!(launchers[1].on_click, "kitty");
        assert_eq!(launchers[1].tooltip, Some(false));
    }

    #[test]
    fn display_names() {
        let cfg = WaybarConfig::parse(
            r#"{ "image#visual_studio_code": {}, "custom/terminal": {} }"#,
        )
        .unwrap();
        let names: Vec<String> = cfg.launchers().iter().map(|l| l.display_name()).collect();
        assert_eq!(names, vec!["Visual Studio Code", "Terminal"]);
    }

    #[test]
    fn default_document_has_group() {
        let cfg = WaybarConfig::default();
        assert!(cfg.get(GROUP_KEY).is_some());
        assert!(cfg.get(FALLBACK_LIST).is_some());
        assert!(cfg.launchers().is_empty());
    }

    #[test]
    fn add_launcher_registers_in_group() {
        let mut cfg = WaybarConfig::parse(SAMPLE).unwrap();
        let key = cfg.add_launcher(&app("Visual Studio Code", "code"), "/icons/code.svg");
        assert_eq!(key, "image#visual_studio_code");
        let l = cfg.launcher(&key).unwrap();
        assert_eq!(l.icon, "/icons/code.svg");
        assert_eq!(l.on_click, "code");
        assert_eq!(l.size, Some(DEFAULT_ICON_SIZE));
        assert_eq!(l.tooltip, Some(true));
        assert_eq!(
            cfg.group_modules(),
            vec!["image#firefox", "custom/terminal", "image#visual_studio_code"]
        );
    }

    #[test]
    fn re_adding_does_not_duplicate_module_entry() {
        let mut cfg = WaybarConfig::parse(SAMPLE).unwrap();
        cfg.add_launcher(&app("Firefox", "firefox --new-window"), "/icons/ff2.png");
        assert_eq!(cfg.group_modules().iter().filter(|m| *m == "image#firefox").count(), 1);
        assert_eq!(cfg.launcher("image#firefox").unwrap().on_click, "firefox --new-window");
        assert_eq!(cfg.launchers().len(), 2);
    }

    #[test]
    fn add_without_group_falls_back_to_modules_left() {
        let mut cfg = WaybarConfig::parse(r#"{ "modules-left": ["clock"] }"#).unwrap();
        cfg.add_launcher(&app("Files", "nautilus"), "/icons/files.png");
        assert_eq!(cfg.get("modules-left").unwrap(), &json!(["clock", "image#files"]));
    }

    #[test]
    fn add_into_empty_document_creates_fallback_list() {
        let mut cfg = WaybarConfig::parse("{}").unwrap();
        cfg.add_custom_launcher("Menu", "󰍜", "wofi --show drun");
        assert_eq!(cfg.get("modules-left").unwrap(), &json!(["custom/menu"]));
        let l = cfg.launcher("custom/menu").unwrap();
        assert_eq!(l.icon, "󰍜");
        assert_eq!(l.tooltip, Some(false));
    }

    #[test]
    fn update_writes_kind_specific_field() {
        let mut cfg = WaybarConfig::parse(SAMPLE).unwrap();
        cfg.update_launcher("image#firefox", "/new.png", "firefox -P work").unwrap();
        cfg.update_launcher("custom/terminal", "T", "foot").unwrap();
        assert_eq!(cfg.get("image#firefox").unwrap()["path"], "/new.png");
        assert_eq!(cfg.get("image#firefox").unwrap()["size"], 22);
        assert_eq!(cfg.get("custom/terminal").unwrap()["format"], "T");
        assert!(cfg.get("custom/terminal").unwrap().get("path").is_none());
    }

    #[test]
    fn update_unknown_launcher_fails() {
        let mut cfg = WaybarConfig::parse(SAMPLE).unwrap();
        assert!(matches!(
            cfg.update_launcher("image#nope", "", ""),
            Err(WaybarError::UnknownLauncher(_))
        ));
        assert!(cfg.update_launcher("clock", "", "").is_err());
    }

    #[test]
    fn remove_cleans_every_list() {
        let mut cfg = WaybarConfig::parse(
            r#"{
                "modules-left": ["image#a", "clock"],
                "modules-right": ["image#a"],
                "group/apps": { "modules": ["image#a", "image#b"] },
                "image#a": {}, "image#b": {}
            }"#,
        )
        .unwrap();
        cfg.remove_launcher("image#a");
        assert!(cfg.get("image#a").is_none());
        assert_eq!(cfg.get("modules-left").unwrap(), &json!(["clock"]));
        assert_eq!(cfg.get("modules-right").unwrap(), &json!([]));
        assert_eq!(cfg.group_modules(), vec!["image#b"]);
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut cfg = WaybarConfig::parse(SAMPLE).unwrap();
        let before = cfg.clone();
        cfg.remove_launcher("image#ghost");
        assert_eq!(cfg, before);
    }

    #[test]
    fn pretty_output_uses_four_spaces_and_keeps_order() {
        let cfg = WaybarConfig::parse(r#"{ "zeta": { "b": 1 }, "alpha": 2 }"#).unwrap();
        let text = cfg.to_pretty_string().unwrap();
        assert!(text.starts_with("{\n    \"zeta\": {\n        \"b\": 1\n    },"));
        assert!(text.find("zeta").unwrap() < text.find("alpha").unwrap());
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn save_then_load_preserves_launchers() {
        let path = temp_path("waybar/config");
        let mut cfg = WaybarConfig::parse(SAMPLE).unwrap();
        cfg.add_launcher(&app("Files", "nautilus"), "/icons/files.png");
        cfg.save(&path).unwrap();

        let loaded = WaybarConfig::load(&path).unwrap();
        assert_eq!(loaded, cfg);
        let keys: Vec<&str> = loaded.keys().collect();
        assert_eq!(keys[0], "layer");

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn save_through_symlink_updates_target_and_keeps_link() {
        let base = temp_path("linked");
        let dotfiles = base.join("dotfiles");
        std::fs::create_dir_all(&dotfiles).unwrap();
        let real = dotfiles.join("config");
        std::fs::write(&real, SAMPLE).unwrap();
        let link = base.join("config");
        std::os::unix::fs::symlink("dotfiles/config", &link).unwrap();

        let mut cfg = WaybarConfig::load(&link).unwrap();
        let key = cfg.add_custom_launcher("menu", "M", "wofi --show drun");
        cfg.save(&link).unwrap();

        let meta = std::fs::symlink_metadata(&link).unwrap();
        assert!(meta.file_type().is_symlink());
        let saved = WaybarConfig::load(&real).unwrap();
        assert!(saved.launcher(&key).is_some());
        assert!(!dotfiles.join("config.tmp").exists());

        let _ = std::fs::remove_dir_all(&base);
    }

    #[cfg(unix)]
    #[test]
    fn save_through_dangling_symlink_creates_target() {
        let base = temp_path("dangling");
        std::fs::create_dir_all(&base).unwrap();
        let link = base.join("config");
        std::os::unix::fs::symlink(base.join("real/config"), &link).unwrap();

        WaybarConfig::default().save(&link).unwrap();

        assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(
            WaybarConfig::load(&base.join("real/config")).unwrap(),
            WaybarConfig::default()
        );

        let _ = std::fs::remove_dir_all(&base);
    }

    #[test]
    fn load_missing_file_gives_default() {
        let cfg = WaybarConfig::load(&temp_path("missing-config")).unwrap();
        assert_eq!(cfg, WaybarConfig::default());
    }

    #[test]
    fn load_broken_file_is_error() {
        let path = temp_path("broken-config");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            WaybarConfig::load(&path),
            Err(WaybarError::Parse { .. })
        ));
        let _ = std::fs::remove_file(&path);
    }
}
