//! Installed applications, read from freedesktop `.desktop` files.

use crate::config::xdg_data_home;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// An application that can be added as a launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopApp {
    pub name: String,
    /// `Exec=` with field codes (`%u`, `%F`, …) cut off.
    pub exec: String,
    /// `Icon=` name or path, if any.
    pub icon: Option<String>,
}

/// `/usr/share/applications` followed by `$XDG_DATA_HOME/applications`.
pub fn default_application_dirs() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/usr/share/applications"),
        xdg_data_home().join("applications"),
    ]
}

/// Parse the `[Desktop Entry]` group of a `.desktop` file.
///
/// Returns `None` for hidden entries (`NoDisplay=true`, `Hidden=true`)
/// and entries lacking `Name` or `Exec`.  Localised keys such as
/// `Name[de]` are ignored.
pub fn parse_desktop_entry(text: &str) -> Option<DesktopApp> {
    let mut in_entry = false;
    let mut name = None;
    let mut exec = None;
    let mut icon = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') {
            in_entry = line == "[Desktop Entry]";
            continue;
        }
        if !in_entry {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Name" if name.is_none() => name = Some(value.to_string()),
            "Exec" if exec.is_none() => exec = Some(strip_field_codes(value)),
            "Icon" if icon.is_none() && !value.is_empty() => icon = Some(value.to_string()),
            "NoDisplay" | "Hidden" if value.eq_ignore_ascii_case("true") => return None,
            _ => {}
        }
    }

    let name = name.filter(|n| !n.is_empty())?;
    let exec = exec.filter(|e| !e.is_empty())?;
    Some(DesktopApp { name, exec, icon })
}

/// `firefox %u` → `firefox`.  Everything from the first `%` is dropped.
fn strip_field_codes(exec: &str) -> String {
    exec.split('%').next().unwrap_or_default().trim().to_string()
}

/// Read every `*.desktop` file in `dirs`.
///
/// A file in a later directory replaces one with the same file name in an
/// earlier directory, so user entries shadow system ones.  Missing
/// directories and unreadable files are skipped.  The result is sorted
/// by name, case-insensitively.
pub fn scan_applications(dirs: &[PathBuf]) -> Vec<DesktopApp> {
    let mut by_id: BTreeMap<String, Option<DesktopApp>> = BTreeMap::new();
    for dir in dirs {
        for (id, app) in read_dir_entries(dir) {
            by_id.insert(id, app);
        }
    }

    let mut apps: Vec<DesktopApp> = by_id.into_values().flatten().collect();
    apps.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
    debug!("found {} application(s)", apps.len());
    apps
}

fn read_dir_entries(dir: &Path) -> Vec<(String, Option<DesktopApp>)> {
    let Ok(read) = std::fs::read_dir(dir) else {
        debug!("skipping {}", dir.display());
        return Vec::new();
    };
    read.flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "desktop"))
        .filter_map(|path| {
            let id = path.file_name()?.to_string_lossy().into_owned();
            match std::fs::read(&path) {
                // A hidden user entry still shadows the system one.
                Ok(bytes) => Some((id, parse_desktop_entry(&String::from_utf8_lossy(&bytes)))),
                Err(e) => {
                    warn!("cannot read {}: {}", path.display(), e);
                    None
                }
            }
        })
        .collect()
}

/// Apps whose name contains `query`, ignoring case.  An empty query
/// matches everything.
pub fn filter_applications<'a>(apps: &'a [DesktopApp], query: &str) -> Vec<&'a DesktopApp> {
    let query = query.trim().to_lowercase();
    apps.iter()
        .filter(|app| query.is_empty() || app.name.to_lowercase().contains(&query))
        .collect()
}
