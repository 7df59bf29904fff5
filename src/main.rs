//! Entry point for **deskpanels**.
//!
//! ```text
//! deskpanels <waybar|bluetooth|wifi|wallpaper|power> [--list]
//! ```
//!
//! Each sub-command opens one panel window.  With `--list`, or when built
//! without the `ui-gtk` feature, the panel's data is printed to stdout
//! instead.

use deskpanels::cli::bluetoothctl::BluetoothCtl;
use deskpanels::cli::nmcli::Nmcli;
use deskpanels::cli::session::SessionCtl;
use deskpanels::cli::swww::Swww;
use deskpanels::cli::SystemRunner;
use deskpanels::command::SessionAction;
use deskpanels::config::{xdg_config_home, Config};
use deskpanels::traits::{BluetoothManager, WallpaperDaemon, WifiManager};
use deskpanels::wallpaper::{current_wallpaper, list_images, resolve_directory};
use deskpanels::waybar::WaybarConfig;
use log::{error, info};
use std::fmt::Display;
use std::path::PathBuf;

const USAGE: &str = "usage: deskpanels <waybar|bluetooth|wifi|wallpaper|power> [--list]";

/// Resolve the config directory (`$XDG_CONFIG_HOME/deskpanels`).
fn config_dir() -> PathBuf {
    xdg_config_home().join("deskpanels")
}

/// Try to load the config from `$XDG_CONFIG_HOME/deskpanels/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

/// Resolve the CSS stylesheet path.
#[cfg(feature = "ui-gtk")]
fn css_path() -> PathBuf {
    config_dir().join("style.css")
}

fn fatal(e: impl Display) -> ! {
    error!("{}", e);
    eprintln!("deskpanels: {}", e);
    std::process::exit(1);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Panel {
    Waybar,
    Bluetooth,
    Wifi,
    Wallpaper,
    Power,
}

impl Panel {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "waybar" => Some(Panel::Waybar),
            "bluetooth" => Some(Panel::Bluetooth),
            "wifi" => Some(Panel::Wifi),
            "wallpaper" => Some(Panel::Wallpaper),
            "power" => Some(Panel::Power),
            _ => None,
        }
    }
}

//  Main

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{}", USAGE);
        return;
    }
    let list_only = args.iter().any(|a| a == "--list");
    let panel = match args.iter().find(|a| !a.starts_with('-')) {
        Some(name) => match Panel::parse(name) {
            Some(panel) => panel,
            None => {
                eprintln!("unknown panel '{}'\n{}", name, USAGE);
                std::process::exit(2);
            }
        },
        None => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    let config = load_config();

    if list_only || cfg!(not(feature = "ui-gtk")) {
        print_panel(panel, &config);
        return;
    }

    #[cfg(feature = "ui-gtk")]
    open_panel(panel, config);
}

//  --list

fn print_panel(panel: Panel, config: &Config) {
    let runner = SystemRunner::new();
    match panel {
        Panel::Waybar => {
            let path = config.waybar.config_path();
            let waybar = WaybarConfig::load(&path).unwrap_or_else(|e| fatal(e));
            for launcher in waybar.launchers() {
                println!("{}\t{}\t{}", launcher.key, launcher.icon, launcher.on_click);
            }
        }
        Panel::Bluetooth => {
            let ctl = BluetoothCtl::new(runner);
            let powered = ctl.powered().unwrap_or_else(|e| fatal(e));
            println!("powered\t{}", if powered { "yes" } else { "no" });
            for device in ctl.devices().unwrap_or_else(|e| fatal(e)) {
                let state = match (device.connected, device.paired) {
                    (true, _) => "connected",
                    (false, true) => "paired",
                    (false, false) => "available",
                };
                println!("{}\t{}\t{}", device.mac, device.display_name(), state);
            }
        }
        Panel::Wifi => {
            let nm = Nmcli::new(runner);
            for net in nm.networks().unwrap_or_else(|e| fatal(e)) {
                println!(
                    "{}{}\t{}%\t{}",
                    if net.active { "* " } else { "  " },
                    net.ssid,
                    net.signal,
                    if net.is_open() { "open" } else { net.security.as_str() }
                );
            }
        }
        Panel::Wallpaper => {
            let (images, current) = wallpapers(config, &Swww::new(runner), false);
            for image in images {
                let marker = if current.as_ref() == Some(&image) { "*" } else { " " };
                println!("{} {}", marker, image.display());
            }
        }
        Panel::Power => {
            let session = SessionCtl::new(runner, config.power.clone());
            for action in SessionAction::ALL {
                println!("{}\t{}", action, session.describe(action));
            }
        }
    }
}

/// Images from the configured directory and the one currently shown.
/// `start_daemon` starts `swww-daemon` when it is not running.
fn wallpapers<D: WallpaperDaemon>(
    config: &Config,
    daemon: &D,
    start_daemon: bool,
) -> (Vec<PathBuf>, Option<PathBuf>) {
    let dir = resolve_directory(
        &config.wallpaper.directory(),
        &config.wallpaper.fallback_directory(),
    );
    let images = list_images(&dir)
        .unwrap_or_else(|e| fatal(format!("cannot read {}: {}", dir.display(), e)));
    (images, current_wallpaper(daemon, start_daemon))
}

//  Windows

#[cfg(feature = "ui-gtk")]
fn open_panel(panel: Panel, config: Config) {
    use deskpanels::cli::waybar::WaybarProcess;
    use deskpanels::ui;

    let runner = SystemRunner::new();
    ui::init(Some(&css_path()));

    match panel {
        Panel::Waybar => ui::waybar_editor::run(
            config.waybar.config_path(),
            config.waybar.restart,
            WaybarProcess::new(runner),
        ),
        Panel::Bluetooth => ui::bluetooth::run(BluetoothCtl::new(runner), config.bluetooth),
        Panel::Wifi => ui::wifi::run(Nmcli::new(runner), config.wifi),
        Panel::Wallpaper => {
            let daemon = Swww::new(runner);
            let (images, current) = wallpapers(&config, &daemon, true);
            ui::carousel::run(daemon, config.wallpaper, images, current);
        }
        Panel::Power => ui::power::run(SessionCtl::new(runner, config.power)),
    }
}
