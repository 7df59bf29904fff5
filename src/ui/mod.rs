//! GTK4 windows for the four panels.  Everything here runs on the **main
//! thread**.
//!
//! Blocking backend calls go through [`Job`], which runs them on a worker
//! thread and hands the result back to a GLib timeout on the main loop.
//!
//! # CSS selectors
//!
//! | Selector               | Targets                                        |
//! |------------------------|------------------------------------------------|
//! | `.panel`               | Outer box of every panel window                |
//! | `.panel-header`        | Icon, title and header buttons                 |
//! | `.panel-title`         | Title label                                    |
//! | `.panel-icon`          | Header icon / spinner label                    |
//! | `.card`                | Launcher card, device row, network row         |
//! | `.accent`              | Primary buttons                                |
//! | `.danger`              | Remove / forget buttons                        |
//! | `.muted`               | Subtitles and empty-list placeholders          |
//! | `.signal-strong` etc.  | Wi-Fi row label, by signal strength            |
//! | `.carousel-slot`       | Each wallpaper thumbnail                       |
//! | `.carousel-slot.center`| The selected thumbnail                         |
//! | `.wallpaper-name`      | File name under the carousel                   |
//! | `.power-menu`          | Full-screen backdrop of the power menu         |
//! | `.power-button`        | Lock / Logout / Reboot / Power buttons         |
//! | `.power-glyph`         | Icon inside a power button                     |

pub mod bluetooth;
pub mod carousel;
pub mod power;
pub mod waybar_editor;
pub mod wifi;

use gtk4::prelude::*;
use gtk4::{gdk, gio, glib};
use gtk4_layer_shell::{Edge, KeyboardMode, Layer, LayerShell};
use log::{info, warn};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

/// How often a pending [`Job`] is polled.
pub const JOB_POLL: Duration = Duration::from_millis(50);
/// Spinner frame interval.
pub const SPINNER_FRAME: Duration = Duration::from_millis(100);
const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

//  Default CSS

const DEFAULT_CSS: &str = r#"
window.panel-window,
window.panel-window.background {
    background-color: transparent;
}

.panel {
    background-color: #1e1e2e;
    color: #cdd6f4;
    border-radius: 14px;
    border: 1px solid #313244;
    padding: 14px;
}

.panel-header {
    margin-bottom: 10px;
}

.panel-title {
    font-weight: bold;
    font-size: 15px;
}

.panel-icon {
    font-family: monospace;
    font-size: 16px;
    color: #89b4fa;
    min-width: 20px;
}

.muted {
    color: #7f849c;
}

.card {
    background-color: #313244;
    border-radius: 10px;
    padding: 10px;
    margin-bottom: 8px;
}

.card entry {
    margin-top: 4px;
}

.field-caption {
    font-size: 10px;
    color: #7f849c;
    margin-top: 6px;
}

button.accent {
    background: #89b4fa;
    color: #11111b;
}

button.danger {
    color: #f38ba8;
}

.signal-strong { color: #a6e3a1; }
.signal-fair   { color: #f9e2af; }
.signal-weak   { color: #f38ba8; }

.carousel {
    background-color: transparent;
}

.carousel-slot {
    border-radius: 18px;
    border: 2px solid #444444;
    background-color: #11111b;
}

.carousel-slot.center {
    border-color: #ffffff;
}

.power-menu {
    background-color: rgba(11, 18, 32, 0.9);
}

button.power-button {
    background-color: #121a2f;
    color: #e5e7eb;
    font-size: 20px;
    font-family: "JetBrainsMono Nerd Font", monospace;
    border: 2px solid #38bdf8;
    border-radius: 15px;
}

button.power-button:hover {
    background-color: #38bdf8;
    color: #0b1220;
}

.power-glyph {
    font-size: 40px;
}

.wallpaper-name {
    color: rgba(255, 255, 255, 0.8);
    font-family: "JetBrains Mono", monospace;
    font-size: 16px;
}
"#;

/// Initialise GTK and install the stylesheet.
pub fn init(css_path: Option<&Path>) {
    gtk4::init().expect("failed to initialise GTK4");
    info!("GTK4 initialised on main thread");
    load_css(css_path);
}

fn load_css(css_path: Option<&Path>) {
    let provider = gtk4::CssProvider::new();

    let css_content = match css_path.filter(|p| p.exists()) {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(content) => {
                info!("user CSS: {} ({} bytes)", p.display(), content.len());
                content
            }
            Err(e) => {
                warn!("CSS read failed ({}): {}, using built-in", p.display(), e);
                DEFAULT_CSS.to_string()
            }
        },
        None => {
            info!("no user CSS, using built-in default");
            DEFAULT_CSS.to_string()
        }
    };

    #[allow(deprecated)]
    provider.load_from_data(&css_content);

    if let Some(display) = gdk::Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    } else {
        warn!("no GDK display, CSS will not be applied");
    }
}

//  Main loop

/// Show `window` and run the GLib main loop until it is closed.
pub fn run_until_closed(window: &gtk4::Window) {
    let main_loop = glib::MainLoop::new(None, false);
    window.connect_close_request({
        let main_loop = main_loop.clone();
        move |_| {
            main_loop.quit();
            glib::Propagation::Proceed
        }
    });
    window.present();

    info!("entering GLib main loop");
    main_loop.run();
    info!("GLib main loop exited");
}

//  Worker jobs

/// A closure running on a worker thread whose result is picked up on the
/// main loop.
pub struct Job<T> {
    rx: mpsc::Receiver<T>,
}

impl<T: Send + 'static> Job<T> {
    pub fn spawn<F>(work: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            // The receiver is gone if the window closed first.
            let _ = tx.send(work());
        });
        Self { rx }
    }

    /// Call `done` on the main thread once the result arrives.
    pub fn then<D>(self, done: D)
    where
        D: FnOnce(T) + 'static,
    {
        let mut done = Some(done);
        glib::timeout_add_local(JOB_POLL, move || match self.rx.try_recv() {
            Ok(value) => {
                if let Some(done) = done.take() {
                    done(value);
                }
                glib::ControlFlow::Break
            }
            Err(mpsc::TryRecvError::Empty) => glib::ControlFlow::Continue,
            Err(mpsc::TryRecvError::Disconnected) => {
                warn!("worker thread exited without a result");
                glib::ControlFlow::Break
            }
        });
    }
}

//  Spinner

/// Text spinner shown in a header while a job runs.
#[derive(Clone)]
pub struct Spinner {
    label: gtk4::Label,
    idle_text: Rc<str>,
    source: Rc<RefCell<Option<glib::SourceId>>>,
}

impl Spinner {
    pub fn new(label: &gtk4::Label) -> Self {
        Self {
            label: label.clone(),
            idle_text: label.text().as_str().into(),
            source: Rc::new(RefCell::new(None)),
        }
    }

    pub fn is_spinning(&self) -> bool {
        self.source.borrow().is_some()
    }

    pub fn start(&self) {
        if self.is_spinning() {
            return;
        }
        let label = self.label.clone();
        let mut frame = 0;
        label.set_text(SPINNER_FRAMES[0]);
        let id = glib::timeout_add_local(SPINNER_FRAME, move || {
            frame = (frame + 1) % SPINNER_FRAMES.len();
            label.set_text(SPINNER_FRAMES[frame]);
            glib::ControlFlow::Continue
        });
        *self.source.borrow_mut() = Some(id);
    }

    pub fn stop(&self) {
        if let Some(id) = self.source.borrow_mut().take() {
            id.remove();
        }
        self.label.set_text(&self.idle_text);
    }
}

//  Dialogs

/// Modal message with a single OK button.
pub fn show_message(parent: &impl IsA<gtk4::Window>, heading: &str, detail: &str) {
    let dialog = gtk4::AlertDialog::builder()
        .message(heading)
        .detail(detail)
        .modal(true)
        .build();
    dialog.set_buttons(&["OK"]);
    dialog.show(Some(parent));
}

/// Like [`show_message`], then close `parent` once dismissed.
pub fn show_fatal(parent: &gtk4::Window, heading: &str, detail: &str) {
    let dialog = gtk4::AlertDialog::builder()
        .message(heading)
        .detail(detail)
        .modal(true)
        .build();
    dialog.set_buttons(&["Quit"]);
    let window = parent.clone();
    dialog.choose(Some(parent), gio::Cancellable::NONE, move |_| {
        window.close();
    });
}

//  Window helpers

/// Where a layer-shell panel sits on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    TopRight,
    Center,
    /// Covers the whole output, bars included.
    Fullscreen,
}

/// A borderless layer-shell overlay that takes keyboard focus on demand.
pub fn layer_window(namespace: &str, placement: Placement) -> gtk4::Window {
    let window = gtk4::Window::new();
    window.set_title(Some(namespace));
    window.init_layer_shell();
    window.set_layer(Layer::Overlay);
    window.set_namespace(namespace);
    window.set_exclusive_zone(0);
    window.set_decorated(false);
    window.add_css_class("panel-window");

    match placement {
        Placement::TopRight => {
            window.set_anchor(Edge::Top, true);
            window.set_anchor(Edge::Right, true);
            window.set_margin(Edge::Top, 10);
            window.set_margin(Edge::Right, 10);
            window.set_keyboard_mode(KeyboardMode::OnDemand);
        }
        Placement::Center => {
            window.set_keyboard_mode(KeyboardMode::Exclusive);
        }
        Placement::Fullscreen => {
            for edge in [Edge::Top, Edge::Bottom, Edge::Left, Edge::Right] {
                window.set_anchor(edge, true);
            }
            window.set_exclusive_zone(-1);
            window.set_keyboard_mode(KeyboardMode::Exclusive);
        }
    }
    window
}

/// Close `window` when Escape is pressed.
pub fn close_on_escape(window: &gtk4::Window) {
    let keys = gtk4::EventControllerKey::new();
    let win = window.clone();
    keys.connect_key_pressed(move |_, key, _, _| {
        if key == gdk::Key::Escape {
            win.close();
            glib::Propagation::Stop
        } else {
            glib::Propagation::Proceed
        }
    });
    window.add_controller(keys);
}

/// Header row: icon label, bold title, then `buttons` packed at the end.
pub struct PanelHeader {
    pub container: gtk4::Box,
    pub icon: gtk4::Label,
    pub title: gtk4::Label,
}

impl PanelHeader {
    pub fn new(icon: &str, title: &str) -> Self {
        let container = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
        container.add_css_class("panel-header");

        let icon = gtk4::Label::new(Some(icon));
        icon.add_css_class("panel-icon");
        container.append(&icon);

        let title = gtk4::Label::new(Some(title));
        title.add_css_class("panel-title");
        title.set_hexpand(true);
        title.set_xalign(0.0);
        container.append(&title);

        Self {
            container,
            icon,
            title,
        }
    }

    pub fn add_button(&self, label: &str, tooltip: &str) -> gtk4::Button {
        let button = gtk4::Button::with_label(label);
        button.set_tooltip_text(Some(tooltip));
        button.add_css_class("flat");
        self.container.append(&button);
        button
    }
}

/// Grey centred text used for empty lists.
pub fn placeholder(text: &str) -> gtk4::Label {
    let label = gtk4::Label::new(Some(text));
    label.add_css_class("muted");
    label.set_margin_top(20);
    label.set_margin_bottom(20);
    label
}

/// Remove every child of `container`.
pub fn clear_box(container: &gtk4::Box) {
    while let Some(child) = container.first_child() {
        container.remove(&child);
    }
}
