//! Bluetooth device panel.
//!
//! ```text
//! window                       (layer-shell, top right)
//! └ .panel
//!     ├ .panel-header          [BT] Bluetooth  (power) ⟳ ✕
//!     └ ScrolledWindow
//!         └ .card per device   name / status   [Connect] [⋮]
//! ```

use super::{
    clear_box, close_on_escape, layer_window, placeholder, run_until_closed, Job, PanelHeader,
    Placement, Spinner,
};
use crate::command::{BluetoothAction, BluetoothDevice};
use crate::config::BluetoothPanelConfig;
use crate::gate::JobGate;
use crate::traits::BluetoothManager;
use gtk4::glib;
use gtk4::prelude::*;
use log::{debug, info, warn};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

const ICON: &str = "BT";
const PANEL_WIDTH: i32 = 360;
const LIST_HEIGHT: i32 = 380;

/// A user request that must not be lost to a running refresh.
#[derive(Debug, Clone)]
enum Request {
    Power(bool),
    Perform(BluetoothAction, String),
}

/// What one refresh learned from the controller.
struct Snapshot {
    powered: bool,
    devices: Vec<BluetoothDevice>,
}

struct BluetoothPanel<B> {
    manager: B,
    config: BluetoothPanelConfig,
    header: PanelHeader,
    spinner: Spinner,
    power: gtk4::Switch,
    list: gtk4::Box,
    gate: RefCell<JobGate<Request>>,
    /// Set while the switch is updated from a refresh, so the change is
    /// not sent back to the controller.
    syncing_power: Cell<bool>,
}

/// Open the Bluetooth panel and block until it is closed.
pub fn run<B>(manager: B, config: BluetoothPanelConfig)
where
    B: BluetoothManager + Clone + Send + 'static,
{
    let window = layer_window("deskpanels-bluetooth", Placement::TopRight);
    let panel = BluetoothPanel::new(manager, config, &window);

    panel.refresh(true, true);
    if let Some(every) = panel.config.refresh_interval() {
        let weak = Rc::downgrade(&panel);
        glib::timeout_add_local(every, move || match weak.upgrade() {
            Some(panel) => {
                panel.refresh(false, true);
                glib::ControlFlow::Continue
            }
            None => glib::ControlFlow::Break,
        });
    }

    run_until_closed(&window);
}

impl<B> BluetoothPanel<B>
where
    B: BluetoothManager + Clone + Send + 'static,
{
    fn new(manager: B, config: BluetoothPanelConfig, window: &gtk4::Window) -> Rc<Self> {
        let root = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
        root.add_css_class("panel");
        root.set_size_request(PANEL_WIDTH, -1);

        let header = PanelHeader::new(ICON, "Bluetooth");
        let spinner = Spinner::new(&header.icon);
        let power = gtk4::Switch::new();
        power.set_valign(gtk4::Align::Center);
        power.set_tooltip_text(Some("Power"));
        header.container.append(&power);
        let reload = header.add_button("⟳", "Refresh");
        let close = header.add_button("✕", "Close");
        root.append(&header.container);

        let list = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
        let scroll = gtk4::ScrolledWindow::new();
        scroll.set_hscrollbar_policy(gtk4::PolicyType::Never);
        scroll.set_min_content_height(LIST_HEIGHT);
        scroll.set_child(Some(&list));
        root.append(&scroll);

        window.set_child(Some(&root));
        close_on_escape(window);

        let panel = Rc::new(Self {
            manager,
            config,
            header,
            spinner,
            power,
            list,
            gate: RefCell::new(JobGate::new()),
            syncing_power: Cell::new(false),
        });

        {
            let panel = Rc::clone(&panel);
            reload.connect_clicked(move |_| panel.refresh(false, true));
        }
        {
            let window = window.clone();
            close.connect_clicked(move |_| window.close());
        }
        {
            let weak = Rc::downgrade(&panel);
            panel.power.connect_active_notify(move |switch| {
                if let Some(panel) = weak.upgrade() {
                    if !panel.syncing_power.get() {
                        panel.set_power(switch.is_active());
                    }
                }
            });
        }
        panel
    }

    /// Reload the device list on a worker thread.
    ///
    /// `prepare` unblocks and powers the adapter first; `scan` runs a short
    /// discovery so new devices appear.  Ignored while another job runs.
    fn refresh(self: &Rc<Self>, prepare: bool, scan: bool) {
        if !self.gate.borrow_mut().try_begin() {
            debug!("bluetooth busy, refresh skipped");
            return;
        }
        self.spinner.start();

        let manager = self.manager.clone();
        let scan_for = self.config.scan();
        let panel = Rc::clone(self);
        Job::spawn(move || -> Result<Snapshot, B::Error> {
            if prepare {
                manager.prepare_adapter()?;
            }
            let powered = manager.powered()?;
            if powered && scan {
                manager.scan(scan_for)?;
            }
            let devices = if powered { manager.devices()? } else { Vec::new() };
            Ok(Snapshot { powered, devices })
        })
        .then(move |result| {
            panel.spinner.stop();
            match result {
                Ok(snapshot) => panel.show(snapshot),
                Err(e) => {
                    warn!("bluetooth refresh failed: {}", e);
                    panel.show_devices(&[]);
                }
            }
            let next = panel.gate.borrow_mut().finish();
            if let Some(request) = next {
                panel.start(request);
            }
        });
    }

    fn set_power(self: &Rc<Self>, on: bool) {
        self.request(Request::Power(on));
    }

    fn perform(self: &Rc<Self>, action: BluetoothAction, mac: String) {
        self.request(Request::Perform(action, mac));
    }

    /// Start `request` now, or once the running job has finished.
    fn request(self: &Rc<Self>, request: Request) {
        let ready = self.gate.borrow_mut().begin_or_queue(request);
        match ready {
            Some(request) => self.start(request),
            None => info!("bluetooth busy, request queued"),
        }
    }

    /// Run a request the gate has already been claimed for, then refresh.
    /// Device actions wait for the configured settle delay before the
    /// refresh.
    fn start(self: &Rc<Self>, request: Request) {
        let manager = self.manager.clone();
        let (work, settle): (Box<dyn FnOnce() -> Result<(), B::Error> + Send>, bool) =
            match request {
                Request::Power(on) => {
                    info!("bluetooth power {}", if on { "on" } else { "off" });
                    (Box::new(move || manager.set_power(on)), false)
                }
                Request::Perform(action, mac) => {
                    info!("bluetooth {} {}", action, mac);
                    self.header.title.set_text(&format!("{}...", action.label()));
                    (Box::new(move || manager.perform(action, &mac)), true)
                }
            };

        self.spinner.start();
        let panel = Rc::clone(self);
        Job::spawn(work).then(move |result| {
            if let Err(e) = result {
                warn!("bluetooth command failed: {}", e);
            }
            panel.header.title.set_text("Bluetooth");
            panel.spinner.stop();

            let next = panel.gate.borrow_mut().finish();
            if let Some(request) = next {
                panel.start(request);
            } else if settle {
                let weak = Rc::downgrade(&panel);
                glib::timeout_add_local_once(panel.config.settle(), move || {
                    if let Some(panel) = weak.upgrade() {
                        panel.refresh(false, false);
                    }
                });
            } else {
                panel.refresh(false, false);
            }
        });
    }

    fn show(self: &Rc<Self>, snapshot: Snapshot) {
        self.syncing_power.set(true);
        self.power.set_active(snapshot.powered);
        self.syncing_power.set(false);

        if snapshot.powered {
            self.show_devices(&snapshot.devices);
        } else {
            clear_box(&self.list);
            self.list.append(&placeholder("Bluetooth is off"));
        }
    }

    fn show_devices(self: &Rc<Self>, devices: &[BluetoothDevice]) {
        clear_box(&self.list);
        if devices.is_empty() {
            self.list.append(&placeholder("No devices found"));
            return;
        }
        for device in devices {
            self.list.append(&self.device_row(device));
        }
    }

    fn device_row(self: &Rc<Self>, device: &BluetoothDevice) -> gtk4::Box {
        let row = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
        row.add_css_class("card");

        let text = gtk4::Box::new(gtk4::Orientation::Vertical, 2);
        text.set_hexpand(true);
        let name = gtk4::Label::new(Some(device.display_name()));
        name.set_xalign(0.0);
        name.set_ellipsize(gtk4::pango::EllipsizeMode::End);
        text.append(&name);
        let status = gtk4::Label::new(Some(status_text(device)));
        status.set_xalign(0.0);
        status.add_css_class("muted");
        text.append(&status);
        row.append(&text);

        let primary = device.primary_action();
        let button = gtk4::Button::with_label(primary.label());
        button.set_valign(gtk4::Align::Center);
        if primary != BluetoothAction::Disconnect {
            button.add_css_class("accent");
        }
        {
            let panel = Rc::clone(self);
            let mac = device.mac.clone();
            button.connect_clicked(move |_| panel.perform(primary, mac.clone()));
        }
        row.append(&button);

        let menu = gtk4::Box::new(gtk4::Orientation::Vertical, 4);
        let popover = gtk4::Popover::new();
        popover.set_child(Some(&menu));
        for action in [device.trust_toggle(), BluetoothAction::Remove] {
            let item = gtk4::Button::with_label(action.label());
            item.add_css_class("flat");
            if action == BluetoothAction::Remove {
                item.add_css_class("danger");
            }
            let panel = Rc::clone(self);
            let mac = device.mac.clone();
            let popover = popover.clone();
            item.connect_clicked(move |_| {
                popover.popdown();
                panel.perform(action, mac.clone());
            });
            menu.append(&item);
        }
        let more = gtk4::MenuButton::new();
        more.set_label("⋮");
        more.set_valign(gtk4::Align::Center);
        more.set_popover(Some(&popover));
        row.append(&more);

        row
    }
}

fn status_text(device: &BluetoothDevice) -> &'static str {
    match (device.connected, device.paired) {
        (true, _) => "Connected",
        (false, true) => "Paired",
        (false, false) => "Available",
    }
}
