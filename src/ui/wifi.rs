//! Wi-Fi network panel.
//!
//! ```text
//! window                       (layer-shell, top right)
//! └ .panel
//!     ├ .panel-header          [WiFi] Wi-Fi  ✕
//!     ├ [ Scan Networks ]
//!     └ ScrolledWindow
//!         └ .card per network  HomeNet (92%)   [Active] [✕]
//!             └ Revealer       password entry  [Join]
//! ```

use super::{
    clear_box, close_on_escape, layer_window, placeholder, run_until_closed, show_message, Job,
    PanelHeader, Placement, Spinner,
};
use crate::command::WifiNetwork;
use crate::config::WifiPanelConfig;
use crate::gate::JobGate;
use crate::traits::WifiManager;
use gtk4::glib;
use gtk4::prelude::*;
use log::{debug, info, warn};
use std::cell::RefCell;
use std::rc::Rc;

const ICON: &str = "WiFi";
const TITLE: &str = "Wi-Fi";
const PANEL_WIDTH: i32 = 360;
const LIST_HEIGHT: i32 = 380;

/// A user request that must not be lost to a running refresh.
enum Request {
    Connect { ssid: String, password: Option<String> },
    Forget(String),
}

struct WifiPanel<W> {
    manager: W,
    config: WifiPanelConfig,
    window: gtk4::Window,
    header: PanelHeader,
    spinner: Spinner,
    list: gtk4::Box,
    gate: RefCell<JobGate<Request>>,
    /// The password revealer currently expanded, if any.
    open_revealer: RefCell<Option<gtk4::Revealer>>,
}

/// Open the Wi-Fi panel and block until it is closed.
pub fn run<W>(manager: W, config: WifiPanelConfig)
where
    W: WifiManager + Clone + Send + 'static,
{
    let window = layer_window("deskpanels-wifi", Placement::TopRight);
    let panel = WifiPanel::new(manager, config, &window);

    panel.refresh(true, false);
    if let Some(every) = panel.config.refresh_interval() {
        let weak = Rc::downgrade(&panel);
        glib::timeout_add_local(every, move || match weak.upgrade() {
            Some(panel) => {
                // Do not rebuild the list under a half-typed password.
                if panel.open_revealer.borrow().is_none() {
                    panel.refresh(false, false);
                }
                glib::ControlFlow::Continue
            }
            None => glib::ControlFlow::Break,
        });
    }

    run_until_closed(&window);
}

impl<W> WifiPanel<W>
where
    W: WifiManager + Clone + Send + 'static,
{
    fn new(manager: W, config: WifiPanelConfig, window: &gtk4::Window) -> Rc<Self> {
        let root = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
        root.add_css_class("panel");
        root.set_size_request(PANEL_WIDTH, -1);

        let header = PanelHeader::new(ICON, TITLE);
        let spinner = Spinner::new(&header.icon);
        let close = header.add_button("✕", "Close");
        root.append(&header.container);

        let scan = gtk4::Button::with_label("Scan Networks");
        scan.add_css_class("accent");
        scan.set_margin_bottom(10);
        root.append(&scan);

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
            window: window.clone(),
            header,
            spinner,
            list,
            gate: RefCell::new(JobGate::new()),
            open_revealer: RefCell::new(None),
        });

        {
            let panel = Rc::clone(&panel);
            scan.connect_clicked(move |_| panel.refresh(false, true));
        }
        {
            let window = window.clone();
            close.connect_clicked(move |_| window.close());
        }
        panel
    }

    /// Reload the network list on a worker thread.
    ///
    /// `radio_on` switches the radio on first; `rescan` asks the driver for
    /// a fresh scan, whose failure is only logged.
    fn refresh(self: &Rc<Self>, radio_on: bool, rescan: bool) {
        if !self.gate.borrow_mut().try_begin() {
            debug!("wifi busy, refresh skipped");
            return;
        }
        self.spinner.start();

        let manager = self.manager.clone();
        let panel = Rc::clone(self);
        Job::spawn(move || -> Result<Vec<WifiNetwork>, W::Error> {
            if radio_on {
                manager.set_radio(true)?;
            }
            if rescan {
                if let Err(e) = manager.rescan() {
                    debug!("rescan failed: {}", e);
                }
            }
            manager.networks()
        })
        .then(move |result| {
            panel.spinner.stop();
            match result {
                Ok(networks) => panel.show_networks(&networks),
                Err(e) => {
                    warn!("wifi refresh failed: {}", e);
                    panel.show_networks(&[]);
                }
            }
            panel.run_queued();
        });
    }

    fn connect(self: &Rc<Self>, ssid: String, password: Option<String>) {
        self.request(Request::Connect { ssid, password });
    }

    fn forget(self: &Rc<Self>, ssid: String) {
        self.request(Request::Forget(ssid));
    }

    /// Start `request` now, or once the running job has finished.
    fn request(self: &Rc<Self>, request: Request) {
        let ready = self.gate.borrow_mut().begin_or_queue(request);
        match ready {
            Some(request) => self.start(request),
            None => info!("wifi busy, request queued"),
        }
    }

    /// Start the queued request, if any, else release the gate.
    fn run_queued(self: &Rc<Self>) {
        let next = self.gate.borrow_mut().finish();
        if let Some(request) = next {
            self.start(request);
        }
    }

    /// Run a request the gate has already been claimed for.
    fn start(self: &Rc<Self>, request: Request) {
        let manager = self.manager.clone();
        let panel = Rc::clone(self);
        self.spinner.start();
        match request {
            Request::Connect { ssid, password } => {
                info!("wifi connect '{}'", ssid);
                self.header.title.set_text("Connecting...");
                let target = ssid.clone();
                Job::spawn(move || manager.connect(&target, password.as_deref())).then(
                    move |result| {
                        panel.header.title.set_text(TITLE);
                        panel.spinner.stop();
                        *panel.open_revealer.borrow_mut() = None;
                        if let Err(e) = result {
                            warn!("wifi connect '{}' failed: {}", ssid, e);
                            show_message(&panel.window, "Connection failed", &e.to_string());
                        }
                        panel.run_queued();
                        panel.refresh_after_settle();
                    },
                );
            }
            Request::Forget(ssid) => {
                info!("wifi forget '{}'", ssid);
                Job::spawn(move || manager.forget(&ssid)).then(move |result| {
                    panel.spinner.stop();
                    if let Err(e) = result {
                        warn!("wifi forget failed: {}", e);
                    }
                    panel.run_queued();
                    panel.refresh(false, false);
                });
            }
        }
    }

    fn refresh_after_settle(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        glib::timeout_add_local_once(self.config.settle(), move || {
            if let Some(panel) = weak.upgrade() {
                panel.refresh(false, false);
            }
        });
    }

    fn show_networks(self: &Rc<Self>, networks: &[WifiNetwork]) {
        *self.open_revealer.borrow_mut() = None;
        clear_box(&self.list);
        if networks.is_empty() {
            self.list.append(&placeholder("No networks found"));
            return;
        }
        for network in networks {
            self.list.append(&self.network_row(network));
        }
    }

    /// Expand `revealer`, collapsing whichever one was open.
    fn toggle_revealer(&self, revealer: &gtk4::Revealer) {
        let was_open = revealer.reveals_child();
        if let Some(open) = self.open_revealer.borrow_mut().take() {
            open.set_reveal_child(false);
        }
        if !was_open {
            revealer.set_reveal_child(true);
            *self.open_revealer.borrow_mut() = Some(revealer.clone());
        }
    }

    fn network_row(self: &Rc<Self>, network: &WifiNetwork) -> gtk4::Box {
        let card = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
        card.add_css_class("card");

        let row = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
        let label = gtk4::Label::new(Some(&format!("{} ({}%)", network.ssid, network.signal)));
        label.add_css_class(network.strength().css_class());
        label.set_hexpand(true);
        label.set_xalign(0.0);
        label.set_ellipsize(gtk4::pango::EllipsizeMode::End);
        if !network.is_open() {
            label.set_tooltip_text(Some(&network.security));
        }
        row.append(&label);

        let revealer = gtk4::Revealer::new();
        revealer.set_transition_type(gtk4::RevealerTransitionType::SlideDown);

        let action = gtk4::Button::with_label(if network.active { "Active" } else { "Connect" });
        action.set_valign(gtk4::Align::Center);
        if network.active {
            action.set_sensitive(false);
        } else {
            action.add_css_class("accent");
        }
        {
            let panel = Rc::clone(self);
            let ssid = network.ssid.clone();
            let open = network.is_open();
            let revealer = revealer.clone();
            action.connect_clicked(move |_| {
                if open {
                    panel.connect(ssid.clone(), None);
                } else {
                    panel.toggle_revealer(&revealer);
                }
            });
        }
        row.append(&action);

        let forget = gtk4::Button::with_label("✕");
        forget.set_tooltip_text(Some("Forget network"));
        forget.add_css_class("flat");
        forget.add_css_class("danger");
        forget.set_valign(gtk4::Align::Center);
        {
            let panel = Rc::clone(self);
            let ssid = network.ssid.clone();
            forget.connect_clicked(move |_| panel.forget(ssid.clone()));
        }
        row.append(&forget);
        card.append(&row);

        let form = gtk4::Box::new(gtk4::Orientation::Horizontal, 6);
        form.set_margin_top(8);
        let password = gtk4::PasswordEntry::new();
        password.set_show_peek_icon(true);
        password.set_hexpand(true);
        password.set_placeholder_text(Some("Password"));
        form.append(&password);
        let join = gtk4::Button::with_label("Join");
        join.add_css_class("accent");
        form.append(&join);
        revealer.set_child(Some(&form));
        card.append(&revealer);

        let submit = {
            let panel = Rc::clone(self);
            let ssid = network.ssid.clone();
            let password = password.clone();
            move || {
                let text = password.text().to_string();
                panel.connect(ssid.clone(), Some(text).filter(|t| !t.is_empty()));
            }
        };
        {
            let submit = submit.clone();
            join.connect_clicked(move |_| submit());
        }
        password.connect_activate(move |_| submit());

        card
    }
}
