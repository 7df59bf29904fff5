//! Full-screen power menu.
//!
//! ```text
//! window                       (layer-shell, all edges)
//! └ .power-menu
//!     └ row   [ Lock ] [ Logout ] [ Reboot ] [ Power ]
//! ```
//!
//! A click runs the entry and closes the menu.  Escape closes it without
//! doing anything.

use super::{close_on_escape, layer_window, run_until_closed, show_message, Job, Placement};
use crate::command::SessionAction;
use crate::traits::SessionManager;
use gtk4::prelude::*;
use log::{info, warn};
use std::cell::Cell;
use std::rc::Rc;

const BUTTON_SIZE: i32 = 150;
const BUTTON_SPACING: i32 = 30;

/// Open the power menu and block until it is closed.
pub fn run<S>(session: S)
where
    S: SessionManager + Clone + Send + 'static,
{
    let window = layer_window("deskpanels-power", Placement::Fullscreen);

    let root = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    root.add_css_class("power-menu");
    root.set_hexpand(true);
    root.set_vexpand(true);

    let row = gtk4::Box::new(gtk4::Orientation::Horizontal, BUTTON_SPACING);
    row.set_halign(gtk4::Align::Center);
    row.set_valign(gtk4::Align::Center);
    row.set_vexpand(true);
    root.append(&row);

    window.set_child(Some(&root));
    close_on_escape(&window);

    let running = Rc::new(Cell::new(false));
    for action in SessionAction::ALL {
        let button = power_button(action);
        let session = session.clone();
        let window = window.clone();
        let running = Rc::clone(&running);
        button.connect_clicked(move |_| {
            if running.replace(true) {
                return;
            }
            info!("power menu: {}", action);
            let session = session.clone();
            let window = window.clone();
            let running = Rc::clone(&running);
            Job::spawn(move || session.run(action)).then(move |result| match result {
                Ok(()) => window.close(),
                Err(e) => {
                    warn!("{} failed: {}", action, e);
                    running.set(false);
                    show_message(&window, &format!("{} failed", action.label()), &e.to_string());
                }
            });
        });
        row.append(&button);
    }

    run_until_closed(&window);
}

fn power_button(action: SessionAction) -> gtk4::Button {
    let content = gtk4::Box::new(gtk4::Orientation::Vertical, 6);
    content.set_valign(gtk4::Align::Center);
    let glyph = gtk4::Label::new(Some(action.glyph()));
    glyph.add_css_class("power-glyph");
    content.append(&glyph);
    content.append(&gtk4::Label::new(Some(action.label())));

    let button = gtk4::Button::new();
    button.add_css_class("power-button");
    button.set_size_request(BUTTON_SIZE, BUTTON_SIZE);
    button.set_tooltip_text(Some(action.label()));
    button.set_child(Some(&content));
    button
}
