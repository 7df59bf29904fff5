//! Waybar launcher editor.
//!
//! ```text
//! window
//! └ .panel
//!     ├ .panel-title / .muted  heading and config path
//!     ├ ScrolledWindow
//!     │   └ .card per launcher name [Remove]
//!     │                        ICON PATH | FORMAT entry
//!     │                        COMMAND entry
//!     └ [+ Add Application]  [Apply Changes]
//! ```
//!
//! Edits stay in the entries until they are copied into the model, which
//! happens before every structural change and on apply.

use super::{clear_box, placeholder, run_until_closed, show_fatal, show_message, Job};
use crate::traits::BarProcess;
use crate::waybar::{
    filter_applications, scan_applications, DesktopApp, LauncherKind, WaybarConfig,
};
use crate::waybar::desktop::default_application_dirs;
use gtk4::prelude::*;
use gtk4::{gio, glib};
use log::{info, warn};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

const TITLE: &str = "Waybar Launchers";

/// The entries of one launcher card.
struct CardEntries {
    key: String,
    icon: gtk4::Entry,
    command: gtk4::Entry,
}

struct Editor<P> {
    bar: P,
    restart: bool,
    path: PathBuf,
    window: gtk4::Window,
    list: gtk4::Box,
    config: RefCell<WaybarConfig>,
    cards: RefCell<Vec<CardEntries>>,
}

/// Open the editor for the Waybar config at `path` and block until it is
/// closed.  With `restart`, Waybar is restarted after every apply.
pub fn run<P>(path: PathBuf, restart: bool, bar: P)
where
    P: BarProcess + Clone + Send + 'static,
{
    let window = gtk4::Window::new();
    window.set_title(Some(TITLE));
    window.set_default_size(520, 640);

    match WaybarConfig::load(&path) {
        Ok(config) => {
            let editor = Editor::new(bar, restart, path, config, &window);
            editor.render();
        }
        Err(e) => {
            warn!("{}", e);
            let message = e.to_string();
            let parent = window.clone();
            glib::idle_add_local_once(move || {
                show_fatal(&parent, "Could not load the Waybar config", &message);
            });
        }
    }

    run_until_closed(&window);
}

impl<P> Editor<P>
where
    P: BarProcess + Clone + Send + 'static,
{
    fn new(
        bar: P,
        restart: bool,
        path: PathBuf,
        config: WaybarConfig,
        window: &gtk4::Window,
    ) -> Rc<Self> {
        let root = gtk4::Box::new(gtk4::Orientation::Vertical, 6);
        root.add_css_class("panel");

        let title = gtk4::Label::new(Some(TITLE));
        title.add_css_class("panel-title");
        title.set_xalign(0.0);
        root.append(&title);
        let subtitle = gtk4::Label::new(Some(&format!("Editing {}", path.display())));
        subtitle.add_css_class("muted");
        subtitle.set_xalign(0.0);
        subtitle.set_ellipsize(gtk4::pango::EllipsizeMode::Middle);
        subtitle.set_margin_bottom(10);
        root.append(&subtitle);

        let list = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
        let scroll = gtk4::ScrolledWindow::new();
        scroll.set_hscrollbar_policy(gtk4::PolicyType::Never);
        scroll.set_vexpand(true);
        scroll.set_child(Some(&list));
        root.append(&scroll);

        let buttons = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
        buttons.set_margin_top(10);
        let add = gtk4::Button::with_label("+ Add Application");
        add.set_hexpand(true);
        buttons.append(&add);
        let apply = gtk4::Button::with_label("Apply Changes");
        apply.add_css_class("accent");
        apply.set_hexpand(true);
        buttons.append(&apply);
        root.append(&buttons);

        window.set_child(Some(&root));

        let editor = Rc::new(Self {
            bar,
            restart,
            path,
            window: window.clone(),
            list,
            config: RefCell::new(config),
            cards: RefCell::new(Vec::new()),
        });

        {
            let editor = Rc::clone(&editor);
            add.connect_clicked(move |_| editor.open_picker());
        }
        {
            let editor = Rc::clone(&editor);
            apply.connect_clicked(move |_| editor.apply());
        }
        editor
    }

    /// Rebuild the card list from the model.
    fn render(self: &Rc<Self>) {
        clear_box(&self.list);
        let launchers = self.config.borrow().launchers();
        let mut cards = Vec::with_capacity(launchers.len());

        if launchers.is_empty() {
            self.list.append(&placeholder("No applications added yet."));
        }
        for launcher in launchers {
            let card = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
            card.add_css_class("card");

            let top = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
            let name = gtk4::Label::new(Some(&launcher.display_name()));
            name.add_css_class("panel-title");
            name.set_hexpand(true);
            name.set_xalign(0.0);
            top.append(&name);
            let remove = gtk4::Button::with_label("Remove");
            remove.add_css_class("flat");
            remove.add_css_class("danger");
            {
                let editor = Rc::clone(self);
                let key = launcher.key.clone();
                remove.connect_clicked(move |_| editor.remove(&key));
            }
            top.append(&remove);
            card.append(&top);

            let icon = labelled_entry(&card, launcher.kind.icon_caption(), &launcher.icon);
            let command = labelled_entry(&card, "COMMAND", &launcher.on_click);
            if launcher.kind == LauncherKind::Image {
                icon.set_tooltip_text(Some("Path to an image file"));
            }

            self.list.append(&card);
            cards.push(CardEntries {
                key: launcher.key,
                icon,
                command,
            });
        }
        *self.cards.borrow_mut() = cards;
    }

    /// Copy the entry contents into the model.
    fn sync_entries(&self) {
        let mut config = self.config.borrow_mut();
        for card in self.cards.borrow().iter() {
            let icon = card.icon.text();
            let command = card.command.text();
            if let Err(e) = config.update_launcher(&card.key, icon.as_str(), command.as_str()) {
                warn!("{}", e);
            }
        }
    }

    fn remove(self: &Rc<Self>, key: &str) {
        self.sync_entries();
        self.config.borrow_mut().remove_launcher(key);
        self.render();
    }

    fn add(self: &Rc<Self>, app: &DesktopApp, icon_path: &str) {
        self.sync_entries();
        self.config.borrow_mut().add_launcher(app, icon_path);
        self.render();
    }

    fn add_text(self: &Rc<Self>, app: &DesktopApp) {
        self.sync_entries();
        let glyph: String = app.name.chars().take(1).flat_map(char::to_uppercase).collect();
        self.config
            .borrow_mut()
            .add_custom_launcher(&app.name, &glyph, &app.exec);
        self.render();
    }

    fn apply(self: &Rc<Self>) {
        self.sync_entries();
        if let Err(e) = self.config.borrow().save(&self.path) {
            warn!("{}", e);
            show_message(&self.window, "Could not save", &e.to_string());
            return;
        }
        if !self.restart {
            show_message(&self.window, "Saved", &format!("Wrote {}", self.path.display()));
            return;
        }

        let bar = self.bar.clone();
        let editor = Rc::clone(self);
        Job::spawn(move || bar.restart()).then(move |result| match result {
            Ok(()) => show_message(&editor.window, "Saved", "Waybar has been restarted."),
            Err(e) => {
                warn!("waybar restart failed: {}", e);
                show_message(
                    &editor.window,
                    "Saved, but Waybar did not restart",
                    &e.to_string(),
                );
            }
        });
    }

    //  Application picker

    fn open_picker(self: &Rc<Self>) {
        let picker = gtk4::Window::new();
        picker.set_title(Some("Select Application"));
        picker.set_transient_for(Some(&self.window));
        picker.set_modal(true);
        picker.set_default_size(420, 560);

        let root = gtk4::Box::new(gtk4::Orientation::Vertical, 8);
        root.add_css_class("panel");
        let search = gtk4::SearchEntry::new();
        search.set_placeholder_text(Some("Search applications"));
        root.append(&search);

        let list = gtk4::ListBox::new();
        list.set_selection_mode(gtk4::SelectionMode::Single);
        let scroll = gtk4::ScrolledWindow::new();
        scroll.set_vexpand(true);
        scroll.set_child(Some(&list));
        root.append(&scroll);

        let buttons = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
        let text = gtk4::Button::with_label("Add as Text");
        text.set_hexpand(true);
        buttons.append(&text);
        let choose = gtk4::Button::with_label("Choose Icon...");
        choose.add_css_class("accent");
        choose.set_hexpand(true);
        buttons.append(&choose);
        root.append(&buttons);
        picker.set_child(Some(&root));

        let all: Rc<RefCell<Vec<DesktopApp>>> = Rc::new(RefCell::new(Vec::new()));
        let shown: Rc<RefCell<Vec<DesktopApp>>> = Rc::new(RefCell::new(Vec::new()));

        let fill = {
            let all = Rc::clone(&all);
            let shown = Rc::clone(&shown);
            let list = list.clone();
            let search = search.clone();
            move || {
                while let Some(row) = list.row_at_index(0) {
                    list.remove(&row);
                }
                let all = all.borrow();
                let hits: Vec<DesktopApp> = filter_applications(&all, search.text().as_str())
                    .into_iter()
                    .cloned()
                    .collect();
                for app in &hits {
                    let label = gtk4::Label::new(Some(&app.name));
                    label.set_xalign(0.0);
                    list.append(&label);
                }
                *shown.borrow_mut() = hits;
            }
        };

        {
            let fill = fill.clone();
            search.connect_search_changed(move |_| fill());
        }
        {
            let all = Rc::clone(&all);
            let fill = fill.clone();
            Job::spawn(|| scan_applications(&default_application_dirs())).then(move |apps| {
                info!("{} application(s) available", apps.len());
                *all.borrow_mut() = apps;
                fill();
            });
        }

        let selected = {
            let list = list.clone();
            let shown = Rc::clone(&shown);
            move || -> Option<DesktopApp> {
                let row = list.selected_row()?;
                shown.borrow().get(row.index() as usize).cloned()
            }
        };

        {
            let editor = Rc::clone(self);
            let picker_win = picker.clone();
            let selected = selected.clone();
            text.connect_clicked(move |_| {
                if let Some(app) = selected() {
                    editor.add_text(&app);
                    picker_win.close();
                }
            });
        }
        {
            let editor = Rc::clone(self);
            let picker_win = picker.clone();
            let selected = selected.clone();
            choose.connect_clicked(move |_| {
                if let Some(app) = selected() {
                    editor.choose_icon(app, &picker_win);
                }
            });
        }
        {
            let editor = Rc::clone(self);
            let picker_win = picker.clone();
            list.connect_row_activated(move |_, _| {
                if let Some(app) = selected() {
                    editor.choose_icon(app, &picker_win);
                }
            });
        }

        picker.present();
    }

    /// Ask for an icon file, then add `app` with it and close the picker.
    fn choose_icon(self: &Rc<Self>, app: DesktopApp, picker: &gtk4::Window) {
        let filter = gtk4::FileFilter::new();
        filter.set_name(Some("Images"));
        for pattern in ["*.png", "*.svg", "*.jpg", "*.jpeg"] {
            filter.add_pattern(pattern);
        }
        let filters = gio::ListStore::new::<gtk4::FileFilter>();
        filters.append(&filter);

        let dialog = gtk4::FileDialog::builder()
            .title(format!("Icon for {}", app.name))
            .modal(true)
            .filters(&filters)
            .build();

        let editor = Rc::clone(self);
        let picker_win = picker.clone();
        dialog.open(Some(picker), gio::Cancellable::NONE, move |result| {
            let Ok(file) = result else {
                return;
            };
            let Some(path) = file.path() else {
                warn!("selected icon has no local path");
                return;
            };
            editor.add(&app, &path.to_string_lossy());
            picker_win.close();
        });
    }
}

/// Small caption above an entry holding `text`, both appended to `card`.
fn labelled_entry(card: &gtk4::Box, caption: &str, text: &str) -> gtk4::Entry {
    let label = gtk4::Label::new(Some(caption));
    label.add_css_class("field-caption");
    label.set_xalign(0.0);
    card.append(&label);

    let entry = gtk4::Entry::new();
    entry.set_text(text);
    card.append(&entry);
    entry
}
