//! Wallpaper carousel window.
//!
//! ```text
//! window                         (layer-shell, centred, exclusive keyboard)
//! └ .carousel
//!     ├ gtk4::Fixed
//!     │   ├ .carousel-slot       previous image, half opacity
//!     │   ├ .carousel-slot.center
//!     │   └ .carousel-slot       next image, half opacity
//!     └ .wallpaper-name
//! ```
//!
//! Slot positions are driven from a 16 ms tick: the [`HoldController`]
//! decides when to slide, the [`SlideAnimation`] moves the slots, and the
//! [`Carousel`] index advances when a slide lands.

use super::{layer_window, run_until_closed, show_message, Job, Placement};
use crate::command::{Direction, Transition};
use crate::config::WallpaperPanelConfig;
use crate::traits::WallpaperDaemon;
use crate::wallpaper::scan::display_name;
use crate::wallpaper::{
    cover_size, Carousel, Fire, HoldController, SlideAnimation, SlideTick, ThumbnailCache,
};
use gtk4::gdk_pixbuf::Pixbuf;
use gtk4::prelude::*;
use gtk4::{gdk, glib};
use log::{debug, error, info, warn};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

//  Layout constants (must match the default CSS)

const SIDE: (i32, i32) = (400, 225);
const CENTER: (i32, i32) = (440, 248);
const GAP: i32 = 30;
const WIDTH: i32 = SIDE.0 * 2 + CENTER.0 + GAP * 2 + 100;
const HEIGHT: i32 = CENTER.1 + 40;
const SIDE_OPACITY: f64 = 0.5;
const TICK: Duration = Duration::from_millis(16);

/// Resting `(x, y)` of the left, centre and right slots.
fn slot_origins() -> [(f64, f64); 3] {
    let left = ((WIDTH - SIDE.0 * 2 - CENTER.0 - GAP * 2) / 2) as f64;
    let top = ((HEIGHT - CENTER.1) / 2) as f64;
    let side_top = top + ((CENTER.1 - SIDE.1) / 2) as f64;
    [
        (left, side_top),
        (left + (SIDE.0 + GAP) as f64, top),
        (left + (SIDE.0 + GAP + CENTER.0 + GAP) as f64, side_top),
    ]
}

fn slot_size(slot: usize) -> (i32, i32) {
    if slot == 1 {
        CENTER
    } else {
        SIDE
    }
}

//  Thumbnail decoding (worker thread)

#[derive(Debug, thiserror::Error)]
enum ThumbnailError {
    #[error("unrecognised image format")]
    Unrecognised,
    #[error(transparent)]
    Decode(#[from] glib::Error),
}

/// Pixel data decoded off the main thread.
struct Decoded {
    bytes: glib::Bytes,
    width: i32,
    height: i32,
    stride: i32,
    has_alpha: bool,
}

impl Decoded {
    fn texture(&self) -> gdk::Texture {
        let format = if self.has_alpha {
            gdk::MemoryFormat::R8g8b8a8
        } else {
            gdk::MemoryFormat::R8g8b8
        };
        gdk::MemoryTexture::new(self.width, self.height, format, &self.bytes, self.stride as usize)
            .upcast()
    }
}

/// Decode `path` scaled to cover a slot of `size`.
fn decode(path: &Path, size: (i32, i32)) -> Result<Decoded, ThumbnailError> {
    let (_, width, height) = Pixbuf::file_info(path).ok_or(ThumbnailError::Unrecognised)?;
    let (w, h) = cover_size((width, height), size);
    let pixbuf = Pixbuf::from_file_at_scale(path, w, h, false)?;
    Ok(Decoded {
        bytes: pixbuf.read_pixel_bytes(),
        width: pixbuf.width(),
        height: pixbuf.height(),
        stride: pixbuf.rowstride(),
        has_alpha: pixbuf.has_alpha(),
    })
}

//  Window

struct CarouselView<D> {
    daemon: D,
    transition: Transition,
    preload_range: usize,
    window: gtk4::Window,
    fixed: gtk4::Fixed,
    slots: [gtk4::Picture; 3],
    name: gtk4::Label,
    carousel: RefCell<Carousel>,
    hold: RefCell<HoldController>,
    slide: RefCell<SlideAnimation>,
    cache: RefCell<ThumbnailCache<gdk::Texture>>,
    pending: RefCell<HashSet<(PathBuf, i32)>>,
    applying: Cell<bool>,
}

/// Open the carousel over `images` and block until it is closed.
pub fn run<D>(daemon: D, config: WallpaperPanelConfig, images: Vec<PathBuf>, current: Option<PathBuf>)
where
    D: WallpaperDaemon + Clone + Send + 'static,
{
    let window = layer_window("deskpanels-wallpaper", Placement::Center);
    let carousel = Carousel::new(images, current.as_deref());
    info!("{} wallpaper(s), starting at {}", carousel.len(), carousel.index());

    let view = CarouselView::new(daemon, &config, carousel, &window);
    view.refresh_slots();
    view.request_thumbnails();

    let weak = Rc::downgrade(&view);
    glib::timeout_add_local(TICK, move || match weak.upgrade() {
        Some(view) => {
            view.tick(Instant::now());
            glib::ControlFlow::Continue
        }
        None => glib::ControlFlow::Break,
    });

    run_until_closed(&window);
    view.hold.borrow_mut().cancel();
}

impl<D> CarouselView<D>
where
    D: WallpaperDaemon + Clone + Send + 'static,
{
    fn new(
        daemon: D,
        config: &WallpaperPanelConfig,
        carousel: Carousel,
        window: &gtk4::Window,
    ) -> Rc<Self> {
        let root = gtk4::Box::new(gtk4::Orientation::Vertical, 20);
        root.add_css_class("carousel");

        let fixed = gtk4::Fixed::new();
        fixed.set_size_request(WIDTH, HEIGHT);
        fixed.set_overflow(gtk4::Overflow::Hidden);

        let slots: [gtk4::Picture; 3] = std::array::from_fn(|i| {
            let picture = gtk4::Picture::new();
            let (w, h) = slot_size(i);
            picture.set_size_request(w, h);
            picture.set_can_shrink(true);
            picture.set_content_fit(gtk4::ContentFit::Cover);
            picture.set_overflow(gtk4::Overflow::Hidden);
            picture.add_css_class("carousel-slot");
            if i == 1 {
                picture.add_css_class("center");
            } else {
                picture.set_opacity(SIDE_OPACITY);
            }
            let (x, y) = slot_origins()[i];
            fixed.put(&picture, x, y);
            picture
        });
        root.append(&fixed);

        let name = gtk4::Label::new(None);
        name.add_css_class("wallpaper-name");
        root.append(&name);
        window.set_child(Some(&root));

        let view = Rc::new(Self {
            daemon,
            transition: config.transition(),
            preload_range: config.preload_range,
            window: window.clone(),
            fixed,
            slots,
            name,
            carousel: RefCell::new(carousel),
            hold: RefCell::new(HoldController::new()),
            slide: RefCell::new(SlideAnimation::new(config.slide_duration(), config.slide_offset)),
            cache: RefCell::new(ThumbnailCache::default()),
            pending: RefCell::new(HashSet::new()),
            applying: Cell::new(false),
        });
        view.connect_input();
        view
    }

    fn connect_input(self: &Rc<Self>) {
        let keys = gtk4::EventControllerKey::new();
        {
            let view = Rc::clone(self);
            keys.connect_key_pressed(move |_, key, _, _| view.key_pressed(key));
        }
        {
            let view = Rc::clone(self);
            keys.connect_key_released(move |_, key, _, _| {
                if let Some(direction) = arrow(key) {
                    view.hold.borrow_mut().release(direction, Instant::now());
                }
            });
        }
        self.window.add_controller(keys);

        let scroll = gtk4::EventControllerScroll::new(gtk4::EventControllerScrollFlags::VERTICAL);
        {
            let view = Rc::clone(self);
            scroll.connect_scroll(move |_, _, dy| {
                if dy > 0.0 {
                    view.step_once(Direction::Right);
                } else if dy < 0.0 {
                    view.step_once(Direction::Left);
                }
                glib::Propagation::Stop
            });
        }
        self.window.add_controller(scroll);

        for (i, slot) in self.slots.iter().enumerate() {
            let click = gtk4::GestureClick::new();
            let view = Rc::clone(self);
            click.connect_released(move |_, _, _, _| match i {
                0 => view.step_once(Direction::Left),
                2 => view.step_once(Direction::Right),
                _ => view.apply_selected(),
            });
            slot.add_controller(click);
        }
    }

    fn key_pressed(self: &Rc<Self>, key: gdk::Key) -> glib::Propagation {
        if let Some(direction) = arrow(key) {
            let now = Instant::now();
            let animating = self.slide.borrow().is_animating();
            let fire = self.hold.borrow_mut().press(direction, now, animating);
            if let Some(fire) = fire {
                self.slide.borrow_mut().start(fire, now);
            }
            return glib::Propagation::Stop;
        }
        match key {
            gdk::Key::Return | gdk::Key::KP_Enter => {
                self.apply_selected();
                glib::Propagation::Stop
            }
            gdk::Key::Escape => {
                self.window.close();
                glib::Propagation::Stop
            }
            _ => glib::Propagation::Proceed,
        }
    }

    /// A single slide, as for a scroll notch or a click on a side slot.
    fn step_once(&self, direction: Direction) {
        if !self.slide.borrow_mut().start(Fire::single(direction), Instant::now()) {
            debug!("slide in progress, {} ignored", direction);
        }
    }

    fn tick(self: &Rc<Self>, now: Instant) {
        let animating = self.slide.borrow().is_animating();
        let fire = self.hold.borrow_mut().poll(now, animating);
        if let Some(fire) = fire {
            self.slide.borrow_mut().start(fire, now);
        }

        let tick = self.slide.borrow_mut().tick(now);
        match tick {
            SlideTick::Idle => {}
            SlideTick::Moving(offset) => self.place_slots(offset),
            SlideTick::Finished(direction) => {
                self.carousel.borrow_mut().step(direction);
                self.place_slots(0.0);
                self.refresh_slots();
                self.request_thumbnails();
            }
        }
    }

    fn place_slots(&self, offset: f64) {
        for (slot, (x, y)) in self.slots.iter().zip(slot_origins()) {
            self.fixed.move_(slot, x + offset, y);
        }
    }

    /// Show cached thumbnails for the visible triple and update the name.
    fn refresh_slots(&self) {
        let carousel = self.carousel.borrow();
        let Some((left, center, right)) = carousel.visible() else {
            self.name.set_text("No wallpapers found");
            return;
        };
        let cache = self.cache.borrow();
        for (slot, index) in [left, center, right].into_iter().enumerate() {
            let texture = carousel
                .path(index)
                .and_then(|path| cache.get(path, slot_size(slot).0));
            self.slots[slot].set_paintable(texture);
        }
        if let Some(selected) = carousel.selected() {
            self.name.set_text(&display_name(selected));
        }
    }

    /// Drop thumbnails outside the preload window and start loading the
    /// missing ones.  The centre and its neighbours also get a
    /// centre-sized copy since they are the next to move into the middle.
    fn request_thumbnails(self: &Rc<Self>) {
        let wanted: Vec<(PathBuf, (i32, i32))> = {
            let carousel = self.carousel.borrow();
            let window = carousel.preload_window(self.preload_range);
            let keep: Vec<&Path> = window.iter().filter_map(|&i| carousel.path(i)).collect();
            self.cache.borrow_mut().retain_window(&keep);

            let mut wanted = Vec::new();
            for (n, &index) in window.iter().enumerate() {
                let Some(path) = carousel.path(index) else {
                    continue;
                };
                // preload_window lists the centre first, then its neighbours.
                if n < 3 {
                    wanted.push((path.to_path_buf(), CENTER));
                }
                wanted.push((path.to_path_buf(), SIDE));
            }
            wanted
        };

        for (path, size) in wanted {
            let key = (path.clone(), size.0);
            if self.cache.borrow().contains(&path, size.0) || self.pending.borrow().contains(&key) {
                continue;
            }
            self.pending.borrow_mut().insert(key.clone());

            let view = Rc::clone(self);
            Job::spawn(move || {
                let result = decode(&path, size);
                (path, result)
            })
            .then(move |(path, result)| {
                view.pending.borrow_mut().remove(&key);
                match result {
                    Ok(decoded) => {
                        view.cache.borrow_mut().insert(path, size.0, decoded.texture());
                        view.refresh_slots();
                    }
                    Err(e) => warn!("thumbnail {}: {}", path.display(), e),
                }
            });
        }
    }

    fn apply_selected(self: &Rc<Self>) {
        if self.applying.replace(true) {
            return;
        }
        let Some(path) = self.carousel.borrow().selected().map(Path::to_path_buf) else {
            self.window.close();
            return;
        };
        let daemon = self.daemon.clone();
        let transition = self.transition;
        let view = Rc::clone(self);
        Job::spawn(move || daemon.apply(&path, &transition)).then(move |result| {
            view.applying.set(false);
            match result {
                Ok(()) => view.window.close(),
                Err(e) => {
                    error!("failed to set wallpaper: {}", e);
                    show_message(&view.window, "Could not set wallpaper", &e.to_string());
                }
            }
        });
    }
}

fn arrow(key: gdk::Key) -> Option<Direction> {
    match key {
        gdk::Key::Left => Some(Direction::Left),
        gdk::Key::Right => Some(Direction::Right),
        _ => None,
    }
}
