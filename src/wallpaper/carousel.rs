//! Carousel state: which wallpaper is centred, how held arrow keys
//! accelerate, and the slide animation between positions.
//!
//! All timing takes an explicit `now` so the GTK tick and the tests drive
//! the same code.

use crate::command::Direction;
use crate::easing::Easing;
use log::debug;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// First repeat interval of a held arrow key.
pub const HOLD_START: Duration = Duration::from_millis(350);
/// How much each repeat shortens the interval.
pub const HOLD_STEP: Duration = Duration::from_millis(25);
/// Fastest repeat interval.
pub const HOLD_MIN: Duration = Duration::from_millis(90);
/// Gap between inertia steps after release.
pub const INERTIA_GAP: Duration = Duration::from_millis(120);

fn wrap(index: isize, len: usize) -> usize {
    index.rem_euclid(len as isize) as usize
}

//  Index model

/// A ring of wallpapers with one selected in the centre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carousel {
    images: Vec<PathBuf>,
    index: usize,
}

impl Carousel {
    /// Start at `current` when it is in `images`, else at the first image.
    pub fn new(images: Vec<PathBuf>, current: Option<&Path>) -> Self {
        let index = current
            .and_then(|cur| images.iter().position(|p| p == cur))
            .unwrap_or(0);
        Self { images, index }
    }


    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Move one image in `direction`, wrapping at both ends.
    pub fn step(&mut self, direction: Direction) {
        if self.images.is_empty() {
            return;
        }
        self.index = wrap(self.index as isize + direction.delta(), self.images.len());
    }

    /// `(left, centre, right)` indices, or `None` when empty.
    ///
    /// With fewer than three images some slots show the same index.
    pub fn visible(&self) -> Option<(usize, usize, usize)> {
        let len = self.images.len();
        if len == 0 {
            return None;
        }
        let i = self.index as isize;
        Some((wrap(i - 1, len), self.index, wrap(i + 1, len)))
    }

    /// Path at the centre slot.
    pub fn selected(&self) -> Option<&Path> {
        self.images.get(self.index).map(PathBuf::as_path)
    }

    pub fn path(&self, index: usize) -> Option<&Path> {
        self.images.get(index).map(PathBuf::as_path)
    }

    /// Indices within `range` of the centre, each listed once, nearest
    /// first.
    pub fn preload_window(&self, range: usize) -> Vec<usize> {
        let len = self.images.len();
        if len == 0 {
            return Vec::new();
        }
        let i = self.index as isize;
        let mut out = vec![self.index];
        for d in 1..=range as isize {
            for idx in [wrap(i - d, len), wrap(i + d, len)] {
                if !out.contains(&idx) {
                    out.push(idx);
                }
            }
        }
        out
    }
}

//  Hold acceleration

/// Easing used for a slide fired at repeat `interval`: snappier curves as
/// the carousel speeds up.
pub fn easing_for_interval(interval: Duration) -> Easing {
    match interval.as_millis() {
        ms if ms > 260 => Easing::OutCubic,
        ms if ms > 160 => Easing::OutQuart,
        _ => Easing::OutQuint,
    }
}

/// Extra steps taken after the key is released at repeat `interval`.
pub fn inertia_steps(interval: Duration) -> u32 {
    match interval.as_millis() {
        ms if ms < 200 => 2,
        ms if ms < 280 => 1,
        _ => 0,
    }
}

/// One slide requested by the [`HoldController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fire {
    pub direction: Direction,
    pub easing: Easing,
    /// Repeat interval at the time of firing.
    pub interval: Duration,
}

impl Fire {
    /// A lone slide, as for a scroll notch or a click on a side slot.
    pub fn single(direction: Direction) -> Self {
        Self {
            direction,
            easing: Easing::EASE,
            interval: HOLD_START,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Held {
    direction: Direction,
    interval: Duration,
    next_fire: Instant,
}

#[derive(Debug, Clone, Copy)]
struct Inertia {
    direction: Direction,
    remaining: u32,
    easing: Easing,
    interval: Duration,
    next_fire: Instant,
}

/// Turns arrow key press/release into a stream of slides.
///
/// Pressing fires at once; holding repeats with a shrinking interval;
/// releasing a fast hold coasts for a step or two.  Nothing fires while a
/// slide is still animating; the pending fire waits for it.
#[derive(Debug, Default)]
pub struct HoldController {
    held: Option<Held>,
    inertia: Option<Inertia>,
}

impl HoldController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key went down.  Auto-repeat presses for a key already held are
    /// ignored.
    pub fn press(&mut self, direction: Direction, now: Instant, animating: bool) -> Option<Fire> {
        if self.held.is_some_and(|h| h.direction == direction) {
            return None;
        }
        self.inertia = None;
        self.held = Some(Held {
            direction,
            interval: HOLD_START,
            next_fire: now,
        });
        self.poll(now, animating)
    }

    /// Key went up.  Releasing a key that is not the held one is ignored.
    pub fn release(&mut self, direction: Direction, now: Instant) {
        let Some(held) = self.held.filter(|h| h.direction == direction) else {
            return;
        };
        self.held = None;
        let steps = inertia_steps(held.interval);
        debug!("release at {:?}, {} inertia step(s)", held.interval, steps);
        if steps > 0 {
            self.inertia = Some(Inertia {
                direction,
                remaining: steps,
                easing: easing_for_interval(held.interval),
                interval: held.interval,
                next_fire: now + INERTIA_GAP,
            });
        }
    }

    /// Drop any hold or inertia, e.g. when the window closes.
    pub fn cancel(&mut self) {
        self.held = None;
        self.inertia = None;
    }

    /// Call on every tick.  Returns the slide to start, if one is due.
    pub fn poll(&mut self, now: Instant, animating: bool) -> Option<Fire> {
        if animating {
            return None;
        }
        if let Some(held) = self.held.as_mut() {
            if now < held.next_fire {
                return None;
            }
            let fire = Fire {
                direction: held.direction,
                easing: easing_for_interval(held.interval),
                interval: held.interval,
            };
            held.interval = held.interval.saturating_sub(HOLD_STEP).max(HOLD_MIN);
            held.next_fire = now + held.interval;
            return Some(fire);
        }
        if let Some(inertia) = self.inertia.as_mut() {
            if now < inertia.next_fire {
                return None;
            }
            let fire = Fire {
                direction: inertia.direction,
                easing: inertia.easing,
                interval: inertia.interval,
            };
            inertia.remaining -= 1;
            inertia.next_fire = now + INERTIA_GAP;
            if inertia.remaining == 0 {
                self.inertia = None;
            }
            return Some(fire);
        }
        None
    }

    /// Current repeat interval while a key is held.
    pub fn interval(&self) -> Option<Duration> {
        self.held.map(|h| h.interval)
    }

    /// `true` while held or coasting.
    pub fn is_active(&self) -> bool {
        self.held.is_some() || self.inertia.is_some()
    }
}

//  Slide animation

#[derive(Debug, Clone, Copy)]
struct Slide {
    direction: Direction,
    easing: Easing,
    duration: Duration,
    start: Instant,
}

/// Outcome of one animation tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlideTick {
    Idle,
    /// Slots should be drawn shifted by this many pixels.
    Moving(f64),
    /// The slide ended: offsets are back at zero and the carousel should
    /// step in this direction.
    Finished(Direction),
}

/// Horizontal slide of all three slots by `distance` pixels.
///
/// Travelling right (to the next image) moves the slots left, so the
/// offset is negative.
#[derive(Debug)]
pub struct SlideAnimation {
    duration: Duration,
    distance: f64,
    offset: f64,
    active: Option<Slide>,
}

impl SlideAnimation {
    pub fn new(duration: Duration, distance: f64) -> Self {
        Self {
            duration,
            distance,
            offset: 0.0,
            active: None,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Begin a slide.  Returns `false` if one is already running.
    ///
    /// The slide never takes longer than `fire.interval`, so a fast hold
    /// speeds up the animation as well as the repeat rate.
    pub fn start(&mut self, fire: Fire, now: Instant) -> bool {
        if self.active.is_some() {
            return false;
        }
        self.active = Some(Slide {
            direction: fire.direction,
            easing: fire.easing,
            duration: self.duration.min(fire.interval),
            start: now,
        });
        true
    }

    pub fn tick(&mut self, now: Instant) -> SlideTick {
        let Some(slide) = self.active else {
            return SlideTick::Idle;
        };
        let dur = slide.duration.as_secs_f64();
        let t = if dur > 0.0 {
            (now.saturating_duration_since(slide.start).as_secs_f64() / dur).min(1.0)
        } else {
            1.0
        };
        if t >= 1.0 {
            self.active = None;
            self.offset = 0.0;
            return SlideTick::Finished(slide.direction);
        }
        let target = -(slide.direction.delta() as f64) * self.distance;
        self.offset = slide.easing.lerp(0.0, target, t);
        SlideTick::Moving(self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from(format!("/w/{}", n))).collect()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn starts_at_current_wallpaper() {
        let c = Carousel::new(paths(&["a", "b", "c"]), Some(Path::new("/w/b")));
        assert_eq!(c.index(), 1);
        let c = Carousel::new(paths(&["a", "b", "c"]), Some(Path::new("/elsewhere/x")));
        assert_eq!(c.index(), 0);
        let c = Carousel::new(paths(&["a"]), None);
        assert_eq!(c.index(), 0);
    }

    #[test]
    fn step_wraps_both_ways() {
        let mut c = Carousel::new(paths(&["a", "b", "c"]), None);
        c.step(Direction::Left);
        assert_eq!(c.index(), 2);
        c.step(Direction::Right);
        c.step(Direction::Right);
        assert_eq!(c.index(), 1);
        assert_eq!(c.selected(), Some(Path::new("/w/b")));
    }

    #[test]
    fn empty_carousel_is_inert() {
        let mut c = Carousel::new(Vec::new(), None);
        c.step(Direction::Right);
        assert_eq!(c.visible(), None);
        assert_eq!(c.selected(), None);
        assert!(c.preload_window(3).is_empty());
    }

    #[test]
    fn visible_triple_wraps() {
        let c = Carousel::new(paths(&["a", "b", "c", "d"]), None);
        assert_eq!(c.visible(), Some((3, 0, 1)));
        let single = Carousel::new(paths(&["a"]), None);
        assert_eq!(single.visible(), Some((0, 0, 0)));
    }

    #[test]
    fn preload_window_is_deduplicated() {
        let c = Carousel::new(paths(&["a", "b", "c", "d", "e", "f", "g", "h"]), None);
        assert_eq!(c.preload_window(2), vec![0, 7, 1, 6, 2]);
        let small = Carousel::new(paths(&["a", "b", "c"]), None);
        let mut w = small.preload_window(3);
        w.sort();
        assert_eq!(w, vec![0, 1, 2]);
    }

    #[test]
    fn single_step_uses_css_ease_and_full_duration() {
        let fire = Fire::single(Direction::Left);
        assert_eq!(fire.easing, Easing::EASE);
        let mut slide = SlideAnimation::new(ms(300), 500.0);
        let t0 = Instant::now();
        assert!(slide.start(fire, t0));
        assert!(matches!(slide.tick(t0 + ms(299)), SlideTick::Moving(_)));
        assert!(slide.is_animating());
        assert_eq!(slide.tick(t0 + ms(300)), SlideTick::Finished(Direction::Left));
    }

    #[test]
    fn easing_tightens_with_speed() {
        assert_eq!(easing_for_interval(ms(350)), Easing::OutCubic);
        assert_eq!(easing_for_interval(ms(261)), Easing::OutCubic);
        assert_eq!(easing_for_interval(ms(260)), Easing::OutQuart);
        assert_eq!(easing_for_interval(ms(161)), Easing::OutQuart);
        assert_eq!(easing_for_interval(ms(160)), Easing::OutQuint);
        assert_eq!(easing_for_interval(ms(90)), Easing::OutQuint);
    }

    #[test]
    fn inertia_depends_on_release_speed() {
        assert_eq!(inertia_steps(ms(350)), 0);
        assert_eq!(inertia_steps(ms(280)), 0);
        assert_eq!(inertia_steps(ms(279)), 1);
        assert_eq!(inertia_steps(ms(200)), 1);
        assert_eq!(inertia_steps(ms(199)), 2);
        assert_eq!(inertia_steps(ms(90)), 2);
    }

    #[test]
    fn press_fires_immediately_and_ignores_repeats() {
        let t0 = Instant::now();
        let mut hold = HoldController::new();
        let fire = hold.press(Direction::Right, t0, false).unwrap();
        assert_eq!(fire.direction, Direction::Right);
        assert_eq!(fire.easing, Easing::OutCubic);
        assert_eq!(fire.interval, HOLD_START);
        assert!(hold.press(Direction::Right, t0 + ms(10), false).is_none());
    }

    #[test]
    fn hold_accelerates_to_floor() {
        let t0 = Instant::now();
        let mut hold = HoldController::new();
        hold.press(Direction::Left, t0, false);
        assert_eq!(hold.interval(), Some(ms(325)));

        let mut now = t0;
        let mut fires = 1;
        while fires < 30 {
            now += ms(400);
            if hold.poll(now, false).is_some() {
                fires += 1;
            }
        }
        assert_eq!(hold.interval(), Some(HOLD_MIN));
    }

    #[test]
    fn hold_waits_for_interval() {
        let t0 = Instant::now();
        let mut hold = HoldController::new();
        hold.press(Direction::Right, t0, false);
        assert!(hold.poll(t0 + ms(100), false).is_none());
        assert!(hold.poll(t0 + ms(325), false).is_some());
    }

    #[test]
    fn no_fire_while_animating() {
        let t0 = Instant::now();
        let mut hold = HoldController::new();
        assert!(hold.press(Direction::Right, t0, true).is_none());
        assert!(hold.poll(t0 + ms(500), true).is_none());
        let fire = hold.poll(t0 + ms(510), false).unwrap();
        assert_eq!(fire.interval, HOLD_START);
    }

    #[test]
    fn slow_release_has_no_inertia() {
        let t0 = Instant::now();
        let mut hold = HoldController::new();
        hold.press(Direction::Right, t0, false);
        hold.release(Direction::Right, t0 + ms(50));
        assert!(!hold.is_active());
        assert!(hold.poll(t0 + ms(1000), false).is_none());
    }

    #[test]
    fn fast_release_coasts_two_steps() {
        let t0 = Instant::now();
        let mut hold = HoldController::new();
        hold.press(Direction::Right, t0, false);
        let mut now = t0;
        while hold.interval().unwrap() >= ms(200) {
            now += ms(400);
            hold.poll(now, false);
        }
        hold.release(Direction::Right, now);
        assert!(hold.is_active());

        assert!(hold.poll(now + ms(60), false).is_none());
        let first = hold.poll(now + ms(120), false).unwrap();
        assert_eq!(first.direction, Direction::Right);
        assert!(hold.poll(now + ms(200), false).is_none());
        assert!(hold.poll(now + ms(240), false).is_some());
        assert!(!hold.is_active());
        assert!(hold.poll(now + ms(1000), false).is_none());
    }

    #[test]
    fn releasing_other_key_keeps_hold() {
        let t0 = Instant::now();
        let mut hold = HoldController::new();
        hold.press(Direction::Right, t0, false);
        hold.release(Direction::Left, t0);
        assert!(hold.interval().is_some());
    }

    #[test]
    fn new_press_cancels_inertia() {
        let t0 = Instant::now();
        let mut hold = HoldController::new();
        hold.press(Direction::Right, t0, false);
        for i in 1..10 {
            hold.poll(t0 + ms(400 * i), false);
        }
        hold.release(Direction::Right, t0 + ms(4000));
        let fire = hold.press(Direction::Left, t0 + ms(4010), false).unwrap();
        assert_eq!(fire.direction, Direction::Left);
        hold.release(Direction::Left, t0 + ms(4020));
        assert!(!hold.is_active());
    }

    #[test]
    fn slide_moves_then_finishes() {
        let t0 = Instant::now();
        let mut slide = SlideAnimation::new(ms(300), 500.0);
        assert_eq!(slide.tick(t0), SlideTick::Idle);

        let fire = Fire {
            direction: Direction::Right,
            easing: Easing::Linear,
            interval: HOLD_START,
        };
        assert!(slide.start(fire, t0));
        assert!(!slide.start(fire, t0), "second slide rejected while running");

        match slide.tick(t0 + ms(150)) {
            SlideTick::Moving(x) => assert!((x + 250.0).abs() < 1e-6),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(slide.tick(t0 + ms(300)), SlideTick::Finished(Direction::Right));
        assert_eq!(slide.offset(), 0.0);
        assert!(!slide.is_animating());
    }

    #[test]
    fn slide_left_moves_positive() {
        let t0 = Instant::now();
        let mut slide = SlideAnimation::new(ms(300), 500.0);
        slide.start(
            Fire {
                direction: Direction::Left,
                easing: Easing::OutCubic,
                interval: HOLD_START,
            },
            t0,
        );
        match slide.tick(t0 + ms(100)) {
            SlideTick::Moving(x) => assert!(x > 0.0 && x < 500.0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn fast_fire_shortens_slide() {
        let t0 = Instant::now();
        let mut slide = SlideAnimation::new(ms(300), 500.0);
        slide.start(
            Fire {
                direction: Direction::Right,
                easing: Easing::OutQuint,
                interval: HOLD_MIN,
            },
            t0,
        );
        assert_eq!(slide.tick(t0 + HOLD_MIN), SlideTick::Finished(Direction::Right));
    }
}
