//! Easing curves for the carousel slide.
//!
//! [`Easing`] covers the ease-out family the carousel switches between as
//! the user holds an arrow key, plus CSS-style cubic-bezier curves for
//! single steps.

/// A timing curve mapping normalised time `t ∈ [0, 1]` to progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    OutCubic,
    OutQuart,
    OutQuint,
    /// CSS `cubic-bezier(x1, y1, x2, y2)`.
    CubicBezier(f64, f64, f64, f64),
}

impl Easing {
    /// CSS `ease` == cubic-bezier(0.25, 0.1, 0.25, 1.0).
    pub const EASE: Easing = Easing::CubicBezier(0.25, 0.10, 0.25, 1.00);

    /// Progress at time `t`.  `t` is clamped to `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::OutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::OutQuart => 1.0 - (1.0 - t).powi(4),
            Easing::OutQuint => 1.0 - (1.0 - t).powi(5),
            Easing::CubicBezier(x1, y1, x2, y2) => bezier_progress(t, x1, y1, x2, y2),
        }
    }

    /// Interpolate between `a` and `b` at time `t`.
    pub fn lerp(self, a: f64, b: f64, t: f64) -> f64 {
        a + (b - a) * self.apply(t)
    }
}

/// Progress along a CSS cubic-bezier at normalised time `u`.
///
/// Control points are (0,0), (x1,y1), (x2,y2), (1,1).
fn bezier_progress(u: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    // B(t) = ((a*t + b)*t + c)*t with endpoints fixed at (0,0) and (1,1).
    let cx = 3.0 * x1;
    let bx = 3.0 * (x2 - x1) - cx;
    let ax = 1.0 - cx - bx;

    let cy = 3.0 * y1;
    let by = 3.0 * (y2 - y1) - cy;
    let ay = 1.0 - cy - by;

    let sample = |a: f64, b: f64, c: f64, t: f64| ((a * t + b) * t + c) * t;

    // Newton-Raphson on x(t) = u
    let mut t = u;
    let mut solved = false;
    for _ in 0..8 {
        let x = sample(ax, bx, cx, t) - u;
        if x.abs() < 1e-6 {
            solved = true;
            break;
        }
        let dx = (3.0 * ax * t + 2.0 * bx) * t + cx;
        if dx.abs() < 1e-6 {
            break;
        }
        t -= x / dx;
        if !(0.0..=1.0).contains(&t) {
            break;
        }
    }

    if !solved {
        // Bisection fallback
        let mut lo = 0.0;
        let mut hi = 1.0;
        t = u;
        for _ in 0..24 {
            let x = sample(ax, bx, cx, t);
            if (x - u).abs() < 1e-7 {
                break;
            }
            if x < u {
                lo = t;
            } else {
                hi = t;
            }
            t = 0.5 * (lo + hi);
        }
    }

    sample(ay, by, cy, t)
}
