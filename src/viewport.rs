// SPDX: CC0-1.0

//! Mapping between mathematical coordinates and screen pixels.
//!
//! The screen's y axis grows downward, so the vertical transform is flipped:
//! `x_screen = x*scale + origin.x` and `y_screen = origin.y - y*scale`.
//!
//! `min_x..max_x` is the horizontal range the curve is sampled over. It is
//! measured in pixels relative to the origin, which is why zooming leaves it
//! alone while panning shifts it.

use crate::{Number, Point};
use core::{fmt, num::NonZeroU32};

pub const DEFAULT_SCALE: Number = 40.0;
pub const ZOOM_FACTOR: Number = 1.1;
pub const MIN_SCALE: Number = 1e-6;
pub const MAX_SCALE: Number = 1e9;

#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    scale: Number,
    origin: Point<Number>,
    width: NonZeroU32,
    height: NonZeroU32,
    min_x: Number,
    max_x: Number,
    home_scale: Number,
}

impl Viewport {
    pub fn new(width: NonZeroU32, height: NonZeroU32) -> Self {
        Self::with_scale(width, height, DEFAULT_SCALE)
    }

    /// A viewport whose reset state uses `scale` instead of
    /// [`DEFAULT_SCALE`]. Non-positive or non-finite scales are ignored.
    pub fn with_scale(width: NonZeroU32, height: NonZeroU32, scale: Number) -> Self {
        let home_scale = if scale.is_finite() && scale > 0.0 {
            scale.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            DEFAULT_SCALE
        };
        Self {
            scale: home_scale,
            origin: Point::new(0.0, 0.0),
            width,
            height,
            min_x: 0.0,
            max_x: 0.0,
            home_scale,
        }
        .home()
    }

    /// Pixels per mathematical unit; always positive and finite.
    pub const fn scale(&self) -> Number {
        self.scale
    }

    /// Screen position of the mathematical origin.
    pub const fn origin(&self) -> Point<Number> {
        self.origin
    }

    pub const fn width(&self) -> u32 {
        self.width.get()
    }

    pub const fn height(&self) -> u32 {
        self.height.get()
    }

    pub const fn min_x(&self) -> Number {
        self.min_x
    }

    pub const fn max_x(&self) -> Number {
        self.max_x
    }

    pub fn to_screen_x(&self, x: Number) -> Number {
        x * self.scale + self.origin.x
    }

    pub fn to_screen_y(&self, y: Number) -> Number {
        self.origin.y - y * self.scale
    }

    pub fn to_screen(&self, p: Point<Number>) -> Point<Number> {
        Point::new(self.to_screen_x(p.x), self.to_screen_y(p.y))
    }

    pub fn to_math_x(&self, x_screen: Number) -> Number {
        (x_screen - self.origin.x) / self.scale
    }

    pub fn to_math_y(&self, y_screen: Number) -> Number {
        (self.origin.y - y_screen) / self.scale
    }

    pub fn to_math(&self, p: Point<Number>) -> Point<Number> {
        Point::new(self.to_math_x(p.x), self.to_math_y(p.y))
    }

    /// Zooms about the mathematical origin, not the cursor.
    pub fn zoom_in(&mut self) -> bool {
        self.set_scale(self.scale * ZOOM_FACTOR)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_scale(self.scale / ZOOM_FACTOR)
    }

    /// Positive notches zoom in, negative zoom out.
    pub fn zoom(&mut self, notches: i32) -> bool {
        let mut changed = false;
        for _ in 0..notches.unsigned_abs() {
            changed |= if notches > 0 {
                self.zoom_in()
            } else {
                self.zoom_out()
            };
        }
        changed
    }

    fn set_scale(&mut self, scale: Number) -> bool {
        let scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        if scale == self.scale {
            return false;
        }
        self.scale = scale;
        true
    }

    /// Moves the plot by a drag delta in screen pixels.
    pub fn pan(&mut self, dx: Number, dy: Number) -> bool {
        if !(dx.is_finite() && dy.is_finite()) || (dx == 0.0 && dy == 0.0) {
            return false;
        }
        self.origin.x += dx;
        self.origin.y += dy;
        self.min_x -= dx;
        self.max_x -= dx;
        true
    }

    /// Replaces the screen size. Origin, scale and sampled range are kept,
    /// so the origin may end up off-center. Zero-sized screens are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let (Some(width), Some(height)) = (NonZeroU32::new(width), NonZeroU32::new(height)) else {
            return false;
        };
        if (width, height) == (self.width, self.height) {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    /// The state [`reset`](Self::reset) restores for the current screen size.
    pub fn home(&self) -> Self {
        let half_w = Number::from(self.width.get()) / 2.0;
        let half_h = Number::from(self.height.get()) / 2.0;
        Self {
            scale: self.home_scale,
            origin: Point::new(half_w, half_h),
            width: self.width,
            height: self.height,
            min_x: -half_w,
            max_x: half_w,
            home_scale: self.home_scale,
        }
    }

    pub fn is_home(&self) -> bool {
        *self == self.home()
    }

    /// Restores the default scale, centers the origin and resets the sampled
    /// range. Returns whether anything changed.
    pub fn reset(&mut self) -> bool {
        let home = self.home();
        if *self == home {
            return false;
        }
        *self = home;
        true
    }

    /// Whether `p` lies on screen or within `margin` pixels of it. Non-finite
    /// points are never contained.
    pub fn contains_padded(&self, p: Point<Number>, margin: Number) -> bool {
        if !p.is_finite() {
            return false;
        }
        let w = Number::from(self.width.get());
        let h = Number::from(self.height.get());
        (-margin..=w + margin).contains(&p.x) && (-margin..=h + margin).contains(&p.y)
    }

    /// Newton seed: half the screen width expressed in mathematical units.
    pub fn seed_x(&self) -> Number {
        Number::from(self.width.get()) / 2.0 / self.scale
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewport")
            .field("size", &format_args!("{}x{}", self.width, self.height))
            .field("scale", &self.scale)
            .field("origin", &format_args!("{}", self.origin))
            .field("x range", &(self.min_x..self.max_x))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(w: u32, h: u32) -> Viewport {
        Viewport::new(NonZeroU32::new(w).unwrap(), NonZeroU32::new(h).unwrap())
    }

    #[test]
    fn starts_at_home() {
        let vp = viewport(800, 600);
        assert_eq!(vp.scale(), 40.0);
        assert_eq!(vp.origin(), Point::new(400.0, 300.0));
        assert_eq!((vp.min_x(), vp.max_x()), (-400.0, 400.0));
        assert!(vp.is_home());
    }

    #[test]
    fn transform_round_trips_and_flips_y() {
        let mut vp = viewport(800, 600);
        vp.pan(37.5, -12.25);
        vp.zoom(3);
        for p in [
            Point::new(0.0, 0.0),
            Point::new(123.4, 567.8),
            Point::new(-50.0, 1e4),
        ] {
            let back = vp.to_screen(vp.to_math(p));
            assert!((back.x - p.x).abs() < 1e-9 && (back.y - p.y).abs() < 1e-9);
        }

        let a = vp.to_screen(Point::new(1.0, 1.0));
        let b = vp.to_screen(Point::new(2.0, 2.0));
        assert!(b.x > a.x, "x is increasing");
        assert!(b.y < a.y, "y is inverted");
    }

    #[test]
    fn zoom_pairs_cancel_within_rounding() {
        let mut vp = viewport(800, 600);
        for _ in 0..10 {
            assert!(vp.zoom_in());
            assert!(vp.zoom_out());
        }
        // 1.1 and 1/1.1 are not exact inverses, allow a few ulps per step
        assert!((vp.scale() - 40.0).abs() < 40.0 * 1e-13);
        assert_eq!(vp.origin(), Point::new(400.0, 300.0));
        assert_eq!((vp.min_x(), vp.max_x()), (-400.0, 400.0));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut vp = viewport(10, 10);
        while vp.zoom_out() {}
        assert_eq!(vp.scale(), MIN_SCALE);
        assert!(!vp.zoom(-1));
        assert!(vp.zoom(1));
    }

    #[test]
    fn pan_shifts_origin_and_sampled_range() {
        let mut vp = viewport(800, 600);
        assert!(vp.pan(10.0, -5.0));
        assert_eq!(vp.origin(), Point::new(410.0, 295.0));
        assert_eq!((vp.min_x(), vp.max_x()), (-410.0, 390.0));
        // the left screen edge is still where sampling starts
        assert_eq!(vp.min_x() + vp.origin().x, 0.0);
        assert!(!vp.pan(0.0, 0.0));
        assert!(!vp.pan(Number::NAN, 1.0));
    }

    #[test]
    fn resize_keeps_origin_and_scale() {
        let mut vp = viewport(800, 600);
        assert!(vp.resize(1000, 500));
        assert_eq!((vp.width(), vp.height()), (1000, 500));
        assert_eq!(vp.origin(), Point::new(400.0, 300.0));
        assert_eq!(vp.scale(), 40.0);
        assert!(!vp.is_home());
        assert!(!vp.resize(0, 500));
        assert!(!vp.resize(1000, 500));
    }

    #[test]
    fn reset_restores_defaults_and_is_idempotent() {
        let mut vp = viewport(800, 600);
        vp.pan(-120.0, 33.0);
        vp.zoom(-4);
        vp.resize(1024, 768);
        assert!(vp.reset());
        assert_eq!(vp.scale(), 40.0);
        assert_eq!(vp.origin(), Point::new(512.0, 384.0));
        assert_eq!((vp.min_x(), vp.max_x()), (-512.0, 512.0));
        assert!(!vp.reset());
    }

    #[test]
    fn padded_bounds_reject_nan() {
        let vp = viewport(100, 100);
        assert!(vp.contains_padded(Point::new(-10.0, 110.0), 10.0));
        assert!(!vp.contains_padded(Point::new(-10.5, 50.0), 10.0));
        assert!(!vp.contains_padded(Point::new(Number::NAN, 50.0), 1e9));
        assert!(!vp.contains_padded(Point::new(50.0, Number::INFINITY), 1e9));
    }

    #[test]
    fn seed_is_half_width_in_math_units() {
        let vp = viewport(800, 600);
        assert_eq!(vp.seed_x(), 10.0);
    }
}
