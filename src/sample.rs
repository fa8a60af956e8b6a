// SPDX: CC0-1.0

//! Turns an expression into screen-space polylines.

use crate::{evaluator::Evaluator, viewport::Viewport, Number, Point};
use tracing::debug;

/// Horizontal distance between samples, in pixels.
pub const DEFAULT_STEP: Number = 5.0;
/// Smallest accepted step; finer steps only cost time.
pub const MIN_STEP: Number = 0.01;
/// Padding around the screen, in multiples of the scale, within which
/// samples are still kept.
pub const DEFAULT_MARGIN: Number = 5.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleOptions {
    step: Number,
    margin: Number,
}

impl SampleOptions {
    /// Dense sampling for smooth curves at the cost of many evaluations.
    pub const FINE: Self = Self {
        step: 0.1,
        margin: DEFAULT_MARGIN,
    };

    /// `None` unless `step` is at least [`MIN_STEP`] and `margin` is a
    /// non-negative finite number.
    pub fn new(step: Number, margin: Number) -> Option<Self> {
        let step_ok = step.is_finite() && step >= MIN_STEP;
        let margin_ok = margin.is_finite() && margin >= 0.0;
        (step_ok && margin_ok).then_some(Self { step, margin })
    }

    pub const fn step(&self) -> Number {
        self.step
    }

    pub const fn margin(&self) -> Number {
        self.margin
    }
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            step: DEFAULT_STEP,
            margin: DEFAULT_MARGIN,
        }
    }
}

/// Sampled function as connected runs of screen points. A run ends wherever
/// a sample was dropped, so discontinuities are never bridged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Curve {
    segments: Vec<Vec<Point<Number>>>,
    skipped: usize,
}

impl Curve {
    pub fn segments(&self) -> &[Vec<Point<Number>>] {
        &self.segments
    }

    pub fn points(&self) -> impl Iterator<Item = &Point<Number>> + '_ {
        self.segments.iter().flatten()
    }

    /// Number of kept samples.
    pub fn len(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of dropped samples.
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    fn end_segment(&mut self, current: &mut Vec<Point<Number>>) {
        if !current.is_empty() {
            self.segments.push(core::mem::take(current));
        }
    }
}

/// Evaluates `expr` every `opts.step` pixels across the viewport's sampled
/// range.
///
/// A sample is dropped when the expression is undefined there (NaN or
/// infinite) or when it lands further than `opts.margin * scale` pixels
/// outside the screen. Evaluator errors abort sampling.
pub fn sample<E: Evaluator>(
    evaluator: &E,
    expr: &E::Expr,
    viewport: &Viewport,
    opts: &SampleOptions,
) -> Result<Curve, E::Error> {
    let scale = viewport.scale();
    let origin = viewport.origin();
    let margin = opts.margin * scale;
    let (min_x, max_x) = (viewport.min_x(), viewport.max_x());
    // index based so the step does not accumulate rounding error
    let count = ((max_x - min_x) / opts.step).ceil().max(0.0) as usize;

    let mut curve = Curve::default();
    let mut current = Vec::new();
    for i in 0..count {
        let x = min_x + i as Number * opts.step;
        if x >= max_x {
            break;
        }

        let y = evaluator.evaluate(expr, x / scale)?;
        // checked before the bounds test: comparisons against NaN are false
        if !y.is_finite() {
            curve.skipped += 1;
            curve.end_segment(&mut current);
            continue;
        }

        let p = Point::new(x + origin.x, viewport.to_screen_y(y));
        if !viewport.contains_padded(p, margin) {
            curve.skipped += 1;
            curve.end_segment(&mut current);
            continue;
        }
        current.push(p);
    }
    curve.end_segment(&mut current);

    debug!(
        points = curve.len(),
        segments = curve.segments.len(),
        skipped = curve.skipped,
        "sampled curve"
    );
    Ok(curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{evaluator::Symbolic, Evaluator};
    use core::num::NonZeroU32;

    fn viewport() -> Viewport {
        Viewport::new(NonZeroU32::new(800).unwrap(), NonZeroU32::new(600).unwrap())
    }

    fn sampled(src: &str, vp: &Viewport, opts: &SampleOptions) -> Curve {
        let sym = Symbolic::new();
        let f = sym.simplify(src).unwrap();
        sample(&sym, &f, vp, opts).unwrap()
    }

    #[test]
    fn options_are_validated() {
        assert!(SampleOptions::new(0.0, 5.0).is_none());
        assert!(SampleOptions::new(Number::NAN, 5.0).is_none());
        assert!(SampleOptions::new(1.0, -1.0).is_none());
        assert_eq!(SampleOptions::new(0.1, 5.0), Some(SampleOptions::FINE));
    }

    #[test]
    fn identity_is_one_diagonal_run() {
        let vp = viewport();
        let curve = sampled("x", &vp, &SampleOptions::default());
        assert_eq!(curve.segments().len(), 1);
        assert_eq!(curve.len(), 160);
        assert_eq!(curve.skipped(), 0);
        for p in curve.points() {
            let m = vp.to_math(*p);
            assert!((m.x - m.y).abs() < 1e-9, "{p} is off the diagonal");
        }
        // first sample sits on the left screen edge
        assert_eq!(curve.segments()[0][0].x, 0.0);
    }

    #[test]
    fn sine_stays_within_padded_screen() {
        let mut vp = viewport();
        vp.pan(-230.0, 170.0);
        vp.zoom(-7);
        let opts = SampleOptions::FINE;
        let curve = sampled("sin(x)", &vp, &opts);
        assert!(!curve.is_empty());
        let margin = opts.margin() * vp.scale();
        for p in curve.points() {
            assert!(p.is_finite());
            assert!(vp.contains_padded(*p, margin));
        }
    }

    #[test]
    fn undefined_points_break_the_path() {
        let vp = viewport();
        // x = 0 is sampled exactly and is infinite there
        let curve = sampled("1/x", &vp, &SampleOptions::default());
        assert_eq!(curve.segments().len(), 2);
        assert_eq!(curve.skipped(), 1);

        let curve = sampled("ln(x)", &vp, &SampleOptions::default());
        assert_eq!(curve.segments().len(), 1);
        assert!(curve.points().all(|p| p.x > vp.origin().x));
    }

    #[test]
    fn asymptotes_are_clipped() {
        let vp = viewport();
        let curve = sampled("tan(x)", &vp, &SampleOptions::FINE);
        assert!(curve.segments().len() > 1);
        assert!(curve.skipped() > 0);
        let margin = DEFAULT_MARGIN * vp.scale();
        assert!(curve.points().all(|p| vp.contains_padded(*p, margin)));
    }

    #[test]
    fn evaluator_errors_abort_sampling() {
        let sym = Symbolic::new();
        let f = sym.simplify("x + y").unwrap();
        assert!(sample(&sym, &f, &viewport(), &SampleOptions::default()).is_err());
    }
}
