// SPDX: CC0-1.0

//! Frame drawing against an abstract drawing surface.

use crate::{
    config::Settings,
    evaluator::Evaluator,
    roots::{self, RootOutcome},
    sample, Number, Point, Viewport,
};
use core::{fmt, str::FromStr};
use tracing::debug;

/// Grid lines closer together than this, in pixels, are thinned out by
/// factors of ten.
pub const MIN_GRID_SPACING: Number = 8.0;

/// A color in any notation the surface understands, such as `red` or
/// `#123456`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Color(String);

impl Color {
    pub(crate) fn named(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorErr {
    Empty,
    InvalidChar(char),
}

impl fmt::Display for ColorErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "color is empty"),
            Self::InvalidChar(c) => write!(f, "invalid character {c:?} in color"),
        }
    }
}

impl std::error::Error for ColorErr {}

impl FromStr for Color {
    type Err = ColorErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ColorErr::Empty);
        }
        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || "#(),.% -".contains(*c)))
        {
            return Err(ColorErr::InvalidChar(c));
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Something frames can be drawn onto, in screen coordinates.
pub trait Surface {
    type Error;

    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Strokes an open polyline through `points`.
    fn draw_line(
        &mut self,
        color: &Color,
        width: Number,
        points: &[Point<Number>],
    ) -> Result<(), Self::Error>;

    /// Fills a circle centered on `at`.
    fn draw_marker(
        &mut self,
        color: &Color,
        at: Point<Number>,
        radius: Number,
    ) -> Result<(), Self::Error>;

    fn draw_text(
        &mut self,
        color: &Color,
        font: &str,
        at: Point<Number>,
        text: &str,
    ) -> Result<(), Self::Error>;
}

/// The expression to plot, plus its derivative if it has one.
pub struct Plot<'a, E: Evaluator> {
    pub function: &'a E::Expr,
    pub derivative: Option<&'a E::Expr>,
}

/// What went into a drawn frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub grid_lines: usize,
    pub points: usize,
    pub segments: usize,
    pub skipped: usize,
    pub outcome: Option<RootOutcome>,
    /// Rounded root, if one was found.
    pub root: Option<Number>,
    /// Whether the root marker landed on screen.
    pub marked: bool,
}

/// Draws a full frame: background, grid, axes, then the curve and its root
/// marker.
///
/// The outer result carries surface failures. The inner one carries
/// evaluator failures, which stop drawing at the failing stage; grid and
/// axes are always drawn by then.
pub fn draw_frame<E: Evaluator, S: Surface>(
    surface: &mut S,
    evaluator: &E,
    plot: Option<Plot<'_, E>>,
    viewport: &Viewport,
    settings: &Settings,
) -> Result<Result<Frame, E::Error>, S::Error> {
    let mut frame = Frame::default();

    surface.clear()?;
    frame.grid_lines = draw_grid(surface, viewport, settings)?;
    draw_axes(surface, viewport, settings)?;

    let Some(plot) = plot else {
        return Ok(Ok(frame));
    };

    let curve = match sample::sample(evaluator, plot.function, viewport, &settings.sample) {
        Ok(curve) => curve,
        Err(err) => return Ok(Err(err)),
    };
    for segment in curve.segments() {
        // a lone point has no extent to stroke
        if segment.len() >= 2 {
            surface.draw_line(&settings.curve_color, settings.curve_width, segment)?;
        }
    }
    frame.points = curve.len();
    frame.segments = curve.segments().len();
    frame.skipped = curve.skipped();

    let Some(derivative) = plot.derivative else {
        return Ok(Ok(frame));
    };
    let outcome = match roots::newton(
        evaluator,
        plot.function,
        derivative,
        viewport.seed_x(),
        &settings.root,
    ) {
        Ok(outcome) => outcome,
        Err(err) => return Ok(Err(err)),
    };
    frame.outcome = Some(outcome);
    frame.root = outcome.root(settings.root.decimals);

    if let Some(root) = frame.root {
        let at = viewport.to_screen(Point::new(root, 0.0));
        if viewport.contains_padded(at, settings.marker_radius) {
            surface.draw_marker(&settings.root_color, at, settings.marker_radius)?;
            let label = root_label(root, settings.root.decimals);
            let offset = settings.marker_radius * 2.0;
            surface.draw_text(
                &settings.label_color,
                &settings.label_font,
                Point::new(at.x + offset, at.y - offset),
                &label,
            )?;
            frame.marked = true;
        }
    }

    debug!(?frame, "drew frame");
    Ok(Ok(frame))
}

/// Label shown next to the root marker, e.g. `x = 2.000`.
pub fn root_label(root: Number, decimals: i32) -> String {
    let decimals = usize::try_from(decimals).unwrap_or(0);
    format!("x = {root:.decimals$}")
}

/// Grid spacing in pixels: one mathematical unit, widened tenfold until
/// lines are at least [`MIN_GRID_SPACING`] apart.
pub fn grid_spacing(scale: Number) -> Number {
    let mut spacing = scale;
    while spacing < MIN_GRID_SPACING {
        spacing *= 10.0;
    }
    spacing
}

/// Screen positions of grid lines along one axis of length `extent` whose
/// origin sits at `origin`.
fn grid_positions(origin: Number, extent: Number, spacing: Number) -> impl Iterator<Item = Number> {
    let first = (-origin / spacing).ceil() as i64;
    let last = ((extent - origin) / spacing).floor() as i64;
    (first..=last).map(move |k| origin + k as Number * spacing)
}

fn draw_grid<S: Surface>(
    surface: &mut S,
    viewport: &Viewport,
    settings: &Settings,
) -> Result<usize, S::Error> {
    let spacing = grid_spacing(viewport.scale());
    let origin = viewport.origin();
    let w = Number::from(viewport.width());
    let h = Number::from(viewport.height());

    let mut count = 0;
    for x in grid_positions(origin.x, w, spacing) {
        surface.draw_line(
            &settings.grid_color,
            settings.grid_width,
            &[Point::new(x, 0.0), Point::new(x, h)],
        )?;
        count += 1;
    }
    for y in grid_positions(origin.y, h, spacing) {
        surface.draw_line(
            &settings.grid_color,
            settings.grid_width,
            &[Point::new(0.0, y), Point::new(w, y)],
        )?;
        count += 1;
    }
    Ok(count)
}

fn draw_axes<S: Surface>(
    surface: &mut S,
    viewport: &Viewport,
    settings: &Settings,
) -> Result<(), S::Error> {
    let origin = viewport.origin();
    let w = Number::from(viewport.width());
    let h = Number::from(viewport.height());
    surface.draw_line(
        &settings.axes_color,
        settings.axes_width,
        &[Point::new(origin.x, 0.0), Point::new(origin.x, h)],
    )?;
    surface.draw_line(
        &settings.axes_color,
        settings.axes_width,
        &[Point::new(0.0, origin.y), Point::new(w, origin.y)],
    )
}
