// SPDX: CC0-1.0

//! Plot state driven by input events.

use crate::{
    config::Settings,
    evaluator::{Evaluator, Symbolic},
    render::{self, Color, Frame, Plot, Surface},
    roots::{self, RootOutcome},
    stdlib::X,
    Number, Point, Viewport,
};
use core::num::NonZeroU32;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Control,
    Other,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    KeyDown(Key),
    KeyUp(Key),
    /// Negative `delta_y` zooms in. Ignored unless Control is held.
    Wheel { delta_y: Number },
    PointerDown(Point<Number>),
    PointerMove(Point<Number>),
    PointerUp,
    PointerLeave,
    DoubleClick,
    Resize { width: u32, height: u32 },
    Submit(String),
    AxesColor(Color),
    CurveColor(Color),
}

/// A parsed expression with its derivative, reused until the source
/// changes.
struct Prepared<T> {
    src: String,
    function: T,
    derivative: Option<T>,
}

pub struct App<E: Evaluator = Symbolic> {
    evaluator: E,
    settings: Settings,
    viewport: Viewport,
    input: String,
    prepared: Option<Prepared<E::Expr>>,
    ctrl_down: bool,
    drag: Option<Point<Number>>,
}

impl<E: Evaluator> App<E> {
    pub fn new(evaluator: E, settings: Settings, width: NonZeroU32, height: NonZeroU32) -> Self {
        let viewport = Viewport::with_scale(width, height, settings.initial_scale);
        Self {
            evaluator,
            settings,
            viewport,
            input: String::new(),
            prepared: None,
            ctrl_down: false,
            drag: None,
        }
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The expression as last submitted.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Applies `event` and reports whether the plot needs redrawing.
    pub fn handle(&mut self, event: Event) -> bool {
        let redraw = match event {
            Event::KeyDown(key) => {
                if key == Key::Control {
                    self.ctrl_down = true;
                }
                false
            }
            Event::KeyUp(key) => {
                if key == Key::Control {
                    self.ctrl_down = false;
                }
                false
            }
            Event::Wheel { delta_y } => {
                if !self.ctrl_down {
                    false
                } else if delta_y < 0.0 {
                    self.viewport.zoom_in()
                } else if delta_y > 0.0 {
                    self.viewport.zoom_out()
                } else {
                    false
                }
            }
            Event::PointerDown(at) => {
                self.drag = Some(at);
                false
            }
            Event::PointerMove(at) => match self.drag {
                Some(last) => {
                    self.drag = Some(at);
                    self.viewport.pan(at.x - last.x, at.y - last.y)
                }
                None => false,
            },
            Event::PointerUp | Event::PointerLeave => {
                self.drag = None;
                false
            }
            Event::DoubleClick => self.viewport.reset(),
            Event::Resize { width, height } => self.viewport.resize(width, height),
            Event::Submit(src) => {
                self.input = src.trim().to_string();
                true
            }
            Event::AxesColor(color) => {
                self.settings.axes_color = color;
                true
            }
            Event::CurveColor(color) => {
                self.settings.curve_color = color;
                true
            }
        };
        debug!(redraw, "handled event");
        redraw
    }

    /// Parses and differentiates the current input unless the result for
    /// this exact input is cached. An empty input has nothing to prepare.
    pub fn prepare(&mut self) -> Result<(), E::Error> {
        if self.input.is_empty() {
            return Ok(());
        }
        if matches!(&self.prepared, Some(p) if p.src == self.input) {
            return Ok(());
        }

        self.prepared = None;
        let function = self.evaluator.simplify(&self.input)?;
        let derivative = match self.evaluator.derivative(&function, X) {
            Ok(derivative) => Some(derivative),
            Err(err) => {
                debug!(%err, "no derivative, root search disabled");
                None
            }
        };
        self.prepared = Some(Prepared {
            src: self.input.clone(),
            function,
            derivative,
        });
        Ok(())
    }

    /// The prepared function and derivative for the current input.
    pub fn prepared(&self) -> Option<(&E::Expr, Option<&E::Expr>)> {
        self.prepared
            .as_ref()
            .filter(|p| !self.input.is_empty() && p.src == self.input)
            .map(|p| (&p.function, p.derivative.as_ref()))
    }

    /// Searches for a root from the usual seed. `None` when there is no
    /// expression or it has no derivative.
    pub fn root(&mut self) -> Result<Option<RootOutcome>, E::Error> {
        self.prepare()?;
        let Some((function, Some(derivative))) = self.prepared() else {
            return Ok(None);
        };
        let outcome = roots::newton(
            &self.evaluator,
            function,
            derivative,
            self.viewport.seed_x(),
            &self.settings.root,
        )?;
        Ok(Some(outcome))
    }

    /// Draws the current state onto `surface`.
    ///
    /// A rejected expression still yields grid and axes, with the error in
    /// the inner result.
    pub fn redraw<S: Surface>(&mut self, surface: &mut S) -> Result<Result<Frame, E::Error>, S::Error> {
        if let Err(err) = self.prepare() {
            warn!(%err, input = %self.input, "expression rejected");
            // nothing is evaluated without a plot, so only the expression error is reported
            let _axes = render::draw_frame(surface, &self.evaluator, None, &self.viewport, &self.settings)?;
            return Ok(Err(err));
        }

        let plot = self.prepared().map(|(function, derivative)| Plot {
            function,
            derivative,
        });
        let frame = render::draw_frame(surface, &self.evaluator, plot, &self.viewport, &self.settings)?;
        if let Err(err) = &frame {
            warn!(%err, input = %self.input, "expression failed to evaluate");
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::Recorder;
    use core::cell::Cell;

    fn app() -> App {
        App::new(
            Symbolic::new(),
            Settings::default(),
            NonZeroU32::new(800).unwrap(),
            NonZeroU32::new(600).unwrap(),
        )
    }

    #[test]
    fn wheel_zooms_only_with_control() {
        let mut app = app();
        assert!(!app.handle(Event::Wheel { delta_y: -1.0 }));
        assert_eq!(app.viewport().scale(), 40.0);

        assert!(!app.handle(Event::KeyDown(Key::Control)));
        assert!(app.handle(Event::Wheel { delta_y: -1.0 }));
        assert!((app.viewport().scale() - 44.0).abs() < 1e-9);
        assert!(app.handle(Event::Wheel { delta_y: 3.0 }));
        assert!((app.viewport().scale() - 40.0).abs() < 1e-9);
        assert!(!app.handle(Event::Wheel { delta_y: 0.0 }));

        app.handle(Event::KeyUp(Key::Control));
        assert!(!app.handle(Event::Wheel { delta_y: -1.0 }));
    }

    #[test]
    fn drag_pans_by_pointer_delta() {
        let mut app = app();
        assert!(!app.handle(Event::PointerMove(Point::new(5.0, 5.0))));
        app.handle(Event::PointerDown(Point::new(100.0, 100.0)));
        assert!(app.handle(Event::PointerMove(Point::new(110.0, 95.0))));
        assert!(app.handle(Event::PointerMove(Point::new(120.0, 95.0))));
        assert_eq!(app.viewport().origin(), Point::new(420.0, 295.0));
        assert_eq!(app.viewport().min_x(), -420.0);

        app.handle(Event::PointerLeave);
        assert!(!app.handle(Event::PointerMove(Point::new(500.0, 500.0))));
        assert_eq!(app.viewport().origin(), Point::new(420.0, 295.0));
    }

    #[test]
    fn double_click_resets_once() {
        let mut app = app();
        assert!(!app.handle(Event::DoubleClick));
        app.handle(Event::PointerDown(Point::new(0.0, 0.0)));
        app.handle(Event::PointerMove(Point::new(30.0, 0.0)));
        app.handle(Event::PointerUp);
        assert!(app.handle(Event::DoubleClick));
        assert!(app.viewport().is_home());
        assert!(!app.handle(Event::DoubleClick));
    }

    #[test]
    fn submit_trims_and_redraws() {
        let mut app = app();
        assert!(app.handle(Event::Submit("  x^2 - 4 \n".to_string())));
        assert_eq!(app.input(), "x^2 - 4");
        let mut surface = Recorder::default();
        let frame = app.redraw(&mut surface).unwrap().unwrap();
        assert_eq!(frame.root, Some(2.0));
    }

    #[test]
    fn empty_input_draws_only_grid_and_axes() {
        let mut app = app();
        let mut surface = Recorder::default();
        let frame = app.redraw(&mut surface).unwrap().unwrap();
        assert_eq!(frame.points, 0);
        assert_eq!(frame.outcome, None);
        assert_eq!(surface.lines_colored(&app.settings().curve_color), 0);
    }

    #[test]
    fn bad_expression_still_draws_axes() {
        let mut app = app();
        app.handle(Event::Submit("x + (".to_string()));
        let mut surface = Recorder::default();
        assert!(app.redraw(&mut surface).unwrap().is_err());
        assert_eq!(surface.lines_colored(&app.settings().axes_color), 2);
        assert!(app.prepared().is_none());
    }

    #[test]
    fn color_events_restyle() {
        let mut app = app();
        let blue: Color = "blue".parse().unwrap();
        assert!(app.handle(Event::CurveColor(blue.clone())));
        assert!(app.handle(Event::AxesColor(blue.clone())));
        assert_eq!(app.settings().curve_color, blue);
        assert_eq!(app.settings().axes_color, blue);
    }

    /// Counts how often expressions get parsed.
    struct Counting {
        inner: Symbolic,
        parses: Cell<usize>,
    }

    impl Evaluator for Counting {
        type Expr = <Symbolic as Evaluator>::Expr;
        type Error = <Symbolic as Evaluator>::Error;

        fn simplify(&self, src: &str) -> Result<Self::Expr, Self::Error> {
            self.parses.set(self.parses.get() + 1);
            self.inner.simplify(src)
        }

        fn evaluate(&self, expr: &Self::Expr, x: Number) -> Result<Number, Self::Error> {
            self.inner.evaluate(expr, x)
        }

        fn derivative(&self, expr: &Self::Expr, var: &str) -> Result<Self::Expr, Self::Error> {
            self.inner.derivative(expr, var)
        }
    }

    #[test]
    fn prepared_expression_is_cached() {
        let evaluator = Counting {
            inner: Symbolic::new(),
            parses: Cell::new(0),
        };
        let mut app = App::new(
            evaluator,
            Settings::default(),
            NonZeroU32::new(800).unwrap(),
            NonZeroU32::new(600).unwrap(),
        );
        let mut surface = Recorder::default();
        app.handle(Event::Submit("sin(x)".to_string()));
        app.redraw(&mut surface).unwrap().unwrap();
        app.handle(Event::KeyDown(Key::Control));
        app.handle(Event::Wheel { delta_y: -1.0 });
        app.redraw(&mut surface).unwrap().unwrap();
        assert_eq!(app.evaluator().parses.get(), 1);

        app.handle(Event::Submit("cos(x)".to_string()));
        app.redraw(&mut surface).unwrap().unwrap();
        assert_eq!(app.evaluator().parses.get(), 2);
        assert!(app.root().unwrap().is_some());
        assert_eq!(app.evaluator().parses.get(), 2);
    }
}
