// SPDX: CC0-1.0

pub mod app;
pub mod config;
pub mod eval;
pub mod evaluator;
pub mod expr;
pub mod lex;
pub mod parse;
pub mod render;
pub mod roots;
pub mod sample;
pub mod shell;
pub mod stdlib;
pub mod svg;
pub mod viewport;

pub use app::{App, Event, Key};
pub use config::Settings;
pub use evaluator::{Evaluator, ExprError, Symbolic};
pub use viewport::Viewport;

use core::fmt;

pub type Number = f64;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl Point<Number> {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl<T: fmt::Display> fmt::Display for Point<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
