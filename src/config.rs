// SPDX: CC0-1.0

use crate::{
    render::Color, roots::RootOptions, sample::SampleOptions, viewport::DEFAULT_SCALE, Number,
};

/// Appearance and numerics of a plot. Everything here may change between
/// frames except `initial_scale`, which is read once when the viewport is
/// created.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub axes_color: Color,
    pub curve_color: Color,
    pub grid_color: Color,
    pub root_color: Color,
    pub label_color: Color,
    pub axes_width: Number,
    pub curve_width: Number,
    pub grid_width: Number,
    pub marker_radius: Number,
    /// CSS font shorthand for the root label.
    pub label_font: String,
    pub initial_scale: Number,
    pub sample: SampleOptions,
    pub root: RootOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            axes_color: Color::named("#123456"),
            curve_color: Color::named("red"),
            grid_color: Color::named("#919191"),
            root_color: Color::named("#1e90ff"),
            label_color: Color::named("black"),
            axes_width: 3.0,
            curve_width: 3.0,
            grid_width: 1.0,
            marker_radius: 5.0,
            label_font: String::from("14px sans-serif"),
            initial_scale: DEFAULT_SCALE,
            sample: SampleOptions::default(),
            root: RootOptions::default(),
        }
    }
}
