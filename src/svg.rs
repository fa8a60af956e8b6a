// SPDX: CC0-1.0

//! A [`Surface`] producing a standalone SVG document.

use crate::{
    render::{Color, Surface},
    Number, Point,
};
use core::fmt::{self, Write};

#[derive(Clone, Debug)]
pub struct SvgSurface {
    width: u32,
    height: u32,
    body: String,
}

impl SvgSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            body: String::new(),
        }
    }

    /// The complete document drawn so far.
    pub fn finish(&self) -> String {
        let (width, height) = (self.width, self.height);
        let mut svg = String::with_capacity(self.body.len() + 160);
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}">"#,
        ));
        svg.push('\n');
        svg.push_str(&self.body);
        svg.push_str("</svg>\n");
        svg
    }
}

impl Surface for SvgSurface {
    type Error = fmt::Error;

    fn clear(&mut self) -> fmt::Result {
        self.body.clear();
        writeln!(
            self.body,
            r#"<rect width="{}" height="{}" fill="white"/>"#,
            self.width, self.height
        )
    }

    fn draw_line(&mut self, color: &Color, width: Number, points: &[Point<Number>]) -> fmt::Result {
        if points.is_empty() {
            return Ok(());
        }
        write!(self.body, r#"<polyline points=""#)?;
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                self.body.push(' ');
            }
            write!(self.body, "{:.2},{:.2}", p.x, p.y)?;
        }
        writeln!(
            self.body,
            r#"" fill="none" stroke="{}" stroke-width="{width}" stroke-linejoin="round"/>"#,
            escape_xml(color.as_str()),
        )
    }

    fn draw_marker(&mut self, color: &Color, at: Point<Number>, radius: Number) -> fmt::Result {
        writeln!(
            self.body,
            r#"<circle cx="{:.2}" cy="{:.2}" r="{radius}" fill="{}"/>"#,
            at.x,
            at.y,
            escape_xml(color.as_str()),
        )
    }

    fn draw_text(&mut self, color: &Color, font: &str, at: Point<Number>, text: &str) -> fmt::Result {
        writeln!(
            self.body,
            r#"<text x="{:.2}" y="{:.2}" fill="{}" style="font: {}">{}</text>"#,
            at.x,
            at.y,
            escape_xml(color.as_str()),
            escape_xml(font),
            escape_xml(text),
        )
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_wraps_drawing() {
        let mut svg = SvgSurface::new(800, 600);
        svg.clear().unwrap();
        let red = Color::named("red");
        svg.draw_line(&red, 3.0, &[Point::new(0.0, 1.0), Point::new(2.5, 3.0)])
            .unwrap();
        svg.draw_marker(&red, Point::new(4.0, 5.0), 5.0).unwrap();

        let doc = svg.finish();
        assert!(doc.starts_with("<svg"));
        assert!(doc.trim_end().ends_with("</svg>"));
        assert!(doc.contains(r#"viewBox="0 0 800 600""#));
        assert!(doc.contains(r#"points="0.00,1.00 2.50,3.00""#));
        assert!(doc.contains(r#"<circle cx="4.00" cy="5.00" r="5" fill="red"/>"#));
    }

    #[test]
    fn clear_discards_previous_frame() {
        let mut svg = SvgSurface::new(10, 10);
        svg.draw_marker(&Color::named("red"), Point::new(1.0, 1.0), 1.0)
            .unwrap();
        svg.clear().unwrap();
        assert!(!svg.finish().contains("<circle"));
    }

    #[test]
    fn escapes_text() {
        let mut svg = SvgSurface::new(10, 10);
        svg.draw_text(
            &Color::named("black"),
            "14px 'Fira Sans'",
            Point::new(0.0, 0.0),
            "x < 1 & y",
        )
        .unwrap();
        let doc = svg.finish();
        assert!(doc.contains("x &lt; 1 &amp; y"));
        assert!(doc.contains("font: 14px &apos;Fira Sans&apos;"));
    }
}
