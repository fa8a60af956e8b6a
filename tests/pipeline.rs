// SPDX: CC0-1.0

use core::num::NonZeroU32;
use curve_plot::{
    roots::{find_root, RootOptions},
    svg::SvgSurface,
    App, Event, Key, Number, Point, Settings, Symbolic, Viewport,
};

fn app(width: u32, height: u32) -> App {
    App::new(
        Symbolic::new(),
        Settings::default(),
        NonZeroU32::new(width).unwrap(),
        NonZeroU32::new(height).unwrap(),
    )
}

#[test]
fn root_finding_contract() {
    let sym = Symbolic::new();
    let opts = RootOptions::default();
    assert_eq!(find_root(&sym, "x^2 - 4", 3.0, &opts), 2.0);
    assert_eq!(find_root(&sym, "x^2 - 4", -3.0, &opts), -2.0);
    assert!(find_root(&sym, "x^2 + 1", 3.0, &opts).is_nan());
    assert!(find_root(&sym, "1/x", 3.0, &opts).is_nan());
}

#[test]
fn interaction_then_svg() {
    let mut app = app(800, 600);
    app.handle(Event::Submit(String::from("x^2 - 4")));

    app.handle(Event::KeyDown(Key::Control));
    for _ in 0..10 {
        app.handle(Event::Wheel { delta_y: -120.0 });
        app.handle(Event::Wheel { delta_y: 120.0 });
    }
    app.handle(Event::KeyUp(Key::Control));
    assert!((app.viewport().scale() - 40.0).abs() < 1e-9);

    app.handle(Event::PointerDown(Point::new(10.0, 10.0)));
    app.handle(Event::PointerMove(Point::new(60.0, 10.0)));
    app.handle(Event::PointerUp);
    assert_eq!(app.viewport().origin(), Point::new(450.0, 300.0));

    let mut svg = SvgSurface::new(app.viewport().width(), app.viewport().height());
    let frame = app.redraw(&mut svg).unwrap().unwrap();
    // seed is half the width in math units regardless of panning
    assert_eq!(frame.root, Some(2.0));
    assert!(frame.marked);
    let doc = svg.finish();
    assert!(doc.contains("<polyline"));
    assert!(doc.contains(r#"<circle cx="530.00" cy="300.00""#));
    assert!(doc.contains("x = 2.000"));

    assert!(app.handle(Event::DoubleClick));
    assert_eq!(app.viewport().origin(), Point::new(400.0, 300.0));
}

#[test]
fn resize_then_reset_recenters() {
    let mut app = app(800, 600);
    assert!(app.handle(Event::Resize {
        width: 1000,
        height: 400
    }));
    assert!(!app.handle(Event::Resize {
        width: 0,
        height: 400
    }));
    assert!(app.handle(Event::DoubleClick));

    let vp: &Viewport = app.viewport();
    assert_eq!(vp.scale(), 40.0);
    assert_eq!(vp.origin(), Point::new(500.0, 200.0));
    assert_eq!((vp.min_x(), vp.max_x()), (-500.0, 500.0));
}

#[test]
fn broken_expression_recovers() {
    let mut app = app(400, 400);
    app.handle(Event::Submit(String::from("sin(x")));
    let mut svg = SvgSurface::new(400, 400);
    assert!(app.redraw(&mut svg).unwrap().is_err());
    assert!(!svg.finish().contains(r#"stroke="red""#));

    app.handle(Event::Submit(String::from("sin(x)")));
    let frame = app.redraw(&mut svg).unwrap().unwrap();
    assert!(frame.points > 0);
    let root: Number = frame.root.unwrap();
    let k = (root / core::f64::consts::PI).round();
    assert!((root - k * core::f64::consts::PI).abs() < 1e-3);
}
