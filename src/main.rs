// SPDX: CC0-1.0

use anyhow::Context;
use chrono::{DateTime, Local};
use core::num::NonZeroU32;
use curve_plot::{
    eval::{EvalErr, EvalErrTyp, Idents},
    expr::DiffErr,
    lex::{LexErrTyp, SubStr, TokTyp},
    parse::{ParseErr, ParseErrTyp},
    render::{root_label, Color},
    roots::RootOutcome,
    sample::{SampleOptions, MIN_STEP},
    shell::{self, Command},
    svg::SvgSurface,
    App, Evaluator, Event, ExprError, Key, Number, Point, Settings, Symbolic,
};
use std::{
    fs::OpenOptions,
    io::{stdout, BufWriter, Write},
    process::ExitCode,
    sync::Arc,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const OUTPUT_RES: [u32; 2] = [1280, 720];

fn output_svg_filename(now: DateTime<Local>) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "svg"
    )
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "curve_plot=info".into()),
        )
        .init();

    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> anyhow::Result<()> {
    let [width, height] = OUTPUT_RES;
    let mut app = App::new(
        Symbolic::new(),
        Settings::default(),
        NonZeroU32::new(width).context("output width is zero")?,
        NonZeroU32::new(height).context("output height is zero")?,
    );
    app.handle(Event::Submit(String::from("x^2 - 4")));

    let mut stdout = BufWriter::new(stdout());
    loop {
        if app.input().is_empty() {
            writeln!(stdout, "f(x) is not set")?;
        } else {
            writeln!(stdout, "f(x) = {}", app.input())?;
        }

        let Some(mut try_cmd) = shell::input_line(&mut stdout, "> ")? else {
            writeln!(stdout)?;
            break;
        };
        try_cmd.make_ascii_lowercase();
        writeln!(stdout)?;

        if let Ok(cmd) = try_cmd.parse::<Command>() {
            match cmd {
                Command::Help => {
                    for c in Command::exhaustive() {
                        writeln!(stdout, "{name}: {help}", name = c.name(), help = c.help())?;
                    }
                }

                Command::Quit => break,

                Command::SetExpr => set_expr(&mut stdout, &mut app)?,

                Command::Plot => plot_expr(&mut stdout, &mut app)?,

                Command::Root => find_root(&mut stdout, &mut app)?,

                Command::View => {
                    writeln!(stdout, "{}", app.viewport())?;
                    writeln!(stdout, "root search starts at x = {}", app.viewport().seed_x())?;
                }

                Command::Zoom => zoom(&mut stdout, &mut app)?,

                Command::Pan => pan(&mut stdout, &mut app)?,

                Command::Resize => resize(&mut stdout, &mut app)?,

                Command::Reset => {
                    if app.handle(Event::DoubleClick) {
                        writeln!(stdout, "view reset")?;
                    } else {
                        writeln!(stdout, "view is already at its default")?;
                    }
                }

                Command::Colors => set_colors(&mut stdout, &mut app)?,

                Command::Config => set_config(&mut stdout, &mut app)?,

                Command::PrintProg => print_prog(&mut stdout, &mut app)?,
            }
        } else {
            writeln!(stdout, r#"Unknown command, try "help" for help"#)?;
            let names = Command::exhaustive().iter().map(Command::name);
            if let Some(name) = shell::most_similar(&try_cmd, names) {
                writeln!(stdout, "note: did you mean '{name}'?")?;
            }
        }

        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn set_expr<W: Write>(mut out: W, app: &mut App) -> anyhow::Result<()> {
    let input = shell::input(&mut out, "f(x) = ")?;
    if input.is_empty() {
        return Ok(());
    }
    app.handle(Event::Submit(input));
    compile_expr(&mut out, app)?;
    Ok(())
}

/// Prepares the current expression, reporting problems as they would show
/// up when plotting.
fn compile_expr<W: Write>(mut out: W, app: &mut App) -> anyhow::Result<bool> {
    if let Err(err) = app.prepare() {
        report_error(&mut out, app, &err)?;
        return Ok(false);
    }
    let Some((function, derivative)) = app.prepared() else {
        shell::expr_undefined(&mut out)?;
        return Ok(false);
    };

    // surfaces unknown identifiers before anything is drawn
    if let Err(err) = app.evaluator().evaluate(function, 0.0) {
        report_error(&mut out, app, &err)?;
        return Ok(false);
    }

    writeln!(out, "simplified: f(x) = {function}")?;
    match derivative {
        Some(derivative) => writeln!(out, "derivative: f'(x) = {derivative}")?,
        None => writeln!(out, "note: no derivative, root search is disabled")?,
    }
    Ok(true)
}

fn plot_expr<W: Write>(mut out: W, app: &mut App) -> anyhow::Result<()> {
    if app.input().is_empty() {
        shell::expr_undefined(&mut out)?;
        return Ok(());
    }

    let mut svg = SvgSurface::new(app.viewport().width(), app.viewport().height());
    match app.redraw(&mut svg).context("failed to draw svg")? {
        Ok(frame) => {
            let path = output_svg_filename(Local::now());
            let mut file = BufWriter::new(
                OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&path)
                    .context("failed to open output svg file")?,
            );
            file.write_all(svg.finish().as_bytes())
                .context("failed to write to output svg file")?;
            file.flush()?;
            file.get_mut().sync_data()?;
            drop(file);
            info!(%path, "wrote plot");

            writeln!(out, "wrote {path}")?;
            writeln!(
                out,
                "{points} points in {segments} segment{s}, {skipped} skipped",
                points = frame.points,
                segments = frame.segments,
                s = if frame.segments == 1 { "" } else { "s" },
                skipped = frame.skipped,
            )?;
            match frame.root {
                Some(root) if frame.marked => writeln!(
                    out,
                    "marked root at {}",
                    root_label(root, app.settings().root.decimals)
                )?,
                Some(root) => writeln!(
                    out,
                    "root at {} is off screen",
                    root_label(root, app.settings().root.decimals)
                )?,
                None => writeln!(out, "no root marked")?,
            }
        }

        Err(err) => report_error(&mut out, app, &err)?,
    }
    Ok(())
}

fn find_root<W: Write>(mut out: W, app: &mut App) -> anyhow::Result<()> {
    if app.input().is_empty() {
        shell::expr_undefined(&mut out)?;
        return Ok(());
    }

    let seed = app.viewport().seed_x();
    let decimals = app.settings().root.decimals;
    let outcome = match app.root() {
        Ok(Some(outcome)) => outcome,
        Ok(None) => {
            writeln!(out, "error: the expression has no derivative")?;
            return Ok(());
        }
        Err(err) => {
            report_error(&mut out, app, &err)?;
            return Ok(());
        }
    };

    writeln!(out, "starting from x = {seed}")?;
    match outcome {
        RootOutcome::Converged { x, iterations } => writeln!(
            out,
            "found root {label} after {iterations} iteration{s}",
            label = root_label(outcome.root(decimals).unwrap_or(x), decimals),
            s = if iterations == 1 { "" } else { "s" },
        )?,
        RootOutcome::FlatDerivative { x, iteration } => writeln!(
            out,
            "no root: the tangent is flat at x = {x} (iteration {iteration})"
        )?,
        RootOutcome::Diverged { iteration } => {
            writeln!(out, "no root: the iteration diverged (iteration {iteration})")?
        }
        RootOutcome::Undefined { iteration } => writeln!(
            out,
            "no root: the expression is undefined at an iterate (iteration {iteration})"
        )?,
        RootOutcome::NotConverged { x } => writeln!(
            out,
            "no root: the iteration did not settle (last at x = {x})"
        )?,
    }
    Ok(())
}

fn zoom<W: Write>(mut out: W, app: &mut App) -> anyhow::Result<()> {
    let notches = match shell::read_fromstr::<_, i32>(
        &mut out,
        "?notches (positive zooms in) = ",
        true,
    )? {
        Ok(Some(notches)) => notches,
        Ok(None) | Err(_) => return Ok(()),
    };

    // wheel zoom only applies while control is held
    app.handle(Event::KeyDown(Key::Control));
    let delta_y = if notches > 0 { -1.0 } else { 1.0 };
    for _ in 0..notches.unsigned_abs() {
        app.handle(Event::Wheel { delta_y });
    }
    app.handle(Event::KeyUp(Key::Control));

    writeln!(out, "scale = {}", app.viewport().scale())?;
    Ok(())
}

fn pan<W: Write>(mut out: W, app: &mut App) -> anyhow::Result<()> {
    writeln!(out, "note: distances are in pixels, leave blank to skip")?;
    let mut delta = Point::new(0.0, 0.0);
    for (name, dst) in [("dx", &mut delta.x), ("dy", &mut delta.y)] {
        match shell::read_fromstr::<_, Number>(&mut out, format_args!("?{name} = "), true)? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    app.handle(Event::PointerDown(Point::new(0.0, 0.0)));
    let moved = app.handle(Event::PointerMove(delta));
    app.handle(Event::PointerUp);

    if moved {
        writeln!(out, "origin = {}", app.viewport().origin())?;
    }
    Ok(())
}

fn resize<W: Write>(mut out: W, app: &mut App) -> anyhow::Result<()> {
    writeln!(out, "note: leave blank to skip")?;
    let mut size = [app.viewport().width(), app.viewport().height()];
    for (name, dst) in ["width", "height"].into_iter().zip(size.iter_mut()) {
        match shell::read_fromstr::<_, NonZeroU32>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new.get(),
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    let [width, height] = size;
    if app.handle(Event::Resize { width, height }) {
        writeln!(out, "size = {width}x{height}")?;
    }
    Ok(())
}

fn set_colors<W: Write>(mut out: W, app: &mut App) -> anyhow::Result<()> {
    writeln!(out, "note: leave blank to skip")?;
    let fields: [(&str, Color, fn(Color) -> Event); 2] = [
        ("axes", app.settings().axes_color.clone(), Event::AxesColor),
        ("curve", app.settings().curve_color.clone(), Event::CurveColor),
    ];
    for (name, cur, event) in fields {
        match shell::read_fromstr::<_, Color>(
            &mut out,
            format_args!("?{name} color (is {cur}) = "),
            true,
        )? {
            Ok(Some(new)) => {
                app.handle(event(new));
            }
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }
    Ok(())
}

fn set_config<W: Write>(mut out: W, app: &mut App) -> anyhow::Result<()> {
    let settings = app.settings_mut();
    writeln!(out, "note: leave blank to skip")?;

    let mut step = settings.sample.step();
    let mut margin = settings.sample.margin();
    let mut tolerance = settings.root.tolerance;
    for (name, dst) in [
        ("sample step in pixels", &mut step),
        ("sample margin in multiples of the scale", &mut margin),
        ("root tolerance", &mut tolerance),
    ] {
        match shell::read_fromstr::<_, Number>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    match SampleOptions::new(step, margin) {
        Some(sample) => settings.sample = sample,
        None => {
            writeln!(
                out,
                "error: step must be at least {MIN_STEP} and margin must not be negative"
            )?;
            return Ok(());
        }
    }
    if tolerance.is_finite() && tolerance > 0.0 {
        settings.root.tolerance = tolerance;
    } else {
        writeln!(out, "error: tolerance must be positive")?;
        return Ok(());
    }

    match shell::read_fromstr::<_, u32>(
        &mut out,
        format_args!(
            "?root iterations (is {cur}) = ",
            cur = settings.root.max_iterations
        ),
        true,
    )? {
        Ok(Some(new)) => settings.root.max_iterations = new,
        Ok(None) => {}
        Err(_) => return Ok(()),
    }

    writeln!(out, "note: decimals must be between 0 and 15")?;
    match shell::read_fromstr::<_, u8>(
        &mut out,
        format_args!("?root decimals (is {cur}) = ", cur = settings.root.decimals),
        true,
    )? {
        Ok(Some(new)) if new <= 15 => settings.root.decimals = i32::from(new),
        Ok(Some(_)) => writeln!(out, "error: too many decimals")?,
        Ok(None) => {}
        Err(_) => return Ok(()),
    }
    Ok(())
}

fn print_prog<W: Write>(mut out: W, app: &mut App) -> anyhow::Result<()> {
    if !compile_expr(&mut out, app)? {
        return Ok(());
    }
    writeln!(out)?;
    if let Some((function, derivative)) = app.prepared() {
        shell::dump_program(&mut out, function.program(), format_args!("f(x)"))?;
        if let Some(derivative) = derivative {
            shell::dump_program(&mut out, derivative.program(), format_args!("f'(x)"))?;
        }
    }
    Ok(())
}

fn report_error<W: Write>(mut out: W, app: &App, err: &ExprError) -> anyhow::Result<()> {
    let src = app.input();
    // NOTE(unicode)
    let loc = err
        .loc()
        .cloned()
        .unwrap_or_else(|| SubStr::new(Arc::new(src.to_string()), src.len(), 1));
    writeln!(out)?;
    shell::underline(&mut out, &loc)?;
    writeln!(out, "{err}")?;

    match err {
        ExprError::Parse(ParseErr { typ, .. }) => match typ {
            ParseErrTyp::LexErr(LexErrTyp::InvalidChar) => writeln!(
                out,
                "note: available tokens are numbers, alphanumeric identifiers, and symbols +-*/^,()"
            )?,
            ParseErrTyp::LexErr(LexErrTyp::Unsupported(typ)) => match typ {
                TokTyp::XGreater | TokTyp::XLess => {
                    writeln!(out, "note: expected an expression but found an inequality")?
                }
                TokTyp::XEqual => {
                    writeln!(out, "note: expected an expression but found an equation")?
                }
                TokTyp::XPipe => writeln!(
                    out,
                    "note: use the 'abs' function to compute absolute value"
                )?,
                _ => {}
            },
            ParseErrTyp::ParseNum(_) => writeln!(out, "note: parsing as floating point number")?,
            ParseErrTyp::Leftover { .. } => implicit_mul_note(&mut out)?,
            ParseErrTyp::Arity { .. } => writeln!(
                out,
                "note: log takes a value and an optional base, other functions one argument"
            )?,
            ParseErrTyp::ParenMismatch
            | ParseErrTyp::MissingOperand
            | ParseErrTyp::Empty
            | ParseErrTyp::StrayComma => {}
        },

        ExprError::Eval(EvalErr { typ, .. }) => match typ {
            EvalErrTyp::UndefinedIdent { name } => {
                similar_ident_note(&mut out, app.evaluator().idents(), name.get())?
            }
            EvalErrTyp::StackMismatch { .. } => implicit_mul_note(&mut out)?,
            EvalErrTyp::Empty | EvalErrTyp::MissingArgs { .. } | EvalErrTyp::NullVar { .. } => {}
        },

        ExprError::Diff(DiffErr::Unsupported { .. }) => {
            writeln!(out, "note: root search is unavailable for this expression")?
        }
    }
    Ok(())
}

fn implicit_mul_note<W: Write>(mut out: W) -> std::io::Result<()> {
    writeln!(
        out,
        "note: implicit multiplication is not supported, so for example '5x' would be '5*x'",
    )
}

fn similar_ident_note<W: Write>(mut out: W, idents: &Idents, name: &str) -> std::io::Result<()> {
    let Some(similar) = shell::most_similar(name, idents.keys().map(|k| k.get())) else {
        return Ok(());
    };
    if let Some((key, ident)) = idents.iter().find(|(k, _)| k.get() == similar) {
        writeln!(out, "note: {} '{key}' has a similar name", ident.kind())?;
    }
    Ok(())
}
