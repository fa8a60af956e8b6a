// SPDX: CC0-1.0

use crate::{eval::Program, lex::SubStr};
use anyhow::Context;
use core::fmt;
use std::{
    io::{self, stdin, BufRead, Write},
    sync::Arc,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    SetExpr,
    Plot,
    Root,
    View,
    Zoom,
    Pan,
    Resize,
    Reset,
    Colors,
    Config,
    PrintProg,
}

impl Command {
    pub const fn exhaustive() -> &'static [Command] {
        &[
            Self::Help,
            Self::Quit,
            Self::SetExpr,
            Self::Plot,
            Self::Root,
            Self::View,
            Self::Zoom,
            Self::Pan,
            Self::Resize,
            Self::Reset,
            Self::Colors,
            Self::Config,
            Self::PrintProg,
        ]
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Self::Help => "display help for each command",
            Self::Quit => "quit the shell",
            Self::SetExpr => "set expression to plot",
            Self::Plot => "render the current view to an svg file",
            Self::Root => "search for a root of the expression near the middle of the view",
            Self::View => "print viewport parameters",
            Self::Zoom => "zoom in or out by a number of wheel notches",
            Self::Pan => "drag the plot by a distance in pixels",
            Self::Resize => "change the output size in pixels",
            Self::Reset => "restore the default zoom and center the origin",
            Self::Colors => "set axes and curve colors",
            Self::Config => "set sampling and root search parameters",
            Self::PrintProg => {
                "print programs compiled from the expression and its derivative (for debugging)"
            }
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Quit => "quit",
            Self::SetExpr => "set",
            Self::Plot => "plot",
            Self::Root => "root",
            Self::View => "view",
            Self::Zoom => "zoom",
            Self::Pan => "pan",
            Self::Resize => "resize",
            Self::Reset => "reset",
            Self::Colors => "colors",
            Self::Config => "config",
            Self::PrintProg => "prog",
        }
    }
}

impl core::str::FromStr for Command {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::exhaustive()
            .iter()
            .find(|c| c.name() == s)
            .copied()
            .ok_or(())
    }
}

/// Prompts for a line. `None` once standard input is exhausted.
pub fn input_line<W: Write>(out: W, prompt: impl fmt::Display) -> anyhow::Result<Option<String>> {
    fn inner<W: Write>(mut out: W, prompt: impl fmt::Display) -> io::Result<Option<String>> {
        write!(out, "{prompt}")?;
        out.flush()?;
        let mut stdin = stdin().lock();
        let mut s = String::new();
        if stdin.read_line(&mut s)? == 0 {
            return Ok(None);
        }
        Ok(Some(s.trim().to_string()))
    }

    let s = inner(out, prompt).context("read from standard input failed")?;
    Ok(s)
}

pub fn input<W: Write>(out: W, prompt: impl fmt::Display) -> anyhow::Result<String> {
    input_line(out, prompt)?.context("standard input closed")
}

pub fn read_fromstr<W: Write, T: core::str::FromStr>(
    mut out: W,
    prompt: impl fmt::Display,
    ignore_empty: bool,
) -> anyhow::Result<Result<Option<T>, <T as core::str::FromStr>::Err>>
where
    <T as core::str::FromStr>::Err: fmt::Display,
{
    let input = Arc::new(input(&mut out, prompt)?);
    if ignore_empty && input.is_empty() {
        return Ok(Ok(None));
    }
    match input.parse::<T>() {
        Ok(new) => Ok(Ok(Some(new))),
        Err(err) => {
            writeln!(out)?;
            underline(&mut out, &SubStr::all(input))?;
            writeln!(out, "parse error: {err}")?;
            Ok(Err(err))
        }
    }
}

pub fn underline<W: Write>(mut out: W, span: &SubStr) -> io::Result<()> {
    writeln!(out, "{}", span.src())?;
    writeln!(
        out,
        "{}{}",
        " ".repeat(span.start()),
        "^".repeat(span.len().max(1))
    )?;
    Ok(())
}

/// The candidate most similar to `word`, if any is reasonably close.
pub fn most_similar<'a>(word: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let word = word.to_ascii_lowercase();
    candidates
        .into_iter()
        .map(|c| {
            let sim = strsim::normalized_damerau_levenshtein(&word, &c.to_ascii_lowercase());
            (sim, c)
        })
        .reduce(|acc, elem| if elem.0 > acc.0 { elem } else { acc })
        .filter(|(sim, _)| *sim > 0.3)
        .map(|(_, c)| c)
}

pub fn dump_program<W: Write>(
    mut out: W,
    prog: &Program,
    title: core::fmt::Arguments,
) -> io::Result<()> {
    writeln!(out, "{title}: ")?;
    if prog.ops().len() == 0 {
        writeln!(out, "  (empty)")?;
    }
    for op in prog.ops() {
        writeln!(out, "  {op}")?;
    }
    Ok(())
}

pub fn expr_undefined<W: Write>(mut out: W) -> io::Result<()> {
    writeln!(out, "error: no expression is defined")
}
