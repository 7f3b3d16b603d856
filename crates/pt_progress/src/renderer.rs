//! Bar drawing and the periodic render loop.
//!
//! Every tick locks the output gate, draws one line per registered source and
//! moves the cursor back up so the next tick overwrites the same rows. A line
//! looks like:
//!
//! ```text
//! Thread 3: [=====================>                            ]  42%
//! ```
//!
//! Between two ticks a source whose percentage advanced is swept through every
//! intermediate value, so a jump from 10 to 40 animates instead of snapping.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::time::Duration;

use unicode_width::UnicodeWidthStr;

use crate::config::BarWidth;
use crate::errors::Result;
use crate::fill::FillBuffer;
use crate::gate::{GateState, OutputGate};
use crate::registry::ProgressSource;
use crate::shutdown::ExitFlag;
use crate::terminal::escape;

const LABEL_SEPARATOR: &str = ": [";
const PERCENT_SUFFIX: &str = "] 100%";
/// Columns taken by the head character
const HEAD_WIDTH: usize = 1;

/// Draws individual bar lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarRenderer {
    head: char,
    bar_width: BarWidth,
}

impl BarRenderer {
    pub fn new(head: char, bar_width: BarWidth) -> Self {
        Self { head, bar_width }
    }

    /// Columns of a line that are not available to the bar for `label`.
    pub fn decoration_width(label: &str) -> usize {
        label.width() + LABEL_SEPARATOR.len() + HEAD_WIDTH + PERCENT_SUFFIX.len()
    }

    /// Length of the fill segment for `label` on a terminal `terminal_width`
    /// columns wide. Zero means the terminal is too narrow for a bar.
    pub fn bar_length(&self, label: &str, terminal_width: usize) -> usize {
        match self.bar_width {
            BarWidth::Fixed(length) => length,
            BarWidth::Terminal => terminal_width.saturating_sub(Self::decoration_width(label)),
        }
    }

    /// Appends the line for one percentage to `out`.
    ///
    /// `bar_length` is capped by the fill buffer so a buffer that could not be
    /// grown yet never produces a ragged bar.
    pub fn format_line(
        &self,
        out: &mut String,
        label: &str,
        percent: u8,
        bar_length: usize,
        fill: &FillBuffer,
    ) {
        let bar_length = bar_length.min(fill.width());
        if bar_length == 0 {
            let _ = write!(out, "{}: {:>3}%", label, percent);
            return;
        }
        let progress = (usize::from(percent) * bar_length / 100).min(bar_length);
        let _ = write!(
            out,
            "{}{}{}{}{:blank$}] {:>3}%",
            label,
            LABEL_SEPARATOR,
            fill.prefix(progress),
            self.head,
            "",
            percent,
            blank = bar_length - progress
        );
    }

    /// Draws one source, sweeping from its last rendered percentage to the
    /// current one, and records the current value as rendered.
    pub fn draw_source<W: Write + ?Sized>(
        &self,
        w: &mut W,
        source: &mut ProgressSource,
        fill: &FillBuffer,
        terminal_width: usize,
    ) -> io::Result<()> {
        escape::clear_line(w)?;

        let current = source.current();
        // a worker that went backwards is drawn at its new value directly
        let from = source.last_rendered().min(current);
        let bar_length = self.bar_length(source.label(), terminal_width);

        let mut line = String::new();
        for percent in from..=current {
            line.clear();
            self.format_line(&mut line, source.label(), percent, bar_length, fill);
            line.push('\r');
            w.write_all(line.as_bytes())?;
            w.flush()?;
        }
        w.write_all(b"\n")?;

        source.set_last_rendered(current);
        Ok(())
    }
}

/// Draws every registered source once.
///
/// With `overwrite` the cursor is moved back to the first bar afterwards so
/// the next pass redraws in place. Returns the number of lines drawn.
pub(crate) fn render_pass(state: &mut GateState, renderer: &BarRenderer, overwrite: bool) -> Result<usize> {
    state.registry.check()?;
    if state.geometry.take_change() {
        log::debug!(
            "rendering at {} columns (was {})",
            state.geometry.width,
            state.geometry.previous_width
        );
    }

    let terminal_width = usize::from(state.geometry.width);
    let GateState {
        registry,
        fill,
        writer,
        ..
    } = state;

    let mut lines = 0;
    for source in registry.iter_mut() {
        renderer.draw_source(writer.as_mut(), source, fill, terminal_width)?;
        lines += 1;
    }
    if overwrite {
        escape::rewind(writer.as_mut(), lines)?;
    }
    writer.flush()?;
    Ok(lines)
}

/// The render loop: one overwriting pass per tick until the exit flag is
/// raised, then a final pass that leaves the last frame in the scroll-back.
pub(crate) async fn run(
    gate: OutputGate,
    renderer: BarRenderer,
    refresh_rate: Duration,
    mut exit: ExitFlag,
) -> Result<()> {
    log::debug!("render loop started, refreshing every {:?}", refresh_rate);
    while !exit.is_set() {
        {
            let mut state = gate.lock()?;
            render_pass(&mut state, &renderer, true)?;
        }
        tokio::select! {
            _ = tokio::time::sleep(refresh_rate) => {}
            _ = exit.wait() => {}
        }
    }

    let mut state = gate.lock()?;
    let lines = render_pass(&mut state, &renderer, false)?;
    log::debug!("render loop stopped after a final pass of {} lines", lines);
    Ok(())
}
