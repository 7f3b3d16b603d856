//! The escape sequences the session emits.
//!
//! All of them go through crossterm's ANSI implementations so the bytes are
//! the standard ones: `ESC[?25l`, `ESC[?25h`, `ESC[2K`, `ESC[<n>A`, `ESC[?1049l`.

use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveUp, Show};
use crossterm::terminal::{Clear, ClearType, LeaveAlternateScreen};
use crossterm::QueueableCommand;

pub fn hide_cursor<W: Write + ?Sized>(w: &mut W) -> io::Result<()> {
    w.queue(Hide)?;
    Ok(())
}

pub fn show_cursor<W: Write + ?Sized>(w: &mut W) -> io::Result<()> {
    w.queue(Show)?;
    Ok(())
}

/// Erases the whole row the cursor is on
pub fn clear_line<W: Write + ?Sized>(w: &mut W) -> io::Result<()> {
    w.queue(Clear(ClearType::CurrentLine))?;
    Ok(())
}

/// Moves the cursor up `lines` rows. Zero is a no-op.
pub fn rewind<W: Write + ?Sized>(w: &mut W, lines: usize) -> io::Result<()> {
    if lines == 0 {
        return Ok(());
    }
    let lines = u16::try_from(lines).unwrap_or(u16::MAX);
    w.queue(MoveUp(lines))?;
    Ok(())
}

/// Puts the terminal back the way a shell expects it.
pub fn restore<W: Write + ?Sized>(w: &mut W) -> io::Result<()> {
    w.queue(Show)?;
    // never entered by the session; emitted in case the host switched to it
    w.queue(LeaveAlternateScreen)?;
    w.flush()
}
