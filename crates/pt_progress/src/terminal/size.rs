use std::io;
use std::sync::{Arc, Mutex};

/// Fallback geometry when the output is not a terminal
pub const DEFAULT_SIZE: (u16, u16) = (80, 24);

/// Queries the current terminal size on demand.
///
/// Implementations return `(columns, rows)`.
pub trait GeometryProbe: Send + Sync {
    fn size(&self) -> io::Result<(u16, u16)>;
}

/// Probe backed by `crossterm::terminal::size`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrosstermProbe;

impl GeometryProbe for CrosstermProbe {
    fn size(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }
}

/// A probe whose answer is set by hand.
///
/// Useful for hosts that render into something other than a tty, and for
/// simulating resizes in tests. Clones share the same size.
#[derive(Debug, Clone)]
pub struct ManualProbe {
    size: Arc<Mutex<(u16, u16)>>,
}

impl ManualProbe {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            size: Arc::new(Mutex::new((width, height))),
        }
    }

    /// Sets the size reported by every clone of this probe
    pub fn set_size(&self, width: u16, height: u16) {
        // A poisoned size is still a plain tuple, keep using it
        let mut size = self.size.lock().unwrap_or_else(|e| e.into_inner());
        *size = (width, height);
    }
}

impl Default for ManualProbe {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE.0, DEFAULT_SIZE.1)
    }
}

impl GeometryProbe for ManualProbe {
    fn size(&self) -> io::Result<(u16, u16)> {
        Ok(*self.size.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

/// Asks the probe for a size, falling back to [`DEFAULT_SIZE`] when the output
/// is not attached to a terminal.
pub(crate) fn probe_or_default(probe: &dyn GeometryProbe) -> (u16, u16) {
    match probe.size() {
        Ok((0, _)) | Err(_) => {
            log::debug!("terminal size unavailable, assuming {}x{}", DEFAULT_SIZE.0, DEFAULT_SIZE.1);
            DEFAULT_SIZE
        }
        Ok(size) => size,
    }
}
