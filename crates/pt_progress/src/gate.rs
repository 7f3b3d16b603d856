use std::fmt::{self, Debug, Display};
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::Result;
use crate::fill::FillBuffer;
use crate::registry::{ProgressSource, Registry, RegistryStats, SharedProgress};
use crate::terminal::{escape, TerminalGeometry};

/// Everything the output gate protects.
pub(crate) struct GateState {
    pub(crate) registry: Registry,
    pub(crate) geometry: TerminalGeometry,
    pub(crate) fill: FillBuffer,
    pub(crate) writer: Box<dyn Write + Send + 'static>,
}

/// The lock serializing every terminal write.
///
/// Render passes and ad-hoc messages both go through it, so a message can
/// never land in the middle of a bar line. The same lock guards the registry,
/// the terminal geometry and the fill buffer. Cloning is cheap; hand a clone to
/// every worker that needs to print or register itself.
#[derive(Clone)]
pub struct OutputGate {
    inner: Arc<Mutex<GateState>>,
}

impl Debug for OutputGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("OutputGate");
        match self.inner.try_lock() {
            Ok(state) => debug
                .field("sources", &state.registry.len())
                .field("geometry", &state.geometry),
            Err(_) => debug.field("state", &"<locked>"),
        };
        debug.finish()
    }
}

impl OutputGate {
    pub(crate) fn new(state: GateState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, GateState>> {
        Ok(self.inner.lock()?)
    }

    /// Prints a message on its own line without disturbing the bars.
    pub fn print_message(&self, message: impl Display) -> Result<()> {
        self.print_fmt(format_args!("{}", message))
    }

    /// Formatted variant of [`print_message`](Self::print_message); see also [`pt_println!`](crate::pt_println).
    pub fn print_fmt(&self, args: fmt::Arguments<'_>) -> Result<()> {
        let mut state = self.lock()?;
        let writer = state.writer.as_mut();
        escape::clear_line(writer)?;
        writer.write_fmt(args)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Registers a worker labelled `Thread <id>`, returning its row index.
    pub fn add_source(&self, id: impl Display, progress: SharedProgress) -> Result<usize> {
        self.add(ProgressSource::new(id, progress))
    }

    /// Registers a worker with a custom label
    pub fn add_labeled(&self, label: impl Into<String>, progress: SharedProgress) -> Result<usize> {
        self.add(ProgressSource::labeled(label, progress))
    }

    pub(crate) fn add(&self, source: ProgressSource) -> Result<usize> {
        let mut state = self.lock()?;
        state.registry.add(source)
    }

    /// Unregisters the most recently added worker, returning its label.
    ///
    /// Removal is LIFO only. An empty registry logs a warning and yields `None`.
    pub fn remove_source(&self) -> Result<Option<String>> {
        let mut state = self.lock()?;
        Ok(state
            .registry
            .remove_last()?
            .map(|source| source.label().to_string()))
    }

    pub fn registry_stats(&self) -> Result<RegistryStats> {
        let state = self.lock()?;
        state.registry.check()?;
        Ok(state.registry.stats())
    }

    /// Terminal geometry as last applied by the resize watcher
    pub fn geometry(&self) -> Result<TerminalGeometry> {
        Ok(self.lock()?.geometry)
    }

    /// Width of the fill buffer currently used by the renderer
    pub fn fill_width(&self) -> Result<usize> {
        Ok(self.lock()?.fill.width())
    }
}

/// Prints a formatted line through an [`OutputGate`] or a [`Session`](crate::Session).
///
/// Evaluates to the `Result` of the write.
///
/// ```ignore
/// pt_println!(gate, "Thread {}: {}", id, step)?;
/// ```
#[macro_export]
macro_rules! pt_println {
    ($gate:expr, $($arg:tt)*) => {
        $gate.print_fmt(format_args!($($arg)*))
    };
}
