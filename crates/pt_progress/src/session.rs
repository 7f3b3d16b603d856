use std::fmt::{self, Debug, Display};
use std::io::Write;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::config::{BarWidth, MonitorConfig};
use crate::errors::{ProgressError, Result};
use crate::fill::FillBuffer;
use crate::gate::{GateState, OutputGate};
use crate::registry::{ProgressSource, Registry, RegistryStats, SharedProgress};
use crate::renderer::{self, BarRenderer};
use crate::resize::ResizeWatcher;
use crate::shutdown::ExitFlag;
use crate::signals::TerminationGuard;
use crate::terminal::{escape, probe_or_default, CrosstermProbe, GeometryProbe, TerminalGeometry};

/// Lifecycle of a [`Session`].
///
/// A session value only exists once initialized; there is no
/// uninitialized state to observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Configured, registry allocated, nothing drawn yet
    Initialized,
    /// Background loops are drawing
    Running,
    /// Loops joined and resources released; terminal
    Finished,
}

impl Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Initialized => write!(f, "initialized"),
            SessionState::Running => write!(f, "running"),
            SessionState::Finished => write!(f, "finished"),
        }
    }
}

/// A monitoring context: the registry of bars, the output gate, and the
/// background loops drawing them.
///
/// ```ignore
/// let config = MonitorConfig::builder().refresh_rate_ms(1).bar_length(50).build()?;
/// let mut session = Session::new(config)?;
/// let progress = SharedProgress::new();
/// session.add_source(0, progress.clone())?;
/// session.start()?;
/// // workers call progress.set(..) and session.gate().print_message(..)
/// session.finish().await?;
/// ```
pub struct Session {
    config: MonitorConfig,
    gate: OutputGate,
    probe: Arc<dyn GeometryProbe>,
    exit: ExitFlag,
    resize_trigger: Arc<Notify>,
    state: SessionState,
    loops: Vec<(&'static str, JoinHandle<Result<()>>)>,
    termination: Option<TerminationGuard>,
}

impl Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("gate", &self.gate)
            .field("state", &self.state)
            .field("loops", &self.loops.iter().map(|(name, _)| *name).collect::<Vec<_>>())
            .finish()
    }
}

impl Session {
    /// Initializes a session drawing to stdout and sized after the real terminal.
    pub fn new(config: MonitorConfig) -> Result<Self> {
        Self::with_output(config, std::io::stdout(), CrosstermProbe)
    }

    /// Initializes a session with an injected writer and geometry probe.
    pub fn with_output<W, P>(config: MonitorConfig, writer: W, probe: P) -> Result<Self>
    where
        W: Write + Send + 'static,
        P: GeometryProbe + 'static,
    {
        Self::with_sources(config, writer, probe, std::iter::empty())
    }

    /// Initializes a session with every source registered up front.
    pub fn with_sources<W, P, I>(config: MonitorConfig, writer: W, probe: P, sources: I) -> Result<Self>
    where
        W: Write + Send + 'static,
        P: GeometryProbe + 'static,
        I: IntoIterator<Item = ProgressSource>,
    {
        config.validate().map_err(|e| match e {
            ProgressError::Config(msg) => ProgressError::NotInitialized(msg),
            other => other,
        })?;

        let (width, height) = probe_or_default(&probe);
        let fill_width = match config.bar_width {
            BarWidth::Fixed(length) => length,
            BarWidth::Terminal => usize::from(width),
        };

        let mut registry = Registry::new()?;
        for source in sources {
            registry.add(source)?;
        }

        let gate = OutputGate::new(GateState {
            registry,
            geometry: TerminalGeometry::new(width, height),
            fill: FillBuffer::new(config.body, fill_width),
            writer: Box::new(writer),
        });
        log::debug!(
            "[init] session initialized ({}x{}, bar width {:?})",
            width,
            height,
            config.bar_width
        );

        Ok(Self {
            config,
            gate,
            probe: Arc::new(probe),
            exit: ExitFlag::new(),
            resize_trigger: Arc::new(Notify::new()),
            state: SessionState::Initialized,
            loops: Vec::new(),
            termination: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// A cloneable handle for workers: printing and registering go through it.
    pub fn gate(&self) -> OutputGate {
        self.gate.clone()
    }

    /// Registers a worker labelled `Thread <id>`; see [`OutputGate::add_source`].
    pub fn add_source(&self, id: impl Display, progress: SharedProgress) -> Result<usize> {
        self.gate.add_source(id, progress)
    }

    pub fn add_labeled(&self, label: impl Into<String>, progress: SharedProgress) -> Result<usize> {
        self.gate.add_labeled(label, progress)
    }

    /// Removes the most recently added worker; see [`OutputGate::remove_source`].
    pub fn remove_source(&self) -> Result<Option<String>> {
        self.gate.remove_source()
    }

    pub fn print_message(&self, message: impl Display) -> Result<()> {
        self.gate.print_message(message)
    }

    pub fn print_fmt(&self, args: fmt::Arguments<'_>) -> Result<()> {
        self.gate.print_fmt(args)
    }

    pub fn registry_stats(&self) -> Result<RegistryStats> {
        self.gate.registry_stats()
    }

    pub fn geometry(&self) -> Result<TerminalGeometry> {
        self.gate.geometry()
    }

    /// Asks the resize watcher to re-query the terminal size.
    ///
    /// Has no effect with a fixed bar width, where no watcher runs.
    pub fn notify_resize(&self) {
        self.resize_trigger.notify_one();
    }

    /// Hides the cursor and spawns the background loops on the current tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            SessionState::Initialized => {}
            SessionState::Running => {
                return Err(ProgressError::AlreadyStarted("session is already running".to_string()))
            }
            SessionState::Finished => {
                return Err(ProgressError::NotInitialized(
                    "session is finished, initialize a new one".to_string(),
                ))
            }
        }
        let runtime = Handle::try_current()
            .map_err(|e| ProgressError::Runtime(format!("no tokio runtime to run the session on: {}", e)))?;
        // handlers are live before the cursor is hidden
        let termination = if self.config.restore_on_signal {
            Some(TerminationGuard::claim(&self.gate)?)
        } else {
            None
        };

        {
            let mut state = self.gate.lock()?;
            state.registry.check()?;
            escape::hide_cursor(state.writer.as_mut())?;
            state.writer.flush()?;
        }

        let renderer = BarRenderer::new(self.config.head, self.config.bar_width);
        self.loops.push((
            "render loop",
            runtime.spawn(renderer::run(
                self.gate.clone(),
                renderer,
                self.config.refresh_rate(),
                self.exit.clone(),
            )),
        ));

        if self.config.bar_width == BarWidth::Terminal {
            let watcher = ResizeWatcher::new(
                self.gate.clone(),
                Arc::clone(&self.probe),
                self.config.resize,
                Arc::clone(&self.resize_trigger),
                self.exit.clone(),
            );
            self.loops.push(("resize watcher", runtime.spawn(watcher.run())));
        }
        self.termination = termination;
        self.state = SessionState::Running;
        log::debug!("[start] session running with {} loops", self.loops.len());
        Ok(())
    }

    /// Stops the loops, draws the final frame, releases the registry and the
    /// fill buffer, and shows the cursor again.
    ///
    /// Calling it again is a no-op. Errors from the loops are reported after
    /// cleanup has completed.
    pub async fn finish(&mut self) -> Result<()> {
        let was_running = match self.state {
            SessionState::Finished => {
                log::debug!("finish called on a finished session, ignoring");
                return Ok(());
            }
            SessionState::Running => true,
            SessionState::Initialized => false,
        };

        self.exit.set();
        let mut first_error = None;
        for (name, handle) in self.loops.drain(..) {
            let error = match handle.await {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(e) => ProgressError::Join {
                    name,
                    reason: e.to_string(),
                },
            };
            log::error!("{} failed: {}", name, error);
            first_error.get_or_insert(error);
        }
        self.state = SessionState::Finished;

        // the termination slot is held until the cursor is back
        let released = self.release(was_running);
        self.termination = None;
        released?;
        log::debug!("session finished");

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn release(&self, show_cursor: bool) -> Result<()> {
        let mut state = self.gate.lock()?;
        state.registry.release();
        state.fill.release();
        if show_cursor {
            escape::show_cursor(state.writer.as_mut())?;
            state.writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state != SessionState::Running {
            return;
        }
        log::warn!("session dropped while running, call finish() to join its loops");
        self.exit.set();
        if let Ok(mut state) = self.gate.lock() {
            let _ = escape::show_cursor(state.writer.as_mut());
            let _ = state.writer.flush();
        }
    }
}
