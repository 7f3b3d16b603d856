//! Terminal restoration on abrupt termination.
//!
//! A running session hides the cursor. If the process is interrupted the
//! shell would be left without one, so a session can own the process-wide
//! termination slot: when SIGINT, SIGTERM or SIGHUP arrives, the terminal is
//! restored through the owner's output gate before the process exits with the
//! conventional `128 + signo` status.
//!
//! The listener is installed once per process on its own thread and never
//! goes away. Signal dispositions can't be handed back once tokio registered
//! them, so with no owner the listener exits the process itself, which is
//! what the default disposition would have done.

use std::io;
use std::sync::{mpsc, Mutex, PoisonError};
use std::thread;

use crate::errors::{ProgressError, Result};
use crate::gate::OutputGate;
use crate::terminal::escape;

/// Gate of the session currently owning the slot
static OWNER: Mutex<Option<OutputGate>> = Mutex::new(None);
/// Set once the listener thread is running with its handlers registered
static LISTENER_INSTALLED: Mutex<bool> = Mutex::new(false);

/// Ownership of the process-wide termination slot; released on drop.
#[derive(Debug)]
pub(crate) struct TerminationGuard {
    _private: (),
}

impl TerminationGuard {
    /// Claims the slot for `gate`.
    ///
    /// Installs the listener first if needed. Handlers are registered by the
    /// time this returns, so a signal arriving right after is not missed.
    pub(crate) fn claim(gate: &OutputGate) -> Result<Self> {
        install()?;
        let mut owner = OWNER.lock()?;
        if owner.is_some() {
            return Err(ProgressError::AlreadyStarted(
                "another running session already owns the termination handlers".to_string(),
            ));
        }
        *owner = Some(gate.clone());
        Ok(Self { _private: () })
    }
}

impl Drop for TerminationGuard {
    fn drop(&mut self) {
        OWNER.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

fn install() -> Result<()> {
    let mut installed = LISTENER_INSTALLED.lock()?;
    if *installed {
        return Ok(());
    }

    let (ready_tx, ready_rx) = mpsc::channel();
    thread::Builder::new()
        .name("pt-termination".to_string())
        .spawn(move || listen(ready_tx))
        .map_err(|e| ProgressError::Runtime(format!("failed to spawn the termination listener: {}", e)))?;

    match ready_rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            return Err(ProgressError::Runtime(format!(
                "failed to register the termination handlers: {}",
                e
            )))
        }
        Err(_) => {
            return Err(ProgressError::Runtime(
                "termination listener exited before registering its handlers".to_string(),
            ))
        }
    }
    *installed = true;
    log::debug!("[start] termination listener installed");
    Ok(())
}

/// Body of the listener thread. Reports registration through `ready`, then
/// waits for the first termination signal and never returns after it.
fn listen(ready: mpsc::Sender<io::Result<()>>) {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    runtime.block_on(async move {
        let mut signals = match TerminationSignals::register() {
            Ok(signals) => signals,
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };
        let _ = ready.send(Ok(()));
        let status = signals.recv().await;
        terminate(status);
    });
}

fn terminate(status: i32) -> ! {
    let owner = OWNER.lock().unwrap_or_else(PoisonError::into_inner).clone();
    if let Some(gate) = owner {
        log::debug!("termination signal received, restoring the terminal");
        match gate.lock() {
            Ok(mut state) => {
                if let Err(e) = escape::restore(state.writer.as_mut()) {
                    log::error!("[print] failed to restore the terminal: {}", e);
                }
            }
            Err(e) => log::error!("{}", e),
        }
    }
    std::process::exit(status);
}

#[cfg(unix)]
struct TerminationSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    hangup: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl TerminationSignals {
    fn register() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }

    /// Exit status for the first signal received
    async fn recv(&mut self) -> i32 {
        let signo = tokio::select! {
            _ = self.interrupt.recv() => 2,
            _ = self.terminate.recv() => 15,
            _ = self.hangup.recv() => 1,
        };
        128 + signo
    }
}

#[cfg(not(unix))]
struct TerminationSignals;

#[cfg(not(unix))]
impl TerminationSignals {
    fn register() -> io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> i32 {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
        130
    }
}
