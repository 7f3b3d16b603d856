//! Terminal resize handling.
//!
//! The watcher is a background task that sleeps until something suggests the
//! geometry changed: SIGWINCH, a poll interval, or an explicit
//! [`Session::notify_resize`](crate::Session::notify_resize). It then re-queries
//! the probe and, only if the width really differs, rebuilds the fill buffer
//! and updates the geometry while holding the output gate. A render pass can
//! therefore never see the new width together with the old buffer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::config::{ResizeStrategy, DEFAULT_POLL_INTERVAL_MS};
use crate::errors::Result;
use crate::gate::{GateState, OutputGate};
use crate::shutdown::ExitFlag;
use crate::terminal::GeometryProbe;

/// Delay before retrying a fill buffer that could not be reallocated
const RETRY_INTERVAL: Duration = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResizeOutcome {
    Unchanged,
    Resized { from: u16, to: u16 },
    /// The fill buffer could not be rebuilt; the old width stays in effect
    Deferred,
}

/// Applies a freshly probed size to the gate state.
pub(crate) fn apply_size(state: &mut GateState, (width, height): (u16, u16)) -> ResizeOutcome {
    if width == state.geometry.width {
        state.geometry.update(width, height);
        return ResizeOutcome::Unchanged;
    }
    if let Err(e) = state.fill.resize(usize::from(width)) {
        log::warn!(
            "[resize] failed to resize the fill buffer to {} columns, keeping {}: {}",
            width,
            state.geometry.width,
            e
        );
        return ResizeOutcome::Deferred;
    }
    let from = state.geometry.width;
    state.geometry.update(width, height);
    ResizeOutcome::Resized { from, to: width }
}

pub(crate) struct ResizeWatcher {
    gate: OutputGate,
    probe: Arc<dyn GeometryProbe>,
    strategy: ResizeStrategy,
    trigger: Arc<Notify>,
    exit: ExitFlag,
}

impl ResizeWatcher {
    pub(crate) fn new(
        gate: OutputGate,
        probe: Arc<dyn GeometryProbe>,
        strategy: ResizeStrategy,
        trigger: Arc<Notify>,
        exit: ExitFlag,
    ) -> Self {
        Self {
            gate,
            probe,
            strategy,
            trigger,
            exit,
        }
    }

    /// Re-queries the probe and applies the result.
    pub(crate) fn refresh(&self) -> Result<ResizeOutcome> {
        let size = match self.probe.size() {
            Ok((0, _)) => {
                log::debug!("[resize] probe reported a zero width, ignoring");
                return Ok(ResizeOutcome::Unchanged);
            }
            Ok(size) => size,
            Err(e) => {
                log::debug!("[resize] failed to query the terminal size: {}", e);
                return Ok(ResizeOutcome::Unchanged);
            }
        };
        let mut state = self.gate.lock()?;
        let outcome = apply_size(&mut state, size);
        if let ResizeOutcome::Resized { from, to } = outcome {
            log::debug!("[resize] terminal width changed from {} to {}", from, to);
        }
        Ok(outcome)
    }

    pub(crate) async fn run(self) -> Result<()> {
        let mut exit = self.exit.clone();
        let mut signal = match self.strategy {
            ResizeStrategy::Signal => resize_signal(),
            _ => None,
        };
        let poll = match (self.strategy, signal.is_some()) {
            (ResizeStrategy::Poll { interval_ms }, _) => Some(Duration::from_millis(interval_ms)),
            (ResizeStrategy::Signal, false) => {
                log::debug!("[resize] SIGWINCH unavailable, polling instead");
                Some(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS))
            }
            _ => None,
        };
        log::debug!("resize watcher started ({:?})", self.strategy);

        let mut retry = false;
        while !exit.is_set() {
            let timer = if retry { Some(RETRY_INTERVAL) } else { poll };
            tokio::select! {
                _ = exit.wait() => break,
                _ = self.trigger.notified() => {}
                _ = next_resize(&mut signal) => {}
                _ = sleep_for(timer) => {}
            }
            if exit.is_set() {
                break;
            }
            // wakes may be spurious; refresh compares against the stored width
            retry = self.refresh()? == ResizeOutcome::Deferred;
        }
        log::debug!("resize watcher stopped");
        Ok(())
    }
}

async fn sleep_for(duration: Option<Duration>) {
    match duration {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}

#[cfg(unix)]
type ResizeSignal = tokio::signal::unix::Signal;
#[cfg(not(unix))]
type ResizeSignal = ();

#[cfg(unix)]
fn resize_signal() -> Option<ResizeSignal> {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::window_change()) {
        Ok(signal) => Some(signal),
        Err(e) => {
            log::warn!("[resize] failed to register for SIGWINCH: {}", e);
            None
        }
    }
}

#[cfg(not(unix))]
fn resize_signal() -> Option<ResizeSignal> {
    None
}

#[cfg(unix)]
async fn next_resize(signal: &mut Option<ResizeSignal>) {
    match signal {
        Some(signal) => {
            if signal.recv().await.is_none() {
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending().await,
    }
}

#[cfg(not(unix))]
async fn next_resize(_signal: &mut Option<ResizeSignal>) {
    std::future::pending().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fill::FillBuffer;
    use crate::registry::Registry;
    use crate::terminal::test_helpers::{with_timeout, SharedBuffer};
    use crate::terminal::{ManualProbe, TerminalGeometry};

    fn gate(width: u16) -> OutputGate {
        OutputGate::new(GateState {
            registry: Registry::new().unwrap(),
            geometry: TerminalGeometry::new(width, 24),
            fill: FillBuffer::new('=', usize::from(width)),
            writer: Box::new(SharedBuffer::new()),
        })
    }

    #[test]
    fn test_apply_size_rebuilds_fill_with_geometry() {
        let gate = gate(80);
        let mut state = gate.lock().unwrap();
        assert_eq!(apply_size(&mut state, (80, 30)), ResizeOutcome::Unchanged);
        assert_eq!(state.geometry.height, 30);

        assert_eq!(
            apply_size(&mut state, (40, 30)),
            ResizeOutcome::Resized { from: 80, to: 40 }
        );
        assert_eq!(state.fill.width(), 40);
        assert_eq!(state.geometry.width, 40);
        assert_eq!(state.geometry.previous_width, 80);
    }

    #[test]
    fn test_refresh_ignores_unchanged_and_zero_width() {
        let gate = gate(80);
        let probe = ManualProbe::new(80, 24);
        let watcher = ResizeWatcher::new(
            gate.clone(),
            Arc::new(probe.clone()),
            ResizeStrategy::Disabled,
            Arc::new(Notify::new()),
            ExitFlag::new(),
        );
        assert_eq!(watcher.refresh().unwrap(), ResizeOutcome::Unchanged);

        probe.set_size(0, 0);
        assert_eq!(watcher.refresh().unwrap(), ResizeOutcome::Unchanged);
        assert_eq!(gate.fill_width().unwrap(), 80);

        probe.set_size(100, 24);
        assert_eq!(
            watcher.refresh().unwrap(),
            ResizeOutcome::Resized { from: 80, to: 100 }
        );
        assert_eq!(gate.fill_width().unwrap(), 100);
    }

    #[tokio::test]
    async fn test_trigger_wakes_watcher() {
        let gate = gate(80);
        let probe = ManualProbe::new(80, 24);
        let trigger = Arc::new(Notify::new());
        let exit = ExitFlag::new();
        let watcher = ResizeWatcher::new(
            gate.clone(),
            Arc::new(probe.clone()),
            ResizeStrategy::Disabled,
            Arc::clone(&trigger),
            exit.clone(),
        );
        let handle = tokio::spawn(watcher.run());

        probe.set_size(40, 24);
        trigger.notify_one();
        with_timeout(
            async {
                while gate.geometry().unwrap().width != 40 {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            },
            5,
        )
        .await;
        assert_eq!(gate.fill_width().unwrap(), 40);

        exit.set();
        with_timeout(handle, 5).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_poll_strategy_picks_up_changes() {
        let gate = gate(80);
        let probe = ManualProbe::new(80, 24);
        let exit = ExitFlag::new();
        let watcher = ResizeWatcher::new(
            gate.clone(),
            Arc::new(probe.clone()),
            ResizeStrategy::Poll { interval_ms: 5 },
            Arc::new(Notify::new()),
            exit.clone(),
        );
        let handle = tokio::spawn(watcher.run());

        probe.set_size(120, 40);
        with_timeout(
            async {
                while gate.geometry().unwrap().width != 120 {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            },
            5,
        )
        .await;

        exit.set();
        with_timeout(handle, 5).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_exit_wakes_blocked_watcher() {
        let exit = ExitFlag::new();
        let watcher = ResizeWatcher::new(
            gate(80),
            Arc::new(ManualProbe::new(80, 24)),
            ResizeStrategy::Signal,
            Arc::new(Notify::new()),
            exit.clone(),
        );
        let handle = tokio::spawn(watcher.run());
        tokio::time::sleep(Duration::from_millis(10)).await;
        exit.set();
        with_timeout(handle, 5).await.unwrap().unwrap();
    }
}
