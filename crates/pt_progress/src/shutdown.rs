use std::sync::Arc;

use tokio::sync::watch;

/// Cooperative exit flag shared by the session and its background loops.
///
/// Loops check it at the top of every iteration and await it at every
/// suspension point; a raise is never missed because it is a value, not an
/// edge.
#[derive(Debug, Clone)]
pub(crate) struct ExitFlag {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl ExitFlag {
    pub(crate) fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    pub(crate) fn set(&self) {
        self.tx.send_replace(true);
    }

    pub(crate) fn is_set(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the flag is raised.
    pub(crate) async fn wait(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}
