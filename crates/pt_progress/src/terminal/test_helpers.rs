// Helpers shared by the unit tests, the integration tests and the benches
use std::future::Future;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use super::TestEnv;

static LOGGING: Once = Once::new();

/// Routes `log` output of the library to the test harness.
///
/// `RUST_LOG` controls the level; repeated calls are harmless.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Runs an async test body with a timeout, panicking when it is exceeded.
///
/// Keeps a stuck background loop from hanging the whole test run.
pub async fn with_timeout<F, T>(test_fn: F, timeout_secs: u64) -> T
where
    F: Future<Output = T>,
{
    let timeout_secs = timeout_secs.min(60);
    match tokio::time::timeout(Duration::from_secs(timeout_secs), test_fn).await {
        Ok(result) => result,
        Err(_) => panic!("Test timed out after {} seconds", timeout_secs),
    }
}

/// A cloneable in-memory writer. Every clone appends to the same buffer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Everything written so far, lossily decoded
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes()).into_owned()
    }

    /// Replays the captured output into a fresh virtual terminal
    pub fn screen(&self, width: u16, height: u16) -> TestEnv {
        let mut env = TestEnv::new(width, height);
        env.process(&self.bytes());
        env
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
