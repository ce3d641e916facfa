//! The single-threaded reactor the whole daemon runs on.
//!
//! Everything — method dispatch, driver callbacks, bus I/O, timers — is
//! driven by one current-thread Tokio runtime, so per-device state never
//! needs a `Mutex` held across an `.await`.

use std::time::Duration;

use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;

/// Build the daemon's single-threaded runtime.
pub fn build_runtime() -> std::io::Result<Runtime> {
    Builder::new_current_thread().enable_all().build()
}

/// A cancellable delayed action, used for the PAM-side verify timeout and
/// the Manager's idle-timeout. Dropping or calling [`Timer::cancel`] aborts
/// the underlying task before it fires.
pub struct Timer {
    handle: JoinHandle<()>,
}

impl Timer {
    /// Schedule `on_fire` to run after `duration`, on this runtime.
    pub fn schedule<F>(duration: Duration, on_fire: F) -> Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            on_fire.await;
        });
        Timer { handle }
    }

    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn timer_fires_after_duration() {
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = fired.clone();
        let _timer = Timer::schedule(Duration::from_millis(10), async move {
            fired_clone.store(true, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn cancel_prevents_fire() {
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = fired.clone();
        let timer = Timer::schedule(Duration::from_millis(20), async move {
            fired_clone.store(true, Ordering::SeqCst);
        });
        timer.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
