//! Process-wide idle-timeout accounting, shared by every [`crate::device::Device`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::event_loop::Timer;

const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Tracks which devices are currently `in-use` and arms/disarms a 30-second
/// shutdown timer whenever that set becomes empty or non-empty.
pub struct IdleTracker {
    in_use: Mutex<HashSet<u32>>,
    timer: Mutex<Option<Timer>>,
    no_timeout: bool,
    timeout: Duration,
    on_expire: Arc<dyn Fn() + Send + Sync>,
}

impl IdleTracker {
    /// `no_timeout` mirrors the daemon's `--no-timeout`/`-t` flag: when set,
    /// the idle timer never arms.
    pub fn new(no_timeout: bool) -> Arc<Self> {
        Self::with_timeout(no_timeout, IDLE_TIMEOUT, || std::process::exit(0))
    }

    pub fn with_timeout(
        no_timeout: bool,
        timeout: Duration,
        on_expire: impl Fn() + Send + Sync + 'static,
    ) -> Arc<Self> {
        let tracker = Arc::new(Self {
            in_use: Mutex::new(HashSet::new()),
            timer: Mutex::new(None),
            no_timeout,
            timeout,
            on_expire: Arc::new(on_expire),
        });
        // No device has ever been claimed yet, which is itself a
        // transition-to-empty: arm the same as any later 1->0 edge would.
        tracker.arm();
        tracker
    }

    /// Record device `device_id`'s `in-use` transition. Arms the shutdown
    /// timer on a transition to all-idle, cancels it on any transition away
    /// from all-idle.
    pub fn set_in_use(self: &Arc<Self>, device_id: u32, in_use: bool) {
        let mut set = self.in_use.lock().expect("idle tracker poisoned");
        let was_empty = set.is_empty();
        if in_use {
            set.insert(device_id);
        } else {
            set.remove(&device_id);
        }
        let now_empty = set.is_empty();
        drop(set);

        if now_empty && !was_empty {
            self.arm();
        } else if !now_empty && was_empty {
            self.disarm();
        }
    }

    fn arm(self: &Arc<Self>) {
        if self.no_timeout {
            return;
        }
        log::debug!("all devices idle, arming {}s shutdown timer", self.timeout.as_secs());
        let on_expire = self.on_expire.clone();
        let timer = Timer::schedule(self.timeout, async move {
            log::info!("idle timeout reached, shutting down");
            on_expire();
        });
        *self.timer.lock().expect("idle tracker poisoned") = Some(timer);
    }

    fn disarm(&self) {
        if let Some(timer) = self.timer.lock().expect("idle tracker poisoned").take() {
            log::debug!("device became active, cancelling shutdown timer");
            timer.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    #[tokio::test]
    async fn arms_on_transition_to_empty() {
        let expired = Arc::new(AtomicUsize::new(0));
        let expired_clone = expired.clone();
        let tracker = IdleTracker::with_timeout(false, StdDuration::from_millis(20), move || {
            expired_clone.fetch_add(1, Ordering::SeqCst);
        });

        tracker.set_in_use(1, true);
        tracker.set_in_use(1, false);
        tokio::time::sleep(StdDuration::from_millis(60)).await;
        assert_eq!(expired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reactivation_cancels_timer() {
        let expired = Arc::new(AtomicUsize::new(0));
        let expired_clone = expired.clone();
        let tracker = IdleTracker::with_timeout(false, StdDuration::from_millis(20), move || {
            expired_clone.fetch_add(1, Ordering::SeqCst);
        });

        tracker.set_in_use(1, true);
        tracker.set_in_use(1, false);
        tracker.set_in_use(2, true);
        tokio::time::sleep(StdDuration::from_millis(60)).await;
        assert_eq!(expired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn no_timeout_flag_suppresses_arm() {
        let expired = Arc::new(AtomicUsize::new(0));
        let expired_clone = expired.clone();
        let tracker = IdleTracker::with_timeout(true, StdDuration::from_millis(20), move || {
            expired_clone.fetch_add(1, Ordering::SeqCst);
        });

        tracker.set_in_use(1, true);
        tracker.set_in_use(1, false);
        tokio::time::sleep(StdDuration::from_millis(60)).await;
        assert_eq!(expired.load(Ordering::SeqCst), 0);
    }
}
