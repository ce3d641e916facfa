//! Thin, language-neutral interface over the biometric driver library.
//!
//! Real hardware access (libfprint or similar) is explicitly out of scope;
//! [`SimulatedDriver`] is the in-process reference implementation used both
//! by the daemon when no native driver is configured and by the test suite.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::error::{FprintError, Result};
use crate::finger::Finger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanType {
    Press,
    Swipe,
}

impl ScanType {
    pub fn wire_name(self) -> &'static str {
        match self {
            ScanType::Press => "press",
            ScanType::Swipe => "swipe",
        }
    }
}

/// Static identity of a discovered device, known before it's opened.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    pub driver_id: u16,
    pub device_type: u32,
    pub name: String,
    pub scan_type: ScanType,
    pub supports_identify: bool,
    pub enroll_stages: u32,
}

/// Opaque handle to an opened device, returned by [`DriverAdapter::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollEvent {
    StagePassed,
    Completed(Vec<u8>),
    Failed,
    RetryScan,
    SwipeTooShort,
    FingerNotCentered,
    RemoveAndRetry,
    UnknownError,
}

impl EnrollEvent {
    /// Wire code string as defined in the data model; `done` discipline is
    /// enforced by the caller, not encoded here.
    pub fn wire_code(&self) -> &'static str {
        match self {
            EnrollEvent::StagePassed => "enroll-stage-passed",
            EnrollEvent::Completed(_) => "enroll-completed",
            EnrollEvent::Failed => "enroll-failed",
            EnrollEvent::RetryScan => "enroll-retry-scan",
            EnrollEvent::SwipeTooShort => "enroll-swipe-too-short",
            EnrollEvent::FingerNotCentered => "enroll-finger-not-centered",
            EnrollEvent::RemoveAndRetry => "enroll-remove-and-retry",
            EnrollEvent::UnknownError => "enroll-unknown-error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EnrollEvent::Completed(_) | EnrollEvent::Failed | EnrollEvent::UnknownError
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyEvent {
    Match,
    NoMatch,
    RetryScan,
    SwipeTooShort,
    FingerNotCentered,
    RemoveAndRetry,
    UnknownError,
}

impl VerifyEvent {
    pub fn wire_code(self) -> &'static str {
        match self {
            VerifyEvent::Match => "verify-match",
            VerifyEvent::NoMatch => "verify-no-match",
            VerifyEvent::RetryScan => "verify-retry-scan",
            VerifyEvent::SwipeTooShort => "verify-swipe-too-short",
            VerifyEvent::FingerNotCentered => "verify-finger-not-centered",
            VerifyEvent::RemoveAndRetry => "verify-remove-and-retry",
            VerifyEvent::UnknownError => "verify-unknown-error",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, VerifyEvent::Match | VerifyEvent::NoMatch | VerifyEvent::UnknownError)
    }
}

/// Like [`VerifyEvent`] but a `Match` also names which gallery entry hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifyEvent {
    Match(Finger),
    NoMatch,
    RetryScan,
    SwipeTooShort,
    FingerNotCentered,
    RemoveAndRetry,
    UnknownError,
}

impl IdentifyEvent {
    pub fn wire_code(&self) -> &'static str {
        match self {
            IdentifyEvent::Match(_) => "verify-match",
            IdentifyEvent::NoMatch => "verify-no-match",
            IdentifyEvent::RetryScan => "verify-retry-scan",
            IdentifyEvent::SwipeTooShort => "verify-swipe-too-short",
            IdentifyEvent::FingerNotCentered => "verify-finger-not-centered",
            IdentifyEvent::RemoveAndRetry => "verify-remove-and-retry",
            IdentifyEvent::UnknownError => "verify-unknown-error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            IdentifyEvent::Match(_) | IdentifyEvent::NoMatch | IdentifyEvent::UnknownError
        )
    }
}

/// Channel capacity for driver event streams; generous enough that a
/// multi-stage enroll never blocks the simulated driver's producer task.
const EVENT_CHANNEL_CAPACITY: usize = 16;

#[async_trait]
pub trait DriverAdapter: Send + Sync {
    async fn discover_devices(&self) -> Result<Vec<DeviceDescriptor>>;
    async fn open(&self, descriptor: &DeviceDescriptor) -> Result<DeviceHandle>;
    async fn close(&self, handle: DeviceHandle) -> Result<()>;

    async fn enroll_start(&self, handle: DeviceHandle) -> Result<mpsc::Receiver<EnrollEvent>>;
    async fn enroll_stop(&self, handle: DeviceHandle) -> Result<()>;

    async fn verify_start(&self, handle: DeviceHandle, template: Vec<u8>) -> Result<mpsc::Receiver<VerifyEvent>>;
    async fn verify_stop(&self, handle: DeviceHandle) -> Result<()>;

    async fn identify_start(
        &self,
        handle: DeviceHandle,
        gallery: Vec<(Finger, Vec<u8>)>,
    ) -> Result<mpsc::Receiver<IdentifyEvent>>;
    async fn identify_stop(&self, handle: DeviceHandle) -> Result<()>;
}

/// Deterministic, hardware-free stand-in for a real biometric driver.
///
/// Produces a scripted sequence when one is configured for a handle, or a
/// seeded pseudo-random sequence otherwise. Never touches wall-clock time or
/// the OS RNG directly from `verify`/`enroll`/`identify` paths, so scripted
/// and seeded runs are fully reproducible.
pub struct SimulatedDriver {
    next_handle: AtomicU64,
    rng: Mutex<StdRng>,
}

impl SimulatedDriver {
    /// Construct with a fixed seed, for deterministic tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Single always-present descriptor: a press-scan device that supports
    /// identify, matching the "enroll then verify" scenario's defaults.
    fn descriptor() -> DeviceDescriptor {
        DeviceDescriptor {
            driver_id: 0x0001,
            device_type: 0x00000001,
            name: "Simulated Fingerprint Reader".to_string(),
            scan_type: ScanType::Press,
            supports_identify: true,
            enroll_stages: 5,
        }
    }

    /// A template the simulated driver will always report as a match against
    /// itself: bytes are irrelevant, only presence/absence matters.
    fn synth_template(rng: &mut StdRng) -> Vec<u8> {
        (0..32).map(|_| rng.random::<u8>()).collect()
    }
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }
}

#[async_trait]
impl DriverAdapter for SimulatedDriver {
    async fn discover_devices(&self) -> Result<Vec<DeviceDescriptor>> {
        Ok(vec![Self::descriptor()])
    }

    async fn open(&self, _descriptor: &DeviceDescriptor) -> Result<DeviceHandle> {
        let id = self.next_handle.fetch_add(1, Ordering::SeqCst);
        Ok(DeviceHandle(id))
    }

    async fn close(&self, _handle: DeviceHandle) -> Result<()> {
        Ok(())
    }

    async fn enroll_start(&self, _handle: DeviceHandle) -> Result<mpsc::Receiver<EnrollEvent>> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let stages = Self::descriptor().enroll_stages;
        let template = {
            let mut rng = self.rng.lock().expect("rng mutex poisoned");
            Self::synth_template(&mut rng)
        };
        tokio::spawn(async move {
            for _ in 1..stages {
                if tx.send(EnrollEvent::StagePassed).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(EnrollEvent::Completed(template)).await;
        });
        Ok(rx)
    }

    async fn enroll_stop(&self, _handle: DeviceHandle) -> Result<()> {
        Ok(())
    }

    async fn verify_start(&self, _handle: DeviceHandle, template: Vec<u8>) -> Result<mpsc::Receiver<VerifyEvent>> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let result = if template.is_empty() {
            VerifyEvent::UnknownError
        } else {
            VerifyEvent::Match
        };
        tokio::spawn(async move {
            let _ = tx.send(result).await;
        });
        Ok(rx)
    }

    async fn verify_stop(&self, _handle: DeviceHandle) -> Result<()> {
        Ok(())
    }

    async fn identify_start(
        &self,
        _handle: DeviceHandle,
        gallery: Vec<(Finger, Vec<u8>)>,
    ) -> Result<mpsc::Receiver<IdentifyEvent>> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let result = match gallery.into_iter().next() {
            Some((finger, _)) => IdentifyEvent::Match(finger),
            None => IdentifyEvent::NoMatch,
        };
        tokio::spawn(async move {
            let _ = tx.send(result).await;
        });
        Ok(rx)
    }

    async fn identify_stop(&self, _handle: DeviceHandle) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn discover_returns_one_device() {
        let driver = SimulatedDriver::seeded(1);
        let devices = driver.discover_devices().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert!(devices[0].supports_identify);
    }

    #[tokio::test]
    async fn enroll_reports_stages_then_completes() {
        let driver = SimulatedDriver::seeded(42);
        let descriptor = SimulatedDriver::descriptor();
        let handle = driver.open(&descriptor).await.unwrap();
        let mut rx = driver.enroll_start(handle).await.unwrap();

        let mut saw_stage_passed = false;
        loop {
            match rx.recv().await.expect("stream ended without terminal event") {
                EnrollEvent::StagePassed => saw_stage_passed = true,
                EnrollEvent::Completed(template) => {
                    assert!(!template.is_empty());
                    break;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert!(saw_stage_passed);
    }

    #[tokio::test]
    async fn verify_matches_nonempty_template() {
        let driver = SimulatedDriver::seeded(7);
        let handle = driver.open(&SimulatedDriver::descriptor()).await.unwrap();
        let mut rx = driver.verify_start(handle, vec![1, 2, 3]).await.unwrap();
        assert_eq!(rx.recv().await, Some(VerifyEvent::Match));
    }

    #[tokio::test]
    async fn identify_picks_first_gallery_entry() {
        let driver = SimulatedDriver::seeded(7);
        let handle = driver.open(&SimulatedDriver::descriptor()).await.unwrap();
        let gallery = vec![(Finger::RightIndex, vec![9, 9, 9])];
        let mut rx = driver.identify_start(handle, gallery).await.unwrap();
        assert_eq!(rx.recv().await, Some(IdentifyEvent::Match(Finger::RightIndex)));
    }

    #[tokio::test]
    async fn identify_empty_gallery_is_no_match() {
        let driver = SimulatedDriver::seeded(7);
        let handle = driver.open(&SimulatedDriver::descriptor()).await.unwrap();
        let mut rx = driver.identify_start(handle, Vec::new()).await.unwrap();
        assert_eq!(rx.recv().await, Some(IdentifyEvent::NoMatch));
    }
}
