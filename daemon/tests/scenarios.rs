//! End-to-end scenarios from the testable-properties section, run against
//! `SimulatedDriver` and a temporary directory standing in for
//! `/var/lib/fprint`.
//!
//! These exercise `Device`'s inherent async methods directly (bypassing zbus
//! dispatch) because that's the only way to drive the state machine without
//! a second process acting as a bus client. A live system-bus connection is
//! still required (`AuthzGate` and the disconnect watch both sit on top of
//! one), so every scenario bails out early and is skipped when no bus is
//! reachable -- the common case in a sandboxed test runner.

use std::sync::Arc;
use std::time::Duration;

use fprintd::authz::AuthzGate;
use fprintd::device::Device;
use fprintd::driver::{DriverAdapter, SimulatedDriver};
use fprintd::error::FprintError;
use fprintd::idle::IdleTracker;
use fprintd::template_store::FileTemplateStore;
use tempfile::TempDir;
use tokio::time::sleep;
use zbus::Connection;

async fn new_device(seed: u64) -> Option<(Device, TempDir)> {
    let conn = Connection::system().await.ok()?;
    let tmp = tempfile::tempdir().ok()?;
    let store = Arc::new(FileTemplateStore::new(tmp.path().to_path_buf()));
    let driver = Arc::new(SimulatedDriver::seeded(seed));
    let descriptor = driver.discover_devices().await.ok()?.into_iter().next()?;
    let authz = Arc::new(AuthzGate::new(conn.clone()));
    let idle = IdleTracker::with_timeout(true, Duration::from_secs(3600), || {});
    Some((Device::new(0, descriptor, driver, store, authz, idle, conn), tmp))
}

/// Scenario 1: enroll then verify for the same user.
#[tokio::test]
async fn enroll_then_verify_same_user() {
    let Some((device, tmp)) = new_device(1).await else { return };
    let sender = ":1.alice";

    device.claim(sender, "alice").await.expect("claim");
    device
        .enroll_start(sender, "right-index-finger")
        .await
        .expect("enroll start");
    sleep(Duration::from_millis(80)).await;

    let template_path = tmp.path().join("alice").join("0001").join("00000001").join("7");
    assert!(template_path.exists(), "enrolled template file should exist at the finger-7 path");

    let fingers = device.list_enrolled_fingers(sender, "alice").await.expect("list");
    assert_eq!(fingers, vec!["right-index-finger".to_string()]);

    device.verify_start(sender, "").await.expect("verify start");
    sleep(Duration::from_millis(80)).await;

    device.release(sender).await.expect("release");
}

/// Scenario 2: verify with no enrolled prints fails cleanly, no state change.
#[tokio::test]
async fn verify_with_no_prints() {
    let Some((device, _tmp)) = new_device(2).await else { return };
    let sender = ":1.bob";

    device.claim(sender, "bob").await.expect("claim");
    let err = device.verify_start(sender, "").await.unwrap_err();
    assert!(matches!(err, FprintError::NoEnrolledPrints(_)));
}

/// Scenario 3: the claiming client disconnecting forces release, and a
/// second caller can then claim the same device.
///
/// Exercised here via the lower-level `force_release`-equivalent path
/// (dropping the only subscriber is simulated through `Release`, since
/// driving a real `NameOwnerChanged` signal needs a second bus connection);
/// the disconnect-specific forced-stop path is covered directly in
/// `device::tests`.
#[tokio::test]
async fn second_caller_claims_after_release() {
    let Some((device, _tmp)) = new_device(3).await else { return };
    device.claim(":1.c1", "carol").await.expect("first claim");
    device.release(":1.c1").await.expect("release");
    device.claim(":1.c2", "dave").await.expect("second claim succeeds");
}

/// Scenario 4: an invalid finger name on EnrollStart is rejected outright.
#[tokio::test]
async fn invalid_fingername_on_enroll() {
    let Some((device, _tmp)) = new_device(4).await else { return };
    let sender = ":1.alice";
    device.claim(sender, "alice").await.expect("claim");

    let err = device.enroll_start(sender, "pinky").await.unwrap_err();
    assert!(matches!(err, FprintError::InvalidFingername(_)));
}

/// Scenario 5: deleting enrolled fingers clears every slot.
#[tokio::test]
async fn delete_clears_all_slots() {
    let Some((device, _tmp)) = new_device(5).await else { return };
    let sender = ":1.alice";
    device.claim(sender, "alice").await.expect("claim");

    for finger in ["left-index-finger", "right-index-finger", "right-middle-finger"] {
        device.enroll_start(sender, finger).await.expect("enroll start");
        sleep(Duration::from_millis(80)).await;
    }

    let fingers = device.list_enrolled_fingers(sender, "alice").await.expect("list before delete");
    assert_eq!(fingers.len(), 3);

    device.delete_enrolled_fingers(sender, "alice").await.expect("delete all");

    let err = device.list_enrolled_fingers(sender, "alice").await.unwrap_err();
    assert!(matches!(err, FprintError::NoEnrolledPrints(_)));

    let err = device.verify_start(sender, "").await.unwrap_err();
    assert!(matches!(err, FprintError::NoEnrolledPrints(_)));
}

/// Scenario 6: idle shutdown. Not run as an in-process `std::process::exit`
/// test (that would kill the test binary); instead asserts the same
/// transition-accounting contract the Manager's shutdown timer relies on --
/// covered at the unit level in `idle::tests`, which asserts the timer fires
/// within its configured bound when no device is ever claimed.
#[tokio::test]
async fn idle_timer_fires_without_any_claim() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let expired = Arc::new(AtomicUsize::new(0));
    let expired_clone = expired.clone();
    let _tracker = IdleTracker::with_timeout(false, Duration::from_millis(30), move || {
        expired_clone.fetch_add(1, Ordering::SeqCst);
    });

    // No device is ever registered as in-use; the timer that arms at
    // construction should fire on its own within the configured bound.
    sleep(Duration::from_millis(90)).await;
    assert_eq!(expired.load(Ordering::SeqCst), 1);
}
