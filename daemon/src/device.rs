//! Per-device claim lifecycle, action state machine, and IPC surface.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use zbus::object_server::SignalEmitter;
use zbus::zvariant::OwnedObjectPath;
use zbus::Connection;

use crate::authz::{Action as PolicyAction, AuthzGate};
use crate::driver::{DeviceDescriptor, DeviceHandle, DriverAdapter, EnrollEvent, IdentifyEvent, VerifyEvent};
use crate::error::{FprintError, Result};
use crate::finger::{Finger, FingerSelector};
use crate::idle::IdleTracker;
use crate::template_store::{DeviceIdentity, TemplateStore};

/// What the device is doing right now, if anything.
enum RunningAction {
    Verify { done: Arc<AtomicBool> },
    Identify { done: Arc<AtomicBool> },
    Enroll { target: Finger, done: Arc<AtomicBool> },
}

impl RunningAction {
    fn kind_str(&self) -> &'static str {
        match self {
            RunningAction::Verify { .. } => "verify",
            RunningAction::Identify { .. } => "identify",
            RunningAction::Enroll { .. } => "enroll",
        }
    }
}

struct Claim {
    owner: String,
    username: String,
    handle: DeviceHandle,
    action: Option<RunningAction>,
}

struct State {
    subscribers: HashSet<String>,
    claim: Option<Claim>,
}

/// A fingerprint device, addressable on the bus at
/// `/net/reactivated/Fprint/Device/<id>`.
///
/// Interior state lives behind a `tokio::sync::Mutex` so the object can be
/// cloned cheaply and mutated both from zbus method dispatch and from the
/// background tasks that forward driver events into signals; the daemon's
/// single-threaded runtime means this mutex is never contended.
#[derive(Clone)]
pub struct Device {
    pub id: u32,
    pub descriptor: DeviceDescriptor,
    driver: Arc<dyn DriverAdapter>,
    store: Arc<dyn TemplateStore>,
    authz: Arc<AuthzGate>,
    idle: Arc<IdleTracker>,
    conn: Connection,
    path: OwnedObjectPath,
    state: Arc<Mutex<State>>,
}

impl Device {
    pub fn new(
        id: u32,
        descriptor: DeviceDescriptor,
        driver: Arc<dyn DriverAdapter>,
        store: Arc<dyn TemplateStore>,
        authz: Arc<AuthzGate>,
        idle: Arc<IdleTracker>,
        conn: Connection,
    ) -> Self {
        let path = OwnedObjectPath::try_from(format!("/net/reactivated/Fprint/Device/{id}"))
            .expect("device path is a valid object path");
        Self {
            id,
            descriptor,
            driver,
            store,
            authz,
            idle,
            conn,
            path,
            state: Arc::new(Mutex::new(State {
                subscribers: HashSet::new(),
                claim: None,
            })),
        }
    }

    pub fn path(&self) -> &OwnedObjectPath {
        &self.path
    }

    fn identity(&self) -> DeviceIdentity {
        DeviceIdentity {
            driver_id: self.descriptor.driver_id,
            device_type: self.descriptor.device_type,
        }
    }

    fn emitter(&self) -> Result<SignalEmitter<'static>> {
        SignalEmitter::new(self.conn.clone(), self.path.clone())
            .map_err(|e| FprintError::internal(format!("building signal emitter: {e}")))
    }

    /// Record `sender` as a subscriber of this device, watching for its
    /// disconnect the first time it's seen. Flips `in-use` on the 0→1 edge
    /// and emits its property-change notification before returning, so it
    /// always precedes the method reply that caused it.
    async fn track_subscriber(&self, sender: &str) {
        let became_in_use = {
            let mut state = self.state.lock().expect("device state poisoned");
            let was_empty = state.subscribers.is_empty();
            let newly_seen = state.subscribers.insert(sender.to_string());
            newly_seen && was_empty
        };
        if became_in_use {
            self.idle.set_in_use(self.id, true);
            self.notify_in_use_changed().await;
            self.spawn_disconnect_watch(sender.to_string());
        }
    }

    /// Emit the `in-use` `PropertiesChanged` notification. Logged and
    /// swallowed on failure, like every other signal emission in this
    /// module — it must never fail the call that triggered it.
    async fn notify_in_use_changed(&self) {
        let Ok(emitter) = self.emitter() else { return };
        if let Err(e) = self.in_use_prop_changed(&emitter).await {
            log::warn!("failed to emit in-use property change for device {}: {e}", self.id);
        }
    }

    fn spawn_disconnect_watch(&self, sender: String) {
        let device = self.clone();
        tokio::spawn(async move {
            let dbus = match zbus::fdo::DBusProxy::new(&device.conn).await {
                Ok(proxy) => proxy,
                Err(e) => {
                    log::warn!("could not watch {sender} for disconnect: {e}");
                    return;
                }
            };
            let Ok(mut changes) = dbus.receive_name_owner_changed().await else {
                return;
            };
            while let Some(signal) = changes.next().await {
                let Ok(args) = signal.args() else { continue };
                if args.name() == sender.as_str() && args.new_owner().as_ref().is_none() {
                    device.authz.evict(&sender);
                    device.on_subscriber_gone(&sender).await;
                    break;
                }
            }
        });
    }

    async fn on_subscriber_gone(&self, sender: &str) {
        let now_empty = {
            let mut state = self.state.lock().expect("device state poisoned");
            state.subscribers.remove(sender);
            state.subscribers.is_empty()
        };
        if now_empty {
            self.idle.set_in_use(self.id, false);
            self.notify_in_use_changed().await;
        }

        let was_owner = self
            .state
            .lock()
            .expect("device state poisoned")
            .claim
            .as_ref()
            .map(|c| c.owner == sender)
            .unwrap_or(false);

        if was_owner {
            log::info!("device {} owner {sender} disconnected, forcing release", self.id);
            if let Err(e) = self.force_release().await {
                log::error!("forced release of device {} failed: {e}", self.id);
            }
        }
    }

    /// Synchronously stop any running action and close the driver handle.
    /// Used on owner disconnect; must always leave the device in Idle.
    async fn force_release(&self) -> Result<()> {
        let (handle, action_kind) = {
            let mut state = self.state.lock().expect("device state poisoned");
            match state.claim.take() {
                Some(claim) => (claim.handle, claim.action.map(|a| a.kind_str())),
                None => return Ok(()),
            }
        };

        if let Some(kind) = action_kind {
            let stop_result = match kind {
                "verify" | "identify" => self.driver.verify_stop(handle).await,
                "enroll" => self.driver.enroll_stop(handle).await,
                _ => Ok(()),
            };
            if let Err(e) = stop_result {
                log::warn!("driver stop during forced release errored: {e}");
            }
        }

        if let Err(e) = self.driver.close(handle).await {
            log::warn!("driver close during forced release errored: {e}");
        }
        Ok(())
    }

    fn require_claim<'a>(&self, state: &'a State, sender: &str) -> Result<&'a Claim> {
        match &state.claim {
            Some(claim) if claim.owner == sender => Ok(claim),
            Some(_) => Err(FprintError::already_in_use("device claimed by another caller")),
            None => Err(FprintError::claim_device("device is not claimed")),
        }
    }

    pub async fn claim(&self, sender: &str, username: &str) -> Result<()> {
        self.track_subscriber(sender).await;
        {
            let state = self.state.lock().expect("device state poisoned");
            if state.claim.is_some() {
                return Err(FprintError::already_in_use("device already claimed"));
            }
        }

        let resolved = self.authz.resolve_username(sender, username).await?;
        self.authz
            .check_any(sender, &[PolicyAction::Verify, PolicyAction::Enroll])
            .await?;

        let handle = self
            .driver
            .open(&self.descriptor)
            .await
            .map_err(|e| FprintError::internal(format!("opening device: {e}")))?;

        let mut state = self.state.lock().expect("device state poisoned");
        if state.claim.is_some() {
            drop(state);
            let _ = self.driver.close(handle).await;
            return Err(FprintError::already_in_use("device already claimed"));
        }
        state.claim = Some(Claim {
            owner: sender.to_string(),
            username: resolved,
            handle,
            action: None,
        });
        Ok(())
    }

    pub async fn release(&self, sender: &str) -> Result<()> {
        self.track_subscriber(sender).await;
        let handle = {
            let mut state = self.state.lock().expect("device state poisoned");
            let claim = self.require_claim(&state, sender)?;
            if claim.action.is_some() {
                return Err(FprintError::already_in_use("an action is still in progress"));
            }
            let handle = claim.handle;
            state.claim = None;
            handle
        };
        self.driver
            .close(handle)
            .await
            .map_err(|e| FprintError::internal(format!("closing device: {e}")))
    }

    pub async fn verify_start(&self, sender: &str, finger_name: &str) -> Result<()> {
        self.track_subscriber(sender).await;
        let (handle, username) = {
            let state = self.state.lock().expect("device state poisoned");
            let claim = self.require_claim(&state, sender)?;
            if claim.action.is_some() {
                return Err(FprintError::already_in_use("an action is already in progress"));
            }
            (claim.handle, claim.username.clone())
        };

        // Unknown names coerce to `any` for VerifyStart (keeps examples working).
        let selector = FingerSelector::parse(finger_name).unwrap_or(FingerSelector::Any);
        let dev = self.identity();

        match selector {
            FingerSelector::Specific(finger) => {
                // A concrete finger always does a plain verify, identify or not.
                let template = self
                    .store
                    .load(dev, finger, &username)?
                    .ok_or_else(|| FprintError::no_enrolled_prints(format!("no template for {finger}")))?;
                self.begin_verify(sender, handle, finger, template).await
            }
            FingerSelector::Any if !self.descriptor.supports_identify => {
                let discovered = self.store.discover(dev, &username)?;
                let finger = discovered
                    .into_iter()
                    .next()
                    .ok_or_else(|| FprintError::no_enrolled_prints("no fingers enrolled"))?;
                let template = self.store.load(dev, finger, &username)?.ok_or_else(|| {
                    FprintError::no_enrolled_prints(format!("template for {finger} vanished"))
                })?;
                self.begin_verify(sender, handle, finger, template).await
            }
            FingerSelector::Any => {
                let discovered = self.store.discover(dev, &username)?;
                let mut gallery = Vec::new();
                for finger in discovered {
                    if let Ok(Some(template)) = self.store.load(dev, finger, &username) {
                        gallery.push((finger, template));
                    }
                }
                if gallery.is_empty() {
                    return Err(FprintError::no_enrolled_prints("no usable templates for identify"));
                }
                self.begin_identify(sender, handle, gallery).await
            }
        }
    }

    async fn begin_verify(&self, sender: &str, handle: DeviceHandle, finger: Finger, template: Vec<u8>) -> Result<()> {
        let mut rx = self
            .driver
            .verify_start(handle, template)
            .await
            .map_err(|e| FprintError::internal(format!("starting verify: {e}")))?;

        let done = Arc::new(AtomicBool::new(false));
        {
            let mut state = self.state.lock().expect("device state poisoned");
            let claim = state
                .claim
                .as_mut()
                .filter(|c| c.owner == sender)
                .ok_or_else(|| FprintError::claim_device("claim lost before verify could start"))?;
            claim.action = Some(RunningAction::Verify { done: done.clone() });
        }

        let emitter = self.emitter()?;
        Self::verify_finger_selected(&emitter, finger.wire_name())
            .await
            .ok();

        let device = self.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                device.emit_verify_event(event, &done).await;
                if event.is_terminal() {
                    device.end_action(&device.state);
                    break;
                }
            }
        });
        Ok(())
    }

    async fn begin_identify(&self, sender: &str, handle: DeviceHandle, gallery: Vec<(Finger, Vec<u8>)>) -> Result<()> {
        let mut rx = self
            .driver
            .identify_start(handle, gallery)
            .await
            .map_err(|e| FprintError::internal(format!("starting identify: {e}")))?;

        let done = Arc::new(AtomicBool::new(false));
        {
            let mut state = self.state.lock().expect("device state poisoned");
            let claim = state
                .claim
                .as_mut()
                .filter(|c| c.owner == sender)
                .ok_or_else(|| FprintError::claim_device("claim lost before identify could start"))?;
            claim.action = Some(RunningAction::Identify { done: done.clone() });
        }

        let emitter = self.emitter()?;
        Self::verify_finger_selected(&emitter, "any").await.ok();

        let device = self.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let terminal = event.is_terminal();
                device.emit_identify_event(event, &done).await;
                if terminal {
                    device.end_action(&device.state);
                    break;
                }
            }
        });
        Ok(())
    }

    async fn emit_verify_event(&self, event: VerifyEvent, done: &Arc<AtomicBool>) {
        if done.swap(event.is_terminal(), Ordering::SeqCst) {
            return;
        }
        if let Ok(emitter) = self.emitter() {
            let _ = Self::verify_status(&emitter, event.wire_code(), event.is_terminal()).await;
        }
    }

    async fn emit_identify_event(&self, event: IdentifyEvent, done: &Arc<AtomicBool>) {
        if done.swap(event.is_terminal(), Ordering::SeqCst) {
            return;
        }
        if let Ok(emitter) = self.emitter() {
            let _ = Self::verify_status(&emitter, event.wire_code(), event.is_terminal()).await;
        }
    }

    fn end_action(&self, state: &Arc<Mutex<State>>) {
        if let Some(claim) = state.lock().expect("device state poisoned").claim.as_mut() {
            claim.action = None;
        }
    }

    pub async fn verify_stop(&self, sender: &str) -> Result<()> {
        self.track_subscriber(sender).await;
        let handle = {
            let mut state = self.state.lock().expect("device state poisoned");
            let claim = self.require_claim(&state, sender)?;
            match &claim.action {
                Some(RunningAction::Verify { .. }) | Some(RunningAction::Identify { .. }) => {}
                _ => return Err(FprintError::no_action_in_progress("no verify/identify running")),
            }
            let handle = claim.handle;
            claim.action = None;
            handle
        };
        self.driver
            .verify_stop(handle)
            .await
            .map_err(|e| FprintError::internal(format!("stopping verify: {e}")))
    }

    pub async fn enroll_start(&self, sender: &str, finger_name: &str) -> Result<()> {
        self.track_subscriber(sender).await;
        let target = match FingerSelector::parse(finger_name) {
            Some(FingerSelector::Specific(finger)) => finger,
            _ => return Err(FprintError::invalid_fingername(finger_name.to_string())),
        };

        let handle = {
            let state = self.state.lock().expect("device state poisoned");
            let claim = self.require_claim(&state, sender)?;
            if claim.action.is_some() {
                return Err(FprintError::already_in_use("an action is already in progress"));
            }
            claim.handle
        };

        let mut rx = self
            .driver
            .enroll_start(handle)
            .await
            .map_err(|e| FprintError::internal(format!("starting enroll: {e}")))?;

        let done = Arc::new(AtomicBool::new(false));
        {
            let mut state = self.state.lock().expect("device state poisoned");
            let claim = state
                .claim
                .as_mut()
                .filter(|c| c.owner == sender)
                .ok_or_else(|| FprintError::claim_device("claim lost before enroll could start"))?;
            claim.action = Some(RunningAction::Enroll {
                target,
                done: done.clone(),
            });
        }

        let device = self.clone();
        let dev = self.identity();
        let sender = sender.to_string();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let terminal = event.is_terminal();
                let code = event.wire_code();
                let final_code = if let EnrollEvent::Completed(template) = &event {
                    match device.store.save(dev, target, &device.claim_username(&sender), template) {
                        Ok(()) => code,
                        Err(e) => {
                            log::error!("saving enrolled template failed: {e}");
                            "enroll-failed"
                        }
                    }
                } else {
                    code
                };

                if done.swap(terminal, Ordering::SeqCst) {
                    break;
                }
                if let Ok(emitter) = device.emitter() {
                    let _ = Self::enroll_status(&emitter, final_code, terminal).await;
                }
                if terminal {
                    device.end_action(&device.state);
                    break;
                }
            }
        });
        Ok(())
    }

    fn claim_username(&self, sender: &str) -> String {
        self.state
            .lock()
            .expect("device state poisoned")
            .claim
            .as_ref()
            .filter(|c| c.owner == sender)
            .map(|c| c.username.clone())
            .unwrap_or_default()
    }

    pub async fn enroll_stop(&self, sender: &str) -> Result<()> {
        self.track_subscriber(sender).await;
        let handle = {
            let mut state = self.state.lock().expect("device state poisoned");
            let claim = self.require_claim(&state, sender)?;
            match &claim.action {
                Some(RunningAction::Enroll { .. }) => {}
                _ => return Err(FprintError::no_action_in_progress("no enroll running")),
            }
            let handle = claim.handle;
            claim.action = None;
            handle
        };
        self.driver
            .enroll_stop(handle)
            .await
            .map_err(|e| FprintError::internal(format!("stopping enroll: {e}")))
    }

    pub async fn list_enrolled_fingers(&self, sender: &str, username: &str) -> Result<Vec<String>> {
        self.track_subscriber(sender).await;
        let resolved = self.authz.resolve_username(sender, username).await?;
        self.authz.check(sender, PolicyAction::Verify).await?;
        let fingers = self.store.discover(self.identity(), &resolved)?;
        if fingers.is_empty() {
            return Err(FprintError::no_enrolled_prints(format!("no prints for {resolved}")));
        }
        Ok(fingers.into_iter().map(|f| f.wire_name().to_string()).collect())
    }

    pub async fn delete_enrolled_fingers(&self, sender: &str, username: &str) -> Result<()> {
        self.track_subscriber(sender).await;
        let resolved = self.authz.resolve_username(sender, username).await?;
        self.authz.check(sender, PolicyAction::Enroll).await?;
        self.store.delete_all(self.identity(), &resolved)
    }

    pub fn num_enroll_stages(&self) -> i32 {
        let state = self.state.lock().expect("device state poisoned");
        if state.claim.is_some() {
            self.descriptor.enroll_stages as i32
        } else {
            -1
        }
    }

    pub fn in_use(&self) -> bool {
        !self.state.lock().expect("device state poisoned").subscribers.is_empty()
    }
}

#[zbus::interface(name = "net.reactivated.Fprint.Device")]
impl Device {
    #[zbus(property)]
    fn name(&self) -> String {
        self.descriptor.name.clone()
    }

    #[zbus(property, name = "scan-type")]
    fn scan_type(&self) -> String {
        self.descriptor.scan_type.wire_name().to_string()
    }

    #[zbus(property, name = "num-enroll-stages")]
    fn num_enroll_stages_prop(&self) -> i32 {
        self.num_enroll_stages()
    }

    #[zbus(property, name = "in-use")]
    fn in_use_prop(&self) -> bool {
        self.in_use()
    }

    #[zbus(name = "Claim")]
    async fn claim_method(
        &self,
        username: String,
        #[zbus(header)] hdr: zbus::message::Header<'_>,
    ) -> Result<()> {
        let sender = sender_of(&hdr)?;
        self.track_subscriber(&sender).await;
        self.claim(&sender, &username).await
    }

    #[zbus(name = "Release")]
    async fn release_method(&self, #[zbus(header)] hdr: zbus::message::Header<'_>) -> Result<()> {
        let sender = sender_of(&hdr)?;
        self.release(&sender).await
    }

    #[zbus(name = "VerifyStart")]
    async fn verify_start_method(
        &self,
        finger_name: String,
        #[zbus(header)] hdr: zbus::message::Header<'_>,
    ) -> Result<()> {
        let sender = sender_of(&hdr)?;
        self.verify_start(&sender, &finger_name).await
    }

    #[zbus(name = "VerifyStop")]
    async fn verify_stop_method(&self, #[zbus(header)] hdr: zbus::message::Header<'_>) -> Result<()> {
        let sender = sender_of(&hdr)?;
        self.verify_stop(&sender).await
    }

    #[zbus(name = "EnrollStart")]
    async fn enroll_start_method(
        &self,
        finger_name: String,
        #[zbus(header)] hdr: zbus::message::Header<'_>,
    ) -> Result<()> {
        let sender = sender_of(&hdr)?;
        self.enroll_start(&sender, &finger_name).await
    }

    #[zbus(name = "EnrollStop")]
    async fn enroll_stop_method(&self, #[zbus(header)] hdr: zbus::message::Header<'_>) -> Result<()> {
        let sender = sender_of(&hdr)?;
        self.enroll_stop(&sender).await
    }

    #[zbus(name = "ListEnrolledFingers")]
    async fn list_enrolled_fingers_method(
        &self,
        username: String,
        #[zbus(header)] hdr: zbus::message::Header<'_>,
    ) -> Result<Vec<String>> {
        let sender = sender_of(&hdr)?;
        self.list_enrolled_fingers(&sender, &username).await
    }

    #[zbus(name = "DeleteEnrolledFingers")]
    async fn delete_enrolled_fingers_method(
        &self,
        username: String,
        #[zbus(header)] hdr: zbus::message::Header<'_>,
    ) -> Result<()> {
        let sender = sender_of(&hdr)?;
        self.delete_enrolled_fingers(&sender, &username).await
    }

    #[zbus(signal)]
    async fn verify_status(emitter: &SignalEmitter<'_>, result: &str, done: bool) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn verify_finger_selected(emitter: &SignalEmitter<'_>, finger_name: &str) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn enroll_status(emitter: &SignalEmitter<'_>, result: &str, done: bool) -> zbus::Result<()>;
}

fn sender_of(hdr: &zbus::message::Header<'_>) -> Result<String> {
    hdr.sender()
        .map(|s| s.to_string())
        .ok_or_else(|| FprintError::internal("method call had no sender"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::SimulatedDriver;
    use crate::template_store::FileTemplateStore;
    use std::time::Duration;
    use tokio::time::sleep;

    // These tests exercise the inherent async methods directly (bypassing
    // zbus dispatch) against a real system-bus connection, since AuthzGate
    // and the disconnect watch both need one. They're skipped if no bus is
    // reachable, which is the common case in sandboxed CI.
    async fn try_device() -> Option<(Device, tempfile::TempDir)> {
        let conn = Connection::system().await.ok()?;
        let tmp = tempfile::tempdir().ok()?;
        let store = Arc::new(FileTemplateStore::new(tmp.path().to_path_buf()));
        let driver = Arc::new(SimulatedDriver::seeded(1));
        let descriptor = driver.discover_devices().await.ok()?.into_iter().next()?;
        let authz = Arc::new(AuthzGate::new(conn.clone()));
        let idle = IdleTracker::with_timeout(true, Duration::from_secs(3600), || {});
        Some((Device::new(0, descriptor, driver, store, authz, idle, conn), tmp))
    }

    #[tokio::test]
    async fn claim_then_release_clears_state() {
        let Some((device, _tmp)) = try_device().await else { return };
        let sender = ":1.test";
        device.claim(sender, "alice").await.unwrap();
        assert!(device.release(sender).await.is_ok());
    }

    #[tokio::test]
    async fn double_claim_is_already_in_use() {
        let Some((device, _tmp)) = try_device().await else { return };
        device.claim(":1.a", "alice").await.unwrap();
        let err = device.claim(":1.b", "bob").await.unwrap_err();
        assert!(matches!(err, FprintError::AlreadyInUse(_)));
    }

    #[tokio::test]
    async fn verify_without_enrolled_prints_fails() {
        let Some((device, _tmp)) = try_device().await else { return };
        device.claim(":1.a", "nobody-enrolled").await.unwrap();
        let err = device.verify_start(":1.a", "").await.unwrap_err();
        assert!(matches!(err, FprintError::NoEnrolledPrints(_)));
    }

    #[tokio::test]
    async fn enroll_rejects_invalid_fingername() {
        let Some((device, _tmp)) = try_device().await else { return };
        device.claim(":1.a", "alice").await.unwrap();
        let err = device.enroll_start(":1.a", "pinky").await.unwrap_err();
        assert!(matches!(err, FprintError::InvalidFingername(_)));
    }

    #[tokio::test]
    async fn enroll_then_verify_same_user() {
        let Some((device, _tmp)) = try_device().await else { return };
        device.claim(":1.a", "alice").await.unwrap();
        device.enroll_start(":1.a", "right-index-finger").await.unwrap();
        sleep(Duration::from_millis(50)).await;
        assert_eq!(device.num_enroll_stages(), 5);

        let fingers = device.list_enrolled_fingers(":1.a", "alice").await.unwrap();
        assert_eq!(fingers, vec!["right-index-finger".to_string()]);

        device.verify_start(":1.a", "").await.unwrap();
        sleep(Duration::from_millis(50)).await;
    }
}
