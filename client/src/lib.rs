#![allow(dead_code)]
//! Async client bindings for the `net.reactivated.Fprint` D-Bus service.
//!
//! Shared by the PAM module and the `fprintd-*` CLI tools. Mirrors the wire
//! contract implemented server-side by the `fprintd` daemon crate.

use std::fmt;

use futures_util::StreamExt;
use serde::{de::DeserializeOwned, Serialize};
use zbus::zvariant::{OwnedObjectPath, Type};
use zbus::{Connection, Proxy};

/// D-Bus service name for fprintd.
pub const SERVICE: &str = "net.reactivated.Fprint";

/// Manager object path.
pub const MANAGER_PATH: &str = "/net/reactivated/Fprint/Manager";

/// Manager interface name.
pub const IFACE_MANAGER: &str = "net.reactivated.Fprint.Manager";

/// Device interface name.
pub const IFACE_DEVICE: &str = "net.reactivated.Fprint.Device";

/// Supported finger names, in on-disk finger-code order (1..=10).
pub const FINGERS: &[&str] = &[
    "left-thumb",
    "left-index-finger",
    "left-middle-finger",
    "left-ring-finger",
    "left-little-finger",
    "right-thumb",
    "right-index-finger",
    "right-middle-finger",
    "right-ring-finger",
    "right-little-finger",
];

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),
    #[error("device error: {0}")]
    Device(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Async client with a system bus connection.
#[derive(Clone)]
pub struct Client {
    conn: Connection,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

impl Client {
    /// Connect to the system bus, where fprintd is published.
    pub async fn system() -> Result<Self> {
        let conn = Connection::system().await?;
        Ok(Self { conn })
    }

    /// Get the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create a Manager helper bound to this connection.
    pub fn manager(&self) -> Manager {
        Manager {
            conn: self.conn.clone(),
        }
    }

    /// Create a Device helper for a specific object path.
    pub fn device(&self, object_path: OwnedObjectPath) -> Device {
        Device {
            conn: self.conn.clone(),
            object_path,
        }
    }
}

/// Manager interface helper.
#[derive(Clone)]
pub struct Manager {
    conn: Connection,
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager").finish_non_exhaustive()
    }
}

impl Manager {
    async fn proxy(&self) -> Result<Proxy<'_>> {
        Ok(Proxy::new(&self.conn, SERVICE, MANAGER_PATH, IFACE_MANAGER).await?)
    }

    async fn call<R>(&self, method: &str, args: &(impl Serialize + Type + fmt::Debug)) -> Result<R>
    where
        R: DeserializeOwned + Type,
    {
        let proxy = self.proxy().await?;
        Ok(proxy.call(method, args).await?)
    }

    /// Get all registered device object paths.
    pub async fn get_devices(&self) -> Result<Vec<OwnedObjectPath>> {
        let (paths,): (Vec<OwnedObjectPath>,) = self.call("GetDevices", &()).await?;
        Ok(paths)
    }

    /// Get the default (first registered) device path.
    pub async fn get_default_device(&self) -> Result<OwnedObjectPath> {
        let (path,): (OwnedObjectPath,) = self.call("GetDefaultDevice", &()).await?;
        Ok(path)
    }
}

/// Device interface helper.
#[derive(Clone)]
pub struct Device {
    conn: Connection,
    object_path: OwnedObjectPath,
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("object_path", &self.object_path)
            .finish()
    }
}

impl Device {
    async fn proxy(&self) -> Result<Proxy<'_>> {
        Ok(Proxy::new(&self.conn, SERVICE, self.object_path.as_str(), IFACE_DEVICE).await?)
    }

    /// Object path this helper is bound to.
    pub fn object_path(&self) -> &str {
        self.object_path.as_str()
    }

    async fn call<R>(&self, method: &str, args: &(impl Serialize + Type + fmt::Debug)) -> Result<R>
    where
        R: DeserializeOwned + Type,
    {
        let proxy = self.proxy().await?;
        Ok(proxy.call(method, args).await?)
    }

    /// Claim the device for `username` (empty string means the caller's own account).
    pub async fn claim(&self, username: &str) -> Result<()> {
        let _: () = self.call("Claim", &(username,)).await?;
        Ok(())
    }

    /// Release a previously-claimed device.
    pub async fn release(&self) -> Result<()> {
        let _: () = self.call("Release", &()).await?;
        Ok(())
    }

    /// Start verification. Empty or `"any"` lets the daemon auto-select a finger.
    pub async fn verify_start(&self, finger: &str) -> Result<()> {
        let _: () = self.call("VerifyStart", &(finger,)).await?;
        Ok(())
    }

    /// Stop an in-progress verification.
    pub async fn verify_stop(&self) -> Result<()> {
        let _: () = self.call("VerifyStop", &()).await?;
        Ok(())
    }

    /// Start enrollment of the given finger.
    pub async fn enroll_start(&self, finger: &str) -> Result<()> {
        let _: () = self.call("EnrollStart", &(finger,)).await?;
        Ok(())
    }

    /// Stop an in-progress enrollment.
    pub async fn enroll_stop(&self) -> Result<()> {
        let _: () = self.call("EnrollStop", &()).await?;
        Ok(())
    }

    /// List the fingers enrolled for `username` (empty string means the caller's own account).
    pub async fn list_enrolled_fingers(&self, username: &str) -> Result<Vec<String>> {
        let (fingers,): (Vec<String>,) = self.call("ListEnrolledFingers", &(username,)).await?;
        Ok(fingers)
    }

    /// Delete every enrolled finger for `username`.
    pub async fn delete_enrolled_fingers(&self, username: &str) -> Result<()> {
        let _: () = self.call("DeleteEnrolledFingers", &(username,)).await?;
        Ok(())
    }

    /// Driver's human-readable device name.
    pub async fn name(&self) -> Result<String> {
        let proxy = self.proxy().await?;
        Ok(proxy.get_property::<String>("name").await?)
    }

    /// Number of enrollment stages (requires the device to be opened/claimed).
    pub async fn num_enroll_stages(&self) -> Result<i32> {
        let proxy = self.proxy().await?;
        Ok(proxy.get_property::<i32>("num-enroll-stages").await?)
    }

    /// Scan type: `"press"` or `"swipe"`.
    pub async fn scan_type(&self) -> Result<String> {
        let proxy = self.proxy().await?;
        Ok(proxy.get_property::<String>("scan-type").await?)
    }

    /// Whether at least one client currently holds a subscription to this device.
    pub async fn in_use(&self) -> Result<bool> {
        let proxy = self.proxy().await?;
        Ok(proxy.get_property::<bool>("in-use").await?)
    }

    /// Listen for `VerifyFingerSelected` signals until the stream ends.
    pub async fn listen_verify_finger_selected<F>(&self, mut handler: F) -> Result<()>
    where
        F: FnMut(VerifyFingerSelectedEvent) + Send,
    {
        let proxy = self.proxy().await?;
        let mut stream = proxy.receive_signal("VerifyFingerSelected").await?;
        while let Some(msg) = stream.next().await {
            let (finger_name,): (String,) = msg.body().deserialize()?;
            handler(VerifyFingerSelectedEvent { finger_name });
        }
        Ok(())
    }

    /// Listen for `VerifyStatus` signals until the stream ends.
    pub async fn listen_verify_status<F>(&self, mut handler: F) -> Result<()>
    where
        F: FnMut(VerifyStatusEvent) + Send,
    {
        let proxy = self.proxy().await?;
        let mut stream = proxy.receive_signal("VerifyStatus").await?;
        while let Some(msg) = stream.next().await {
            let (result, done): (String, bool) = msg.body().deserialize()?;
            handler(VerifyStatusEvent { result, done });
        }
        Ok(())
    }

    /// Listen for `EnrollStatus` signals until the stream ends.
    pub async fn listen_enroll_status<F>(&self, mut handler: F) -> Result<()>
    where
        F: FnMut(EnrollStatusEvent) + Send,
    {
        let proxy = self.proxy().await?;
        let mut stream = proxy.receive_signal("EnrollStatus").await?;
        while let Some(msg) = stream.next().await {
            let (result, done): (String, bool) = msg.body().deserialize()?;
            handler(EnrollStatusEvent { result, done });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct VerifyFingerSelectedEvent {
    pub finger_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct VerifyStatusEvent {
    pub result: String,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct EnrollStatusEvent {
    pub result: String,
    pub done: bool,
}

/// Resolve the default device, falling back to the first enumerated one.
pub async fn first_device(client: &Client) -> Result<Option<Device>> {
    let mgr = client.manager();

    if let Ok(path) = mgr.get_default_device().await {
        return Ok(Some(client.device(path)));
    }

    let paths = mgr.get_devices().await?;
    Ok(paths.into_iter().next().map(|p| client.device(p)))
}
