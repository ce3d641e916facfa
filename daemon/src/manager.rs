//! Process-wide device registry, bus publication, and idle-timeout wiring.

use std::sync::Arc;

use zbus::connection::Builder as ConnectionBuilder;
use zbus::zvariant::OwnedObjectPath;
use zbus::Connection;

use crate::authz::AuthzGate;
use crate::config::Config;
use crate::device::Device;
use crate::driver::DriverAdapter;
use crate::error::{FprintError, Result};
use crate::idle::IdleTracker;
use crate::template_store::TemplateStore;

pub const SERVICE_NAME: &str = "net.reactivated.Fprint";
pub const MANAGER_PATH: &str = "/net/reactivated/Fprint/Manager";

/// Registers one [`Device`] per descriptor the driver reports, and answers
/// `GetDevices`/`GetDefaultDevice` on the bus.
pub struct Manager {
    devices: Vec<Device>,
}

impl Manager {
    /// Discover devices via `driver`, construct one [`Device`] per
    /// descriptor, and register each of them plus the Manager itself on
    /// `conn`. Does not acquire the well-known name; callers that want a
    /// fully running daemon should call [`Manager::run`] instead.
    pub async fn build(
        conn: &Connection,
        driver: Arc<dyn DriverAdapter>,
        store: Arc<dyn TemplateStore>,
        authz: Arc<AuthzGate>,
        idle: Arc<IdleTracker>,
    ) -> Result<Manager> {
        let descriptors = driver
            .discover_devices()
            .await
            .map_err(|e| FprintError::internal(format!("discovering devices: {e}")))?;

        let mut devices = Vec::with_capacity(descriptors.len());
        for (id, descriptor) in descriptors.into_iter().enumerate() {
            let id = id as u32;
            log::info!("registering device {id}: {}", descriptor.name);
            let device = Device::new(
                id,
                descriptor,
                driver.clone(),
                store.clone(),
                authz.clone(),
                idle.clone(),
                conn.clone(),
            );
            conn.object_server()
                .at(device.path().clone(), device.clone())
                .await
                .map_err(|e| FprintError::internal(format!("registering device {id}: {e}")))?;
            devices.push(device);
        }

        let manager = Manager { devices };
        conn.object_server()
            .at(MANAGER_PATH, ManagerIface(manager.device_paths()))
            .await
            .map_err(|e| FprintError::internal(format!("registering manager object: {e}")))?;

        Ok(manager)
    }

    pub fn device_paths(&self) -> Vec<OwnedObjectPath> {
        self.devices.iter().map(|d| d.path().clone()).collect()
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Full startup sequence: load config (falling back to the built-in file
    /// backend on any failure), build the store/driver/authz stack,
    /// register every device, and acquire the well-known bus name. Returns
    /// the connection and the constructed [`Manager`] once the daemon is
    /// ready to serve requests.
    pub async fn start(
        sysconfdir: &std::path::Path,
        storage_base: &std::path::Path,
        driver: Arc<dyn DriverAdapter>,
        no_timeout: bool,
    ) -> Result<(Connection, Manager, Arc<IdleTracker>)> {
        let config_path = sysconfdir.join("fprintd.conf");
        let config = Config::load(&config_path).unwrap_or_else(|e| {
            log::warn!("failed to read {}: {e}, using defaults", config_path.display());
            Config::default()
        });

        let store: Arc<dyn TemplateStore> = match config.storage_type.as_str() {
            "file" => Arc::new(crate::template_store::FileTemplateStore::new(storage_base.to_path_buf())),
            other => {
                return Err(FprintError::internal(format!(
                    "unsupported storage backend {other:?} (only \"file\" is built in)"
                )))
            }
        };

        let conn = ConnectionBuilder::system()
            .map_err(|e| FprintError::internal(format!("connecting to system bus: {e}")))?
            .build()
            .await
            .map_err(|e| FprintError::internal(format!("connecting to system bus: {e}")))?;

        let authz = Arc::new(AuthzGate::new(conn.clone()));
        let idle = IdleTracker::new(no_timeout);

        let manager = Manager::build(&conn, driver, store, authz, idle.clone()).await?;

        conn.request_name(SERVICE_NAME)
            .await
            .map_err(|e| FprintError::internal(format!("acquiring bus name {SERVICE_NAME}: {e}")))?;

        log::info!("D-Bus service launched with name: {SERVICE_NAME}");
        Ok((conn, manager, idle))
    }
}

struct ManagerIface(Vec<OwnedObjectPath>);

#[zbus::interface(name = "net.reactivated.Fprint.Manager")]
impl ManagerIface {
    #[zbus(name = "GetDevices")]
    fn get_devices(&self) -> Vec<OwnedObjectPath> {
        self.0.clone()
    }

    #[zbus(name = "GetDefaultDevice")]
    fn get_default_device(&self) -> Result<OwnedObjectPath> {
        self.0
            .first()
            .cloned()
            .ok_or_else(|| FprintError::no_such_device("no devices available"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::SimulatedDriver;
    use crate::template_store::FileTemplateStore;
    use std::time::Duration;

    #[tokio::test]
    async fn build_registers_one_device_per_descriptor() {
        let Ok(conn) = Connection::session().await else { return };
        let tmp = tempfile::tempdir().unwrap();
        let driver: Arc<dyn DriverAdapter> = Arc::new(SimulatedDriver::seeded(1));
        let store: Arc<dyn TemplateStore> = Arc::new(FileTemplateStore::new(tmp.path().to_path_buf()));
        let authz = Arc::new(AuthzGate::new(conn.clone()));
        let idle = IdleTracker::with_timeout(true, Duration::from_secs(3600), || {});

        let manager = Manager::build(&conn, driver, store, authz, idle).await.unwrap();
        assert_eq!(manager.device_paths().len(), 1);
        assert_eq!(
            manager.device_paths()[0].as_str(),
            "/net/reactivated/Fprint/Device/0"
        );
    }
}
