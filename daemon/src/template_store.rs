//! Disk-backed persistence for enrolled fingerprint templates.
//!
//! Layout: `<base>/<username>/<driver-id:04x>/<device-type:08x>/<finger-hex>`,
//! mode 0700 along every directory created, one file per enrolled finger.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::error::{FprintError, Result};
use crate::finger::Finger;

/// Identity of the hardware a template belongs to, as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub driver_id: u16,
    pub device_type: u32,
}

/// A pluggable key→blob store keyed by (username, driver-id, device-type, finger).
///
/// Only one implementation is active process-wide, selected from
/// `fprintd.conf`'s `[storage] type` key (see [`crate::config`]).
pub trait TemplateStore: Send + Sync {
    fn save(&self, dev: DeviceIdentity, finger: Finger, username: &str, template: &[u8]) -> Result<()>;

    /// Returns `Ok(None)` if no template is on file for this finger.
    fn load(&self, dev: DeviceIdentity, finger: Finger, username: &str) -> Result<Option<Vec<u8>>>;

    /// Best-effort: deleting an absent file is not an error.
    fn delete(&self, dev: DeviceIdentity, finger: Finger, username: &str) -> Result<()>;

    /// Delete every enrolled finger for this (dev, user); best-effort per file.
    fn delete_all(&self, dev: DeviceIdentity, username: &str) -> Result<()> {
        for finger in Finger::ALL {
            self.delete(dev, finger, username)?;
        }
        Ok(())
    }

    /// Non-recursive scan of the device directory; ignores anything whose
    /// filename isn't exactly one hex digit naming a valid finger.
    fn discover(&self, dev: DeviceIdentity, username: &str) -> Result<Vec<Finger>>;
}

/// The built-in, and currently only, storage backend: one file per finger
/// under a fixed base directory.
pub struct FileTemplateStore {
    base: PathBuf,
}

impl FileTemplateStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn validate_username(username: &str) -> Result<()> {
        if username.is_empty() || username.contains('/') || username == "." || username == ".." {
            return Err(FprintError::internal(format!(
                "invalid username for template path: {username:?}"
            )));
        }
        Ok(())
    }

    fn device_dir(&self, dev: DeviceIdentity, username: &str) -> Result<PathBuf> {
        Self::validate_username(username)?;
        Ok(self
            .base
            .join(username)
            .join(format!("{:04x}", dev.driver_id))
            .join(format!("{:08x}", dev.device_type)))
    }

    fn finger_path(&self, dev: DeviceIdentity, finger: Finger, username: &str) -> Result<PathBuf> {
        Ok(self.device_dir(dev, username)?.join(format!("{:x}", finger.code())))
    }

    /// Create `dir` and every missing parent with mode 0700.
    fn mkdir_secure(dir: &Path) -> std::io::Result<()> {
        let mut built = PathBuf::new();
        for component in dir.components() {
            built.push(component);
            match fs::create_dir(&built) {
                Ok(()) => fs::set_permissions(&built, fs::Permissions::from_mode(0o700))?,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl TemplateStore for FileTemplateStore {
    fn save(&self, dev: DeviceIdentity, finger: Finger, username: &str, template: &[u8]) -> Result<()> {
        let dir = self.device_dir(dev, username)?;
        Self::mkdir_secure(&dir)?;
        let path = dir.join(format!("{:x}", finger.code()));
        fs::write(&path, template)?;
        Ok(())
    }

    fn load(&self, dev: DeviceIdentity, finger: Finger, username: &str) -> Result<Option<Vec<u8>>> {
        let path = self.finger_path(dev, finger, username)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, dev: DeviceIdentity, finger: Finger, username: &str) -> Result<()> {
        let path = self.finger_path(dev, finger, username)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn discover(&self, dev: DeviceIdentity, username: &str) -> Result<Vec<Finger>> {
        let dir = self.device_dir(dev, username)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut fingers = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let name = match name.to_str() {
                Some(n) if n.len() == 1 => n,
                _ => continue,
            };
            if let Ok(code) = u8::from_str_radix(name, 16) {
                if let Some(finger) = Finger::from_code(code) {
                    fingers.push(finger);
                }
            }
        }
        fingers.sort();
        Ok(fingers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev() -> DeviceIdentity {
        DeviceIdentity {
            driver_id: 0x0001,
            device_type: 0x00000001,
        }
    }

    #[test]
    fn save_load_discover_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileTemplateStore::new(tmp.path());

        store.save(dev(), Finger::RightIndex, "alice", b"blob").unwrap();
        let loaded = store.load(dev(), Finger::RightIndex, "alice").unwrap();
        assert_eq!(loaded, Some(b"blob".to_vec()));

        let fingers = store.discover(dev(), "alice").unwrap();
        assert_eq!(fingers, vec![Finger::RightIndex]);

        let path = tmp
            .path()
            .join("alice")
            .join("0001")
            .join("00000001")
            .join("7");
        assert!(path.exists());
        let mode = fs::metadata(path.parent().unwrap()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o700);
    }

    #[test]
    fn load_missing_is_none_not_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileTemplateStore::new(tmp.path());
        assert_eq!(store.load(dev(), Finger::LeftThumb, "bob").unwrap(), None);
    }

    #[test]
    fn discover_on_missing_dir_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileTemplateStore::new(tmp.path());
        assert_eq!(store.discover(dev(), "nobody").unwrap(), Vec::new());
    }

    #[test]
    fn delete_absent_file_is_ok() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileTemplateStore::new(tmp.path());
        store.delete(dev(), Finger::LeftThumb, "alice").unwrap();
    }

    #[test]
    fn delete_all_clears_every_slot() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileTemplateStore::new(tmp.path());
        store.save(dev(), Finger::LeftIndex, "alice", b"a").unwrap();
        store.save(dev(), Finger::RightThumb, "alice", b"b").unwrap();

        store.delete_all(dev(), "alice").unwrap();
        assert_eq!(store.discover(dev(), "alice").unwrap(), Vec::new());
    }

    #[test]
    fn rejects_username_with_path_separator() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileTemplateStore::new(tmp.path());
        let err = store.save(dev(), Finger::LeftThumb, "../escape", b"x");
        assert!(err.is_err());
    }

    #[test]
    fn ignores_non_finger_entries_on_discover() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileTemplateStore::new(tmp.path());
        store.save(dev(), Finger::LeftThumb, "alice", b"x").unwrap();
        let dir = store.device_dir(dev(), "alice").unwrap();
        fs::write(dir.join("not-a-finger"), b"junk").unwrap();
        fs::write(dir.join("ff"), b"junk").unwrap();

        let fingers = store.discover(dev(), "alice").unwrap();
        assert_eq!(fingers, vec![Finger::LeftThumb]);
    }
}
