//! Caller authorization against the system polkit daemon.
//!
//! Three questions, all keyed by the caller's D-Bus unique name (`sender`):
//! resolving which username an operation should act on, and checking whether
//! the caller may perform a named action.

use std::collections::HashMap;
use std::sync::Mutex;

use nix::unistd::{Uid, User};
use zbus::zvariant::{OwnedValue, Value};
use zbus::{Connection, Proxy};

use crate::error::{FprintError, Result};

const POLKIT_SERVICE: &str = "org.freedesktop.PolicyKit1";
const POLKIT_PATH: &str = "/org/freedesktop/PolicyKit1/Authority";
const POLKIT_IFACE: &str = "org.freedesktop.PolicyKit1.Authority";

/// Actions the core asks the policy engine about. Names match the policy
/// action ids shipped in the daemon's `.policy` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Verify,
    Enroll,
    SetUsername,
}

impl Action {
    fn policy_id(self) -> &'static str {
        match self {
            Action::Verify => "net.reactivated.fprint.device.verify",
            Action::Enroll => "net.reactivated.fprint.device.enroll",
            Action::SetUsername => "net.reactivated.fprint.device.setusername",
        }
    }
}

#[derive(Debug, Clone)]
struct Identity {
    uid: u32,
    username: String,
}

/// Resolves caller identity and checks policy, caching per-sender identity
/// for the life of that bus connection.
pub struct AuthzGate {
    conn: Connection,
    cache: Mutex<HashMap<String, Identity>>,
}

impl AuthzGate {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Drop any cached identity for `sender`. Call when the sender's
    /// `NameOwnerChanged` signal reports it gone.
    pub fn evict(&self, sender: &str) {
        self.cache.lock().expect("authz cache poisoned").remove(sender);
    }

    async fn identity(&self, sender: &str) -> Result<Identity> {
        if let Some(identity) = self.cache.lock().expect("authz cache poisoned").get(sender) {
            return Ok(identity.clone());
        }

        let dbus = Proxy::new(&self.conn, "org.freedesktop.DBus", "/org/freedesktop/DBus", "org.freedesktop.DBus")
            .await
            .map_err(|e| FprintError::internal(format!("connecting to bus daemon: {e}")))?;
        let uid: u32 = dbus
            .call("GetConnectionUnixUser", &(sender,))
            .await
            .map_err(|e| FprintError::internal(format!("resolving uid for {sender}: {e}")))?;
        let username = User::from_uid(Uid::from_raw(uid))
            .map_err(|e| FprintError::internal(format!("looking up uid {uid}: {e}")))?
            .map(|u| u.name)
            .ok_or_else(|| FprintError::internal(format!("no passwd entry for uid {uid}")))?;

        let identity = Identity { uid, username };
        self.cache
            .lock()
            .expect("authz cache poisoned")
            .insert(sender.to_string(), identity.clone());
        Ok(identity)
    }

    /// `requested` empty or equal to the caller's own account resolves
    /// without a policy check; anything else requires `set-username`.
    pub async fn resolve_username(&self, sender: &str, requested: &str) -> Result<String> {
        let own = self.identity(sender).await?.username;
        if requested.is_empty() || requested == own {
            return Ok(own);
        }
        self.check(sender, Action::SetUsername).await?;
        Ok(requested.to_string())
    }

    /// uid 0 is permitted `set-username`/`verify` unconditionally; every
    /// other action, `enroll` included, always goes through polkit even for
    /// uid 0.
    pub async fn check(&self, sender: &str, action: Action) -> Result<()> {
        let identity = self.identity(sender).await?;
        if identity.uid == 0 && matches!(action, Action::SetUsername | Action::Verify) {
            return Ok(());
        }
        if self.ask_polkit(sender, action.policy_id()).await? {
            Ok(())
        } else {
            Err(FprintError::permission_denied(format!(
                "{sender} not authorized for {}",
                action.policy_id()
            )))
        }
    }

    /// Succeeds if any of `actions` is permitted, applying the same uid-0
    /// restriction as [`AuthzGate::check`] per action.
    pub async fn check_any(&self, sender: &str, actions: &[Action]) -> Result<()> {
        let identity = self.identity(sender).await?;
        for action in actions {
            if identity.uid == 0 && matches!(action, Action::SetUsername | Action::Verify) {
                return Ok(());
            }
            if self.ask_polkit(sender, action.policy_id()).await? {
                return Ok(());
            }
        }
        Err(FprintError::permission_denied(format!(
            "{sender} not authorized for any of {actions:?}"
        )))
    }

    async fn ask_polkit(&self, sender: &str, action_id: &str) -> Result<bool> {
        let authority = Proxy::new(&self.conn, POLKIT_SERVICE, POLKIT_PATH, POLKIT_IFACE)
            .await
            .map_err(|e| FprintError::internal(format!("connecting to polkit: {e}")))?;

        let mut subject_details: HashMap<&str, Value> = HashMap::new();
        subject_details.insert("name", Value::from(sender));
        let subject = ("system-bus-name", subject_details);
        let call_details: HashMap<&str, Value> = HashMap::new();
        // AllowUserInteraction: authentication dialogs are meaningless for a
        // headless verify/enroll call, but harmless if polkit offers one.
        let flags: u32 = 1;

        let (is_authorized, _is_challenge, _details): (bool, bool, HashMap<String, OwnedValue>) = authority
            .call("CheckAuthorization", &(subject, action_id, call_details, flags, ""))
            .await
            .map_err(|e| FprintError::internal(format!("polkit check for {action_id}: {e}")))?;

        Ok(is_authorized)
    }
}
