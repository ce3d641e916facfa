//! Error taxonomy, mapped 1:1 onto `net.reactivated.Fprint.Error.*` D-Bus
//! error names via zbus's `DBusError` derive.

use zbus::DBusError;

pub type Result<T> = std::result::Result<T, FprintError>;

#[derive(Debug, DBusError)]
#[zbus(prefix = "net.reactivated.Fprint.Error")]
pub enum FprintError {
    #[zbus(error)]
    ZBus(zbus::Error),
    /// The device is already claimed by another caller.
    ClaimDevice(String),
    /// The device is open/in use and the operation can't proceed.
    AlreadyInUse(String),
    /// Catch-all for conditions that shouldn't happen in practice.
    Internal(String),
    /// Polkit denied the action.
    PermissionDenied(String),
    /// `ListEnrolledFingers`/verify found nothing on file for the user.
    NoEnrolledPrints(String),
    /// `VerifyStop`/`EnrollStop` with nothing running.
    NoActionInProgress(String),
    /// `EnrollStart`/`VerifyStart` got a finger name that isn't one of the ten.
    InvalidFingername(String),
    /// Object path doesn't correspond to a known device.
    NoSuchDevice(String),
}

impl FprintError {
    pub fn claim_device(msg: impl Into<String>) -> Self {
        FprintError::ClaimDevice(msg.into())
    }

    pub fn already_in_use(msg: impl Into<String>) -> Self {
        FprintError::AlreadyInUse(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        FprintError::Internal(msg.into())
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        FprintError::PermissionDenied(msg.into())
    }

    pub fn no_enrolled_prints(msg: impl Into<String>) -> Self {
        FprintError::NoEnrolledPrints(msg.into())
    }

    pub fn no_action_in_progress(msg: impl Into<String>) -> Self {
        FprintError::NoActionInProgress(msg.into())
    }

    pub fn invalid_fingername(msg: impl Into<String>) -> Self {
        FprintError::InvalidFingername(msg.into())
    }

    pub fn no_such_device(msg: impl Into<String>) -> Self {
        FprintError::NoSuchDevice(msg.into())
    }
}

impl From<std::io::Error> for FprintError {
    fn from(err: std::io::Error) -> Self {
        FprintError::Internal(err.to_string())
    }
}
