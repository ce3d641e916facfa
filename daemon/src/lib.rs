//! `fprintd` — privileged D-Bus daemon mediating access to fingerprint
//! hardware. See the individual modules for the pieces described in the
//! design: [`device`] (claim lifecycle and action state machine),
//! [`driver`] (the biometric library interface), [`template_store`]
//! (on-disk template persistence), [`authz`] (polkit-backed authorization),
//! [`idle`] and [`event_loop`] (the single-threaded reactor and its
//! idle-shutdown timer), and [`manager`] (startup and bus publication).

pub mod authz;
pub mod config;
pub mod device;
pub mod driver;
pub mod error;
pub mod event_loop;
pub mod finger;
pub mod idle;
pub mod manager;
pub mod template_store;
