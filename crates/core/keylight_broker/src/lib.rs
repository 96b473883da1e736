//! keylight broker.
//!
//! The keyboard backlight of System76 laptops is controlled through files under
//! `/sys/class/leds/system76::kbd_backlight` that only root can write. This crate implements
//! the service that performs those writes for unprivileged users:
//!
//! 1. the D-Bus sender of a request is mapped to a process id and uid,
//! 2. the target path must be one of the keyboard control files (unless the caller is root),
//! 3. polkit must grant the caller [SET_COLOR_PERMISSION],
//! 4. only then the value is written, verbatim, to the control file.

/// The fixed set of files the broker may write to.
pub mod guard;

/// Maps D-Bus senders to process identities.
pub mod identity;

/// Asks polkit whether a process may change the backlight.
pub mod authority;

/// The zbus implementations of the authority and identity handles.
pub mod polkit;

mod broker;
mod daemon;
mod error;
mod service;

#[cfg(test)]
mod test_support;

pub use broker::WriteBroker;
pub use daemon::run;
pub use daemon::DaemonOpt;
pub use error::BrokerError;
pub use service::BrokerService;
pub use service::ServiceError;

/// Well-known bus name claimed by `keylightd`
pub const BUS_NAME: &str = "org.keylight.Broker";

/// Object path of the [BrokerService]
pub const OBJECT_PATH: &str = "/org/keylight/Broker";

/// D-Bus interface implemented by the [BrokerService]
pub const INTERFACE: &str = "org.keylight.Broker1";

/// The polkit action checked before any write.
pub const SET_COLOR_PERMISSION: &str = "org.keylight.set-color";
