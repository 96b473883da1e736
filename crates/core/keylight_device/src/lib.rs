//! The keyboard as seen by an unprivileged process.
//!
//! Reads go straight to the LED class directory. Writes are delegated to a [ControlWriter],
//! normally the [BrokerClient] talking to `keylightd`.

mod brightness;
mod client;
mod error;
mod keyboard;
mod kind;
mod zone;

pub use brightness::*;
pub use client::*;
pub use error::*;
pub use keyboard::*;
pub use kind::*;
pub use zone::*;
