//! XBee device facade
//!
//! The synchronous-feeling command surface callers actually use:
//! [`device::LocalDevice`] for the module attached to this host's
//! transport, and [`remote::RemoteDevice`] for a module reached over the
//! air through it. Both sit on top of `xbee-core`'s Correlator; this crate
//! adds device identity, the IO line model, and protocol resolution.
//!
//! # Components
//!
//! - [`device::LocalDevice`]: AT get/set/execute, IO config/read/write,
//!   PWM, reset, identity, lifecycle state machine
//! - [`remote::RemoteDevice`]: the same AT surface, wrapped in
//!   `REMOTE_AT_COMMAND_REQUEST`/`RESPONSE`, borrowing the local device's
//!   correlator
//! - [`io_line::IoLine`]: channel capability/mnemonic table
//! - [`identity`]: addresses, cached identity fields, protocol resolution

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod device;
pub mod identity;
pub mod io_line;
pub mod remote;

pub use device::{DeviceState, LocalDevice};
pub use identity::{Addr16, Addr64, DeviceIdentity, HardwareVersion, Protocol};
pub use io_line::IoLine;
pub use remote::{RemoteDevice, RemoteIdentity};
