//! XBee driver engine
//!
//! The async machinery that sits between the wire protocol
//! ([`xbee_proto`]) and the device-facing API (`xbee-client`): the
//! `Transport` boundary, the Reader task, the Listener Registry, the
//! frame-id allocator, and the Correlator/Send Engine.
//!
//! # Components
//!
//! - [`transport::Transport`]: the byte-channel boundary a concrete
//!   serial/TCP/loopback implementation fills in
//! - [`reader`]: the dedicated inbound task
//! - [`listener::ListenerRegistry`]: global and frame-id-keyed subscribers
//! - [`correlator::Correlator`]: request/response correlation and the
//!   transport write lock
//! - [`config::DriverConfig`]: injectable timing/mode configuration
//! - [`error::XBeeError`]: the crate's single error type

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod correlator;
pub mod error;
pub mod frame_id;
pub mod listener;
pub mod reader;
pub mod transport;

pub use config::{DriverConfig, OperatingMode};
pub use correlator::Correlator;
pub use error::{Result, XBeeError};
pub use listener::{ListenerRegistry, Subscription};
pub use transport::Transport;
