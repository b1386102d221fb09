//! Test-only support: an in-memory loopback transport.
//!
//! Kept as its own crate, a dev-dependency of `xbee-client`, so production
//! code never links test scaffolding.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod loopback;

pub use loopback::LoopbackTransport;
