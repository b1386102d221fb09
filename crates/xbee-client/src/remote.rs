//! [`RemoteDevice`]: a device facade reached over the air through a local
//! device's transport and correlator.
//!
//! A `RemoteDevice` never opens a transport or calls `initialize()` on
//! one — it borrows the owning [`LocalDevice`]'s correlator (and therefore
//! its frame-id space) and wraps every outbound AT command in a
//! `REMOTE_AT_COMMAND_REQUEST` addressed to the remote's 64-bit address.
//! Identity fields (`NI`/`HV`/`VR`) are not known up front; they're fetched
//! lazily, over the air, the first time they're asked for.

use std::sync::Arc;

use tokio::sync::Mutex;
use xbee_proto::{
    at::{AtCommandRequest, AtStatus},
    registry::FrameKind,
    Frame,
};
use xbee_core::{Correlator, Transport, XBeeError};

use crate::identity::{Addr16, Addr64, HardwareVersion, Protocol};

type Result<T> = std::result::Result<T, XBeeError>;

/// Minimal identity a remote device can report once queried: `NI`, `HV`,
/// `VR`. Unlike [`crate::identity::DeviceIdentity`], the remote's own
/// address is known up front (it's how we address it), so only the
/// over-the-air-only fields are cached here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteIdentity {
    /// Friendly node identifier, if fetched.
    pub node_id: Option<Vec<u8>>,
    /// Hardware version, if fetched.
    pub hardware_version: Option<HardwareVersion>,
    /// Firmware version, if fetched.
    pub firmware_version: Option<String>,
}

/// A device reached over the air through another device's radio.
pub struct RemoteDevice<T: Transport> {
    correlator: Arc<Correlator<T>>,
    addr64: Addr64,
    cached: Mutex<RemoteIdentity>,
}

impl<T: Transport> RemoteDevice<T> {
    /// Builds a handle to the remote at `addr64`, sending through
    /// `correlator` (typically [`crate::device::LocalDevice::correlator`]).
    #[must_use]
    pub fn new(correlator: Arc<Correlator<T>>, addr64: Addr64) -> Self {
        Self { correlator, addr64, cached: Mutex::new(RemoteIdentity::default()) }
    }

    /// The remote's 64-bit address.
    #[must_use]
    pub fn addr64(&self) -> Addr64 {
        self.addr64
    }

    async fn remote_at_command(&self, request: AtCommandRequest) -> Result<Vec<u8>> {
        let mut payload = Vec::with_capacity(11 + request.parameter.len() + 2);
        payload.extend_from_slice(&self.addr64.0);
        payload.extend_from_slice(&Addr16::UNKNOWN.0);
        payload.push(0x02); // apply changes immediately
        payload.extend_from_slice(&request.to_bytes());

        let frame = Frame::new(0x17, None, payload);
        let response =
            self.correlator.send_and_wait(frame, FrameKind::RemoteAtCommandResponse.to_byte()).await?;

        let parsed = parse_remote_at_response(&response.payload)
            .ok_or_else(|| XBeeError::Protocol("malformed remote AT command response".to_owned()))?;

        if !parsed.status.is_ok() {
            return Err(XBeeError::AtCommandError {
                mnemonic: String::from_utf8_lossy(&parsed.mnemonic).into_owned(),
                status: parsed.status,
            });
        }
        Ok(parsed.value)
    }

    /// Queries the current value of `mnemonic` on the remote.
    ///
    /// # Errors
    ///
    /// Propagates transport, timeout and non-OK-status failures.
    pub async fn get_parameter(&self, mnemonic: [u8; 2]) -> Result<Vec<u8>> {
        self.remote_at_command(AtCommandRequest::query(mnemonic)).await
    }

    /// Sets `mnemonic` to `value` on the remote.
    ///
    /// # Errors
    ///
    /// Propagates transport, timeout and non-OK-status failures.
    pub async fn set_parameter(&self, mnemonic: [u8; 2], value: Vec<u8>) -> Result<()> {
        self.remote_at_command(AtCommandRequest::set(mnemonic, value)).await?;
        Ok(())
    }

    /// Fetches (and caches) `NI`, `HV` and `VR` from the remote, skipping
    /// any field already cached from a previous call.
    ///
    /// # Errors
    ///
    /// Propagates transport, timeout and non-OK-status failures from
    /// whichever queries are still needed.
    pub async fn identity(&self) -> Result<RemoteIdentity> {
        let mut cached = self.cached.lock().await;
        if cached.node_id.is_none() {
            cached.node_id = Some(self.get_parameter(*b"NI").await?);
        }
        if cached.hardware_version.is_none() {
            let hv = self.get_parameter(*b"HV").await?;
            cached.hardware_version = Some(HardwareVersion::from_byte(*hv.last().unwrap_or(&0)));
        }
        if cached.firmware_version.is_none() {
            let vr = self.get_parameter(*b"VR").await?;
            cached.firmware_version = Some(hex::encode_upper(&vr));
        }
        Ok(cached.clone())
    }

    /// Resolves the remote's protocol family from its cached (or freshly
    /// fetched) hardware version.
    ///
    /// # Errors
    ///
    /// As [`RemoteDevice::identity`].
    pub async fn protocol(&self) -> Result<Protocol> {
        let identity = self.identity().await?;
        let hardware_version = identity.hardware_version.unwrap_or(HardwareVersion::from_byte(0));
        let firmware_version = identity.firmware_version.unwrap_or_default();
        Ok(Protocol::resolve(hardware_version, &firmware_version))
    }
}

struct RemoteAtResponse {
    mnemonic: [u8; 2],
    status: AtStatus,
    value: Vec<u8>,
}

fn parse_remote_at_response(bytes: &[u8]) -> Option<RemoteAtResponse> {
    // 8-byte source addr64 + 2-byte source addr16 + 2-byte mnemonic +
    // 1-byte status + value.
    if bytes.len() < 13 {
        return None;
    }
    Some(RemoteAtResponse {
        mnemonic: [bytes[10], bytes[11]],
        status: AtStatus::from_byte(bytes[12]),
        value: bytes[13..].to_vec(),
    })
}
