//! [`LocalDevice`]: the device facade, and its lifecycle state machine.
//!
//! `New -> Connected(open) -> Initialized -> (Initialized|Connected) ->
//! Closed`. Every command except the identity reads performed inside
//! `initialize()` requires `Initialized` and an open transport; closing and
//! reopening drops back to `Connected` without discarding cached identity.

use std::sync::Arc;

use tokio::sync::Mutex;
use xbee_proto::{
    at::{AtCommandRequest, AtCommandResponse, AtStatus},
    io_sample::{IoDataSampleRxIndicator, IoSampleRaw, RxIo16, RxIo64},
    registry::FrameKind,
    Frame,
};
use xbee_core::{Correlator, DriverConfig, ListenerRegistry, Transport, XBeeError};

use crate::{
    identity::{Addr16, Addr64, DeviceIdentity, HardwareVersion, Protocol},
    io_line::IoLine,
};

type Result<T> = std::result::Result<T, XBeeError>;

/// Lifecycle state of a [`LocalDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Constructed but never opened.
    New,
    /// Transport is open but `initialize()` hasn't completed.
    Connected,
    /// `initialize()` has completed at least once; identity is cached.
    Initialized,
    /// `close()` has been called.
    Closed,
}

/// The local-device facade: AT get/set/execute, IO configuration and
/// access, PWM, reset, and identity.
pub struct LocalDevice<T: Transport> {
    transport: Arc<T>,
    correlator: Arc<Correlator<T>>,
    listener: ListenerRegistry,
    config: DriverConfig,
    reader_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
    state: Mutex<DeviceState>,
    identity: Mutex<Option<DeviceIdentity>>,
}

impl<T: Transport> LocalDevice<T> {
    /// Builds a device over `transport`, not yet opened.
    #[must_use]
    pub fn new(transport: Arc<T>, config: DriverConfig) -> Self {
        let listener = ListenerRegistry::new();
        let correlator = Arc::new(Correlator::new(transport.clone(), listener.clone(), config.clone()));
        Self {
            transport,
            correlator,
            listener,
            config,
            reader_handle: Mutex::new(None),
            state: Mutex::new(DeviceState::New),
            identity: Mutex::new(None),
        }
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> DeviceState {
        *self.state.lock().await
    }

    /// Cached identity, if `initialize()` has completed at least once.
    pub async fn identity(&self) -> Option<DeviceIdentity> {
        self.identity.lock().await.clone()
    }

    /// The correlator this device sends through — used by [`crate::remote::RemoteDevice`]
    /// to borrow this device's frame-id space and transport.
    #[must_use]
    pub fn correlator(&self) -> Arc<Correlator<T>> {
        self.correlator.clone()
    }

    /// Opens the transport and starts the Reader task. Valid from `New` or
    /// `Closed`.
    ///
    /// # Errors
    ///
    /// Propagates transport open failures.
    pub async fn open(&self) -> Result<()> {
        self.transport.open().await?;
        let handle = tokio::spawn(xbee_core::reader::run(
            self.transport.clone(),
            self.listener.clone(),
            self.config.operating_mode.is_escaped(),
        ));
        *self.reader_handle.lock().await = Some(handle);
        *self.state.lock().await = DeviceState::Connected;
        Ok(())
    }

    /// Closes the transport and awaits the Reader task's completion.
    ///
    /// # Errors
    ///
    /// Propagates transport close failures. The lifecycle state is set to
    /// `Closed` regardless.
    pub async fn close(&self) -> Result<()> {
        let result = self.transport.close().await;
        if let Some(handle) = self.reader_handle.lock().await.take() {
            let _ = handle.await;
        }
        *self.state.lock().await = DeviceState::Closed;
        result
    }

    async fn require_ready(&self) -> Result<()> {
        if *self.state.lock().await != DeviceState::Initialized {
            return Err(XBeeError::InvalidOperatingMode);
        }
        if !self.transport.is_open().await {
            return Err(XBeeError::InterfaceNotOpen);
        }
        Ok(())
    }

    /// Reads `SH`, `SL`, `MY`, `NI`, `HV`, `VR` and caches the resulting
    /// identity. Valid from `Connected` or `Initialized` (a second call
    /// only fills in fields still at their null/sentinel value).
    ///
    /// # Errors
    ///
    /// Propagates transport and AT-command failures from any of the
    /// underlying queries.
    pub async fn initialize(&self) -> Result<DeviceIdentity> {
        if !self.transport.is_open().await {
            return Err(XBeeError::InterfaceNotOpen);
        }

        let sh = self.query_raw(*b"SH").await?;
        let sl = self.query_raw(*b"SL").await?;
        let my = self.query_raw(*b"MY").await?;
        let node_id = self.query_raw(*b"NI").await?;
        let hv = self.query_raw(*b"HV").await?;
        let vr = self.query_raw(*b"VR").await?;

        let sh_bytes = left_pad4(&sh);
        let sl_bytes = left_pad4(&sl);
        let addr16 = if my.len() >= 2 { Addr16([my[my.len() - 2], my[my.len() - 1]]) } else { Addr16::UNKNOWN };
        let hardware_version = HardwareVersion::from_byte(*hv.last().unwrap_or(&0));
        let firmware_version = hex::encode_upper(&vr);
        let protocol = Protocol::resolve(hardware_version, &firmware_version);

        let fresh = DeviceIdentity {
            addr64: Addr64::from_sh_sl(sh_bytes, sl_bytes),
            addr16,
            node_id,
            hardware_version,
            firmware_version,
            protocol,
        };

        let mut cached = self.identity.lock().await;
        match cached.as_mut() {
            Some(existing) => existing.merge_missing_from(&fresh),
            None => *cached = Some(fresh.clone()),
        }
        *self.state.lock().await = DeviceState::Initialized;
        Ok(cached.clone().unwrap_or(fresh))
    }

    async fn query_raw(&self, mnemonic: [u8; 2]) -> Result<Vec<u8>> {
        let response = self.at_command(AtCommandRequest::query(mnemonic)).await?;
        Ok(response.value.to_vec())
    }

    async fn at_command(&self, request: AtCommandRequest) -> Result<AtCommandResponse> {
        let frame = Frame::new(0x08, None, request.to_bytes());
        let response = self.correlator.send_and_wait(frame, FrameKind::AtCommandResponse.to_byte()).await?;
        let parsed = AtCommandResponse::from_bytes(&response.payload)
            .ok_or_else(|| XBeeError::Protocol("malformed AT command response".to_owned()))?;
        if !parsed.status.is_ok() {
            return Err(XBeeError::AtCommandError {
                mnemonic: String::from_utf8_lossy(&parsed.mnemonic).into_owned(),
                status: parsed.status,
            });
        }
        Ok(parsed)
    }

    /// Queries the current value of `mnemonic`.
    ///
    /// # Errors
    ///
    /// See [`LocalDevice::at_command`]; requires `Initialized` + open.
    pub async fn get_parameter(&self, mnemonic: [u8; 2]) -> Result<Vec<u8>> {
        self.require_ready().await?;
        self.query_raw(mnemonic).await
    }

    /// Sets `mnemonic` to `value`.
    ///
    /// # Errors
    ///
    /// See [`LocalDevice::at_command`]; requires `Initialized` + open.
    pub async fn set_parameter(&self, mnemonic: [u8; 2], value: Vec<u8>) -> Result<()> {
        self.require_ready().await?;
        self.at_command(AtCommandRequest::set(mnemonic, value)).await?;
        Ok(())
    }

    /// Executes a parameterless command mnemonic (e.g. `WR`, `FR`).
    ///
    /// # Errors
    ///
    /// See [`LocalDevice::at_command`]; requires `Initialized` + open.
    pub async fn execute_parameter(&self, mnemonic: [u8; 2]) -> Result<()> {
        self.require_ready().await?;
        self.at_command(AtCommandRequest::query(mnemonic)).await?;
        Ok(())
    }

    /// Configures `line`'s function (e.g. `3` for digital output high, `2`
    /// for digital input, `0` for disabled — the raw mode byte is passed
    /// through as `mode`).
    ///
    /// # Errors
    ///
    /// See [`LocalDevice::at_command`]; requires `Initialized` + open.
    pub async fn set_io_config(&self, line: IoLine, mode: u8) -> Result<()> {
        self.set_parameter(line.configure_mnemonic(), vec![mode]).await
    }

    /// Reads back `line`'s configured mode byte.
    ///
    /// # Errors
    ///
    /// See [`LocalDevice::at_command`]; requires `Initialized` + open.
    pub async fn get_io_config(&self, line: IoLine) -> Result<u8> {
        let value = self.get_parameter(line.configure_mnemonic()).await?;
        value.first().copied().ok_or(XBeeError::OpNotSupported)
    }

    /// Drives `line` high or low. Per the configure-mnemonic-reuse design,
    /// this issues the same AT mnemonic used by [`LocalDevice::set_io_config`],
    /// with the digital-output-high/low mode byte as its parameter.
    ///
    /// # Errors
    ///
    /// See [`LocalDevice::at_command`]; requires `Initialized` + open.
    pub async fn set_dio(&self, line: IoLine, high: bool) -> Result<()> {
        let mode = if high { 5 } else { 4 };
        self.set_parameter(line.configure_mnemonic(), vec![mode]).await
    }

    /// Reads `line`'s current digital value from an immediate IO sample.
    ///
    /// # Errors
    ///
    /// [`XBeeError::OpNotSupported`] if the channel isn't present in the
    /// sample; otherwise as [`LocalDevice::sample_io`].
    pub async fn get_dio(&self, line: IoLine) -> Result<bool> {
        let sample = self.sample_io().await?;
        sample.digital_high(line.channel()).ok_or(XBeeError::OpNotSupported)
    }

    /// Sets `line`'s PWM duty cycle as a percentage, via its dedicated
    /// `M0`/`M1` mnemonic (`int = round(pct·1023/100)`).
    ///
    /// # Errors
    ///
    /// [`XBeeError::InvalidArg`] if `line` isn't PWM-capable or `pct` isn't
    /// in `0.0..=100.0`; otherwise as [`LocalDevice::at_command`].
    pub async fn set_pwm_duty(&self, line: IoLine, pct: f64) -> Result<()> {
        let Some(mnemonic) = line.pwm_mnemonic() else {
            return Err(XBeeError::InvalidArg(format!("channel {} is not PWM-capable", line.channel())));
        };
        if !(0.0..=100.0).contains(&pct) {
            return Err(XBeeError::InvalidArg(format!("pwm duty {pct} out of range 0..=100")));
        }
        let duty = (pct * 1023.0 / 100.0).round() as u16;
        self.set_parameter(mnemonic, duty.to_be_bytes().to_vec()).await
    }

    /// Reads back `line`'s configured PWM duty cycle as a percentage
    /// (`round((v·100/1023)·100)/100`).
    ///
    /// # Errors
    ///
    /// [`XBeeError::InvalidArg`] if `line` isn't PWM-capable;
    /// [`XBeeError::OpNotSupported`] if the device's response carries no
    /// value; otherwise as [`LocalDevice::at_command`].
    pub async fn get_pwm_duty(&self, line: IoLine) -> Result<f64> {
        let Some(mnemonic) = line.pwm_mnemonic() else {
            return Err(XBeeError::InvalidArg(format!("channel {} is not PWM-capable", line.channel())));
        };
        let value = self.get_parameter(mnemonic).await?;
        if value.len() < 2 {
            return Err(XBeeError::OpNotSupported);
        }
        let duty = f64::from(u16::from_be_bytes([value[0], value[1]]));
        Ok(((duty * 100.0 / 1023.0) * 100.0).round() / 100.0)
    }

    /// Reads `line`'s current analog value from an immediate IO sample.
    ///
    /// # Errors
    ///
    /// [`XBeeError::OpNotSupported`] if the channel isn't analog-capable or
    /// isn't present in the sample; otherwise as [`LocalDevice::sample_io`].
    pub async fn get_adc(&self, line: IoLine) -> Result<u16> {
        if !line.is_analog_capable() {
            return Err(XBeeError::OpNotSupported);
        }
        let sample = self.sample_io().await?;
        sample.analog_value(line.channel()).ok_or(XBeeError::OpNotSupported)
    }

    /// Triggers a software reset of the module.
    ///
    /// # Errors
    ///
    /// See [`LocalDevice::at_command`]; requires `Initialized` + open.
    pub async fn reset(&self) -> Result<()> {
        self.execute_parameter(*b"FR").await
    }

    /// Takes a single IO sample ("force sample", AT `IS`).
    ///
    /// For [`Protocol::Raw802_15_4`] devices the sample arrives as an
    /// asynchronous RX-indicator frame rather than the AT response itself,
    /// observed through a one-shot global-listener subscription bounded by
    /// `receive_timeout`; every other protocol decodes the sample straight
    /// out of the `IS` AT response value.
    ///
    /// # Errors
    ///
    /// [`XBeeError::Timeout`] if no sampling frame arrives in time for an
    /// asynchronous-sampling device; [`XBeeError::Protocol`] if the sample
    /// payload can't be parsed; otherwise as [`LocalDevice::at_command`].
    pub async fn sample_io(&self) -> Result<IoSampleRaw> {
        self.require_ready().await?;

        let is_async = self
            .identity
            .lock()
            .await
            .as_ref()
            .is_some_and(|identity| identity.protocol.samples_asynchronously());

        if is_async {
            self.sample_io_async().await
        } else {
            let response = self.at_command(AtCommandRequest::query(*b"IS")).await?;
            decode_is_response(&response.value).ok_or_else(|| {
                XBeeError::Protocol("malformed IS response payload".to_owned())
            })
        }
    }

    async fn sample_io_async(&self) -> Result<IoSampleRaw> {
        let subscription = self.listener.subscribe_global().await;
        self.execute_parameter(*b"IS").await?;

        let deadline = tokio::time::Instant::now() + self.config.receive_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Err(XBeeError::Timeout);
            }
            let frame = match tokio::time::timeout(remaining, subscription.recv()).await {
                Ok(Some(frame)) => frame,
                Ok(None) => return Err(XBeeError::TransportClosed),
                Err(_) => return Err(XBeeError::Timeout),
            };
            if let Some(sample) = sample_from_rx_frame(&frame) {
                return Ok(sample);
            }
        }
    }
}

fn sample_from_rx_frame(frame: &Frame) -> Option<IoSampleRaw> {
    match FrameKind::from_byte(frame.frame_type) {
        FrameKind::RxIo64 => RxIo64::from_bytes(&frame.payload).map(|parsed| parsed.sample),
        FrameKind::RxIo16 => RxIo16::from_bytes(&frame.payload).map(|parsed| parsed.sample),
        FrameKind::IoDataSampleRxIndicator => {
            IoDataSampleRxIndicator::from_bytes(&frame.payload).map(|parsed| parsed.sample)
        },
        _ => None,
    }
}

fn decode_is_response(bytes: &[u8]) -> Option<IoSampleRaw> {
    // Leading byte is the vendor "number of samples" count; this driver
    // only ever requests one.
    let rest = bytes.get(1..)?;
    IoSampleRaw::parse(rest)
}

fn left_pad4(bytes: &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    let len = bytes.len().min(4);
    out[4 - len..].copy_from_slice(&bytes[bytes.len() - len..]);
    out
}
