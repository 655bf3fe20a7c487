// MIT License - Copyright (c) 2026 Peter Wright
// Per-operation session: connect, handshake, exchange, close

use std::fmt;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::codec::v2::PREFIX_LEN;
use crate::codec::{hex, IsecFrame, PacketKind, V1Frame, V2Frame, V2Reply};
use crate::config::{EngineConfig, Endpoint, Route};
use crate::constants::{server, v2, COMPLETE_STATUS_LEN, PARTIAL_STATUS_LEN};
use crate::device::{Device, Password};
use crate::devices::zone::ZoneMask;
use crate::error::{CommandFailure, IsecError, Result};
use crate::interpret::{interpret, Failure, ResponseContext, ResponseOutcome};
use crate::models::{Generation, ModelSpec};
use crate::transport::Connector;

/// Lifecycle of a session.
///
/// ```text
/// Idle -> KeyExchanged -> Connected -> Authenticated -> Ready -> Closed
///    \__________\______________\____________\____________\--> Failed
/// ```
///
/// V1 sessions skip `Authenticated`: the password travels in every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    KeyExchanged,
    Connected,
    Authenticated,
    Ready,
    Closed,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::KeyExchanged => "key exchanged",
            Self::Connected => "connected",
            Self::Authenticated => "authenticated",
            Self::Ready => "ready",
            Self::Closed => "closed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A V1 reply as read off the wire.
#[derive(Debug, Clone)]
pub struct V1Reply {
    /// Complete frame, size byte and checksum included
    pub raw: Vec<u8>,
    pub frame: V1Frame,
}

impl V1Reply {
    /// Status replies are recognised by their fixed length.
    pub fn is_status(&self) -> bool {
        matches!(self.raw.len(), PARTIAL_STATUS_LEN | COMPLETE_STATUS_LEN)
    }
}

/// Endpoints to try, in order, for a device.
pub fn endpoints_for(device: &Device, config: &EngineConfig) -> Result<Vec<Endpoint>> {
    match (device.generation(), &device.route) {
        (Generation::V2, Route::Cloud) => Ok(config
            .cloud_ports
            .iter()
            .map(|port| Endpoint::new(config.cloud_host.clone(), *port))
            .collect()),
        (Generation::V2, route) => Err(IsecError::UnsupportedRoute {
            generation: Generation::V2,
            route: route.name(),
        }),
        (Generation::V1, Route::Cloud) => config
            .v1_relay
            .clone()
            .map(|ep| vec![ep])
            .ok_or(IsecError::MissingRelay),
        (Generation::V1, Route::IpReceiver(ep)) => Ok(vec![ep.clone()]),
    }
}

/// One connection to one device. Sessions are never pooled: each operation
/// opens its own and closes it when done. Dropping a session closes the
/// underlying stream.
pub struct Session<S> {
    stream: Option<S>,
    phase: Phase,
    model: &'static ModelSpec,
    generation: Generation,
    route: Route,
    password: Password,
    timeout: Duration,
    /// Masking key from the key exchange (cloud routes only)
    key: Option<u8>,
    /// Source id assigned by the V2 relay
    source: u16,
    firmware: Option<Vec<u8>>,
}

impl<S> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("phase", &self.phase)
            .field("model", &self.model.name)
            .field("route", &self.route)
            .field("source", &self.source)
            .finish()
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already-connected stream. The session starts `Idle`.
    pub fn new(stream: S, device: &Device, password: Password, config: &EngineConfig) -> Self {
        Self {
            stream: Some(stream),
            phase: Phase::Idle,
            model: device.model,
            generation: device.generation(),
            route: device.route.clone(),
            password,
            timeout: config.timeout_for(&device.route),
            key: None,
            source: 0,
            firmware: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn model(&self) -> &'static ModelSpec {
        self.model
    }

    /// Firmware version reported by the V1 relay, if any.
    pub fn firmware(&self) -> Option<&[u8]> {
        self.firmware.as_deref()
    }

    /// Source id assigned during the V2 handshake.
    pub fn source_id(&self) -> u16 {
        self.source
    }

    pub fn key(&self) -> Option<u8> {
        self.key
    }

    /// Drive the handshake for this generation and route to `Ready`.
    pub async fn handshake(&mut self, device: &Device, config: &EngineConfig) -> Result<()> {
        self.require(Phase::Idle, "start handshake")?;
        let result = match (device.generation(), &device.route) {
            (Generation::V2, Route::Cloud) => self.handshake_v2(device).await,
            (Generation::V1, Route::Cloud) => self.handshake_v1_relay(device, config).await,
            (Generation::V1, Route::IpReceiver(_)) => self.handshake_ip_receiver(device).await,
            (Generation::V2, route) => Err(IsecError::UnsupportedRoute {
                generation: Generation::V2,
                route: route.name(),
            }),
        };
        let result = self.guard(result);
        if result.is_ok() {
            info!(
                "Session ready: {} via {}",
                self.model.name,
                self.route.name()
            );
        }
        result
    }

    /// Cloud relay key exchange, then CONNECT with client id and MAC.
    async fn handshake_v1_relay(&mut self, device: &Device, config: &EngineConfig) -> Result<()> {
        let get_byte = V1Frame::new(server::GET_BYTE, Vec::new()).encode(PacketKind::CloudGetByte)?;
        self.write(&get_byte, "relay key exchange").await?;
        let reply = self.read_v1("relay key exchange").await?;
        let key = reply.frame.code().ok_or_else(|| IsecError::InvalidResponse {
            details: "relay key exchange reply carries no key".to_string(),
        })?;
        self.key = Some(key);
        self.advance(Phase::KeyExchanged);

        let mut payload = config.client_id.as_bytes().to_vec();
        payload.push(0x00);
        payload.extend_from_slice(&device.mac.bytes());
        let mut connect = V1Frame::new(server::CONNECT, payload).encode(PacketKind::CloudConnect)?;
        crate::codec::v2::mask(&mut connect, key);
        self.write(&connect, "relay connect").await?;

        let reply = self.read_v1("relay connect").await?;
        let code = reply.frame.code().ok_or_else(|| IsecError::InvalidResponse {
            details: "relay connect reply is empty".to_string(),
        })?;
        let outcome = interpret(code, ResponseContext::HandshakeV1);
        if outcome == ResponseOutcome::AcceptedWithFirmware {
            let firmware = reply.frame.payload[1..].to_vec();
            debug!("Relay reported firmware {}", hex(&firmware));
            self.firmware = Some(firmware);
        }
        outcome.into_result()?;
        self.advance(Phase::Connected);
        self.advance(Phase::Ready);
        Ok(())
    }

    /// IP receiver GET_BYTE, then APP_CONNECT with the account. No auth step.
    async fn handshake_ip_receiver(&mut self, device: &Device) -> Result<()> {
        let get_byte = V1Frame::new(
            server::IP_RECEIVER_GET_BYTE,
            vec![server::IP_RECEIVER_GET_BYTE_ARG],
        )
        .encode(PacketKind::IpReceiverGetByte)?;
        self.write(&get_byte, "receiver key exchange").await?;
        let reply = self.read_v1("receiver key exchange").await?;
        self.expect_code(&reply, ResponseContext::HandshakeIpReceiver)?;
        self.advance(Phase::KeyExchanged);

        let mut payload = vec![server::CONNECTION_ETHERNET];
        payload.extend_from_slice(device.id.as_bytes());
        let connect = V1Frame::new(server::IP_RECEIVER_CONNECT, payload)
            .encode(PacketKind::IpReceiverConnect)?;
        self.write(&connect, "receiver connect").await?;
        let reply = self.read_v1("receiver connect").await?;
        self.expect_code(&reply, ResponseContext::HandshakeIpReceiver)?;
        self.advance(Phase::Connected);
        self.advance(Phase::Ready);
        Ok(())
    }

    /// CONNECT for the key, masked APP_CONNECT for the source id, AUTHORIZE.
    async fn handshake_v2(&mut self, device: &Device) -> Result<()> {
        let connect = V2Frame::new(0, v2::CONNECT, vec![0]).encode()?;
        self.write(&connect, "connect").await?;
        let reply = self.read_v2("connect").await?;
        let key = *reply.payload.first().ok_or_else(|| IsecError::InvalidResponse {
            details: "connect reply carries no key".to_string(),
        })?;
        self.key = Some(key);
        self.advance(Phase::KeyExchanged);

        let name = format!("{}{}", v2::DEVICE_NAME_PREFIX, device.mac);
        let app_connect =
            V2Frame::new(0, v2::APP_CONNECT, name.into_bytes()).encode_masked(key)?;
        self.write(&app_connect, "app connect").await?;
        let reply = self.read_v2("app connect").await?;
        let code = *reply.payload.first().ok_or_else(|| IsecError::InvalidResponse {
            details: "app connect reply is empty".to_string(),
        })?;
        interpret(code, ResponseContext::HandshakeV2Connect).into_result()?;
        let source = reply.payload.get(1..3).ok_or_else(|| IsecError::InvalidResponse {
            details: "app connect reply carries no source id".to_string(),
        })?;
        self.source = u16::from_be_bytes([source[0], source[1]]);
        debug!("Relay assigned source id 0x{:04X}", self.source);
        self.advance(Phase::Connected);

        let mut payload = vec![v2::AUTH_SOFTWARE_TYPE];
        payload.extend_from_slice(&self.password.v2_digits());
        payload.extend_from_slice(&v2::AUTH_SOFTWARE_VERSION);
        let authorize = V2Frame::new(self.source, v2::AUTHORIZE, payload).encode()?;
        self.write(&authorize, "authorize").await?;
        let reply = self.read_v2("authorize").await?;
        if let V2Reply::Nack { reason, .. } = reply.reply() {
            return Err(reject(interpret(reason, ResponseContext::CommandV2Ack), &[]));
        }
        let code = *reply.payload.first().ok_or_else(|| IsecError::InvalidResponse {
            details: "authorize reply is empty".to_string(),
        })?;
        interpret(code, ResponseContext::HandshakeV2Auth).into_result()?;
        self.advance(Phase::Authenticated);
        self.advance(Phase::Ready);
        Ok(())
    }

    /// Send a password-bearing V1 command and read its reply.
    ///
    /// Status-sized replies are returned as is. Anything else must carry an
    /// accepting result code in its first payload byte.
    pub async fn command_v1(&mut self, data: Vec<u8>) -> Result<V1Reply> {
        self.require_generation(Generation::V1, "send V1 command", "V1 framing")?;
        let result = self.exchange_v1(data).await;
        self.guard(result)
    }

    async fn exchange_v1(&mut self, data: Vec<u8>) -> Result<V1Reply> {
        let bytes = IsecFrame::new(self.password.as_str(), data).encode()?;
        self.write(&bytes, "command").await?;
        let reply = self.read_v1("command").await?;
        if reply.is_status() {
            return Ok(reply);
        }
        let code = reply.frame.code().ok_or_else(|| IsecError::InvalidResponse {
            details: format!("empty command reply: {}", hex(&reply.raw)),
        })?;
        match interpret(code, ResponseContext::CommandV1) {
            outcome if outcome.is_accepted() => Ok(reply),
            outcome => Err(reject(outcome, &reply.frame.payload[1..])),
        }
    }

    /// Send a V2 command and read its reply. ACK and data replies succeed;
    /// a NACK is mapped through its reason byte.
    pub async fn command_v2(&mut self, command: u16, payload: Vec<u8>) -> Result<V2Frame> {
        self.require_generation(Generation::V2, "send V2 command", "V2 framing")?;
        let result = self.exchange_v2(command, payload).await;
        self.guard(result)
    }

    async fn exchange_v2(&mut self, command: u16, payload: Vec<u8>) -> Result<V2Frame> {
        let bytes = V2Frame::new(self.source, command, payload).encode()?;
        self.write(&bytes, "command").await?;
        let reply = self.read_v2("command").await?;
        if let V2Reply::Nack { reason, detail } = reply.reply() {
            return Err(reject(interpret(reason, ResponseContext::CommandV2Ack), detail));
        }
        Ok(reply)
    }

    /// Close the session. V2 sessions that got past the key exchange send a
    /// best-effort DISCONNECT first.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let connected = matches!(
                self.phase,
                Phase::Connected | Phase::Authenticated | Phase::Ready
            );
            if connected && self.generation == Generation::V2 {
                if let Ok(bytes) = V2Frame::new(self.source, v2::DISCONNECT, Vec::new()).encode() {
                    match timeout(self.timeout, stream.write_all(&bytes)).await {
                        Ok(Ok(())) => debug!("Sent DISCONNECT"),
                        Ok(Err(e)) => debug!("DISCONNECT not sent: {}", e),
                        Err(_) => debug!("DISCONNECT timed out"),
                    }
                }
            }
            if let Err(e) = stream.shutdown().await {
                debug!("Stream shutdown failed: {}", e);
            }
        }
        if self.phase != Phase::Failed {
            self.phase = Phase::Closed;
        }
        debug!("Session closed");
    }

    fn require(&self, expected: Phase, action: &'static str) -> Result<()> {
        if self.phase != expected {
            return Err(IsecError::InvalidPhase {
                phase: self.phase,
                action,
            });
        }
        Ok(())
    }

    fn require_generation(
        &self,
        generation: Generation,
        action: &'static str,
        framing: &'static str,
    ) -> Result<()> {
        self.require(Phase::Ready, action)?;
        if self.generation != generation {
            return Err(IsecError::UnsupportedRoute {
                generation: self.generation,
                route: framing,
            });
        }
        Ok(())
    }

    fn advance(&mut self, next: Phase) {
        debug!("Session {} -> {}", self.phase, next);
        self.phase = next;
    }

    /// Any error moves the session to `Failed` and releases the stream.
    fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!("Session failed in phase {}: {}", self.phase, e);
            self.phase = Phase::Failed;
            self.stream = None;
        }
        result
    }

    fn expect_code(&self, reply: &V1Reply, context: ResponseContext) -> Result<()> {
        let code = reply.frame.code().ok_or_else(|| IsecError::InvalidResponse {
            details: format!("{} reply is empty", context),
        })?;
        interpret(code, context).into_result()
    }

    fn stream(&mut self) -> Result<&mut S> {
        let phase = self.phase;
        self.stream.as_mut().ok_or(IsecError::InvalidPhase {
            phase,
            action: "use transport",
        })
    }

    async fn write(&mut self, bytes: &[u8], stage: &'static str) -> Result<()> {
        debug!("TX [{}] {}", stage, hex(bytes));
        let limit = self.timeout;
        let stream = self.stream()?;
        timeout(limit, stream.write_all(bytes))
            .await
            .map_err(|_| IsecError::Timeout { stage })??;
        Ok(())
    }

    async fn read_exact_timed(
        &mut self,
        buf: &mut [u8],
        stage: &'static str,
    ) -> Result<()> {
        let limit = self.timeout;
        let stream = self.stream()?;
        timeout(limit, stream.read_exact(buf))
            .await
            .map_err(|_| IsecError::Timeout { stage })??;
        Ok(())
    }

    /// Read one V1 frame: the size byte first, then the rest.
    async fn read_v1(&mut self, stage: &'static str) -> Result<V1Reply> {
        let mut size = [0u8; 1];
        self.read_exact_timed(&mut size, stage).await?;
        let mut raw = vec![0u8; V1Frame::frame_len(size[0])];
        raw[0] = size[0];
        self.read_exact_timed(&mut raw[1..], stage).await?;
        debug!("RX [{}] {}", stage, hex(&raw));
        let frame = V1Frame::decode(&raw, PacketKind::Reply)?;
        Ok(V1Reply { raw, frame })
    }

    /// Read one V2 frame: the 6-byte prefix first, then the rest.
    async fn read_v2(&mut self, stage: &'static str) -> Result<V2Frame> {
        let mut prefix = [0u8; PREFIX_LEN];
        self.read_exact_timed(&mut prefix, stage).await?;
        let mut raw = vec![0u8; V2Frame::frame_len(&prefix)];
        raw[..PREFIX_LEN].copy_from_slice(&prefix);
        self.read_exact_timed(&mut raw[PREFIX_LEN..], stage).await?;
        debug!("RX [{}] {}", stage, hex(&raw));
        Ok(V2Frame::decode(&raw)?)
    }
}

impl<S> Drop for Session<S> {
    fn drop(&mut self) {
        if self.stream.is_some() {
            debug!("Session dropped in phase {}, closing transport", self.phase);
        }
    }
}

/// Turn a non-accepting outcome into an error, attaching the open-zone list
/// from `detail` when the central refused because zones were open.
fn reject(outcome: ResponseOutcome, detail: &[u8]) -> IsecError {
    match outcome {
        ResponseOutcome::Failed(Failure::Command(CommandFailure::OpenZones(_))) => {
            CommandFailure::OpenZones(ZoneMask::from_bytes(detail).indices()).into()
        }
        outcome => match outcome.into_result() {
            Err(e) => e,
            Ok(()) => IsecError::InvalidResponse {
                details: "accepted outcome treated as rejection".to_string(),
            },
        },
    }
}

/// Connect to the first reachable endpoint for `device` and complete the
/// handshake. Later endpoints are only tried when the TCP connect fails.
pub async fn open<C: Connector>(
    connector: &C,
    config: &EngineConfig,
    device: &Device,
    password: Password,
) -> Result<Session<C::Stream>> {
    let endpoints = endpoints_for(device, config)?;
    let mut last_err = None;
    for endpoint in &endpoints {
        match timeout(config.connect_timeout(), connector.connect(endpoint)).await {
            Ok(Ok(stream)) => {
                let mut session = Session::new(stream, device, password, config);
                session.handshake(device, config).await?;
                return Ok(session);
            }
            Ok(Err(e)) => {
                warn!("Connect to {} failed: {}", endpoint, e);
                last_err = Some(IsecError::Transport(e));
            }
            Err(_) => {
                warn!("Connect to {} timed out", endpoint);
                last_err = Some(IsecError::Timeout { stage: "connect" });
            }
        }
    }
    Err(last_err.unwrap_or(IsecError::InvalidResponse {
        details: "no endpoints to connect to".to_string(),
    }))
}
