// MIT License - Copyright (c) 2026 Peter Wright
// Engine configuration

use std::fmt;
use std::time::Duration;

use crate::constants::{CLOUD_V2_HOST, CLOUD_V2_PORTS, DEFAULT_TIMEOUT_MS, IP_RECEIVER_PORT};

/// Arm type for partition arming commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmType {
    /// Full/away arm
    Away,
    /// Partial/stay (perimeter only)
    Stay,
}

/// A TCP host and port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// How a central is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Through the vendor cloud relay (V2 relay, or the configured V1 relay)
    Cloud,
    /// Through a local IP receiver (V1 framing only)
    IpReceiver(Endpoint),
}

impl Route {
    /// IP receiver on the default port.
    pub fn ip_receiver(host: impl Into<String>) -> Self {
        Self::IpReceiver(Endpoint::new(host, IP_RECEIVER_PORT))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Cloud => "cloud relay",
            Self::IpReceiver(_) => "IP receiver",
        }
    }
}

/// Configuration shared by every session the engine opens.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// V2 cloud relay host
    pub cloud_host: String,
    /// V2 cloud relay ports, tried in order. Later ports are only tried when
    /// the TCP connect itself fails.
    pub cloud_ports: Vec<u16>,
    /// V1 cloud relay. No default; V1 centrals on the cloud route fail without it.
    pub v1_relay: Option<Endpoint>,
    /// Client identifier sent in the V1 relay CONNECT
    pub client_id: String,
    /// Per round trip timeout over the cloud relay, in milliseconds
    pub cloud_timeout_ms: u64,
    /// Per round trip timeout over an IP receiver, in milliseconds
    pub ip_receiver_timeout_ms: u64,
    /// TCP connect timeout in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cloud_host: CLOUD_V2_HOST.to_string(),
            cloud_ports: CLOUD_V2_PORTS.to_vec(),
            v1_relay: None,
            client_id: "isecnet-bridge".to_string(),
            cloud_timeout_ms: DEFAULT_TIMEOUT_MS,
            ip_receiver_timeout_ms: DEFAULT_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl EngineConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Round trip timeout for a route.
    pub fn timeout_for(&self, route: &Route) -> Duration {
        match route {
            Route::Cloud => Duration::from_millis(self.cloud_timeout_ms),
            Route::IpReceiver(_) => Duration::from_millis(self.ip_receiver_timeout_ms),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn cloud_host(mut self, host: impl Into<String>) -> Self {
        self.config.cloud_host = host.into();
        self
    }

    pub fn cloud_ports(mut self, ports: Vec<u16>) -> Self {
        self.config.cloud_ports = ports;
        self
    }

    pub fn v1_relay(mut self, endpoint: Endpoint) -> Self {
        self.config.v1_relay = Some(endpoint);
        self
    }

    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.config.client_id = id.into();
        self
    }

    pub fn cloud_timeout_ms(mut self, ms: u64) -> Self {
        self.config.cloud_timeout_ms = ms;
        self
    }

    pub fn ip_receiver_timeout_ms(mut self, ms: u64) -> Self {
        self.config.ip_receiver_timeout_ms = ms;
        self
    }

    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}
