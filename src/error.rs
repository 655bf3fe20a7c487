// MIT License - Copyright (c) 2026 Peter Wright
// ISECNet error taxonomy

use std::fmt;

use crate::interpret::ResponseContext;
use crate::models::{Category, Generation};
use crate::transport::session::Phase;

/// Failures reported while the relay or receiver tunnels us to the central.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeFailure {
    /// The central has no open link to the relay/receiver
    CentralNotConnected,
    /// Another client holds the central
    CentralBusy,
    /// The relay does not know the central
    CentralNotFound,
    /// The central is registered but offline
    CentralOffline,
}

impl HandshakeFailure {
    pub fn description(&self) -> &'static str {
        match self {
            Self::CentralNotConnected => "Central not connected",
            Self::CentralBusy => "Central busy",
            Self::CentralNotFound => "Central not found",
            Self::CentralOffline => "Central offline",
        }
    }
}

impl fmt::Display for HandshakeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Authorization failures. Never retried with the same password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthFailure {
    InvalidPassword,
    BlockedUser,
    NoPermission,
}

impl AuthFailure {
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidPassword => "Invalid password",
            Self::BlockedUser => "User is blocked",
            Self::NoPermission => "No permission",
        }
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Command rejections returned by the central.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommandFailure {
    /// 0x00 - central reported an error without detail
    Unspecified,
    /// 0xE0 - malformed package
    InvalidPackage,
    /// 0xE2 - command not understood
    InvalidCommand,
    /// 0xE3 - central has no partitions
    NoPartitions,
    /// 0xE4 / NACK 1 - open zones block arming. Carries 0-based zone indices
    /// when the reply includes them.
    OpenZones(Vec<u8>),
    /// 0xE5 - command deprecated
    Deprecated,
    /// 0xE6 - bypass denied
    BypassDenied,
    /// 0xE7 - deactivation denied
    DeactivationDenied,
    /// 0xE8 - bypass refused while central is armed
    BypassWithCentralArmed,
    /// 0xFF - command invalid for this model
    InvalidModel,
    /// NACK 2 - battery too low to arm
    LowBattery,
}

impl CommandFailure {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Unspecified => "Unknown error",
            Self::InvalidPackage => "Invalid package",
            Self::InvalidCommand => "Invalid command",
            Self::NoPartitions => "Central has no partitions",
            Self::OpenZones(_) => "Open zones",
            Self::Deprecated => "Command deprecated",
            Self::BypassDenied => "Bypass denied",
            Self::DeactivationDenied => "Deactivation denied",
            Self::BypassWithCentralArmed => "Bypass refused, central armed",
            Self::InvalidModel => "Invalid model",
            Self::LowBattery => "Low battery",
        }
    }
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenZones(zones) if !zones.is_empty() => {
                let numbers: Vec<String> = zones.iter().map(|z| (*z as u16 + 1).to_string()).collect();
                write!(f, "Open zones: {}", numbers.join(", "))
            }
            other => f.write_str(other.description()),
        }
    }
}

/// Framing errors raised by the codecs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("declared size {declared} does not match {actual} bytes received")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("missing 0x21 delimiter at offset {offset}")]
    MissingDelimiter { offset: usize },

    #[error("unexpected command 0x{actual:04X} (expected 0x{expected:04X})")]
    UnexpectedCommand { expected: u16, actual: u16 },

    #[error("password field is not ASCII digits")]
    NonDigitPassword,

    #[error("payload too large: {len} bytes")]
    PayloadTooLarge { len: usize },
}

/// All errors that can occur in the isecnet-bridge library.
#[derive(Debug, thiserror::Error)]
pub enum IsecError {
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Timeout during {stage}")]
    Timeout { stage: &'static str },

    #[error("Handshake failed: {0}")]
    Handshake(HandshakeFailure),

    #[error("Authorization failed: {0}")]
    Auth(AuthFailure),

    #[error("Corrupt frame: {0}")]
    FrameCorrupt(#[from] FrameError),

    #[error("Command rejected: {0}")]
    Command(CommandFailure),

    #[error("Unknown model code: 0x{0:02X}")]
    UnknownModel(u8),

    #[error("Unrecognized response code 0x{code:02X} during {context}")]
    UnrecognizedResponse { code: u8, context: ResponseContext },

    #[error("Invalid response: {details}")]
    InvalidResponse { details: String },

    #[error("Invalid partition index: {index} (partitions: {count})")]
    InvalidPartition { index: u8, count: u8 },

    #[error("Invalid zone index: {index} (max: {max})")]
    InvalidZone { index: u8, max: u8 },

    #[error("Invalid PGM index: {index} (max: {max})")]
    InvalidOutput { index: u8, max: u8 },

    #[error("{command} is not available on {generation} centrals")]
    UnsupportedCommand {
        command: &'static str,
        generation: Generation,
    },

    #[error("{operation} is not available on {category} devices")]
    CategoryMismatch {
        operation: &'static str,
        category: Category,
    },

    #[error("{generation} centrals cannot be reached through {route}")]
    UnsupportedRoute {
        generation: Generation,
        route: &'static str,
    },

    #[error("No V1 cloud relay configured")]
    MissingRelay,

    #[error("Cannot {action} while session is {phase}")]
    InvalidPhase { phase: Phase, action: &'static str },

    #[error("Invalid MAC address: {mac}")]
    InvalidMac { mac: String },

    #[error("Invalid device password: {reason}")]
    InvalidPassword { reason: &'static str },
}

impl IsecError {
    /// Whether the caller may retry with backoff. The engine itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IsecError::Transport(_) | IsecError::Timeout { .. })
    }
}

impl From<HandshakeFailure> for IsecError {
    fn from(f: HandshakeFailure) -> Self {
        IsecError::Handshake(f)
    }
}

impl From<AuthFailure> for IsecError {
    fn from(f: AuthFailure) -> Self {
        IsecError::Auth(f)
    }
}

impl From<CommandFailure> for IsecError {
    fn from(f: CommandFailure) -> Self {
        IsecError::Command(f)
    }
}

pub type Result<T> = std::result::Result<T, IsecError>;
