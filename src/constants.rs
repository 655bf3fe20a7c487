// MIT License - Copyright (c) 2026 Peter Wright
// ISECNet wire constants

/// V1 frame delimiter ('!') around the password inside ISEC command frames.
pub const DELIMITER: u8 = 0x21;

/// Size in bytes of the partial status reply.
pub const PARTIAL_STATUS_LEN: usize = 46;
/// Size in bytes of the complete status reply.
pub const COMPLETE_STATUS_LEN: usize = 96;

/// Zones addressable by a 6-byte bitmask.
pub const MAX_ZONES: u8 = 48;
/// Bytes in a zone bitmask.
pub const ZONE_MASK_LEN: usize = 6;

/// V2 password length on the wire (digits, padded with zero bytes).
pub const V2_PASSWORD_DIGITS: usize = 6;

/// ISECNet V2 command codes (16-bit, big-endian on the wire).
pub mod v2 {
    pub const CONNECT: u16 = 0x30F6;
    pub const APP_CONNECT: u16 = 0xFFF1;
    pub const AUTHORIZE: u16 = 0xF0F0;
    pub const DISCONNECT: u16 = 0xF0F1;
    pub const SYSTEM_ARM_DISARM: u16 = 0x401E;
    pub const PANEL_STATUS: u16 = 0x0B4A;
    pub const TURN_OFF_SIREN: u16 = 0x4019;
    pub const BYPASS_ZONE: u16 = 0x401F;
    pub const GET_MAC: u16 = 0x3FAA;
    pub const PGM_ON_OFF: u16 = 0x45AF;

    /// Programmable outputs addressable by PGM_ON_OFF.
    pub const PGM_COUNT: u8 = 8;

    pub const ACK: u16 = 0xF0FE;
    pub const NACK: u16 = 0xF0FD;

    /// Arm operation byte in SYSTEM_ARM_DISARM.
    pub const OP_DISARM: u8 = 0;
    pub const OP_ARM_AWAY: u8 = 1;
    pub const OP_ARM_STAY: u8 = 2;

    /// Partition byte addressing every partition.
    pub const ALL_PARTITIONS: u8 = 0xFF;

    /// Authorization payload prefix (software type: mobile app).
    pub const AUTH_SOFTWARE_TYPE: u8 = 0x03;
    /// Authorization payload suffix (software version).
    pub const AUTH_SOFTWARE_VERSION: [u8; 2] = [0x00, 0x01];

    /// APP_CONNECT device name prefix, followed by the MAC in hex.
    pub const DEVICE_NAME_PREFIX: &str = "AMT8000-";
}

/// ISECNet V1 command codes.
pub mod v1 {
    /// Envelope command for all password-bearing frames.
    pub const ISEC_PROGRAM: u8 = 0xE9;
    pub const COMPLETE_STATUS: u8 = 0x53;
    pub const ACTIVATE: u8 = 0x41;
    pub const DEACTIVATE: u8 = 0x44;
    pub const BYPASS: u8 = 0x42;
    pub const SIREN_OFF: u8 = 0x4F;

    /// First partition letter ('A').
    pub const PARTITION_BASE: u8 = 0x41;
    /// Stay suffix ('P', parcial) on ACTIVATE.
    pub const STAY_SUFFIX: u8 = 0x50;
}

/// Relay / IP receiver server commands (V1 handshake packets).
pub mod server {
    /// Cloud relay key exchange.
    pub const GET_BYTE: u8 = 0x0B;
    /// Cloud relay connect with client id + MAC.
    pub const CONNECT: u8 = 0x21;
    /// IP receiver key exchange.
    pub const IP_RECEIVER_GET_BYTE: u8 = 0xE0;
    /// IP receiver connect with account.
    pub const IP_RECEIVER_CONNECT: u8 = 0xE4;

    /// IP receiver GET_BYTE payload.
    pub const IP_RECEIVER_GET_BYTE_ARG: u8 = 0x01;
    /// IP receiver connection type: ethernet.
    pub const CONNECTION_ETHERNET: u8 = 0x45;
}

/// Vendor cloud relay for V2 centrals.
pub const CLOUD_V2_HOST: &str = "amt8000.intelbras.com.br";
/// Primary port first, then the fallback.
pub const CLOUD_V2_PORTS: [u16; 2] = [9009, 80];
/// Default IP receiver port.
pub const IP_RECEIVER_PORT: u16 = 9009;
/// Default round-trip timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
