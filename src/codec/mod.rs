// MIT License - Copyright (c) 2026 Peter Wright
// Frame codecs for both protocol generations

pub mod checksum;
pub mod v1;
pub mod v2;

pub use checksum::ChecksumKind;
pub use v1::{IsecFrame, PacketKind, V1Frame};
pub use v2::{V2Frame, V2Reply};

/// Lowercase hex dump for debug logging.
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
