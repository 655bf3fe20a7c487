// MIT License - Copyright (c) 2026 Peter Wright
// ISECNet V2 framing

use crate::codec::checksum::ChecksumKind;
use crate::constants::v2::{ACK, NACK};
use crate::error::FrameError;

/// Bytes before the payload: destination, source, size, command.
pub const HEADER_LEN: usize = 8;
/// Bytes needed to learn the total frame length (destination, source, size).
pub const PREFIX_LEN: usize = 6;
/// Smallest possible frame: header plus checksum.
pub const MIN_FRAME_LEN: usize = HEADER_LEN + 1;

/// A V2 frame.
///
/// ```text
/// [destination:2][source:2][size:2][command:2][payload:N][checksum:1]
/// ```
///
/// Multi-byte fields are big-endian. `size` counts command + payload.
/// The checksum is XOR-inverted over every preceding byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V2Frame {
    pub destination: u16,
    pub source: u16,
    pub command: u16,
    pub payload: Vec<u8>,
}

/// Classification of a decoded reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum V2Reply<'a> {
    Ack,
    /// Reason byte followed by whatever detail the central appended
    Nack { reason: u8, detail: &'a [u8] },
    /// Any other command, typically the echo of the request with data
    Data { command: u16, payload: &'a [u8] },
}

impl V2Frame {
    /// Frame addressed to the central (destination 0).
    pub fn new(source: u16, command: u16, payload: Vec<u8>) -> Self {
        Self {
            destination: 0,
            source,
            command,
            payload,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        let size = self.payload.len() + 2;
        if size > u16::MAX as usize {
            return Err(FrameError::PayloadTooLarge {
                len: self.payload.len(),
            });
        }
        let mut buf = Vec::with_capacity(HEADER_LEN + self.payload.len() + 1);
        buf.extend_from_slice(&self.destination.to_be_bytes());
        buf.extend_from_slice(&self.source.to_be_bytes());
        buf.extend_from_slice(&(size as u16).to_be_bytes());
        buf.extend_from_slice(&self.command.to_be_bytes());
        buf.extend_from_slice(&self.payload);
        buf.push(ChecksumKind::XorInverted.compute(&buf));
        Ok(buf)
    }

    /// Encode, then XOR every byte (checksum included) with the negotiated key.
    pub fn encode_masked(&self, key: u8) -> Result<Vec<u8>, FrameError> {
        let mut buf = self.encode()?;
        mask(&mut buf, key);
        Ok(buf)
    }

    /// Decode a complete frame. Checksum is verified before anything else.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < MIN_FRAME_LEN {
            return Err(FrameError::TooShort {
                expected: MIN_FRAME_LEN,
                actual: bytes.len(),
            });
        }
        ChecksumKind::XorInverted.verify(bytes)?;

        let declared = u16::from_be_bytes([bytes[4], bytes[5]]) as usize;
        let actual = bytes.len() - PREFIX_LEN - 1;
        if declared != actual {
            return Err(FrameError::LengthMismatch { declared, actual });
        }

        Ok(Self {
            destination: u16::from_be_bytes([bytes[0], bytes[1]]),
            source: u16::from_be_bytes([bytes[2], bytes[3]]),
            command: u16::from_be_bytes([bytes[6], bytes[7]]),
            payload: bytes[HEADER_LEN..bytes.len() - 1].to_vec(),
        })
    }

    /// Total frame length implied by the 6-byte prefix.
    pub fn frame_len(prefix: &[u8; PREFIX_LEN]) -> usize {
        PREFIX_LEN + u16::from_be_bytes([prefix[4], prefix[5]]) as usize + 1
    }

    pub fn reply(&self) -> V2Reply<'_> {
        match self.command {
            ACK => V2Reply::Ack,
            NACK => V2Reply::Nack {
                reason: self.payload.first().copied().unwrap_or(0),
                detail: self.payload.get(1..).unwrap_or(&[]),
            },
            command => V2Reply::Data {
                command,
                payload: &self.payload,
            },
        }
    }
}

/// XOR every byte with `key`. Applying it twice restores the input.
pub fn mask(bytes: &mut [u8], key: u8) {
    for b in bytes.iter_mut() {
        *b ^= key;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::v2;

    #[test]
    fn test_encode_connect() {
        let frame = V2Frame::new(0, v2::CONNECT, vec![0]);
        let bytes = frame.encode().unwrap();
        assert_eq!(&bytes[..8], &[0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x30, 0xF6]);
        assert_eq!(bytes[8], 0x00);
        assert_eq!(bytes.len(), 10);
        let xor = bytes[..9].iter().fold(0u8, |a, b| a ^ b);
        assert_eq!(bytes[9], xor ^ 0xFF);
    }

    #[test]
    fn test_size_is_big_endian() {
        let frame = V2Frame::new(0x1234, v2::PANEL_STATUS, vec![0xAA; 300]);
        let bytes = frame.encode().unwrap();
        assert_eq!(&bytes[2..4], &[0x12, 0x34]);
        assert_eq!(&bytes[4..6], &[0x01, 0x2E]); // 302
        assert_eq!(V2Frame::frame_len(&[0, 0, 0x12, 0x34, 0x01, 0x2E]), bytes.len());
    }

    #[test]
    fn test_roundtrip() {
        let frame = V2Frame::new(0x0A0B, v2::SYSTEM_ARM_DISARM, vec![0x01, 0x02]);
        let decoded = V2Frame::decode(&frame.encode().unwrap()).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_decode_rejects_flipped_byte() {
        let bytes = V2Frame::new(7, v2::BYPASS_ZONE, vec![33, 1]).encode().unwrap();
        for i in 0..bytes.len() {
            let mut corrupted = bytes.clone();
            corrupted[i] ^= 0x40;
            assert!(
                matches!(V2Frame::decode(&corrupted), Err(FrameError::ChecksumMismatch { .. })),
                "flip at {} not detected",
                i
            );
        }
    }

    #[test]
    fn test_decode_rejects_size_mismatch() {
        // Declares 4 bytes of command+payload but carries 3; checksum recomputed so
        // only the size check can catch it.
        let mut bytes = vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0xF0, 0xFE, 0x01];
        bytes.push(ChecksumKind::XorInverted.compute(&bytes));
        assert_eq!(
            V2Frame::decode(&bytes),
            Err(FrameError::LengthMismatch {
                declared: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_decode_too_short() {
        assert!(matches!(
            V2Frame::decode(&[0, 0, 0, 0]),
            Err(FrameError::TooShort { expected: 9, actual: 4 })
        ));
    }

    #[test]
    fn test_masked_encode() {
        let frame = V2Frame::new(0, v2::APP_CONNECT, b"AMT8000-AABBCCDDEEFF".to_vec());
        let plain = frame.encode().unwrap();
        let mut masked = frame.encode_masked(0x5A).unwrap();
        assert_ne!(masked, plain);
        mask(&mut masked, 0x5A);
        assert_eq!(masked, plain);
        assert_eq!(V2Frame::decode(&masked).unwrap(), frame);
    }

    #[test]
    fn test_reply_classification() {
        let ack = V2Frame::new(0, v2::ACK, vec![]);
        assert_eq!(ack.reply(), V2Reply::Ack);

        let nack = V2Frame::new(0, v2::NACK, vec![0x01, 0x05, 0x00]);
        assert_eq!(
            nack.reply(),
            V2Reply::Nack {
                reason: 1,
                detail: &[0x05, 0x00]
            }
        );

        let status = V2Frame::new(0, v2::PANEL_STATUS, vec![0x01]);
        assert_eq!(
            status.reply(),
            V2Reply::Data {
                command: v2::PANEL_STATUS,
                payload: &[0x01]
            }
        );
    }
}
