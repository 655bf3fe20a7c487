// MIT License - Copyright (c) 2026 Peter Wright
// Frame checksum strategies

use crate::error::FrameError;

/// The three checksum variants used on the wire.
///
/// Command frames (V1 and V2) use [`XorInverted`](Self::XorInverted). The V1
/// cloud handshake deliberately differs: key exchange uses
/// [`Sum`](Self::Sum) and connect uses [`Xor`](Self::Xor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    /// XOR of every byte, then `^ 0xFF`
    XorInverted,
    /// XOR of every byte
    Xor,
    /// Sum of every byte modulo 256
    Sum,
}

impl ChecksumKind {
    pub fn compute(self, data: &[u8]) -> u8 {
        match self {
            Self::XorInverted => xor(data) ^ 0xFF,
            Self::Xor => xor(data),
            Self::Sum => data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b)),
        }
    }

    /// Verify `frame`, whose last byte is the checksum over everything before it.
    pub fn verify(self, frame: &[u8]) -> Result<(), FrameError> {
        let Some((&actual, body)) = frame.split_last() else {
            return Err(FrameError::TooShort {
                expected: 1,
                actual: 0,
            });
        };
        let expected = self.compute(body);
        if expected != actual {
            return Err(FrameError::ChecksumMismatch { expected, actual });
        }
        Ok(())
    }
}

fn xor(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, b| acc ^ b)
}
