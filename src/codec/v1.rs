// MIT License - Copyright (c) 2026 Peter Wright
// ISECNet V1 framing

use crate::codec::checksum::ChecksumKind;
use crate::constants::{v1::ISEC_PROGRAM, DELIMITER};
use crate::error::FrameError;

/// Smallest V1 frame: size, command, checksum.
pub const MIN_FRAME_LEN: usize = 3;

/// Which exchange a V1 packet belongs to. Each kind fixes its checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// Password-bearing command frame
    IsecCommand,
    /// Any frame sent back by the central, receiver or relay
    Reply,
    /// Cloud relay key exchange
    CloudGetByte,
    /// Cloud relay connect (client id + MAC)
    CloudConnect,
    IpReceiverGetByte,
    IpReceiverConnect,
}

impl PacketKind {
    pub fn checksum(self) -> ChecksumKind {
        match self {
            Self::IsecCommand | Self::Reply => ChecksumKind::XorInverted,
            Self::IpReceiverGetByte | Self::IpReceiverConnect => ChecksumKind::XorInverted,
            Self::CloudGetByte => ChecksumKind::Sum,
            Self::CloudConnect => ChecksumKind::Xor,
        }
    }
}

/// Outer V1 frame.
///
/// ```text
/// [size:1][command:1][payload:N][checksum:1]
/// ```
///
/// `size` counts command + payload, so the whole frame is `size + 2` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V1Frame {
    pub command: u8,
    pub payload: Vec<u8>,
}

impl V1Frame {
    pub fn new(command: u8, payload: Vec<u8>) -> Self {
        Self { command, payload }
    }

    pub fn encode(&self, kind: PacketKind) -> Result<Vec<u8>, FrameError> {
        let size = self.payload.len() + 1;
        if size > u8::MAX as usize {
            return Err(FrameError::PayloadTooLarge {
                len: self.payload.len(),
            });
        }
        let mut buf = Vec::with_capacity(size + 2);
        buf.push(size as u8);
        buf.push(self.command);
        buf.extend_from_slice(&self.payload);
        buf.push(kind.checksum().compute(&buf));
        Ok(buf)
    }

    pub fn decode(bytes: &[u8], kind: PacketKind) -> Result<Self, FrameError> {
        if bytes.len() < MIN_FRAME_LEN {
            return Err(FrameError::TooShort {
                expected: MIN_FRAME_LEN,
                actual: bytes.len(),
            });
        }
        kind.checksum().verify(bytes)?;

        let declared = bytes[0] as usize;
        let actual = bytes.len() - 2;
        if declared != actual {
            return Err(FrameError::LengthMismatch { declared, actual });
        }

        Ok(Self {
            command: bytes[1],
            payload: bytes[2..bytes.len() - 1].to_vec(),
        })
    }

    /// Total frame length implied by the leading size byte.
    pub fn frame_len(size: u8) -> usize {
        size as usize + 2
    }

    /// First payload byte; replies carry their result code there.
    pub fn code(&self) -> Option<u8> {
        self.payload.first().copied()
    }
}

/// Password-bearing command carried inside an [`ISEC_PROGRAM`] frame.
///
/// ```text
/// [size][0xE9][0x21][password ASCII][data][0x21][checksum]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsecFrame {
    pub password: String,
    pub data: Vec<u8>,
}

impl IsecFrame {
    pub fn new(password: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            password: password.into(),
            data,
        }
    }

    pub fn to_v1(&self) -> V1Frame {
        let mut payload = Vec::with_capacity(self.password.len() + self.data.len() + 2);
        payload.push(DELIMITER);
        payload.extend_from_slice(self.password.as_bytes());
        payload.extend_from_slice(&self.data);
        payload.push(DELIMITER);
        V1Frame::new(ISEC_PROGRAM, payload)
    }

    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        self.to_v1().encode(PacketKind::IsecCommand)
    }

    /// Decode a command frame. The password length is not on the wire, so the
    /// caller supplies it.
    pub fn decode(bytes: &[u8], password_len: usize) -> Result<Self, FrameError> {
        let frame = V1Frame::decode(bytes, PacketKind::IsecCommand)?;
        if frame.command != ISEC_PROGRAM {
            return Err(FrameError::UnexpectedCommand {
                expected: ISEC_PROGRAM as u16,
                actual: frame.command as u16,
            });
        }
        let payload = &frame.payload;
        if payload.len() < password_len + 2 {
            return Err(FrameError::TooShort {
                expected: password_len + 2 + MIN_FRAME_LEN,
                actual: bytes.len(),
            });
        }
        if payload[0] != DELIMITER {
            return Err(FrameError::MissingDelimiter { offset: 2 });
        }
        if payload[payload.len() - 1] != DELIMITER {
            return Err(FrameError::MissingDelimiter {
                offset: bytes.len() - 2,
            });
        }
        let password = &payload[1..1 + password_len];
        if !password.iter().all(u8::is_ascii_digit) {
            return Err(FrameError::NonDigitPassword);
        }
        Ok(Self {
            password: password.iter().map(|b| *b as char).collect(),
            data: payload[1 + password_len..payload.len() - 1].to_vec(),
        })
    }
}
