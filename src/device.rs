// MIT License - Copyright (c) 2026 Peter Wright
// Target device descriptor

use std::fmt;

use crate::config::Route;
use crate::constants::V2_PASSWORD_DIGITS;
use crate::error::{IsecError, Result};
use crate::models::{self, Category, Generation, ModelSpec};

/// Six-byte MAC address of a central.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mac(pub [u8; 6]);

impl Mac {
    /// Parse `AA:BB:CC:DD:EE:FF`, `AA-BB-CC-DD-EE-FF` or `AABBCCDDEEFF`.
    pub fn parse(s: &str) -> Result<Self> {
        let hex: String = s.chars().filter(|c| *c != ':' && *c != '-').collect();
        let invalid = || IsecError::InvalidMac { mac: s.to_string() };
        if hex.len() != 12 || !hex.is_ascii() {
            return Err(invalid());
        }
        let mut out = [0u8; 6];
        for (i, b) in out.iter_mut().enumerate() {
            *b = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self(out))
    }

    pub fn bytes(&self) -> [u8; 6] {
        self.0
    }
}

/// Uppercase hex without separators, the form the relay expects.
impl fmt::Display for Mac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

/// Numeric device password. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if s.is_empty() || s.len() > V2_PASSWORD_DIGITS {
            return Err(IsecError::InvalidPassword {
                reason: "must be 1 to 6 digits",
            });
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IsecError::InvalidPassword {
                reason: "must contain only digits",
            });
        }
        Ok(Self(s))
    }

    /// ASCII form carried in V1 command frames.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// AUTHORIZE form: one byte per digit with '0' sent as 10, padded with 0.
    pub fn v2_digits(&self) -> [u8; V2_PASSWORD_DIGITS] {
        let mut out = [0u8; V2_PASSWORD_DIGITS];
        for (slot, b) in out.iter_mut().zip(self.0.bytes()) {
            *slot = match b - b'0' {
                0 => 10,
                d => d,
            };
        }
        out
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// A central to talk to. Built per request from caller metadata.
#[derive(Debug, Clone)]
pub struct Device {
    /// Account / identifier. Sent as the account in IP receiver handshakes.
    pub id: String,
    pub mac: Mac,
    pub model: &'static ModelSpec,
    pub route: Route,
    /// Resolved from the model and the route
    pub generation: Generation,
}

impl Device {
    /// Resolve `model_code` through the registry. Unknown codes fail.
    pub fn new(id: impl Into<String>, mac: Mac, model_code: u8, route: Route) -> Result<Self> {
        let model = models::resolve(model_code)?;
        Ok(Self {
            id: id.into(),
            mac,
            model,
            generation: model.generation_for(&route),
            route,
        })
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn category(&self) -> Category {
        self.model.category
    }

    /// Key used to serialize operations on this device.
    pub fn lock_key(&self) -> String {
        format!("{}/{}", self.id, self.mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_parse_formats() {
        let expected = Mac([0xAA, 0xBB, 0xCC, 0x01, 0x02, 0x03]);
        assert_eq!(Mac::parse("aa:bb:cc:01:02:03").unwrap(), expected);
        assert_eq!(Mac::parse("AA-BB-CC-01-02-03").unwrap(), expected);
        assert_eq!(Mac::parse("AABBCC010203").unwrap(), expected);
        assert_eq!(expected.to_string(), "AABBCC010203");
    }

    #[test]
    fn test_mac_parse_rejects_garbage() {
        assert!(Mac::parse("AABBCC").is_err());
        assert!(Mac::parse("GGBBCC010203").is_err());
        assert!(Mac::parse("AABBCC0102030").is_err());
        assert!(Mac::parse("ÄABBCC01020").is_err());
    }

    #[test]
    fn test_password_validation() {
        assert!(Password::new("1234").is_ok());
        assert!(Password::new("123456").is_ok());
        assert!(Password::new("").is_err());
        assert!(Password::new("1234567").is_err());
        assert!(Password::new("12a4").is_err());
    }

    #[test]
    fn test_password_v2_digits() {
        let pw = Password::new("1020").unwrap();
        assert_eq!(pw.v2_digits(), [1, 10, 2, 10, 0, 0]);
        assert_eq!(format!("{:?}", pw), "Password(***)");
    }

    #[test]
    fn test_device_unknown_model() {
        let mac = Mac([0; 6]);
        assert!(matches!(
            Device::new("1", mac, 0x77, Route::Cloud),
            Err(IsecError::UnknownModel(0x77))
        ));
    }

    #[test]
    fn test_fence_generation_follows_route() {
        let mac = Mac([0; 6]);
        let cloud = Device::new("1", mac, 0x35, Route::Cloud).unwrap();
        assert_eq!(cloud.category(), Category::Fence);
        assert_eq!(cloud.generation(), Generation::V2);

        let local = Device::new("1", mac, 0x35, Route::ip_receiver("10.0.0.9")).unwrap();
        assert_eq!(local.generation(), Generation::V1);
    }
}
