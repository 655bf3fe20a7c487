// MIT License - Copyright (c) 2026 Peter Wright
// Zones and zone bitmasks

use crate::constants::{MAX_ZONES, ZONE_MASK_LEN};
use crate::error::{IsecError, Result};

/// 48-zone bitmask. Bit `i` of byte `j` is zone index `j * 8 + i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ZoneMask(u64);

impl ZoneMask {
    pub fn empty() -> Self {
        Self(0)
    }

    /// Read up to six mask bytes; extra bytes are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut bits = 0u64;
        for (j, b) in bytes.iter().take(ZONE_MASK_LEN).enumerate() {
            bits |= (*b as u64) << (j * 8);
        }
        Self(bits)
    }

    /// Build a mask from 0-based zone indices.
    pub fn from_indices(indices: &[u8]) -> Result<Self> {
        let mut mask = Self::empty();
        for &index in indices {
            mask.insert(index)?;
        }
        Ok(mask)
    }

    pub fn insert(&mut self, index: u8) -> Result<()> {
        if index >= MAX_ZONES {
            return Err(IsecError::InvalidZone {
                index,
                max: MAX_ZONES - 1,
            });
        }
        self.0 |= 1 << index;
        Ok(())
    }

    pub fn contains(&self, index: u8) -> bool {
        index < MAX_ZONES && self.0 & (1 << index) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn to_bytes(&self) -> [u8; ZONE_MASK_LEN] {
        let mut out = [0u8; ZONE_MASK_LEN];
        for (j, b) in out.iter_mut().enumerate() {
            *b = (self.0 >> (j * 8)) as u8;
        }
        out
    }

    /// Set indices, ascending.
    pub fn indices(&self) -> Vec<u8> {
        (0..MAX_ZONES).filter(|i| self.contains(*i)).collect()
    }
}

/// A single zone as decoded from one status reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone {
    /// 0-based index; the panel's zone number is `index + 1`
    pub index: u8,
    pub open: bool,
    pub bypassed: bool,
    /// Zone fired while armed
    pub violated: bool,
    /// Only known from the complete status form
    pub tamper: bool,
    /// Only known from the complete status form (wireless sensors)
    pub low_battery: bool,
}

impl Zone {
    /// Zone number as printed on the panel (1-based).
    pub fn number(&self) -> u16 {
        self.index as u16 + 1
    }

    pub fn has_trouble(&self) -> bool {
        self.tamper || self.low_battery
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_bit_layout() {
        let mask = ZoneMask::from_indices(&[33, 35]).unwrap();
        assert_eq!(mask.to_bytes(), [0x00, 0x00, 0x00, 0x00, 0b0000_1010, 0x00]);
        assert_eq!(mask.indices(), vec![33, 35]);
    }

    #[test]
    fn test_mask_from_bytes() {
        let mask = ZoneMask::from_bytes(&[0x01, 0x00, 0x00, 0x00, 0x00, 0x80]);
        assert!(mask.contains(0));
        assert!(mask.contains(47));
        assert!(!mask.contains(1));
        assert_eq!(mask.indices(), vec![0, 47]);
    }

    #[test]
    fn test_mask_rejects_out_of_range() {
        assert!(matches!(
            ZoneMask::from_indices(&[48]),
            Err(IsecError::InvalidZone { index: 48, max: 47 })
        ));
    }

    #[test]
    fn test_mask_ignores_extra_bytes() {
        let mask = ZoneMask::from_bytes(&[0, 0, 0, 0, 0, 0, 0xFF]);
        assert!(mask.is_empty());
        assert!(!mask.contains(48));
    }

    #[test]
    fn test_zone_number_and_trouble() {
        let mut zone = Zone {
            index: 0,
            open: true,
            bypassed: false,
            violated: false,
            tamper: false,
            low_battery: false,
        };
        assert_eq!(zone.number(), 1);
        assert!(!zone.has_trouble());
        zone.low_battery = true;
        assert!(zone.has_trouble());
    }
}
