// MIT License - Copyright (c) 2026 Peter Wright
// Siren and PGM outputs

use bitflags::bitflags;

bitflags! {
    /// Output status byte of a V1 panel status reply.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OutputFlags: u8 {
        /// PGM 1 on
        const PGM1  = 0x01;
        /// PGM 2 on
        const PGM2  = 0x02;
        /// PGM 3 on
        const PGM3  = 0x04;
        /// PGM 4 on
        const PGM4  = 0x08;
        /// Siren sounding
        const SIREN = 0x80;
    }
}

const PGM_FLAGS: [OutputFlags; 4] = [
    OutputFlags::PGM1,
    OutputFlags::PGM2,
    OutputFlags::PGM3,
    OutputFlags::PGM4,
];

impl OutputFlags {
    /// Parse the raw byte. Unassigned bits are dropped.
    pub fn from_status_byte(b: u8) -> Self {
        Self::from_bits_truncate(b)
    }

    pub fn siren(&self) -> bool {
        self.contains(Self::SIREN)
    }

    /// On/off state of PGM 1-4, in order.
    pub fn pgm_states(&self) -> [bool; 4] {
        PGM_FLAGS.map(|f| self.contains(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_siren_bit() {
        assert!(OutputFlags::from_status_byte(0x80).siren());
        assert!(!OutputFlags::from_status_byte(0x7F).siren());
    }

    #[test]
    fn test_pgm_states() {
        let flags = OutputFlags::from_status_byte(0b1000_0101);
        assert_eq!(flags.pgm_states(), [true, false, true, false]);
        assert!(flags.siren());
    }

    #[test]
    fn test_unassigned_bits_dropped() {
        assert_eq!(OutputFlags::from_status_byte(0x70), OutputFlags::empty());
    }
}
