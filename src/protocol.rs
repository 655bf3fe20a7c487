// MIT License - Copyright (c) 2026 Peter Wright
// Logical commands and their per-generation encodings

use crate::config::ArmType;
use crate::constants::{v1, v2};
use crate::devices::zone::ZoneMask;

/// Logical commands sent to a central once its session is ready.
///
/// # Encodings
///
/// V1 commands travel as the data of an ISEC frame (password inside the
/// delimiters). V2 commands are one or more `(command, payload)` frames.
///
/// ```text
/// op          V1 data                       V2 frames
/// status      53                            0B4A []
/// arm         41 [41+p] [50 if stay]        401E [p+1|FF, 1 away / 2 stay]
/// disarm      44 [41+p]                     401E [p+1|FF, 0]
/// bypass      42 <6-byte mask>              401F [zone, 1|0] per zone
/// siren off   4F                            4019 [FF]
/// pgm         -                             45AF [index, 1|0]
/// get mac     -                             3FAA [00]
/// ```
///
/// Partitions are 0-based; `None` addresses the whole central.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Complete status (V1) or panel status (V2)
    Status,
    Arm {
        partition: Option<u8>,
        arm_type: ArmType,
    },
    Disarm {
        partition: Option<u8>,
    },
    /// V1 overwrites the whole bypass set with `zones` (an empty set when
    /// `bypass` is false). V2 toggles each listed zone individually.
    Bypass {
        zones: ZoneMask,
        bypass: bool,
    },
    SirenOff,
    /// Switch a programmable output (0-based index)
    Pgm {
        index: u8,
        on: bool,
    },
    /// Ask the central for its MAC address
    GetMac,
}

impl Command {
    /// Create an arm or disarm command.
    pub fn arm(partition: Option<u8>, arm_type: Option<ArmType>) -> Self {
        match arm_type {
            Some(arm_type) => Command::Arm {
                partition,
                arm_type,
            },
            None => Command::Disarm { partition },
        }
    }

    /// Short name used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Status => "status",
            Command::Arm { .. } => "arm",
            Command::Disarm { .. } => "disarm",
            Command::Bypass { .. } => "bypass",
            Command::SirenOff => "siren_off",
            Command::Pgm { .. } => "pgm",
            Command::GetMac => "get_mac",
        }
    }

    /// Data carried inside the V1 ISEC frame. `None` for commands only V2
    /// centrals understand.
    pub fn to_v1_data(&self) -> Option<Vec<u8>> {
        let data = match self {
            Command::Status => vec![v1::COMPLETE_STATUS],
            Command::Arm {
                partition,
                arm_type,
            } => {
                let mut data = vec![v1::ACTIVATE];
                if let Some(p) = partition {
                    data.push(v1::PARTITION_BASE + p);
                }
                if *arm_type == ArmType::Stay {
                    data.push(v1::STAY_SUFFIX);
                }
                data
            }
            Command::Disarm { partition } => {
                let mut data = vec![v1::DEACTIVATE];
                if let Some(p) = partition {
                    data.push(v1::PARTITION_BASE + p);
                }
                data
            }
            Command::Bypass { zones, bypass } => {
                let mask = if *bypass { *zones } else { ZoneMask::empty() };
                let mut data = vec![v1::BYPASS];
                data.extend_from_slice(&mask.to_bytes());
                data
            }
            Command::SirenOff => vec![v1::SIREN_OFF],
            Command::Pgm { .. } | Command::GetMac => return None,
        };
        Some(data)
    }

    /// Frames sent to a V2 central, in order.
    pub fn to_v2_frames(&self) -> Vec<(u16, Vec<u8>)> {
        let partition_byte = |p: &Option<u8>| p.map_or(v2::ALL_PARTITIONS, |p| p + 1);
        match self {
            Command::Status => vec![(v2::PANEL_STATUS, Vec::new())],
            Command::Arm {
                partition,
                arm_type,
            } => {
                let op = match arm_type {
                    ArmType::Away => v2::OP_ARM_AWAY,
                    ArmType::Stay => v2::OP_ARM_STAY,
                };
                vec![(v2::SYSTEM_ARM_DISARM, vec![partition_byte(partition), op])]
            }
            Command::Disarm { partition } => vec![(
                v2::SYSTEM_ARM_DISARM,
                vec![partition_byte(partition), v2::OP_DISARM],
            )],
            Command::Bypass { zones, bypass } => zones
                .indices()
                .into_iter()
                .map(|zone| (v2::BYPASS_ZONE, vec![zone, u8::from(*bypass)]))
                .collect(),
            Command::SirenOff => vec![(v2::TURN_OFF_SIREN, vec![v2::ALL_PARTITIONS])],
            Command::Pgm { index, on } => vec![(v2::PGM_ON_OFF, vec![*index, u8::from(*on)])],
            Command::GetMac => vec![(v2::GET_MAC, vec![0])],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_arm_encodings() {
        assert_eq!(
            Command::arm(None, Some(ArmType::Away)).to_v1_data(),
            Some(vec![0x41])
        );
        assert_eq!(
            Command::arm(Some(1), Some(ArmType::Stay)).to_v1_data(),
            Some(vec![0x41, 0x42, 0x50])
        );
        assert_eq!(
            Command::arm(Some(0), None).to_v1_data(),
            Some(vec![0x44, 0x41])
        );
    }

    #[test]
    fn test_v2_arm_encodings() {
        assert_eq!(
            Command::arm(None, Some(ArmType::Away)).to_v2_frames(),
            vec![(0x401E, vec![0xFF, 1])]
        );
        assert_eq!(
            Command::arm(Some(2), Some(ArmType::Stay)).to_v2_frames(),
            vec![(0x401E, vec![3, 2])]
        );
        assert_eq!(
            Command::arm(Some(0), None).to_v2_frames(),
            vec![(0x401E, vec![1, 0])]
        );
    }

    #[test]
    fn test_v1_bypass_single_frame_with_mask() {
        let zones = ZoneMask::from_indices(&[33, 35]).unwrap();
        let data = Command::Bypass {
            zones,
            bypass: true,
        }
        .to_v1_data();
        assert_eq!(data, Some(vec![0x42, 0, 0, 0, 0, 0b0000_1010, 0]));
    }

    #[test]
    fn test_v1_unbypass_clears_mask() {
        let zones = ZoneMask::from_indices(&[3]).unwrap();
        let data = Command::Bypass {
            zones,
            bypass: false,
        }
        .to_v1_data();
        assert_eq!(data, Some(vec![0x42, 0, 0, 0, 0, 0, 0]));
    }

    #[test]
    fn test_v2_bypass_frame_per_zone() {
        let zones = ZoneMask::from_indices(&[35, 33]).unwrap();
        let frames = Command::Bypass {
            zones,
            bypass: true,
        }
        .to_v2_frames();
        assert_eq!(
            frames,
            vec![(0x401F, vec![33, 1]), (0x401F, vec![35, 1])]
        );
    }

    #[test]
    fn test_status_and_siren() {
        assert_eq!(Command::Status.to_v1_data(), Some(vec![0x53]));
        assert_eq!(Command::Status.to_v2_frames(), vec![(0x0B4A, vec![])]);
        assert_eq!(Command::SirenOff.to_v1_data(), Some(vec![0x4F]));
        assert_eq!(Command::SirenOff.to_v2_frames(), vec![(0x4019, vec![0xFF])]);
        assert_eq!(Command::SirenOff.name(), "siren_off");
    }

    #[test]
    fn test_pgm_and_get_mac_are_v2_only() {
        let on = Command::Pgm { index: 3, on: true };
        assert_eq!(on.to_v2_frames(), vec![(0x45AF, vec![3, 1])]);
        assert_eq!(on.to_v1_data(), None);
        assert_eq!(
            Command::Pgm { index: 0, on: false }.to_v2_frames(),
            vec![(0x45AF, vec![0, 0])]
        );

        assert_eq!(Command::GetMac.to_v2_frames(), vec![(0x3FAA, vec![0])]);
        assert_eq!(Command::GetMac.to_v1_data(), None);
        assert_eq!(Command::GetMac.name(), "get_mac");
    }
}
