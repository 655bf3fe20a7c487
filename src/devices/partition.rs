// MIT License - Copyright (c) 2026 Peter Wright
// Partitions and arm state

use std::fmt;

/// Three-way arm state of a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmState {
    Disarmed,
    ArmedAway,
    ArmedStay,
}

impl ArmState {
    /// Combine the armed bit with the stay bit (complete status form).
    pub fn from_bits(armed: bool, stay: bool) -> Self {
        match (armed, stay) {
            (false, _) => Self::Disarmed,
            (true, false) => Self::ArmedAway,
            (true, true) => Self::ArmedStay,
        }
    }

    pub fn is_armed(&self) -> bool {
        !matches!(self, Self::Disarmed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disarmed => "disarmed",
            Self::ArmedAway => "armed_away",
            Self::ArmedStay => "armed_stay",
        }
    }
}

impl fmt::Display for ArmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A partition as decoded from one status reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    /// 0-based; partition A is index 0
    pub index: u8,
    pub state: ArmState,
    pub triggered: bool,
}

impl Partition {
    pub fn new(index: u8, state: ArmState, triggered: bool) -> Self {
        Self {
            index,
            state,
            triggered,
        }
    }

    /// Letter used by the keypad ('A' for index 0). Indices past 'Z' have no letter.
    pub fn letter(&self) -> Option<char> {
        if self.index < 26 {
            Some((b'A' + self.index) as char)
        } else {
            None
        }
    }

    pub fn is_armed(&self) -> bool {
        self.state.is_armed()
    }
}
