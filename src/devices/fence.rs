// MIT License - Copyright (c) 2026 Peter Wright
// Electric fence controller status

use bitflags::bitflags;

use crate::devices::partition::ArmState;

bitflags! {
    /// Shock (energizer) status byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShockFlags: u8 {
        /// Energizer on
        const ENABLED   = 0x01;
        /// Fence cut or shorted
        const TRIGGERED = 0x04;
    }
}

bitflags! {
    /// Alarm function status byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FenceAlarmFlags: u8 {
        const ARMED     = 0x01;
        const STAY      = 0x02;
        const TRIGGERED = 0x04;
    }
}

/// Decoded fence state. The shock and alarm functions are controlled separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceStatus {
    pub shock_enabled: bool,
    pub shock_triggered: bool,
    pub alarm: ArmState,
    /// Alarm bit or panic
    pub alarm_triggered: bool,
}

impl FenceStatus {
    /// Build from the shock byte, the alarm byte and the panic byte (1 = panic).
    pub fn from_bytes(shock: u8, alarm: u8, panic: u8) -> Self {
        let shock = ShockFlags::from_bits_truncate(shock);
        let alarm = FenceAlarmFlags::from_bits_truncate(alarm);
        Self {
            shock_enabled: shock.contains(ShockFlags::ENABLED),
            shock_triggered: shock.contains(ShockFlags::TRIGGERED),
            alarm: ArmState::from_bits(
                alarm.contains(FenceAlarmFlags::ARMED),
                alarm.contains(FenceAlarmFlags::STAY),
            ),
            alarm_triggered: alarm.contains(FenceAlarmFlags::TRIGGERED) || panic == 1,
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.shock_triggered || self.alarm_triggered
    }
}
