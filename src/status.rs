// MIT License - Copyright (c) 2026 Peter Wright
// Status reply decoding

//! Decodes status replies into [`StatusSnapshot`]s.
//!
//! V1 replies are parsed from the full frame as received (index 0 is the
//! size byte, index 1 the `0xE9` echo). V2 replies are parsed from the
//! decoded frame payload. Fence controllers reuse the panel offsets with
//! their own meaning, so every parser branches on the model category first.

use tracing::{debug, warn};

use crate::constants::{v1::ISEC_PROGRAM, COMPLETE_STATUS_LEN, MAX_ZONES, PARTIAL_STATUS_LEN};
use crate::devices::fence::FenceStatus;
use crate::devices::output::OutputFlags;
use crate::devices::partition::{ArmState, Partition};
use crate::devices::zone::{Zone, ZoneMask};
use crate::error::{IsecError, Result};
use crate::models::{self, ModelSpec};

/// Byte offsets into a V1 status frame.
mod offset {
    pub const ECHO: usize = 1;
    pub const ZONES_OPEN: usize = 2;
    pub const ZONES_VIOLATED: usize = 8;
    pub const ZONES_BYPASSED: usize = 14;
    pub const MODEL: usize = 20;
    pub const PARTITIONS_ARMED: usize = 21;
    pub const PARTITIONS_ENABLED: usize = 22;
    pub const BATTERY: usize = 32;
    pub const OUTPUTS: usize = 39;
    // Complete form only
    pub const ZONES_TAMPER: usize = 70;
    pub const ZONES_LOW_BATTERY: usize = 82;
    pub const PARTITIONS_STAY: usize = 94;
    // Fence controllers
    pub const FENCE_SHOCK: usize = 21;
    pub const FENCE_ALARM: usize = 22;
    pub const FENCE_PANIC: usize = 39;
}

/// Byte offsets into a V2 status payload.
mod cloud {
    pub const MODEL: usize = 0;
    pub const PARTITIONS: usize = 2;
    pub const PARTITION_SLOTS: usize = 4;
    pub const ALARM: usize = 6;
    pub const MIN_PANEL_LEN: usize = 135;
    pub const FENCE_SHOCK: usize = 22;
    pub const FENCE_ALARM: usize = 23;
    pub const FENCE_PANIC: usize = 62;
    pub const MIN_FENCE_LEN: usize = 24;
}

/// Partitions addressable by one status byte.
const MAX_BIT_PARTITIONS: u8 = 8;

/// Which reply a snapshot was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusForm {
    /// 46-byte V1 reply. Carries no stay bits, so armed partitions read as away.
    Partial,
    /// 96-byte V1 reply
    Complete,
    /// V2 status payload. Carries no zone or battery data.
    Cloud,
}

/// Everything one status reply says about a central.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Model code reported by the central
    pub model: u8,
    pub form: StatusForm,
    pub zones: Vec<Zone>,
    pub partitions_enabled: bool,
    pub partitions: Vec<Partition>,
    pub battery: Option<u8>,
    pub outputs: OutputFlags,
    /// Present only for fence controllers
    pub fence: Option<FenceStatus>,
}

impl StatusSnapshot {
    fn empty(model: u8, form: StatusForm) -> Self {
        Self {
            model,
            form,
            zones: Vec::new(),
            partitions_enabled: false,
            partitions: Vec::new(),
            battery: None,
            outputs: OutputFlags::empty(),
            fence: None,
        }
    }

    pub fn siren_active(&self) -> bool {
        self.outputs.siren()
    }

    pub fn is_armed(&self) -> bool {
        match &self.fence {
            Some(fence) => fence.alarm.is_armed(),
            None => self.partitions.iter().any(|p| p.is_armed()),
        }
    }

    pub fn is_triggered(&self) -> bool {
        match &self.fence {
            Some(fence) => fence.is_triggered(),
            None => self.siren_active() || self.partitions.iter().any(|p| p.triggered),
        }
    }

    /// 0-based indices of open zones.
    pub fn open_zones(&self) -> Vec<u8> {
        self.zones.iter().filter(|z| z.open).map(|z| z.index).collect()
    }
}

/// Parse a 46-byte partial status frame.
pub fn parse_partial(frame: &[u8], model: &ModelSpec) -> Result<StatusSnapshot> {
    check_frame(frame, PARTIAL_STATUS_LEN)?;
    check_reported_model(parse_v1_frame(frame, model, StatusForm::Partial), model)
}

/// Parse a 96-byte complete status frame.
pub fn parse_complete(frame: &[u8], model: &ModelSpec) -> Result<StatusSnapshot> {
    check_frame(frame, COMPLETE_STATUS_LEN)?;
    check_reported_model(parse_v1_frame(frame, model, StatusForm::Complete), model)
}

/// Parse a V1 status frame of either length.
pub fn parse_v1(frame: &[u8], model: &ModelSpec) -> Result<StatusSnapshot> {
    match frame.len() {
        PARTIAL_STATUS_LEN => parse_partial(frame, model),
        COMPLETE_STATUS_LEN => parse_complete(frame, model),
        n => Err(IsecError::InvalidResponse {
            details: format!(
                "status reply is {} bytes, expected {} or {}",
                n, PARTIAL_STATUS_LEN, COMPLETE_STATUS_LEN
            ),
        }),
    }
}

/// Parse the payload of a V2 status frame.
pub fn parse_cloud(payload: &[u8], model: &ModelSpec) -> Result<StatusSnapshot> {
    let min = if model.is_fence() {
        cloud::MIN_FENCE_LEN
    } else {
        cloud::MIN_PANEL_LEN
    };
    if payload.len() < min {
        return Err(IsecError::InvalidResponse {
            details: format!("status payload is {} bytes, expected at least {}", payload.len(), min),
        });
    }

    let mut snapshot = StatusSnapshot::empty(payload[cloud::MODEL], StatusForm::Cloud);

    if model.is_fence() {
        let panic = payload.get(cloud::FENCE_PANIC).copied().unwrap_or(0);
        let fence = FenceStatus::from_bytes(
            payload[cloud::FENCE_SHOCK],
            payload[cloud::FENCE_ALARM],
            panic,
        );
        debug!("Fence status: {:?}", fence);
        snapshot.fence = Some(fence);
        return check_reported_model(snapshot, model);
    }

    let alarm = payload[cloud::ALARM] != 0;
    if alarm {
        snapshot.outputs |= OutputFlags::SIREN;
    }

    let count = (model.partitions as usize).min(cloud::PARTITION_SLOTS);
    snapshot.partitions_enabled = model.partitions > 1;
    for i in 0..count {
        let byte = payload[cloud::PARTITIONS + i];
        let (state, triggered) = match byte {
            0 => (ArmState::Disarmed, false),
            1 => (ArmState::ArmedAway, false),
            2 => (ArmState::ArmedStay, false),
            3 => (ArmState::ArmedAway, true),
            other => {
                return Err(IsecError::InvalidResponse {
                    details: format!("partition {} reports unknown state 0x{:02X}", i, other),
                })
            }
        };
        let triggered = triggered || (alarm && state.is_armed());
        snapshot
            .partitions
            .push(Partition::new(i as u8, state, triggered));
    }

    check_reported_model(snapshot, model)
}

fn check_frame(frame: &[u8], expected: usize) -> Result<()> {
    if frame.len() != expected {
        return Err(IsecError::InvalidResponse {
            details: format!("status reply is {} bytes, expected {}", frame.len(), expected),
        });
    }
    if frame[offset::ECHO] != ISEC_PROGRAM {
        return Err(IsecError::InvalidResponse {
            details: format!(
                "status reply echoes 0x{:02X}, expected 0x{:02X}",
                frame[offset::ECHO],
                ISEC_PROGRAM
            ),
        });
    }
    Ok(())
}

fn parse_v1_frame(frame: &[u8], model: &ModelSpec, form: StatusForm) -> StatusSnapshot {
    let mut snapshot = StatusSnapshot::empty(frame[offset::MODEL], form);
    snapshot.battery = Some(frame[offset::BATTERY]);

    if model.is_fence() {
        let fence = FenceStatus::from_bytes(
            frame[offset::FENCE_SHOCK],
            frame[offset::FENCE_ALARM],
            frame[offset::FENCE_PANIC],
        );
        debug!("Fence status: {:?}", fence);
        snapshot.fence = Some(fence);
        return snapshot;
    }

    let mask = |at: usize| ZoneMask::from_bytes(&frame[at..at + 6]);
    let open = mask(offset::ZONES_OPEN);
    let violated = mask(offset::ZONES_VIOLATED);
    let bypassed = mask(offset::ZONES_BYPASSED);
    let (tamper, low_battery) = match form {
        StatusForm::Complete => (mask(offset::ZONES_TAMPER), mask(offset::ZONES_LOW_BATTERY)),
        _ => (ZoneMask::empty(), ZoneMask::empty()),
    };

    snapshot.zones = (0..MAX_ZONES)
        .map(|i| Zone {
            index: i,
            open: open.contains(i),
            bypassed: bypassed.contains(i),
            violated: violated.contains(i),
            tamper: tamper.contains(i),
            low_battery: low_battery.contains(i),
        })
        .collect();

    snapshot.outputs = OutputFlags::from_status_byte(frame[offset::OUTPUTS]);
    snapshot.partitions_enabled = frame[offset::PARTITIONS_ENABLED] != 0;

    let armed_bits = frame[offset::PARTITIONS_ARMED];
    let stay_bits = match form {
        StatusForm::Complete => frame[offset::PARTITIONS_STAY],
        _ => 0,
    };
    let siren = snapshot.outputs.siren();
    snapshot.partitions = (0..model.partitions.min(MAX_BIT_PARTITIONS))
        .map(|i| {
            let armed = armed_bits & (1 << i) != 0;
            let stay = stay_bits & (1 << i) != 0;
            let state = ArmState::from_bits(armed, stay);
            Partition::new(i, state, armed && siren)
        })
        .collect();

    snapshot
}

/// A central reporting a model of the other category would have every status
/// bit misread, so that fails. Any other disagreement is only logged.
fn check_reported_model(snapshot: StatusSnapshot, model: &ModelSpec) -> Result<StatusSnapshot> {
    if snapshot.model == model.code {
        return Ok(snapshot);
    }
    match models::resolve(snapshot.model) {
        Ok(reported) if reported.category != model.category => Err(IsecError::InvalidResponse {
            details: format!(
                "central reports {} ({}) but device is configured as {} ({})",
                reported.name, reported.category, model.name, model.category
            ),
        }),
        Ok(reported) => {
            warn!(
                "Central reports model {} but device is configured as {}",
                reported.name, model.name
            );
            Ok(snapshot)
        }
        Err(_) => {
            warn!(
                "Central reports unknown model code 0x{:02X}, parsing as {}",
                snapshot.model, model.name
            );
            Ok(snapshot)
        }
    }
}
