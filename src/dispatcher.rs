// MIT License - Copyright (c) 2026 Peter Wright
// Public operation surface

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::{ArmType, EngineConfig};
use crate::constants::v2::PGM_COUNT;
use crate::device::{Device, Mac, Password};
use crate::devices::zone::ZoneMask;
use crate::error::{IsecError, Result};
use crate::models::{Category, Generation, ModelSpec};
use crate::protocol::Command;
use crate::status::{self, StatusSnapshot};
use crate::transport::session::{self, Session};
use crate::transport::Connector;

/// Fence shock is driven through partition B.
const FENCE_SHOCK_PARTITION: u8 = 1;
/// Fence alarm is driven through partition A.
const FENCE_ALARM_PARTITION: u8 = 0;

/// Outcome of an accepted command.
#[derive(Debug, Clone)]
pub struct CommandReport {
    pub device: String,
    pub model: &'static str,
    pub command: &'static str,
    pub frames_sent: usize,
    /// Status carried by the reply, when the central answered with one
    pub status: Option<StatusSnapshot>,
    /// MAC reported by the central (get-MAC only)
    pub mac: Option<Mac>,
}

impl CommandReport {
    fn new(device: &Device, command: &Command) -> Self {
        Self {
            device: device.id.clone(),
            model: device.model.name,
            command: command.name(),
            frames_sent: 0,
            status: None,
            mac: None,
        }
    }
}

/// Per-device serialization. One operation per device at a time; different
/// devices proceed in parallel.
#[derive(Debug, Default)]
pub struct DeviceLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DeviceLocks {
    pub async fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .await
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    /// Hand back a lock taken with [`lock_for`](Self::lock_for). The entry is
    /// dropped once nobody else holds or waits on it.
    pub async fn release(&self, key: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        drop(lock);
        if locks.get(key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(key);
        }
    }

    /// Number of devices with a live lock entry.
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}

/// Runs logical operations against devices. Every operation opens a fresh
/// session, drives it to ready, sends its frames and closes it.
pub struct CommandDispatcher<C> {
    connector: C,
    config: EngineConfig,
    locks: DeviceLocks,
}

impl<C: Connector> CommandDispatcher<C> {
    pub fn new(connector: C, config: EngineConfig) -> Self {
        Self {
            connector,
            config,
            locks: DeviceLocks::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetch and decode the current status.
    pub async fn status(&self, device: &Device, password: Password) -> Result<StatusSnapshot> {
        let report = self.run(device, password, Command::Status).await?;
        report.status.ok_or_else(|| IsecError::InvalidResponse {
            details: "status request was not answered with a status reply".to_string(),
        })
    }

    pub async fn arm(
        &self,
        device: &Device,
        password: Password,
        partition: Option<u8>,
        arm_type: ArmType,
    ) -> Result<CommandReport> {
        require_category(device, Category::Panel, "arm")?;
        let partition = check_partition(device.model, partition)?;
        self.run(device, password, Command::arm(partition, Some(arm_type)))
            .await
    }

    pub async fn disarm(
        &self,
        device: &Device,
        password: Password,
        partition: Option<u8>,
    ) -> Result<CommandReport> {
        require_category(device, Category::Panel, "disarm")?;
        let partition = check_partition(device.model, partition)?;
        self.run(device, password, Command::arm(partition, None)).await
    }

    /// Bypass (or restore) zones given as 0-based indices.
    ///
    /// On V1 centrals this replaces the whole bypass set: zones not listed
    /// end up not bypassed.
    pub async fn bypass(
        &self,
        device: &Device,
        password: Password,
        zones: &[u8],
        bypass: bool,
    ) -> Result<CommandReport> {
        let zones = ZoneMask::from_indices(zones)?;
        let command = Command::Bypass { zones, bypass };
        if device.generation() == Generation::V2 && zones.is_empty() {
            debug!("No zones to bypass on {}, not connecting", device.id);
            return Ok(CommandReport::new(device, &command));
        }
        self.run(device, password, command).await
    }

    pub async fn siren_off(&self, device: &Device, password: Password) -> Result<CommandReport> {
        self.run(device, password, Command::SirenOff).await
    }

    /// Switch a programmable output (0-based index). V2 centrals only.
    pub async fn pgm(
        &self,
        device: &Device,
        password: Password,
        index: u8,
        on: bool,
    ) -> Result<CommandReport> {
        if index >= PGM_COUNT {
            return Err(IsecError::InvalidOutput {
                index,
                max: PGM_COUNT - 1,
            });
        }
        self.run(device, password, Command::Pgm { index, on }).await
    }

    /// Read the MAC address the central reports. V2 centrals only.
    pub async fn get_mac(&self, device: &Device, password: Password) -> Result<Mac> {
        let report = self.run(device, password, Command::GetMac).await?;
        report.mac.ok_or_else(|| IsecError::InvalidResponse {
            details: "get-MAC request was not answered with a MAC".to_string(),
        })
    }

    /// Turn the fence shock on or off.
    pub async fn fence_shock(
        &self,
        device: &Device,
        password: Password,
        on: bool,
    ) -> Result<CommandReport> {
        require_category(device, Category::Fence, "fence shock")?;
        let command = Command::arm(Some(FENCE_SHOCK_PARTITION), on.then_some(ArmType::Away));
        self.run(device, password, command).await
    }

    /// Activate or deactivate the fence alarm.
    pub async fn fence_alarm(
        &self,
        device: &Device,
        password: Password,
        on: bool,
    ) -> Result<CommandReport> {
        require_category(device, Category::Fence, "fence alarm")?;
        let command = Command::arm(Some(FENCE_ALARM_PARTITION), on.then_some(ArmType::Away));
        self.run(device, password, command).await
    }

    async fn run(
        &self,
        device: &Device,
        password: Password,
        command: Command,
    ) -> Result<CommandReport> {
        require_generation_support(device, &command)?;

        let key = device.lock_key();
        let lock = self.locks.lock_for(&key).await;
        let guard = lock.lock().await;

        info!(
            "Running {} on {} ({})",
            command.name(),
            device.id,
            device.model.name
        );
        let result = match session::open(&self.connector, &self.config, device, password).await {
            Ok(mut session) => {
                let result = exchange(&mut session, device, &command).await;
                session.close().await;
                result
            }
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            info!("{} on {} failed: {}", command.name(), device.id, e);
        }
        drop(guard);
        self.locks.release(&key, lock).await;
        result
    }
}

async fn exchange<S>(
    session: &mut Session<S>,
    device: &Device,
    command: &Command,
) -> Result<CommandReport>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send,
{
    let mut report = CommandReport::new(device, command);

    match device.generation() {
        Generation::V1 => {
            let data = command.to_v1_data().ok_or(IsecError::UnsupportedCommand {
                command: command.name(),
                generation: Generation::V1,
            })?;
            let reply = session.command_v1(data).await?;
            report.frames_sent = 1;
            if reply.is_status() {
                report.status = Some(status::parse_v1(&reply.raw, device.model)?);
            }
        }
        Generation::V2 => {
            for (code, payload) in command.to_v2_frames() {
                let reply = session.command_v2(code, payload).await?;
                report.frames_sent += 1;
                match command {
                    Command::Status => {
                        report.status = Some(status::parse_cloud(&reply.payload, device.model)?)
                    }
                    Command::GetMac => report.mac = Some(mac_from_reply(&reply.payload)?),
                    _ => {}
                }
            }
        }
    }
    Ok(report)
}

/// The MAC follows the first payload byte of a get-MAC reply.
fn mac_from_reply(payload: &[u8]) -> Result<Mac> {
    payload
        .get(1..7)
        .and_then(|bytes| <[u8; 6]>::try_from(bytes).ok())
        .map(Mac)
        .ok_or_else(|| IsecError::InvalidResponse {
            details: format!("get-MAC reply is {} bytes", payload.len()),
        })
}

fn require_generation_support(device: &Device, command: &Command) -> Result<()> {
    if device.generation() == Generation::V1 && command.to_v1_data().is_none() {
        return Err(IsecError::UnsupportedCommand {
            command: command.name(),
            generation: Generation::V1,
        });
    }
    Ok(())
}

fn require_category(device: &Device, category: Category, operation: &'static str) -> Result<()> {
    if device.category() != category {
        return Err(IsecError::CategoryMismatch {
            operation,
            category: device.category(),
        });
    }
    Ok(())
}

/// Validate a 0-based partition index against the model. Models without
/// partitions are always addressed as a whole.
fn check_partition(model: &ModelSpec, partition: Option<u8>) -> Result<Option<u8>> {
    match partition {
        None => Ok(None),
        Some(_) if model.partitions == 0 => {
            debug!("{} has no partitions, addressing the whole central", model.name);
            Ok(None)
        }
        Some(index) if index >= model.partitions => Err(IsecError::InvalidPartition {
            index,
            count: model.partitions,
        }),
        Some(index) => Ok(Some(index)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Route;
    use crate::device::Mac;
    use crate::models;

    #[test]
    fn test_check_partition() {
        let amt2018 = models::resolve(0x1E).unwrap();
        assert_eq!(check_partition(amt2018, None).unwrap(), None);
        assert_eq!(check_partition(amt2018, Some(1)).unwrap(), Some(1));
        assert!(matches!(
            check_partition(amt2018, Some(2)),
            Err(IsecError::InvalidPartition { index: 2, count: 2 })
        ));

        let anm = models::resolve(0x24).unwrap();
        assert_eq!(check_partition(anm, Some(3)).unwrap(), None);
    }

    #[test]
    fn test_require_category() {
        let fence = Device::new("f", Mac([0; 6]), 0x35, Route::Cloud).unwrap();
        assert!(require_category(&fence, Category::Fence, "fence shock").is_ok());
        assert!(matches!(
            require_category(&fence, Category::Panel, "arm"),
            Err(IsecError::CategoryMismatch {
                operation: "arm",
                category: Category::Fence
            })
        ));
    }

    #[tokio::test]
    async fn test_device_locks_shared_per_key() {
        let locks = DeviceLocks::default();
        let a = locks.lock_for("1/AABBCCDDEEFF").await;
        let b = locks.lock_for("1/AABBCCDDEEFF").await;
        let c = locks.lock_for("2/AABBCCDDEEFF").await;
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));

        let _held = a.lock().await;
        assert!(b.try_lock().is_err());
        assert!(c.try_lock().is_ok());
    }

    #[tokio::test]
    async fn test_device_locks_pruned_after_release() {
        let locks = DeviceLocks::default();
        let first = locks.lock_for("1/AABBCCDDEEFF").await;
        let waiting = locks.lock_for("1/AABBCCDDEEFF").await;
        assert_eq!(locks.tracked().await, 1);

        locks.release("1/AABBCCDDEEFF", first).await;
        assert_eq!(locks.tracked().await, 1, "entry kept while another holder waits");

        locks.release("1/AABBCCDDEEFF", waiting).await;
        assert_eq!(locks.tracked().await, 0);
    }

    #[test]
    fn test_mac_from_reply() {
        let payload = [0x00, 0x00, 0x1A, 0x3F, 0x11, 0x22, 0x33];
        assert_eq!(
            mac_from_reply(&payload).unwrap(),
            Mac([0x00, 0x1A, 0x3F, 0x11, 0x22, 0x33])
        );
        assert!(matches!(
            mac_from_reply(&[0x00, 0x1A]),
            Err(IsecError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_v2_only_commands_rejected_on_v1() {
        let panel = Device::new("p", Mac([0; 6]), 0x1E, Route::ip_receiver("10.0.0.9")).unwrap();
        assert!(matches!(
            require_generation_support(&panel, &Command::GetMac),
            Err(IsecError::UnsupportedCommand {
                command: "get_mac",
                generation: Generation::V1
            })
        ));
        assert!(require_generation_support(&panel, &Command::SirenOff).is_ok());

        let amt8000 = Device::new("h", Mac([0; 6]), 0x01, Route::Cloud).unwrap();
        assert!(require_generation_support(&amt8000, &Command::Pgm { index: 0, on: true }).is_ok());
    }
}
