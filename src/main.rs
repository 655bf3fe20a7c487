// MIT License - Copyright (c) 2026 Peter Wright
// Command-line front-end

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use isecnet_bridge::{
    models, ArmType, CommandDispatcher, CommandFailure, CommandReport, Device, EngineConfig,
    Endpoint, IsecError, Mac, Password, Route, StatusForm, StatusSnapshot, TcpConnector,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "isecnet")]
#[command(about = "Control Intelbras alarm panels and fence controllers over ISECNet")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// Device name from the configuration file
    #[arg(long, short)]
    device: Option<String>,

    /// Device password. Falls back to ISECNET_PASSWORD, then the config file.
    #[arg(long)]
    password: Option<String>,

    #[command(subcommand)]
    command: Op,
}

#[derive(Subcommand)]
enum Op {
    /// Read the current status
    Status,
    /// Arm the central or one partition
    Arm {
        /// 0-based partition index; omit for the whole central
        #[arg(long)]
        partition: Option<u8>,
        /// Arm in stay (perimeter) mode
        #[arg(long)]
        stay: bool,
    },
    /// Disarm the central or one partition
    Disarm {
        #[arg(long)]
        partition: Option<u8>,
    },
    /// Bypass zones (0-based indices). On V1 centrals the list replaces the
    /// whole bypass set.
    Bypass {
        #[arg(long, value_delimiter = ',', required = true)]
        zones: Vec<u8>,
        /// Remove the bypass instead
        #[arg(long)]
        restore: bool,
    },
    /// Silence the siren
    SirenOff,
    /// Turn the fence shock on or off
    Shock { state: Switch },
    /// Activate or deactivate the fence alarm
    FenceAlarm { state: Switch },
    /// Switch a programmable output (0-based index, V2 centrals only)
    Pgm { index: u8, state: Switch },
    /// Read the MAC address reported by the central (V2 centrals only)
    Mac,
    /// List known models
    Models,
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

impl Switch {
    fn is_on(self) -> bool {
        matches!(self, Switch::On)
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Config {
    #[serde(default)]
    engine: EngineToml,
    #[serde(default)]
    devices: Vec<DeviceToml>,
}

#[derive(Debug, Deserialize)]
struct EngineToml {
    #[serde(default = "default_cloud_host")]
    cloud_host: String,
    #[serde(default = "default_cloud_ports")]
    cloud_ports: Vec<u16>,
    /// V1 cloud relay as "host:port"
    #[serde(default)]
    v1_relay: Option<String>,
    #[serde(default = "default_client_id")]
    client_id: String,
    #[serde(default = "default_timeout")]
    cloud_timeout_ms: u64,
    #[serde(default = "default_timeout")]
    ip_receiver_timeout_ms: u64,
    #[serde(default = "default_timeout")]
    connect_timeout_ms: u64,
}

impl Default for EngineToml {
    fn default() -> Self {
        Self {
            cloud_host: default_cloud_host(),
            cloud_ports: default_cloud_ports(),
            v1_relay: None,
            client_id: default_client_id(),
            cloud_timeout_ms: default_timeout(),
            ip_receiver_timeout_ms: default_timeout(),
            connect_timeout_ms: default_timeout(),
        }
    }
}

fn default_cloud_host() -> String {
    EngineConfig::default().cloud_host
}
fn default_cloud_ports() -> Vec<u16> {
    EngineConfig::default().cloud_ports
}
fn default_client_id() -> String {
    EngineConfig::default().client_id
}
fn default_timeout() -> u64 {
    isecnet_bridge::constants::DEFAULT_TIMEOUT_MS
}

#[derive(Debug, Deserialize)]
struct DeviceToml {
    name: String,
    /// Account sent to IP receivers; defaults to the name
    #[serde(default)]
    account: Option<String>,
    mac: String,
    model: ModelToml,
    /// IP receiver as "host" or "host:port". Omit to go through the cloud.
    #[serde(default)]
    receiver: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// Model given either as its numeric code or its name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ModelToml {
    Code(u8),
    Name(String),
}

impl ModelToml {
    fn code(&self) -> Result<u8> {
        match self {
            ModelToml::Code(code) => Ok(*code),
            ModelToml::Name(name) => models::resolve_name(name)
                .map(|m| m.code)
                .ok_or_else(|| anyhow!("unknown model name: {name}")),
        }
    }
}

fn parse_endpoint(s: &str, default_port: u16) -> Result<Endpoint> {
    match s.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .with_context(|| format!("invalid port in {s}"))?;
            Ok(Endpoint::new(host, port))
        }
        None => Ok(Endpoint::new(s, default_port)),
    }
}

fn build_engine_config(engine: &EngineToml) -> Result<EngineConfig> {
    let mut builder = EngineConfig::builder()
        .cloud_host(engine.cloud_host.clone())
        .cloud_ports(engine.cloud_ports.clone())
        .client_id(engine.client_id.clone())
        .cloud_timeout_ms(engine.cloud_timeout_ms)
        .ip_receiver_timeout_ms(engine.ip_receiver_timeout_ms)
        .connect_timeout_ms(engine.connect_timeout_ms);
    if let Some(relay) = &engine.v1_relay {
        let endpoint = parse_endpoint(relay, isecnet_bridge::constants::IP_RECEIVER_PORT)?;
        builder = builder.v1_relay(endpoint);
    }
    Ok(builder.build())
}

fn build_device(toml: &DeviceToml) -> Result<Device> {
    let route = match &toml.receiver {
        Some(addr) => Route::IpReceiver(parse_endpoint(
            addr,
            isecnet_bridge::constants::IP_RECEIVER_PORT,
        )?),
        None => Route::Cloud,
    };
    let mac = Mac::parse(&toml.mac)?;
    let account = toml.account.clone().unwrap_or_else(|| toml.name.clone());
    Ok(Device::new(account, mac, toml.model.code()?, route)?)
}

fn select_device<'a>(config: &'a Config, name: Option<&str>) -> Result<&'a DeviceToml> {
    match name {
        Some(name) => config
            .devices
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| anyhow!("no device named {name} in config")),
        None => match config.devices.as_slice() {
            [only] => Ok(only),
            [] => bail!("no devices configured"),
            _ => bail!("several devices configured, pick one with --device"),
        },
    }
}

fn resolve_password(cli: Option<&str>, device: &DeviceToml) -> Result<Password> {
    let raw = cli
        .map(str::to_string)
        .or_else(|| std::env::var("ISECNET_PASSWORD").ok())
        .or_else(|| device.password.clone())
        .ok_or_else(|| anyhow!("no password given for {}", device.name))?;
    Ok(Password::new(raw)?)
}

// ---------------------------------------------------------------------------
// JSON output
// ---------------------------------------------------------------------------

// All results share a flat {now, op, device, success, ...} structure

#[derive(Serialize)]
struct JsonResult {
    now: u64,
    op: String,
    device: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    frames: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<JsonStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
}

#[derive(Serialize)]
struct JsonStatus {
    model: u8,
    form: &'static str,
    armed: bool,
    triggered: bool,
    siren: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    battery: Option<u8>,
    #[serde(rename = "partitionsEnabled")]
    partitions_enabled: bool,
    partitions: Vec<JsonPartition>,
    zones: Vec<JsonZone>,
    pgm: [bool; 4],
    #[serde(skip_serializing_if = "Option::is_none")]
    fence: Option<JsonFence>,
}

#[derive(Serialize)]
struct JsonPartition {
    index: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    letter: Option<char>,
    state: &'static str,
    triggered: bool,
}

#[derive(Serialize)]
struct JsonZone {
    index: u8,
    number: u16,
    open: bool,
    bypassed: bool,
    violated: bool,
    tamper: bool,
    #[serde(rename = "lowBattery")]
    low_battery: bool,
    trouble: bool,
}

#[derive(Serialize)]
struct JsonFence {
    #[serde(rename = "shockEnabled")]
    shock_enabled: bool,
    #[serde(rename = "shockTriggered")]
    shock_triggered: bool,
    alarm: &'static str,
    #[serde(rename = "alarmTriggered")]
    alarm_triggered: bool,
}

#[derive(Serialize)]
struct JsonError {
    kind: &'static str,
    message: String,
    retryable: bool,
    #[serde(rename = "openZones", skip_serializing_if = "Option::is_none")]
    open_zones: Option<Vec<u8>>,
}

#[derive(Serialize)]
struct JsonModel {
    code: String,
    name: &'static str,
    generation: String,
    #[serde(rename = "cloudGeneration")]
    cloud_generation: String,
    partitions: u8,
    category: String,
}

fn now_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

fn status_json(status: &StatusSnapshot) -> JsonStatus {
    let form = match status.form {
        StatusForm::Partial => "partial",
        StatusForm::Complete => "complete",
        StatusForm::Cloud => "cloud",
    };
    JsonStatus {
        model: status.model,
        form,
        armed: status.is_armed(),
        triggered: status.is_triggered(),
        siren: status.siren_active(),
        battery: status.battery,
        partitions_enabled: status.partitions_enabled,
        partitions: status
            .partitions
            .iter()
            .map(|p| JsonPartition {
                index: p.index,
                letter: p.letter(),
                state: p.state.as_str(),
                triggered: p.triggered,
            })
            .collect(),
        zones: status
            .zones
            .iter()
            .map(|z| JsonZone {
                index: z.index,
                number: z.number(),
                open: z.open,
                bypassed: z.bypassed,
                violated: z.violated,
                tamper: z.tamper,
                low_battery: z.low_battery,
                trouble: z.has_trouble(),
            })
            .collect(),
        pgm: status.outputs.pgm_states(),
        fence: status.fence.map(|f| JsonFence {
            shock_enabled: f.shock_enabled,
            shock_triggered: f.shock_triggered,
            alarm: f.alarm.as_str(),
            alarm_triggered: f.alarm_triggered,
        }),
    }
}

fn error_kind(e: &IsecError) -> &'static str {
    match e {
        IsecError::Transport(_) => "transport",
        IsecError::Timeout { .. } => "timeout",
        IsecError::Handshake(_) => "handshake",
        IsecError::Auth(_) => "auth",
        IsecError::FrameCorrupt(_) => "frame_corrupt",
        IsecError::Command(_) => "command",
        IsecError::UnknownModel(_) => "unknown_model",
        IsecError::UnrecognizedResponse { .. } | IsecError::InvalidResponse { .. } => {
            "invalid_response"
        }
        _ => "invalid_request",
    }
}

fn error_json(e: &IsecError) -> JsonError {
    let open_zones = match e {
        IsecError::Command(CommandFailure::OpenZones(zones)) => Some(zones.clone()),
        _ => None,
    };
    JsonError {
        kind: error_kind(e),
        message: e.to_string(),
        retryable: e.is_retryable(),
        open_zones,
    }
}

fn report_json(op: &str, device: &Device, result: std::result::Result<CommandReport, IsecError>) -> JsonResult {
    let mut out = JsonResult {
        now: now_epoch_ms(),
        op: op.to_string(),
        device: device.id.clone(),
        success: result.is_ok(),
        frames: None,
        status: None,
        mac: None,
        error: None,
    };
    match result {
        Ok(report) => {
            out.frames = Some(report.frames_sent);
            out.status = report.status.as_ref().map(status_json);
            out.mac = report.mac.map(|mac| mac.to_string());
        }
        Err(e) => out.error = Some(error_json(&e)),
    }
    out
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug or RUST_LOG=isecnet_bridge=trace).
    // Default: info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // systemd journal already adds timestamps, so omit them when running under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt()
            .without_time()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter)
            .init();
    }

    let cli = Cli::parse();

    if let Op::Models = cli.command {
        let list: Vec<JsonModel> = models::all()
            .iter()
            .map(|m| JsonModel {
                code: format!("0x{:02X}", m.code),
                name: m.name,
                generation: m.generation.to_string(),
                cloud_generation: m.generation_for(&Route::Cloud).to_string(),
                partitions: m.partitions,
                category: m.category.to_string(),
            })
            .collect();
        return print_json(&list);
    }

    let config_text =
        std::fs::read_to_string(&cli.config).context("Failed to read config file")?;
    let config: Config = toml::from_str(&config_text).context("Failed to parse config file")?;

    let engine = build_engine_config(&config.engine)?;
    let device_toml = select_device(&config, cli.device.as_deref())?;
    let device = build_device(device_toml)
        .with_context(|| format!("Invalid device {}", device_toml.name))?;
    let password = resolve_password(cli.password.as_deref(), device_toml)?;
    debug!("Using device {:?}", device);
    info!(
        "Device {}: {} ({}, {})",
        device_toml.name,
        device.model.name,
        device.generation(),
        device.route.name()
    );

    let dispatcher = CommandDispatcher::new(TcpConnector, engine);

    let out = match cli.command {
        Op::Status => {
            let result = dispatcher.status(&device, password).await;
            JsonResult {
                now: now_epoch_ms(),
                op: "status".to_string(),
                device: device.id.clone(),
                success: result.is_ok(),
                frames: None,
                status: result.as_ref().ok().map(status_json),
                mac: None,
                error: result.as_ref().err().map(error_json),
            }
        }
        Op::Arm { partition, stay } => {
            let arm_type = if stay { ArmType::Stay } else { ArmType::Away };
            let result = dispatcher.arm(&device, password, partition, arm_type).await;
            report_json("arm", &device, result)
        }
        Op::Disarm { partition } => {
            let result = dispatcher.disarm(&device, password, partition).await;
            report_json("disarm", &device, result)
        }
        Op::Bypass { zones, restore } => {
            let result = dispatcher.bypass(&device, password, &zones, !restore).await;
            report_json("bypass", &device, result)
        }
        Op::SirenOff => {
            let result = dispatcher.siren_off(&device, password).await;
            report_json("siren_off", &device, result)
        }
        Op::Shock { state } => {
            let result = dispatcher.fence_shock(&device, password, state.is_on()).await;
            report_json("shock", &device, result)
        }
        Op::FenceAlarm { state } => {
            let result = dispatcher.fence_alarm(&device, password, state.is_on()).await;
            report_json("fence_alarm", &device, result)
        }
        Op::Pgm { index, state } => {
            let result = dispatcher.pgm(&device, password, index, state.is_on()).await;
            report_json("pgm", &device, result)
        }
        Op::Mac => {
            let result = dispatcher.get_mac(&device, password).await;
            JsonResult {
                now: now_epoch_ms(),
                op: "mac".to_string(),
                device: device.id.clone(),
                success: result.is_ok(),
                frames: None,
                status: None,
                mac: result.as_ref().ok().map(Mac::to_string),
                error: result.as_ref().err().map(error_json),
            }
        }
        // Listed before the config is loaded
        Op::Models => return Ok(()),
    };

    print_json(&out)?;
    if !out.success {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let text = r#"
            [engine]
            v1_relay = "relay.example:9015"
            cloud_timeout_ms = 5000

            [[devices]]
            name = "shop"
            mac = "00:1A:3F:11:22:33"
            model = 30
            receiver = "192.168.1.20"

            [[devices]]
            name = "fence"
            mac = "001A3F445566"
            model = "ELC_6012_NET"
        "#;
        let config: Config = toml::from_str(text).unwrap();
        let engine = build_engine_config(&config.engine).unwrap();
        assert_eq!(engine.v1_relay, Some(Endpoint::new("relay.example", 9015)));
        assert_eq!(engine.cloud_timeout_ms, 5000);
        assert_eq!(engine.ip_receiver_timeout_ms, 10_000);
        assert_eq!(engine.cloud_ports, vec![9009, 80]);

        let shop = build_device(select_device(&config, Some("shop")).unwrap()).unwrap();
        assert_eq!(shop.model.code, 0x1E);
        assert_eq!(shop.route, Route::ip_receiver("192.168.1.20"));
        assert_eq!(shop.id, "shop");

        let fence = build_device(select_device(&config, Some("fence")).unwrap()).unwrap();
        assert_eq!(fence.model.code, 0x35);
        assert_eq!(fence.route, Route::Cloud);
        assert_eq!(fence.generation(), isecnet_bridge::Generation::V2);

        assert!(select_device(&config, None).is_err());
    }

    #[test]
    fn test_parse_endpoint() {
        assert_eq!(
            parse_endpoint("10.0.0.5:9010", 9009).unwrap(),
            Endpoint::new("10.0.0.5", 9010)
        );
        assert_eq!(
            parse_endpoint("10.0.0.5", 9009).unwrap(),
            Endpoint::new("10.0.0.5", 9009)
        );
        assert!(parse_endpoint("host:notaport", 9009).is_err());
    }

    #[test]
    fn test_open_zones_error_json() {
        let err = IsecError::Command(CommandFailure::OpenZones(vec![0, 4]));
        let json = serde_json::to_value(error_json(&err)).unwrap();
        assert_eq!(json["kind"], "command");
        assert_eq!(json["openZones"], serde_json::json!([0, 4]));
        assert_eq!(json["retryable"], false);
    }

    #[test]
    fn test_report_json_carries_mac() {
        let device = Device::new("home", Mac([0; 6]), 0x01, Route::Cloud).unwrap();
        let report = CommandReport {
            device: "home".to_string(),
            model: "AMT_8000",
            command: "get_mac",
            frames_sent: 1,
            status: None,
            mac: Some(Mac([0x00, 0x1A, 0x3F, 0x11, 0x22, 0x33])),
        };
        let json = serde_json::to_value(report_json("mac", &device, Ok(report))).unwrap();
        assert_eq!(json["mac"], "001A3F112233");
        assert_eq!(json["frames"], 1);

        let err = IsecError::UnsupportedCommand {
            command: "pgm",
            generation: isecnet_bridge::Generation::V1,
        };
        let json = serde_json::to_value(error_json(&err)).unwrap();
        assert_eq!(json["kind"], "invalid_request");
    }
}
