// MIT License - Copyright (c) 2026 Peter Wright
// ISECNet protocol engine
//
//! # isecnet-bridge
//!
//! Talks to Intelbras alarm panels and electric-fence controllers over the
//! ISECNet binary protocol, through the vendor cloud relay or a local IP
//! receiver. Covers both protocol generations: V1 (password in every
//! command frame) and V2 (16-bit commands with a separate authorization).
//!
//! Every operation opens its own session, runs the handshake, sends its
//! frames and closes the connection. Nothing is cached between operations.
//!
//! ## Quick Start
//!
//! ```no_run
//! use isecnet_bridge::{
//!     ArmType, CommandDispatcher, Device, EngineConfig, Mac, Password, Route, TcpConnector,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let dispatcher = CommandDispatcher::new(TcpConnector, EngineConfig::default());
//!
//!     let mac = Mac::parse("00:1A:3F:11:22:33")?;
//!     let device = Device::new("home", mac, 0x01, Route::Cloud)?;
//!
//!     let status = dispatcher.status(&device, Password::new("1234")?).await?;
//!     println!("armed: {}", status.is_armed());
//!
//!     dispatcher
//!         .arm(&device, Password::new("1234")?, Some(0), ArmType::Stay)
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod constants;
pub mod device;
pub mod devices;
pub mod dispatcher;
pub mod error;
pub mod interpret;
pub mod models;
pub mod protocol;
pub mod status;
pub mod transport;

// Re-exports for convenience
pub use config::{ArmType, EngineConfig, EngineConfigBuilder, Endpoint, Route};
pub use device::{Device, Mac, Password};
pub use dispatcher::{CommandDispatcher, CommandReport};
pub use error::{AuthFailure, CommandFailure, HandshakeFailure, IsecError, Result};
pub use interpret::{interpret, ResponseContext, ResponseOutcome};
pub use models::{Category, Generation, ModelSpec};
pub use status::{StatusForm, StatusSnapshot};
pub use transport::direct::TcpConnector;
pub use transport::session::Phase;
pub use devices::zone::{Zone, ZoneMask};
pub use devices::partition::{ArmState, Partition};
pub use devices::output::OutputFlags;
pub use devices::fence::FenceStatus;
