// MIT License - Copyright (c) 2026 bolid-bridge developers

//! # bolid-bridge
//!
//! Communication with Bolid/Orion security and fire-alarm field devices
//! (intrusion panels, relay blocks, addressable loop controllers, power
//! supplies) over their proprietary RS-485 binary protocol.
//!
//! The bus is reached through an abstract duplex byte channel
//! ([`BusChannel`]); the shipped [`TcpChannel`] talks to a
//! serial-to-ethernet bridge in raw socket mode. A background reader task
//! reassembles CRC8-validated frames out of the byte stream, an exchange
//! engine correlates them with the single request in flight, and a device
//! manager turns raw analog/digital replies into branch and relay state.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use bolid_bridge::{BusConfig, BusLink, DeviceManager, DeviceRegistry, TcpChannel};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let channel = Arc::new(TcpChannel::connect("192.168.0.50", 4001).await?);
//!     let mut link = BusLink::open(channel, BusConfig::builder().fast_mode(true).build());
//!
//!     let registry = Arc::new(DeviceRegistry::new());
//!     let manager = DeviceManager::new(link.engine(), registry.clone());
//!
//!     // Find everything on the bus and poll the first device found.
//!     let found = manager.scan(1, 127, |_, _, _| true).await;
//!     if let Some(device) = found.first() {
//!         let summary = manager.poll_branches(device.address, |_, _| true).await?;
//!         println!("{}: {summary}", device.name);
//!     }
//!
//!     link.close().await;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod constants;
pub mod devices;
pub mod error;
pub mod event;
pub mod interpret;
pub mod manager;
pub mod registry;
pub mod transport;

// Re-exports for convenience
pub use codec::{BranchAction, Request, RequestKind, Response};
pub use config::{BusConfig, BusConfigBuilder};
pub use devices::branch::BranchState;
pub use devices::catalog::DeviceType;
pub use devices::info::DeviceInfo;
pub use error::{BolidError, Result};
pub use event::{BusEvent, EventReceiver, EventSender};
pub use manager::{DeviceManager, PollSummary};
pub use registry::DeviceRegistry;
pub use transport::channel::{BusChannel, TcpChannel};
pub use transport::discovery::{scan_devices, FoundDevice};
pub use transport::engine::ExchangeEngine;
pub use transport::link::BusLink;
