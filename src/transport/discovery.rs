// MIT License - Copyright (c) 2026 bolid-bridge developers

//! Address-range device discovery.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::codec::{Request, Response, STATUS_OK};
use crate::constants::device_display_name;
use crate::error::{BolidError, Result};
use crate::transport::engine::ExchangeEngine;

/// A device that answered a type/version query during a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct FoundDevice {
    pub address: u8,
    pub type_code: u8,
    pub name: String,
    pub version: f32,
}

/// Sweep `start..=end`, querying the device type and version at each
/// address.
///
/// `on_progress(addr, found_so_far, total)` runs before each address and
/// stops the sweep when it returns `false`; cancellation takes effect at
/// the address boundary, never mid-exchange. `on_found` runs once per
/// responding device. A missing reply within `per_address_timeout` means
/// the address is unoccupied; there are no retries. A fixed inter-address
/// delay throttles bus load.
pub async fn scan_devices<P, F>(
    engine: &ExchangeEngine,
    start: u8,
    end: u8,
    per_address_timeout: Duration,
    mut on_progress: P,
    mut on_found: F,
) -> Vec<FoundDevice>
where
    P: FnMut(u8, usize, usize) -> bool,
    F: FnMut(&FoundDevice),
{
    let mut found = Vec::new();
    if start > end {
        return found;
    }
    let total = (end - start + 1) as usize;

    // On a slow bus, make sure something is listening before committing to
    // a full sweep.
    if !engine.config().fast_mode {
        if let Err(e) = probe_bus(engine, start, per_address_timeout).await {
            debug!("bus probe failed, aborting sweep: {e}");
            return found;
        }
    }

    info!("scanning addresses {start}..={end}");
    for addr in start..=end {
        if !on_progress(addr, found.len(), total) {
            info!("sweep cancelled at address {addr}");
            break;
        }
        if !engine.channel().is_open() {
            break;
        }

        if engine.send(&Request::DeviceTypeVersion { addr }).await.is_err() {
            continue;
        }

        if let Some(Response::DeviceTypeVersion { status, device_type, version_raw, .. }) =
            engine.get(per_address_timeout, Some(addr)).await
        {
            if status == STATUS_OK {
                let device = FoundDevice {
                    address: addr,
                    type_code: device_type,
                    name: device_display_name(device_type),
                    version: version_raw as f32 / 100.0,
                };
                info!(
                    "found {} v{:.2} at address {}",
                    device.name, device.version, device.address
                );
                on_found(&device);
                found.push(device);
            } else {
                debug!("address {addr}: device answered with status 0x{status:02X}");
            }
        }

        sleep(engine.config().inter_address_delay()).await;
    }

    found
}

/// Check that the bus answers at all by round-tripping a type/version
/// query to `test_addr`. Used to fail fast before a sweep on a link that
/// is up but wired to nothing.
pub async fn probe_bus(
    engine: &ExchangeEngine,
    test_addr: u8,
    timeout: Duration,
) -> Result<()> {
    engine.clear_responses().await;
    engine.send(&Request::DeviceTypeVersion { addr: test_addr }).await?;
    match engine.get(timeout, None).await {
        Some(_) => Ok(()),
        None => Err(BolidError::NoResponse { address: test_addr }),
    }
}
