// MIT License - Copyright (c) 2026 bolid-bridge developers

//! Registry of known devices and change-notification fanout.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::devices::catalog::DeviceType;
use crate::devices::info::DeviceInfo;
use crate::error::{BolidError, Result};
use crate::event::{event_channel, BusEvent, EventReceiver, EventSender};

/// Owns the `address → DeviceInfo` map and broadcasts updates.
///
/// The polling engine and toggle operations are the only writers; readers
/// get cloned snapshots. Notifications go out on a broadcast channel so a
/// misbehaving subscriber can never stall the polling loop or starve other
/// subscribers.
pub struct DeviceRegistry {
    devices: RwLock<HashMap<u8, DeviceInfo>>,
    event_tx: EventSender,
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry {
    pub fn new() -> Self {
        let (event_tx, _rx) = event_channel(256);
        Self {
            devices: RwLock::new(HashMap::new()),
            event_tx,
        }
    }

    /// Subscribe to device events.
    pub fn subscribe(&self) -> EventReceiver {
        self.event_tx.subscribe()
    }

    /// Create and register a device from its type code. Relays start in
    /// the released state.
    pub async fn add_device(&self, address: u8, type_code: u8, version: f32) -> Result<DeviceInfo> {
        if address == 0 || address > 127 {
            return Err(BolidError::InvalidAddress { address });
        }
        let device_type = DeviceType::from_code(type_code);
        let mut info = DeviceInfo::new(address, device_type, version);
        for relay in 1..=info.device_type.max_relays {
            info.relays.insert(relay, false);
        }
        info!("registered {} v{:.2} at address {}", info.device_type.name, version, address);
        self.devices.write().await.insert(address, info.clone());
        let _ = self.event_tx.send(BusEvent::DeviceFound {
            address,
            name: info.device_type.name.clone(),
            version,
        });
        Ok(info)
    }

    /// Register an externally built `DeviceInfo`, filling in missing relay
    /// slots.
    pub async fn register(&self, mut info: DeviceInfo) -> Result<()> {
        if info.address == 0 || info.address > 127 {
            return Err(BolidError::InvalidAddress { address: info.address });
        }
        for relay in 1..=info.device_type.max_relays {
            info.relays.entry(relay).or_insert(false);
        }
        debug!("registered device at address {}", info.address);
        self.devices.write().await.insert(info.address, info);
        Ok(())
    }

    /// Snapshot of one device.
    pub async fn device(&self, address: u8) -> Option<DeviceInfo> {
        self.devices.read().await.get(&address).cloned()
    }

    /// Snapshot of all devices, ordered by address.
    pub async fn devices(&self) -> Vec<DeviceInfo> {
        let map = self.devices.read().await;
        let mut list: Vec<_> = map.values().cloned().collect();
        list.sort_by_key(|d| d.address);
        list
    }

    /// Mutate one device in place without notifying. Returns the updated
    /// snapshot, or `None` if the address is not registered.
    pub async fn with_device_mut<F>(&self, address: u8, f: F) -> Option<DeviceInfo>
    where
        F: FnOnce(&mut DeviceInfo),
    {
        let mut map = self.devices.write().await;
        let info = map.get_mut(&address)?;
        f(info);
        Some(info.clone())
    }

    /// Broadcast the current state of a device to all subscribers.
    pub async fn notify_update(&self, address: u8) {
        if let Some(info) = self.device(address).await {
            // Send errors only mean nobody is listening.
            let _ = self.event_tx.send(BusEvent::DeviceUpdated { address, info });
        }
    }

    /// Drop all devices. Subscriptions stay alive.
    pub async fn clear(&self) {
        self.devices.write().await.clear();
    }
}
