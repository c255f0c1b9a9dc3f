// MIT License - Copyright (c) 2026 bolid-bridge developers

use std::collections::HashMap;

use crate::devices::branch::BranchState;
use crate::devices::catalog::DeviceType;

/// Runtime state of one device on the bus.
///
/// Owned by the registry; the polling engine and toggle operations are the
/// only writers. Branch/relay numbers are 1-based, matching the wire
/// protocol.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Bus address, 1..=127.
    pub address: u8,
    pub device_type: DeviceType,
    /// Firmware version (raw byte / 100).
    pub version: f32,
    pub branches: HashMap<u8, BranchState>,
    pub relays: HashMap<u8, bool>,
    pub adc_values: HashMap<u8, u8>,
    pub resistances: HashMap<u8, f32>,
}

impl DeviceInfo {
    pub fn new(address: u8, device_type: DeviceType, version: f32) -> Self {
        Self {
            address,
            device_type,
            version,
            branches: HashMap::new(),
            relays: HashMap::new(),
            adc_values: HashMap::new(),
            resistances: HashMap::new(),
        }
    }

    /// Last known state of a branch; `Unknown` when never polled.
    pub fn branch_state(&self, branch: u8) -> BranchState {
        self.branches.get(&branch).copied().unwrap_or_default()
    }

    /// Last known on/off state of a relay; off when never read.
    pub fn relay_state(&self, relay: u8) -> bool {
        self.relays.get(&relay).copied().unwrap_or(false)
    }
}
