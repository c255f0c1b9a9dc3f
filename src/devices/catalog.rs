// MIT License - Copyright (c) 2026 bolid-bridge developers

//! Device capability catalog.

use crate::constants::device_display_name;

/// Immutable description of a device model, resolved from its type code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceType {
    pub code: u8,
    pub name: String,
    pub max_branches: u8,
    pub max_relays: u8,
}

impl DeviceType {
    /// Resolve capabilities from a type code. Codes absent from the catalog
    /// get a placeholder name and the conservative default of 20 branches
    /// and 8 relays.
    pub fn from_code(code: u8) -> Self {
        let name = device_display_name(code);
        let (max_branches, max_relays) = match code {
            32 | 34 => (10, 4),           // Сигнал-10
            0 => (20, 8),                 // С2000/С2000М
            4 => (4, 4),                  // С2000-4
            16 => (2, 2),                 // С2000-2
            1 | 26 => (20, 0),            // Сигнал-20 / Сигнал-20М
            2 => (20, 5),                 // Сигнал-20П
            9 | 41 | 61 | 81 => (127, 0), // С2000-КДЛ family
            15 => (2, 6),                 // С2000-КПБ
            48 | 49 => (5, 0),            // МИП-12 / МИП-24
            33 | 38 | 54 | 79 => (5, 2),  // РИП-12 variants
            39 | 55 | 80 => (5, 4),       // РИП-24 variants
            _ => (20, 8),
        };
        Self { code, name, max_branches, max_relays }
    }

    /// Virtual branch number that carries a relay's ADC reading.
    pub fn relay_branch(&self, relay: u8) -> u8 {
        self.max_branches.wrapping_add(relay)
    }
}

/// Conventional two-state detection loops whose ADC reading converts to a
/// loop resistance that the polling engine stores per branch.
pub fn stores_loop_resistance(code: u8) -> bool {
    matches!(code, 1 | 2 | 11 | 26 | 32 | 34)
}

/// Addressable-loop controllers (КДЛ family) whose branches are individual
/// addressable sensors rather than resistive loops.
pub fn is_addressable_loop(code: u8) -> bool {
    matches!(code, 9 | 41 | 61 | 81)
}

/// Power supplies (МИП/РИП families) whose branch indices carry fixed
/// electrical meanings (output voltage, load current, battery, charger,
/// mains).
pub fn is_power_supply(code: u8) -> bool {
    matches!(code, 33 | 38 | 39 | 48 | 49 | 54 | 55 | 79 | 80)
}
