// MIT License - Copyright (c) 2026 bolid-bridge developers

use crate::devices::info::DeviceInfo;

/// Notifications fanned out to registry subscribers.
///
/// Delivery is best-effort through a `tokio::sync::broadcast` channel: a
/// slow or dropped subscriber can never block the polling loop or affect
/// other subscribers.
#[derive(Debug, Clone)]
pub enum BusEvent {
    /// A device answered a type/version query during a sweep or identify.
    DeviceFound { address: u8, name: String, version: f32 },
    /// Branch, relay or ADC state of a registered device changed.
    DeviceUpdated { address: u8, info: DeviceInfo },
}

/// Type alias for the broadcast sender.
pub type EventSender = tokio::sync::broadcast::Sender<BusEvent>;

/// Type alias for the broadcast receiver.
pub type EventReceiver = tokio::sync::broadcast::Receiver<BusEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    tokio::sync::broadcast::channel(capacity)
}
