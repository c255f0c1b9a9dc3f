// MIT License - Copyright (c) 2026 bolid-bridge developers

/// All errors that can occur in the bolid-bridge library.
///
/// Protocol-level corruption (bad CRC, malformed length) never surfaces
/// here: the framing layer drops such frames silently and resynchronises.
/// A missing reply inside a sweep or poll is also not an error; it only
/// becomes [`BolidError::NoResponse`] when a reply was mandatory.
#[derive(Debug, thiserror::Error)]
pub enum BolidError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("write timed out")]
    WriteTimeout,

    #[error("channel is closed")]
    ChannelClosed,

    #[error("no response from device at address {address}")]
    NoResponse { address: u8 },

    #[error("device reported error status 0x{status:02X}")]
    DeviceError { status: u8 },

    #[error("no device registered at address {address}")]
    DeviceNotFound { address: u8 },

    #[error("a relay operation is already in flight for address {address}")]
    RelayBusy { address: u8 },

    #[error("device at address {address} has no relays")]
    NoRelaySupport { address: u8 },

    #[error("invalid device address {address} (valid range 1..=127)")]
    InvalidAddress { address: u8 },

    #[error("invalid branch number {branch}")]
    InvalidBranch { branch: u8 },

    #[error("invalid relay number {relay}")]
    InvalidRelay { relay: u8 },
}

impl BolidError {
    /// Whether the error is transient: the same operation may succeed if
    /// repeated (retry policy is the caller's concern).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BolidError::Io(_)
                | BolidError::WriteTimeout
                | BolidError::ChannelClosed
                | BolidError::NoResponse { .. }
                | BolidError::RelayBusy { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BolidError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(BolidError::WriteTimeout.is_transient());
        assert!(BolidError::NoResponse { address: 1 }.is_transient());
        assert!(BolidError::RelayBusy { address: 1 }.is_transient());
        assert!(!BolidError::DeviceError { status: 0x45 }.is_transient());
        assert!(!BolidError::DeviceNotFound { address: 1 }.is_transient());
    }

    #[test]
    fn test_device_error_display() {
        let err = BolidError::DeviceError { status: 45 };
        assert_eq!(err.to_string(), "device reported error status 0x2D");
    }
}
