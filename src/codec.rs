// MIT License - Copyright (c) 2026 bolid-bridge developers

//! Binary frame codec for the Bolid bus.
//!
//! Every frame is `addr | len | payload | crc` where `len` counts
//! `addr + len + payload` (the trailing CRC byte is excluded) and
//! `crc = CRC8(addr ‖ len ‖ payload)`. Requests are fixed 6-byte headers
//! plus CRC; responses vary in length per request kind.

use crate::constants::CRC8_TABLE;

/// Request function codes.
pub const FUNC_DEVICE_TYPE_VERSION: u8 = 0x0D;
pub const FUNC_MANAGE_BRANCH: u8 = 0x13;
pub const FUNC_MANAGE_RELAY: u8 = 0x15;
pub const FUNC_BRANCH_STATE: u8 = 0x19;
pub const FUNC_REQUEST_ADC: u8 = 0x1B;

/// Success status bytes carried in the first payload byte of a response.
pub const STATUS_OK: u8 = 0;
pub const STATUS_BRANCH_ACK: u8 = 20;
pub const STATUS_RELAY_ACK: u8 = 22;
pub const STATUS_BRANCH_STATE: u8 = 26;
pub const STATUS_ADC: u8 = 28;

/// Relay program codes with a fixed on/off meaning. All other codes
/// (blink patterns, fire-linked programs) are passed to the device as-is.
pub const RELAY_PROGRAM_ON: u8 = 1;
pub const RELAY_PROGRAM_OFF: u8 = 2;

/// Compute the bus CRC8 over `data` by table lookup.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        crc = CRC8_TABLE[(crc ^ byte) as usize];
    }
    crc
}

/// Arm/disarm action byte for a manage-branch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BranchAction {
    Disarm = 0x00,
    Arm = 0x02,
}

impl BranchAction {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Disarm => "disarm",
            Self::Arm => "arm",
        }
    }
}

/// The five request kinds the bus understands.
///
/// The kind of the last request sent to an address determines which
/// response shapes the reassembler will accept from that address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    DeviceTypeVersion,
    ManageBranch,
    RequestAdc,
    BranchState,
    ManageRelay,
}

/// A typed request. Encodes to a fixed 7-byte frame:
/// `addr, 6, 0, func, p1, p2, crc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Query device type code and firmware version.
    DeviceTypeVersion { addr: u8 },
    /// Arm or disarm a branch (detection loop).
    ManageBranch { addr: u8, branch: u8, action: BranchAction },
    /// Read the 8-bit ADC value of a branch.
    RequestAdc { addr: u8, branch: u8 },
    /// Read the state code of a branch.
    BranchState { addr: u8, branch: u8 },
    /// Run a relay control program (0..=57).
    ManageRelay { addr: u8, relay: u8, program: u8 },
}

impl Request {
    /// Destination address of the request.
    pub fn addr(&self) -> u8 {
        match *self {
            Request::DeviceTypeVersion { addr }
            | Request::ManageBranch { addr, .. }
            | Request::RequestAdc { addr, .. }
            | Request::BranchState { addr, .. }
            | Request::ManageRelay { addr, .. } => addr,
        }
    }

    /// Kind tag, used for response-shape dispatch.
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::DeviceTypeVersion { .. } => RequestKind::DeviceTypeVersion,
            Request::ManageBranch { .. } => RequestKind::ManageBranch,
            Request::RequestAdc { .. } => RequestKind::RequestAdc,
            Request::BranchState { .. } => RequestKind::BranchState,
            Request::ManageRelay { .. } => RequestKind::ManageRelay,
        }
    }

    /// Serialize to wire bytes, CRC appended. Always succeeds.
    pub fn encode(&self) -> Vec<u8> {
        let (addr, func, p1, p2) = match *self {
            Request::DeviceTypeVersion { addr } => (addr, FUNC_DEVICE_TYPE_VERSION, 0, 0),
            Request::ManageBranch { addr, branch, action } => {
                (addr, FUNC_MANAGE_BRANCH, branch, action as u8)
            }
            Request::RequestAdc { addr, branch } => (addr, FUNC_REQUEST_ADC, branch, 0),
            Request::BranchState { addr, branch } => (addr, FUNC_BRANCH_STATE, branch, 0),
            Request::ManageRelay { addr, relay, program } => {
                (addr, FUNC_MANAGE_RELAY, relay, program)
            }
        };
        let mut data = vec![addr, 6, 0, func, p1, p2];
        data.push(crc8(&data));
        data
    }
}

/// A decoded response frame, tagged with its source address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Reply to a type/version query. The three wire variants (5/6/7-byte)
    /// differ only in trailing spare bytes and collapse into one shape.
    DeviceTypeVersion { addr: u8, status: u8, device_type: u8, version_raw: u8 },
    /// Acknowledgement of an arm/disarm command.
    BranchManageAck { addr: u8, status: u8, branch: u8, action: u8 },
    /// ADC reading for a branch.
    Adc { addr: u8, status: u8, branch: u8, adc: u8 },
    /// Branch state code. The two-byte variant carries a secondary code in
    /// `code_high`; the one-byte variant leaves it `None`.
    BranchState { addr: u8, status: u8, branch: u8, code_low: u8, code_high: Option<u8> },
    /// Acknowledgement of a relay program command.
    RelayAck { addr: u8, status: u8, relay: u8, program: u8 },
}

impl Response {
    /// Source address of the response.
    pub fn addr(&self) -> u8 {
        match *self {
            Response::DeviceTypeVersion { addr, .. }
            | Response::BranchManageAck { addr, .. }
            | Response::Adc { addr, .. }
            | Response::BranchState { addr, .. }
            | Response::RelayAck { addr, .. } => addr,
        }
    }

    /// The status byte of the response.
    pub fn status(&self) -> u8 {
        match *self {
            Response::DeviceTypeVersion { status, .. }
            | Response::BranchManageAck { status, .. }
            | Response::Adc { status, .. }
            | Response::BranchState { status, .. }
            | Response::RelayAck { status, .. } => status,
        }
    }
}

/// Decode a complete candidate frame (`len + 1` bytes including the
/// trailing CRC) into the response shape expected after a request of
/// `kind`. Returns `None` on CRC mismatch or a length the kind does not
/// accept; line noise is dropped silently here.
pub fn decode_response(kind: RequestKind, frame: &[u8]) -> Option<Response> {
    if frame.len() < 3 {
        return None;
    }
    let payload = &frame[..frame.len() - 1];
    let crc = frame[frame.len() - 1];
    if crc8(payload) != crc {
        return None;
    }

    let addr = payload[0];
    let len = payload[1];
    if payload.len() != len as usize {
        return None;
    }

    match (kind, len) {
        (RequestKind::DeviceTypeVersion, 5..=7) => Some(Response::DeviceTypeVersion {
            addr,
            status: payload[2],
            device_type: payload[3],
            version_raw: payload[4],
        }),
        (RequestKind::ManageBranch, 5) => Some(Response::BranchManageAck {
            addr,
            status: payload[2],
            branch: payload[3],
            action: payload[4],
        }),
        (RequestKind::RequestAdc, 5) => Some(Response::Adc {
            addr,
            status: payload[2],
            branch: payload[3],
            adc: payload[4],
        }),
        (RequestKind::BranchState, 5) => Some(Response::BranchState {
            addr,
            status: payload[2],
            branch: payload[3],
            code_low: payload[4],
            code_high: None,
        }),
        // Two-byte state: low byte first on the wire.
        (RequestKind::BranchState, 6) => Some(Response::BranchState {
            addr,
            status: payload[2],
            branch: payload[3],
            code_low: payload[4],
            code_high: Some(payload[5]),
        }),
        (RequestKind::ManageRelay, 5) => Some(Response::RelayAck {
            addr,
            status: payload[2],
            relay: payload[3],
            program: payload[4],
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc8_known_vectors() {
        assert_eq!(crc8(&[1, 6, 0, 0x0D, 0, 0]), 187);
        assert_eq!(crc8(&[3, 6, 0, 0x0D, 0, 0]), 213);
        assert_eq!(crc8(&[3, 5, 0, 9, 123]), 165);
        assert_eq!(crc8(&[]), 0);
    }

    #[test]
    fn test_request_encoding() {
        assert_eq!(
            Request::DeviceTypeVersion { addr: 1 }.encode(),
            vec![1, 6, 0, 0x0D, 0, 0, 187]
        );
        assert_eq!(
            Request::ManageBranch { addr: 5, branch: 2, action: BranchAction::Arm }.encode(),
            vec![5, 6, 0, 0x13, 2, 2, 244]
        );
        assert_eq!(
            Request::ManageBranch { addr: 5, branch: 2, action: BranchAction::Disarm }.encode(),
            vec![5, 6, 0, 0x13, 2, 0, 72]
        );
        assert_eq!(
            Request::RequestAdc { addr: 5, branch: 1 }.encode(),
            vec![5, 6, 0, 0x1B, 1, 0, 56]
        );
        assert_eq!(
            Request::BranchState { addr: 5, branch: 1 }.encode(),
            vec![5, 6, 0, 0x19, 1, 0, 119]
        );
        assert_eq!(
            Request::ManageRelay { addr: 7, relay: 1, program: 1 }.encode(),
            vec![7, 6, 0, 0x15, 1, 1, 252]
        );
    }

    #[test]
    fn test_request_addr_and_kind() {
        let req = Request::RequestAdc { addr: 42, branch: 3 };
        assert_eq!(req.addr(), 42);
        assert_eq!(req.kind(), RequestKind::RequestAdc);
    }

    #[test]
    fn test_decode_device_type_version() {
        let frame = [3u8, 5, 0, 9, 123, 165];
        let resp = decode_response(RequestKind::DeviceTypeVersion, &frame).unwrap();
        assert_eq!(
            resp,
            Response::DeviceTypeVersion { addr: 3, status: 0, device_type: 9, version_raw: 123 }
        );
        assert_eq!(resp.addr(), 3);
        assert_eq!(resp.status(), 0);
    }

    #[test]
    fn test_decode_rejects_corruption() {
        let good = [3u8, 5, 0, 9, 123, 165];
        // Flipping any single bit must fail the CRC.
        for byte in 0..good.len() {
            for bit in 0..8 {
                let mut bad = good;
                bad[byte] ^= 1 << bit;
                assert_eq!(
                    decode_response(RequestKind::DeviceTypeVersion, &bad),
                    None,
                    "bit {bit} of byte {byte} flipped but frame still decoded"
                );
            }
        }
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        // A valid ADC-shaped frame must not decode after a relay request
        // of a different length expectation.
        let frame = [5u8, 5, 28, 1, 91, 157];
        assert!(decode_response(RequestKind::RequestAdc, &frame).is_some());
        assert!(decode_response(RequestKind::DeviceTypeVersion, &frame).is_some());
        // Too short for any shape.
        assert_eq!(decode_response(RequestKind::RequestAdc, &[5, 5]), None);
        assert_eq!(decode_response(RequestKind::RequestAdc, &[]), None);
    }

    #[test]
    fn test_decode_branch_state_variants() {
        let short = [5u8, 5, 26, 1, 24, 252];
        assert_eq!(
            decode_response(RequestKind::BranchState, &short).unwrap(),
            Response::BranchState { addr: 5, status: 26, branch: 1, code_low: 24, code_high: None }
        );

        let long = [5u8, 6, 26, 1, 24, 0, 101];
        assert_eq!(
            decode_response(RequestKind::BranchState, &long).unwrap(),
            Response::BranchState {
                addr: 5,
                status: 26,
                branch: 1,
                code_low: 24,
                code_high: Some(0),
            }
        );
    }

    #[test]
    fn test_decode_len_field_must_match() {
        // Correct CRC but the len field disagrees with the actual frame size.
        let mut frame = vec![5u8, 6, 28, 1, 91];
        frame.push(crc8(&frame));
        assert_eq!(decode_response(RequestKind::RequestAdc, &frame), None);
    }
}
