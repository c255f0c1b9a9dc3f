// End-to-end tests over an in-memory emulated bus.
//
// The emulated channel parses each request frame the library writes and
// feeds scripted response bytes back through the real reader task, so the
// whole stack (codec, reassembler, engine, manager, registry) is exercised
// exactly as against hardware.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use bolid_bridge::codec::crc8;
use bolid_bridge::{
    BolidError, BranchState, BusChannel, BusConfig, BusEvent, BusLink, DeviceManager,
    DeviceRegistry, Result,
};

type Responder = Box<dyn Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync>;

/// Byte channel wired to a scripted device emulation.
struct EmulatedBus {
    rx: Arc<StdMutex<Vec<u8>>>,
    open: AtomicBool,
    responder: Responder,
    response_delay: Duration,
    /// Every request frame the library wrote, for assertions.
    requests: Arc<StdMutex<Vec<Vec<u8>>>>,
}

impl EmulatedBus {
    fn new(responder: Responder) -> Self {
        Self::with_delay(responder, Duration::ZERO)
    }

    fn with_delay(responder: Responder, response_delay: Duration) -> Self {
        Self {
            rx: Arc::new(StdMutex::new(Vec::new())),
            open: AtomicBool::new(true),
            responder,
            response_delay,
            requests: Arc::new(StdMutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl BusChannel for EmulatedBus {
    async fn write(&self, data: &[u8], _timeout: Duration) -> Result<()> {
        if !self.is_open() {
            return Err(BolidError::ChannelClosed);
        }
        self.requests.lock().unwrap().push(data.to_vec());
        if let Some(response) = (self.responder)(data) {
            let rx = self.rx.clone();
            let delay = self.response_delay;
            tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                rx.lock().unwrap().extend_from_slice(&response);
            });
        }
        Ok(())
    }

    async fn read_available(&self) -> Result<Vec<u8>> {
        Ok(std::mem::take(&mut *self.rx.lock().unwrap()))
    }

    async fn bytes_available(&self) -> Result<usize> {
        Ok(self.rx.lock().unwrap().len())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

/// Build a response frame from its payload, CRC appended.
fn reply(payload: &[u8]) -> Vec<u8> {
    let mut frame = payload.to_vec();
    frame.push(crc8(payload));
    frame
}

fn test_config() -> BusConfig {
    BusConfig::builder()
        .fast_mode(true)
        .queue_poll_interval_ms(2)
        .reader_idle_delay_ms(1)
        .scan_timeout_ms(60)
        .poll_timeout_ms(60)
        .response_timeout_ms(100)
        .ack_timeout_ms(500)
        .inter_address_delay_ms(1)
        .inter_branch_delay_ms(1)
        .build()
}

struct Harness {
    link: BusLink,
    manager: Arc<DeviceManager>,
    registry: Arc<DeviceRegistry>,
    channel: Arc<EmulatedBus>,
}

fn harness(channel: EmulatedBus) -> Harness {
    let channel = Arc::new(channel);
    let link = BusLink::open(channel.clone(), test_config());
    let registry = Arc::new(DeviceRegistry::new());
    let manager = Arc::new(DeviceManager::new(link.engine(), registry.clone()));
    Harness { link, manager, registry, channel }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scan_finds_single_device() {
    // Only address 3 is occupied: a КДЛ, firmware byte 123.
    let bus = EmulatedBus::new(Box::new(|req| {
        if req[0] == 3 && req[3] == 0x0D {
            Some(reply(&[3, 5, 0, 9, 123]))
        } else {
            None
        }
    }));
    let mut h = harness(bus);

    let found = h.manager.scan(1, 5, |_, _, _| true).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].address, 3);
    assert_eq!(found[0].name, "С2000-КДЛ");
    assert!((found[0].version - 1.23).abs() < 1e-6);

    // The device landed in the registry with its catalog capabilities.
    let info = h.registry.device(3).await.unwrap();
    assert_eq!(info.device_type.max_branches, 127);
    assert_eq!(info.device_type.max_relays, 0);

    h.link.close().await;
}

#[tokio::test]
async fn scan_ignores_nonzero_status() {
    let bus = EmulatedBus::new(Box::new(|req| {
        if req[0] == 2 && req[3] == 0x0D {
            // Device answers, but with an error status byte.
            Some(reply(&[2, 5, 0x11, 9, 123]))
        } else {
            None
        }
    }));
    let mut h = harness(bus);

    let found = h.manager.scan(1, 3, |_, _, _| true).await;
    assert!(found.is_empty());
    assert!(h.registry.device(2).await.is_none());

    h.link.close().await;
}

#[tokio::test]
async fn scan_cancelled_by_progress_callback() {
    let bus = EmulatedBus::new(Box::new(|req| Some(reply(&[req[0], 5, 0, 4, 100]))));
    let mut h = harness(bus);

    // Stop as soon as two devices were found.
    let found = h.manager.scan(1, 20, |_, found_so_far, _| found_so_far < 2).await;
    assert_eq!(found.len(), 2);

    h.link.close().await;
}

#[tokio::test]
async fn identify_unknown_type_gets_placeholder() {
    let bus = EmulatedBus::new(Box::new(|req| {
        if req[3] == 0x0D {
            Some(reply(&[req[0], 5, 0, 200, 50]))
        } else {
            None
        }
    }));
    let mut h = harness(bus);

    let info = h.manager.identify(9).await.unwrap();
    assert_eq!(info.device_type.name, "Unknown device type 200");
    assert_eq!(info.device_type.max_branches, 20);
    assert_eq!(info.device_type.max_relays, 8);

    h.link.close().await;
}

// ---------------------------------------------------------------------------
// Branch polling
// ---------------------------------------------------------------------------

/// Responder for a healthy resistive-loop device: every branch reads
/// ADC 91 and reports state code 24 (armed).
fn healthy_loop_responder(address: u8) -> Responder {
    Box::new(move |req| {
        if req[0] != address {
            return None;
        }
        match req[3] {
            0x1B => Some(reply(&[address, 5, 28, req[4], 91])),
            0x19 => Some(reply(&[address, 5, 26, req[4], 24])),
            _ => None,
        }
    })
}

#[tokio::test]
async fn poll_updates_branches_adc_and_resistance() {
    let mut h = harness(EmulatedBus::new(healthy_loop_responder(5)));
    // Сигнал-10: ten resistive loops.
    h.registry.add_device(5, 32, 1.0).await.unwrap();

    let summary = h.manager.poll_branches(5, |_, _| true).await.unwrap();
    assert_eq!(summary.total, 10);
    assert_eq!(summary.polled, 10);
    assert_eq!(summary.updated, 10);
    assert!(!summary.cancelled);

    let info = h.registry.device(5).await.unwrap();
    for branch in 1..=10u8 {
        assert_eq!(info.branch_state(branch), BranchState::Armed);
        assert_eq!(info.adc_values[&branch], 91);
        // ADC 91 lands in the normal 2.2..5.4 kΩ band.
        assert!((info.resistances[&branch] - 2.48).abs() < 1e-6);
    }

    h.link.close().await;
}

#[tokio::test]
async fn poll_cancellation_replaces_branch_map_wholesale() {
    let mut h = harness(EmulatedBus::new(healthy_loop_responder(5)));
    h.registry.add_device(5, 32, 1.0).await.unwrap();
    // A previous pass knew about branch 10.
    h.registry
        .with_device_mut(5, |d| {
            d.branches.insert(10, BranchState::Alarm);
        })
        .await
        .unwrap();

    let summary = h.manager.poll_branches(5, |polled, _| polled < 3).await.unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.polled, 3);
    assert_eq!(summary.updated, 3);

    // The pass was cut short, and the branch map now holds only what this
    // pass actually read; the stale branch-10 entry is gone.
    let info = h.registry.device(5).await.unwrap();
    let mut branches: Vec<u8> = info.branches.keys().copied().collect();
    branches.sort_unstable();
    assert_eq!(branches, vec![1, 2, 3]);

    h.link.close().await;
}

#[tokio::test]
async fn poll_skips_branches_with_adc_errors() {
    // ADC replies carry a device-reported error status; state queries
    // must then never be issued and no branch state stored.
    let bus = EmulatedBus::new(Box::new(|req| match req[3] {
        0x1B => Some(reply(&[req[0], 5, 0x45, req[4], 0])),
        0x19 => Some(reply(&[req[0], 5, 26, req[4], 24])),
        _ => None,
    }));
    let mut h = harness(bus);
    // С2000-2: two loops.
    h.registry.add_device(5, 16, 1.0).await.unwrap();

    let summary = h.manager.poll_branches(5, |_, _| true).await.unwrap();
    assert_eq!(summary.polled, 2);
    assert_eq!(summary.updated, 0);

    let info = h.registry.device(5).await.unwrap();
    assert!(info.branches.is_empty());
    let requests = h.channel.requests.lock().unwrap();
    assert!(requests.iter().all(|r| r[3] != 0x19), "state was queried after an ADC error");
    drop(requests);

    h.link.close().await;
}

#[tokio::test]
async fn poll_two_byte_state_uses_low_byte() {
    let bus = EmulatedBus::new(Box::new(|req| match req[3] {
        0x1B => Some(reply(&[req[0], 5, 28, req[4], 60])),
        // Long state variant: primary code 109, secondary code 23.
        0x19 => Some(reply(&[req[0], 6, 26, req[4], 109, 23])),
        _ => None,
    }));
    let mut h = harness(bus);
    h.registry.add_device(5, 16, 1.0).await.unwrap();

    let summary = h.manager.poll_branches(5, |_, _| true).await.unwrap();
    assert_eq!(summary.updated, 2);
    let info = h.registry.device(5).await.unwrap();
    assert_eq!(info.branch_state(1), BranchState::Disarmed);
    assert_eq!(info.branch_state(2), BranchState::Disarmed);

    h.link.close().await;
}

// ---------------------------------------------------------------------------
// Arm/disarm
// ---------------------------------------------------------------------------

#[tokio::test]
async fn toggle_armed_branch_sends_disarm_and_notifies_once() {
    let bus = EmulatedBus::new(Box::new(|req| {
        if req[3] == 0x13 {
            Some(reply(&[req[0], 5, 20, req[4], req[5]]))
        } else {
            None
        }
    }));
    let mut h = harness(bus);
    h.registry.add_device(5, 4, 1.0).await.unwrap();
    h.registry
        .with_device_mut(5, |d| {
            d.branches.insert(2, BranchState::Armed);
        })
        .await
        .unwrap();

    let mut events = h.registry.subscribe();
    let new_state = h.manager.toggle_branch(5, 2).await.unwrap();
    assert_eq!(new_state, BranchState::Disarmed);

    // The command on the wire was a disarm (action byte 0x00).
    {
        let requests = h.channel.requests.lock().unwrap();
        let manage: Vec<_> = requests.iter().filter(|r| r[3] == 0x13).collect();
        assert_eq!(manage.len(), 1);
        assert_eq!(manage[0][4], 2);
        assert_eq!(manage[0][5], 0x00);
    }

    // Subscribers were notified exactly once.
    match events.try_recv().unwrap() {
        BusEvent::DeviceUpdated { address, info } => {
            assert_eq!(address, 5);
            assert_eq!(info.branch_state(2), BranchState::Disarmed);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(events.try_recv().is_err());

    h.link.close().await;
}

#[tokio::test]
async fn toggle_unknown_branch_sends_arm() {
    let bus = EmulatedBus::new(Box::new(|req| {
        if req[3] == 0x13 {
            Some(reply(&[req[0], 5, 20, req[4], req[5]]))
        } else {
            None
        }
    }));
    let mut h = harness(bus);
    h.registry.add_device(5, 4, 1.0).await.unwrap();

    let new_state = h.manager.toggle_branch(5, 1).await.unwrap();
    assert_eq!(new_state, BranchState::Armed);
    let requests = h.channel.requests.lock().unwrap();
    assert_eq!(requests.last().unwrap()[5], 0x02);
    drop(requests);

    h.link.close().await;
}

#[tokio::test]
async fn toggle_branch_device_error_leaves_state_untouched() {
    let bus = EmulatedBus::new(Box::new(|req| {
        if req[3] == 0x13 {
            // Device rejects the command.
            Some(reply(&[req[0], 5, 0x45, req[4], req[5]]))
        } else {
            None
        }
    }));
    let mut h = harness(bus);
    h.registry.add_device(5, 4, 1.0).await.unwrap();
    h.registry
        .with_device_mut(5, |d| {
            d.branches.insert(1, BranchState::Armed);
        })
        .await
        .unwrap();

    let mut events = h.registry.subscribe();
    let err = h.manager.toggle_branch(5, 1).await.unwrap_err();
    assert!(matches!(err, BolidError::DeviceError { status: 0x45 }));
    assert_eq!(
        h.registry.device(5).await.unwrap().branch_state(1),
        BranchState::Armed
    );
    assert!(events.try_recv().is_err());

    h.link.close().await;
}

#[tokio::test]
async fn toggle_branch_no_reply_is_typed_failure() {
    let bus = EmulatedBus::new(Box::new(|_| None));
    let mut h = harness(bus);
    h.registry.add_device(5, 4, 1.0).await.unwrap();

    let err = h.manager.toggle_branch(5, 1).await.unwrap_err();
    assert!(matches!(err, BolidError::NoResponse { address: 5 }));

    h.link.close().await;
}

// ---------------------------------------------------------------------------
// Relays
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_relay_command_rejected_while_first_in_flight() {
    // The device takes 150 ms to acknowledge.
    let bus = EmulatedBus::with_delay(
        Box::new(|req| {
            if req[3] == 0x15 {
                Some(reply(&[req[0], 5, 22, req[4], req[5]]))
            } else {
                None
            }
        }),
        Duration::from_millis(150),
    );
    let mut h = harness(bus);
    h.registry.add_device(7, 4, 1.0).await.unwrap();

    let manager = h.manager.clone();
    let first = tokio::spawn(async move { manager.toggle_relay(7, 1, None).await });
    tokio::time::sleep(Duration::from_millis(30)).await;

    // Rejected immediately, not queued.
    let err = h.manager.toggle_relay(7, 2, None).await.unwrap_err();
    assert!(matches!(err, BolidError::RelayBusy { address: 7 }));

    // The first command still completes and flips the relay on.
    let result = first.await.unwrap().unwrap();
    assert_eq!(result, Some(true));
    assert!(h.registry.device(7).await.unwrap().relay_state(1));

    // With the flag released, relay commands work again.
    assert!(h.manager.toggle_relay(7, 2, None).await.is_ok());

    h.link.close().await;
}

#[tokio::test]
async fn explicit_relay_program_leaves_tracked_state_unspecified() {
    let bus = EmulatedBus::new(Box::new(|req| {
        if req[3] == 0x15 {
            Some(reply(&[req[0], 5, 22, req[4], req[5]]))
        } else {
            None
        }
    }));
    let mut h = harness(bus);
    h.registry.add_device(7, 4, 1.0).await.unwrap();

    // Program 12 (siren) has no on/off meaning for the tracked boolean.
    let result = h.manager.toggle_relay(7, 1, Some(12)).await.unwrap();
    assert_eq!(result, None);
    assert!(!h.registry.device(7).await.unwrap().relay_state(1));

    let requests = h.channel.requests.lock().unwrap();
    assert_eq!(requests.last().unwrap()[5], 12);
    drop(requests);

    h.link.close().await;
}

#[tokio::test]
async fn relay_states_read_back_through_adc_mapping() {
    // С2000-КПБ: 2 branches, 6 relays on virtual branches 3..=8.
    // Relays on branches 3..=5 are energised (ADC 37), the rest released.
    let bus = EmulatedBus::new(Box::new(|req| {
        if req[3] == 0x1B {
            let adc = if (3..=5).contains(&req[4]) { 37 } else { 0 };
            Some(reply(&[req[0], 5, 28, req[4], adc]))
        } else {
            None
        }
    }));
    let mut h = harness(bus);
    h.registry.add_device(9, 15, 1.0).await.unwrap();

    let updated = h.manager.update_relay_states(9).await.unwrap();
    assert_eq!(updated, 6);

    let info = h.registry.device(9).await.unwrap();
    assert!(info.relay_state(1));
    assert!(info.relay_state(2));
    assert!(info.relay_state(3));
    assert!(!info.relay_state(4));
    assert!(!info.relay_state(5));
    assert!(!info.relay_state(6));

    h.link.close().await;
}
