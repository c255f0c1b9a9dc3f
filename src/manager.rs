// MIT License - Copyright (c) 2026 bolid-bridge developers

//! Stateful device operations: branch polling, arm/disarm, relay control.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::codec::{
    BranchAction, Request, Response, RELAY_PROGRAM_OFF, RELAY_PROGRAM_ON, STATUS_ADC,
    STATUS_BRANCH_ACK, STATUS_BRANCH_STATE, STATUS_OK, STATUS_RELAY_ACK,
};
use crate::config::BusConfig;
use crate::constants::{branch_state_display, relay_program_description};
use crate::devices::branch::BranchState;
use crate::devices::catalog::stores_loop_resistance;
use crate::devices::info::DeviceInfo;
use crate::error::{BolidError, Result};
use crate::interpret::{calculate_resistance, interpret_adc_for_device, interpret_relay_adc};
use crate::registry::DeviceRegistry;
use crate::transport::discovery::{scan_devices, FoundDevice};
use crate::transport::engine::ExchangeEngine;

/// Outcome of one branch-polling pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSummary {
    /// Branches the device has.
    pub total: usize,
    /// Branches the pass reached (including ones that failed to answer).
    pub polled: usize,
    /// Branches whose state was read successfully.
    pub updated: usize,
    /// Whether the pass was stopped early by the progress callback.
    pub cancelled: bool,
}

impl fmt::Display for PollSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "updated {} of {} polled branches (of {} total)",
            self.updated, self.polled, self.total
        )?;
        if self.cancelled {
            write!(f, ", cancelled")?;
        }
        Ok(())
    }
}

/// Drives registered devices over an exchange engine.
///
/// All long-running operations are plain `async fn`s; spawn them when the
/// caller must not block. Cancellation is cooperative: sweep and poll
/// loops check their progress callback between iterations and stop at the
/// next boundary, never mid-exchange.
pub struct DeviceManager {
    engine: Arc<ExchangeEngine>,
    registry: Arc<DeviceRegistry>,
    /// Per-device relay-operation flags. Relay commands reject concurrent
    /// callers immediately instead of queueing, so two programs can never
    /// interleave on the wire.
    relay_flags: StdMutex<HashMap<u8, Arc<AtomicBool>>>,
}

impl DeviceManager {
    pub fn new(engine: Arc<ExchangeEngine>, registry: Arc<DeviceRegistry>) -> Self {
        Self {
            engine,
            registry,
            relay_flags: StdMutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    pub fn engine(&self) -> &Arc<ExchangeEngine> {
        &self.engine
    }

    fn config(&self) -> &BusConfig {
        self.engine.config()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.engine.channel().is_open() {
            Ok(())
        } else {
            Err(BolidError::ChannelClosed)
        }
    }

    /// Query the type and version of the device at `address` and register
    /// it on success.
    pub async fn identify(&self, address: u8) -> Result<DeviceInfo> {
        if address == 0 || address > 127 {
            return Err(BolidError::InvalidAddress { address });
        }
        self.ensure_open()?;
        self.engine.clear_responses().await;
        self.engine.send(&Request::DeviceTypeVersion { addr: address }).await?;
        match self.engine.get(self.config().response_timeout(), Some(address)).await {
            Some(Response::DeviceTypeVersion { status, device_type, version_raw, .. }) => {
                if status == STATUS_OK {
                    self.registry
                        .add_device(address, device_type, version_raw as f32 / 100.0)
                        .await
                } else {
                    Err(BolidError::DeviceError { status })
                }
            }
            _ => Err(BolidError::NoResponse { address }),
        }
    }

    /// Sweep an address range and register every device that answers.
    /// `on_progress(addr, found_so_far, total)` cancels the sweep when it
    /// returns `false`.
    pub async fn scan<P>(&self, start: u8, end: u8, on_progress: P) -> Vec<FoundDevice>
    where
        P: FnMut(u8, usize, usize) -> bool,
    {
        self.engine.clear_responses().await;
        let found = scan_devices(
            &self.engine,
            start,
            end,
            self.config().scan_timeout(),
            on_progress,
            |_| {},
        )
        .await;
        for device in &found {
            if (1..=127).contains(&device.address) {
                let _ = self
                    .registry
                    .add_device(device.address, device.type_code, device.version)
                    .await;
            }
        }
        found
    }

    /// Poll every branch of a device sequentially: ADC reading first, then
    /// the state code, updating the registry as results arrive.
    ///
    /// `on_progress(polled, total)` runs once before the first branch and
    /// after every branch; returning `false` stops the pass at that
    /// boundary, leaving already-polled branches updated. At the end of
    /// the pass the device's branch map is replaced wholesale with what
    /// this pass actually read, so branches that stopped answering drop
    /// back to unknown on the next full pass.
    pub async fn poll_branches<P>(&self, address: u8, mut on_progress: P) -> Result<PollSummary>
    where
        P: FnMut(usize, usize) -> bool,
    {
        let info = self
            .registry
            .device(address)
            .await
            .ok_or(BolidError::DeviceNotFound { address })?;
        self.ensure_open()?;

        let total = info.device_type.max_branches as usize;
        let device_code = info.device_type.code;
        let mut updated: HashMap<u8, BranchState> = HashMap::new();
        let mut polled = 0usize;
        let mut cancelled = false;

        if !on_progress(0, total) {
            debug!("branch poll of address {address} cancelled before start");
            return Ok(PollSummary { total, polled: 0, updated: 0, cancelled: true });
        }

        for branch in 1..=info.device_type.max_branches {
            self.poll_one_branch(&info, branch, device_code, &mut updated).await;
            sleep(self.config().inter_branch_delay()).await;
            polled += 1;
            if !on_progress(polled, total) {
                info!("branch poll of address {address} stopped after branch {branch}");
                cancelled = true;
                break;
            }
        }

        let summary = PollSummary { total, polled, updated: updated.len(), cancelled };
        self.registry
            .with_device_mut(address, |d| {
                d.branches = updated;
            })
            .await;
        info!("address {address}: {summary}");
        Ok(summary)
    }

    /// One branch of a polling pass: ADC then state. Failures are logged
    /// and skipped; the pass always continues with the next branch.
    async fn poll_one_branch(
        &self,
        info: &DeviceInfo,
        branch: u8,
        device_code: u8,
        updated: &mut HashMap<u8, BranchState>,
    ) {
        let address = info.address;

        // ADC reading.
        if self.engine.send(&Request::RequestAdc { addr: address, branch }).await.is_err() {
            return;
        }
        let adc = match self.engine.get(self.config().poll_timeout(), Some(address)).await {
            Some(Response::Adc { status, adc, .. }) => {
                if status != STATUS_ADC {
                    warn!("branch {branch}: ADC error (code 0x{status:02X})");
                    return;
                }
                adc
            }
            _ => {
                debug!("branch {branch}: no ADC response");
                return;
            }
        };

        let resistance = if stores_loop_resistance(device_code) {
            calculate_resistance(adc)
        } else {
            0.0
        };
        let state_code = info.branch_state(branch).state_code();
        debug!(
            "branch {branch}: ADC={adc}, {}",
            interpret_adc_for_device(adc, device_code, state_code, Some(branch))
        );
        self.registry
            .with_device_mut(address, |d| {
                d.adc_values.insert(branch, adc);
                d.resistances.insert(branch, resistance);
            })
            .await;

        // State code.
        if self.engine.send(&Request::BranchState { addr: address, branch }).await.is_err() {
            return;
        }
        match self.engine.get(self.config().poll_timeout(), Some(address)).await {
            Some(Response::BranchState { status, code_low, code_high, .. }) => {
                if status != STATUS_BRANCH_STATE {
                    warn!("branch {branch}: state error (code 0x{status:02X})");
                    return;
                }
                // The one-byte variant always carries a meaningful code;
                // the two-byte variant uses zero as "no primary event".
                if code_high.is_none() || code_low != 0 {
                    let state = BranchState::from_state_code(code_low);
                    debug!("branch {branch}: code {code_low} ({})", branch_state_display(code_low));
                    updated.insert(branch, state);
                    self.registry
                        .with_device_mut(address, |d| {
                            d.branches.insert(branch, state);
                        })
                        .await;
                    self.registry.notify_update(address).await;
                }
                if let Some(high) = code_high {
                    if high != 0 {
                        debug!(
                            "branch {branch}: secondary code {high} ({})",
                            branch_state_display(high)
                        );
                    }
                }
            }
            _ => debug!("branch {branch}: no state response"),
        }
    }

    /// Arm or disarm a branch by inverting its last known state: an armed
    /// branch is disarmed, anything else is armed. The device state is
    /// only mutated, and subscribers only notified, on a positive
    /// acknowledgement.
    pub async fn toggle_branch(&self, address: u8, branch: u8) -> Result<BranchState> {
        if branch == 0 {
            return Err(BolidError::InvalidBranch { branch });
        }
        let info = self
            .registry
            .device(address)
            .await
            .ok_or(BolidError::DeviceNotFound { address })?;
        self.ensure_open()?;

        let action = if info.branch_state(branch) == BranchState::Armed {
            BranchAction::Disarm
        } else {
            BranchAction::Arm
        };
        info!("{} branch {branch} at address {address}", action.description());

        self.engine
            .send(&Request::ManageBranch { addr: address, branch, action })
            .await?;
        match self.engine.get(self.config().ack_timeout(), Some(address)).await {
            Some(Response::BranchManageAck { status, .. }) => {
                if status == STATUS_BRANCH_ACK {
                    let new_state = match action {
                        BranchAction::Arm => BranchState::Armed,
                        BranchAction::Disarm => BranchState::Disarmed,
                    };
                    self.registry
                        .with_device_mut(address, |d| {
                            d.branches.insert(branch, new_state);
                        })
                        .await;
                    self.registry.notify_update(address).await;
                    info!("branch {branch} at address {address} is now {}", new_state.description());
                    Ok(new_state)
                } else {
                    Err(BolidError::DeviceError { status })
                }
            }
            _ => Err(BolidError::NoResponse { address }),
        }
    }

    /// Run a relay program. With `program == None` the relay is toggled
    /// between on (program 1) and off (program 2) based on its last known
    /// state. Only programs 1 and 2 have a definite on/off outcome; for
    /// every other program the device accepts the command but the tracked
    /// boolean is left unspecified and `Ok(None)` is returned.
    ///
    /// Relay commands for one device do not queue: while one is in flight
    /// any further call fails fast with [`BolidError::RelayBusy`].
    pub async fn toggle_relay(
        &self,
        address: u8,
        relay: u8,
        program: Option<u8>,
    ) -> Result<Option<bool>> {
        if relay == 0 {
            return Err(BolidError::InvalidRelay { relay });
        }
        let info = self
            .registry
            .device(address)
            .await
            .ok_or(BolidError::DeviceNotFound { address })?;
        self.ensure_open()?;

        let _guard = self.try_lock_relay(address)?;

        let current = info.relay_state(relay);
        let code = program.unwrap_or(if current { RELAY_PROGRAM_OFF } else { RELAY_PROGRAM_ON });
        match relay_program_description(code) {
            Some(description) => {
                info!("relay {relay} at address {address}: program {code} ({description})")
            }
            None => warn!("relay {relay} at address {address}: unknown program {code}"),
        }

        self.engine
            .send(&Request::ManageRelay { addr: address, relay, program: code })
            .await?;
        match self.engine.get(self.config().ack_timeout(), Some(address)).await {
            Some(Response::RelayAck { status, .. }) => {
                if status == STATUS_RELAY_ACK {
                    if code == RELAY_PROGRAM_ON || code == RELAY_PROGRAM_OFF {
                        let new_state = !current;
                        self.registry
                            .with_device_mut(address, |d| {
                                d.relays.insert(relay, new_state);
                            })
                            .await;
                        self.registry.notify_update(address).await;
                        Ok(Some(new_state))
                    } else {
                        Ok(None)
                    }
                } else {
                    Err(BolidError::DeviceError { status })
                }
            }
            _ => Err(BolidError::NoResponse { address }),
        }
    }

    /// Read back the on/off state of every relay through the relay ADC
    /// channels (relay N is reported on virtual branch
    /// `max_branches + N`). Returns how many relays answered.
    pub async fn update_relay_states(&self, address: u8) -> Result<usize> {
        let info = self
            .registry
            .device(address)
            .await
            .ok_or(BolidError::DeviceNotFound { address })?;
        if info.device_type.max_relays == 0 {
            return Err(BolidError::NoRelaySupport { address });
        }
        self.ensure_open()?;

        let mut updated = 0usize;
        for relay in 1..=info.device_type.max_relays {
            let branch = info.device_type.relay_branch(relay);
            if self.engine.send(&Request::RequestAdc { addr: address, branch }).await.is_err() {
                continue;
            }
            match self.engine.get(self.config().poll_timeout(), Some(address)).await {
                Some(Response::Adc { status, adc, .. }) if status == STATUS_ADC => {
                    let on = interpret_relay_adc(adc);
                    debug!("relay {relay}: {} (ADC {adc})", if on { "on" } else { "off" });
                    self.registry
                        .with_device_mut(address, |d| {
                            d.relays.insert(relay, on);
                        })
                        .await;
                    updated += 1;
                }
                Some(Response::Adc { status, .. }) => {
                    warn!("relay {relay}: ADC error (code 0x{status:02X})");
                }
                _ => debug!("relay {relay}: no ADC response"),
            }
        }
        self.registry.notify_update(address).await;
        info!("address {address}: read {updated} of {} relays", info.device_type.max_relays);
        Ok(updated)
    }

    /// Re-poll a device's branches at a fixed interval until `shutdown`
    /// flips to true. Transient per-pass failures are logged and the loop
    /// keeps going; anything else ends it.
    pub async fn auto_poll(&self, address: u8, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        loop {
            if *shutdown.borrow() {
                return Ok(());
            }
            let cancel = shutdown.clone();
            match self.poll_branches(address, move |_, _| !*cancel.borrow()).await {
                Ok(summary) => debug!("auto-poll pass of address {address}: {summary}"),
                Err(e) if e.is_transient() => warn!("auto-poll pass of address {address}: {e}"),
                Err(e) => return Err(e),
            }
            tokio::select! {
                _ = sleep(self.config().auto_poll_interval()) => {}
                _ = shutdown.changed() => {}
            }
        }
    }

    /// Claim the per-device relay flag, or fail fast if an operation is
    /// already in flight.
    fn try_lock_relay(&self, address: u8) -> Result<RelayGuard> {
        let flag = {
            let mut flags = self.relay_flags.lock().unwrap();
            flags.entry(address).or_default().clone()
        };
        if flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_ok() {
            Ok(RelayGuard { flag })
        } else {
            Err(BolidError::RelayBusy { address })
        }
    }
}

/// Releases the relay flag when the operation finishes, on every path.
struct RelayGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RelayGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
