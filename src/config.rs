// MIT License - Copyright (c) 2026 bolid-bridge developers

use std::time::Duration;

/// Bus timing and pacing configuration.
///
/// The defaults are the values the hardware is known to tolerate; every
/// delay that paces the half-duplex bus is configurable rather than baked
/// in. Two write profiles exist: the fast profile (~300 ms) for responsive
/// interactive use and the normal profile (~1000 ms) for slow or heavily
/// loaded buses.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Use the fast write-timeout profile.
    pub fast_mode: bool,
    /// Write timeout in fast mode.
    pub write_timeout_fast_ms: u64,
    /// Write timeout in normal mode.
    pub write_timeout_ms: u64,
    /// Default wait for a reply to a one-off request (identify, probe).
    pub response_timeout_ms: u64,
    /// Per-address wait during an address sweep.
    pub scan_timeout_ms: u64,
    /// Per-query wait during branch polling.
    pub poll_timeout_ms: u64,
    /// Wait for a command acknowledgement (arm/disarm, relay program).
    pub ack_timeout_ms: u64,
    /// Interval at which the response queue is re-checked while waiting.
    pub queue_poll_interval_ms: u64,
    /// Pause between addresses during a sweep (bus pacing).
    pub inter_address_delay_ms: u64,
    /// Pause between branches during polling (bus pacing).
    pub inter_branch_delay_ms: u64,
    /// Idle sleep of the background reader task between drains.
    pub reader_idle_delay_ms: u64,
    /// Pause between full passes in auto-poll mode.
    pub auto_poll_interval_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            fast_mode: false,
            write_timeout_fast_ms: 300,
            write_timeout_ms: 1000,
            response_timeout_ms: 1000,
            scan_timeout_ms: 300,
            poll_timeout_ms: 300,
            ack_timeout_ms: 500,
            queue_poll_interval_ms: 10,
            inter_address_delay_ms: 100,
            inter_branch_delay_ms: 100,
            reader_idle_delay_ms: 10,
            auto_poll_interval_ms: 1000,
        }
    }
}

impl BusConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> BusConfigBuilder {
        BusConfigBuilder::default()
    }

    /// Write timeout for the active profile.
    pub fn write_timeout(&self) -> Duration {
        if self.fast_mode {
            Duration::from_millis(self.write_timeout_fast_ms)
        } else {
            Duration::from_millis(self.write_timeout_ms)
        }
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    pub fn queue_poll_interval(&self) -> Duration {
        Duration::from_millis(self.queue_poll_interval_ms)
    }

    pub fn inter_address_delay(&self) -> Duration {
        Duration::from_millis(self.inter_address_delay_ms)
    }

    pub fn inter_branch_delay(&self) -> Duration {
        Duration::from_millis(self.inter_branch_delay_ms)
    }

    pub fn reader_idle_delay(&self) -> Duration {
        Duration::from_millis(self.reader_idle_delay_ms)
    }

    pub fn auto_poll_interval(&self) -> Duration {
        Duration::from_millis(self.auto_poll_interval_ms)
    }
}

/// Builder for [`BusConfig`].
#[derive(Debug, Clone, Default)]
pub struct BusConfigBuilder {
    config: BusConfig,
}

impl BusConfigBuilder {
    pub fn fast_mode(mut self, fast: bool) -> Self {
        self.config.fast_mode = fast;
        self
    }

    pub fn write_timeout_fast_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_fast_ms = ms;
        self
    }

    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn response_timeout_ms(mut self, ms: u64) -> Self {
        self.config.response_timeout_ms = ms;
        self
    }

    pub fn scan_timeout_ms(mut self, ms: u64) -> Self {
        self.config.scan_timeout_ms = ms;
        self
    }

    pub fn poll_timeout_ms(mut self, ms: u64) -> Self {
        self.config.poll_timeout_ms = ms;
        self
    }

    pub fn ack_timeout_ms(mut self, ms: u64) -> Self {
        self.config.ack_timeout_ms = ms;
        self
    }

    pub fn queue_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.queue_poll_interval_ms = ms;
        self
    }

    pub fn inter_address_delay_ms(mut self, ms: u64) -> Self {
        self.config.inter_address_delay_ms = ms;
        self
    }

    pub fn inter_branch_delay_ms(mut self, ms: u64) -> Self {
        self.config.inter_branch_delay_ms = ms;
        self
    }

    pub fn reader_idle_delay_ms(mut self, ms: u64) -> Self {
        self.config.reader_idle_delay_ms = ms;
        self
    }

    pub fn auto_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.auto_poll_interval_ms = ms;
        self
    }

    pub fn build(self) -> BusConfig {
        self.config
    }
}
