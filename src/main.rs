// MIT License - Copyright (c) 2026 bolid-bridge developers
// Command-line bridge for Bolid/Orion bus devices.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::{info, warn};

use bolid_bridge::{
    BusConfig, BusEvent, BusLink, DeviceManager, DeviceRegistry, TcpChannel,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "bolid-bridge")]
#[command(about = "Talk to Bolid/Orion security devices over a serial-to-ethernet bridge")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sweep an address range and list every device that answers
    Scan {
        #[arg(long, default_value_t = 1)]
        start: u8,
        #[arg(long, default_value_t = 127)]
        end: u8,
    },
    /// Poll every branch of one device and print its state
    Poll {
        address: u8,
    },
    /// Arm or disarm a branch by inverting its current state
    ToggleBranch {
        address: u8,
        branch: u8,
    },
    /// Run a relay program (toggles on/off when no program is given)
    Relay {
        address: u8,
        relay: u8,
        #[arg(long)]
        program: Option<u8>,
    },
    /// Read back the on/off state of every relay of a device
    Relays {
        address: u8,
    },
    /// Poll a device continuously, printing every state change
    Watch {
        address: u8,
    },
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Config {
    bus: BusToml,
}

#[derive(Debug, Deserialize)]
struct BusToml {
    /// Serial-to-ethernet bridge host
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_fast_mode")]
    fast_mode: bool,
    #[serde(default = "default_scan_timeout")]
    scan_timeout_ms: u64,
    #[serde(default = "default_poll_timeout")]
    poll_timeout_ms: u64,
    #[serde(default = "default_inter_address_delay")]
    inter_address_delay_ms: u64,
    #[serde(default = "default_inter_branch_delay")]
    inter_branch_delay_ms: u64,
    #[serde(default = "default_auto_poll_interval")]
    auto_poll_interval_ms: u64,
}

fn default_port() -> u16 {
    4001
}
fn default_fast_mode() -> bool {
    true
}
fn default_scan_timeout() -> u64 {
    300
}
fn default_poll_timeout() -> u64 {
    300
}
fn default_inter_address_delay() -> u64 {
    100
}
fn default_inter_branch_delay() -> u64 {
    100
}
fn default_auto_poll_interval() -> u64 {
    1000
}

impl BusToml {
    fn to_bus_config(&self) -> BusConfig {
        BusConfig::builder()
            .fast_mode(self.fast_mode)
            .scan_timeout_ms(self.scan_timeout_ms)
            .poll_timeout_ms(self.poll_timeout_ms)
            .inter_address_delay_ms(self.inter_address_delay_ms)
            .inter_branch_delay_ms(self.inter_branch_delay_ms)
            .auto_poll_interval_ms(self.auto_poll_interval_ms)
            .build()
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let text = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("failed to read config file {}", cli.config))?;
    let config: Config = toml::from_str(&text)
        .with_context(|| format!("failed to parse config file {}", cli.config))?;

    let channel = Arc::new(
        TcpChannel::connect(&config.bus.host, config.bus.port)
            .await
            .with_context(|| {
                format!("failed to connect to {}:{}", config.bus.host, config.bus.port)
            })?,
    );
    let mut link = BusLink::open(channel, config.bus.to_bus_config());
    let manager = DeviceManager::new(link.engine(), Arc::new(DeviceRegistry::new()));

    let outcome = run_command(cli.command, &manager).await;
    link.close().await;
    outcome
}

async fn run_command(command: Command, manager: &DeviceManager) -> Result<()> {
    match command {
        Command::Scan { start, end } => {
            let found = manager
                .scan(start, end, |addr, found, total| {
                    if addr % 16 == 0 {
                        info!("scanning address {addr} ({found} found, {total} total)");
                    }
                    true
                })
                .await;
            if found.is_empty() {
                println!("No devices found in {start}..={end}");
            }
            for device in &found {
                println!(
                    "  address {:3}: {} v{:.2}",
                    device.address, device.name, device.version
                );
            }
        }
        Command::Poll { address } => {
            let info = manager.identify(address).await?;
            println!(
                "Device at {}: {} v{:.2}, {} branches, {} relays",
                address,
                info.device_type.name,
                info.version,
                info.device_type.max_branches,
                info.device_type.max_relays
            );
            let summary = manager.poll_branches(address, |_, _| true).await?;
            println!("{summary}");
            print_device(manager, address).await;
        }
        Command::ToggleBranch { address, branch } => {
            manager.identify(address).await?;
            // Read the current state first so the toggle direction is right.
            if let Err(e) = manager.poll_branches(address, |_, _| true).await {
                warn!("initial poll failed: {e}");
            }
            let new_state = manager.toggle_branch(address, branch).await?;
            println!("Branch {branch} at address {address} is now {}", new_state.description());
        }
        Command::Relay { address, relay, program } => {
            manager.identify(address).await?;
            match manager.toggle_relay(address, relay, program).await? {
                Some(on) => println!(
                    "Relay {relay} at address {address} is now {}",
                    if on { "on" } else { "off" }
                ),
                None => println!("Relay {relay} at address {address}: program accepted"),
            }
        }
        Command::Relays { address } => {
            manager.identify(address).await?;
            let updated = manager.update_relay_states(address).await?;
            println!("Read {updated} relays");
            print_device(manager, address).await;
        }
        Command::Watch { address } => {
            manager.identify(address).await?;
            let mut events = manager.registry().subscribe();
            tokio::spawn(async move {
                while let Ok(event) = events.recv().await {
                    if let BusEvent::DeviceUpdated { address, info } = event {
                        let mut branches: Vec<_> = info.branches.iter().collect();
                        branches.sort_by_key(|(n, _)| **n);
                        let text: Vec<String> = branches
                            .iter()
                            .map(|(n, s)| format!("{n}:{}", s.description()))
                            .collect();
                        info!("address {address}: [{}]", text.join(" "));
                    }
                }
            });

            let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
            let poller = manager.auto_poll(address, shutdown_rx);
            println!("Watching address {address}, press Ctrl+C to stop...");
            tokio::select! {
                result = poller => result?,
                _ = tokio::signal::ctrl_c() => {
                    let _ = shutdown_tx.send(true);
                    println!("Stopped.");
                }
            }
        }
    }
    Ok(())
}

async fn print_device(manager: &DeviceManager, address: u8) {
    let Some(info) = manager.registry().device(address).await else {
        return;
    };
    let mut branches: Vec<_> = info.branches.keys().copied().collect();
    branches.sort_unstable();
    for branch in branches {
        let state = info.branch_state(branch);
        let adc = info.adc_values.get(&branch);
        let resistance = info.resistances.get(&branch);
        match (adc, resistance) {
            (Some(adc), Some(r)) if *r > 0.0 => println!(
                "  branch {branch:3}: {:9} ADC={adc:3} R={r:.2} kΩ",
                state.description()
            ),
            (Some(adc), _) => {
                println!("  branch {branch:3}: {:9} ADC={adc:3}", state.description())
            }
            _ => println!("  branch {branch:3}: {}", state.description()),
        }
    }
    let mut relays: Vec<_> = info.relays.iter().collect();
    relays.sort();
    for (relay, on) in relays {
        println!("  relay  {relay:3}: {}", if *on { "on" } else { "off" });
    }
}
