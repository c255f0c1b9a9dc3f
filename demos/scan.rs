//! Example: sweep the bus and print every device that answers.

use std::sync::Arc;

use bolid_bridge::{BusConfig, BusLink, DeviceManager, DeviceRegistry, TcpChannel};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Serial-to-ethernet bridge in raw socket mode.
    let channel = Arc::new(TcpChannel::connect("192.168.0.50", 4001).await?);
    let config = BusConfig::builder().fast_mode(true).build();
    let mut link = BusLink::open(channel, config);

    let registry = Arc::new(DeviceRegistry::new());
    let manager = DeviceManager::new(link.engine(), registry);

    println!("Scanning addresses 1..=127...");
    let found = manager
        .scan(1, 127, |addr, found_so_far, total| {
            if addr % 32 == 0 {
                println!("  ...at address {addr}/{total}, {found_so_far} found");
            }
            true
        })
        .await;

    println!("\n--- Devices ({}) ---", found.len());
    for device in &found {
        println!(
            "  address {:3}: {} v{:.2}",
            device.address, device.name, device.version
        );
    }

    link.close().await;
    Ok(())
}
