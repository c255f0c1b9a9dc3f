//! Example: poll one device's branches and watch state updates.

use std::sync::Arc;

use bolid_bridge::{
    BusConfig, BusEvent, BusLink, DeviceManager, DeviceRegistry, TcpChannel,
};

const ADDRESS: u8 = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let channel = Arc::new(TcpChannel::connect("192.168.0.50", 4001).await?);
    let config = BusConfig::builder().fast_mode(true).build();
    let mut link = BusLink::open(channel, config);

    let registry = Arc::new(DeviceRegistry::new());
    let manager = DeviceManager::new(link.engine(), registry.clone());

    // Print every state change as it happens.
    let mut events = registry.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let BusEvent::DeviceUpdated { address, .. } = event {
                println!("device at address {address} updated");
            }
        }
    });

    let info = manager.identify(ADDRESS).await?;
    println!(
        "Found {} v{:.2}: {} branches, {} relays",
        info.device_type.name, info.version, info.device_type.max_branches, info.device_type.max_relays
    );

    let summary = manager
        .poll_branches(ADDRESS, |polled, total| {
            println!("  polled {polled}/{total}");
            true
        })
        .await?;
    println!("{summary}");

    let info = registry.device(ADDRESS).await.unwrap();
    let mut branches: Vec<_> = info.branches.keys().copied().collect();
    branches.sort_unstable();
    for branch in branches {
        println!(
            "  branch {branch}: {} (ADC {:?})",
            info.branch_state(branch).description(),
            info.adc_values.get(&branch)
        );
    }

    link.close().await;
    Ok(())
}
