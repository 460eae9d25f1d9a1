//! Drives a ledger through a short session and prints the dashboard view

use bigdecimal::BigDecimal;
use sire_ledger::utils::MemoryStorage;
use sire_ledger::{Address, Asset, CallContext, Ledger, LedgerConfig, LedgerEvent, LedgerObserver};
use tracing_subscriber::EnvFilter;

struct LogObserver;

impl LedgerObserver for LogObserver {
    fn on_event(&self, event: &LedgerEvent) {
        println!("  event @{}: {:?}", event.height, event.kind);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = LedgerConfig::from_env()?;
    let mut ledger = Ledger::open(MemoryStorage::new(), &config).await?;
    ledger.subscribe(Box::new(LogObserver));

    let owner = Address::new(config.genesis.owner.clone())?;
    let friend = Address::new("friend")?;

    println!("Running session...");
    ledger
        .deposit(&CallContext::new(owner.clone(), 1), &BigDecimal::from(1))
        .await?;
    ledger
        .transfer(
            &CallContext::new(owner.clone(), 1),
            Asset::Primary,
            &friend,
            &BigDecimal::from(100),
        )
        .await?;
    ledger.mint(&CallContext::new(friend.clone(), 2), &friend).await?;
    ledger.mint(&CallContext::new(friend.clone(), 5), &owner).await?;

    for address in [&owner, &friend] {
        let snapshot = ledger.dashboard(address).await?;
        println!("\n{}", serde_json::to_string_pretty(&snapshot)?);
    }

    let report = ledger.validate_integrity().await?;
    println!("\nIntegrity valid: {}", report.is_valid);

    Ok(())
}
