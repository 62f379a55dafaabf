use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use sungrid::config::{config, VendorEntry};
use sungrid::store::PlantStore;
use sungrid::sync::SyncEngine;
use sungrid::telemetry::init_telemetry;
use sungrid::vendor::adapter_for;
use sungrid::workorder::WorkOrderStatus;

#[derive(Parser)]
#[command(name = "sungrid")]
#[command(about = "Solar plant operations: vendor reconciliation and work-order lifecycle")]
#[command(
    long_about = "sungrid reconciles vendor plant inventories into the local plant store and \
                  validates work-order status transitions. Configure vendors in sungrid.toml, \
                  then run 'sungrid sync' to pull their inventories."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile vendor plant inventories into the plant store
    Sync {
        /// Sync only the named vendor instead of every configured one
        #[arg(long, help = "Vendor name as written in sungrid.toml")]
        vendor: Option<String>,
    },
    /// Show the legal next statuses for a work-order status
    Transitions {
        /// Current status (e.g. OPEN, IN_PROGRESS)
        status: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sync { vendor } => {
            tokio::runtime::Runtime::new()?.block_on(async { sync_command(vendor).await })
        }
        Commands::Transitions { status } => transitions_command(&status),
    }
}

async fn sync_command(vendor_name: Option<String>) -> Result<()> {
    init_telemetry()?;
    let cfg = config()?;

    let targets: Vec<&VendorEntry> = match &vendor_name {
        Some(name) => {
            let entry = cfg
                .vendor_by_name(name)
                .ok_or_else(|| anyhow!("no vendor named '{name}' in configuration"))?;
            vec![entry]
        }
        None => cfg.vendors.iter().collect(),
    };
    if targets.is_empty() {
        println!("📭 No vendors configured. Add a [[vendors]] entry to sungrid.toml.");
        return Ok(());
    }

    let store = open_plant_store(cfg).await?;
    let engine = SyncEngine::new(store).with_batch_size(cfg.sync.batch_size);

    let mut failures = 0;
    for entry in targets {
        println!("🔄 Syncing vendor '{}'...", entry.name);
        let vendor = entry.to_vendor_config();
        let adapter = match adapter_for(&vendor) {
            Ok(adapter) => adapter,
            Err(err) => {
                eprintln!("❌ Vendor '{}' is misconfigured: {err}", entry.name);
                failures += 1;
                continue;
            }
        };

        match engine.sync(&vendor, adapter.as_ref()).await {
            Ok(report) => {
                println!(
                    "✅ {}: {}/{} plants synced ({} created, {} updated)",
                    entry.name, report.synced, report.total, report.created, report.updated
                );
                for error in &report.errors {
                    println!("   ⚠️  {error}");
                }
            }
            Err(err) => {
                eprintln!("❌ Sync failed for '{}': {err}", entry.name);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(anyhow!("{failures} vendor sync(s) failed"));
    }
    Ok(())
}

#[cfg(feature = "database")]
async fn open_plant_store(cfg: &sungrid::SungridConfig) -> Result<Arc<dyn PlantStore>> {
    use sungrid::store::SqliteStore;

    match &cfg.database {
        Some(db) => {
            if let Some(parent) = std::path::Path::new(&db.url).parent() {
                std::fs::create_dir_all(parent)?;
            }
            let store = SqliteStore::new(&db.url, db.auto_migrate).await?;
            Ok(Arc::new(store.plants()))
        }
        None => Ok(Arc::new(sungrid::store::InMemoryPlantStore::new())),
    }
}

#[cfg(not(feature = "database"))]
async fn open_plant_store(_cfg: &sungrid::SungridConfig) -> Result<Arc<dyn PlantStore>> {
    // Without the database feature the store lives only for this process;
    // useful for connectivity checks against a vendor
    Ok(Arc::new(sungrid::store::InMemoryPlantStore::new()))
}

fn transitions_command(status: &str) -> Result<()> {
    let current: WorkOrderStatus = status
        .trim()
        .to_uppercase()
        .parse()
        .map_err(|err| anyhow!("{err}"))?;

    let next = current.next_valid_statuses();
    if next.is_empty() {
        println!("{current} is terminal; no transitions allowed.");
    } else {
        println!("{current} may transition to:");
        for status in next {
            println!("  → {status}");
        }
    }
    Ok(())
}
