// Vendor plant reconciliation. Pulls the vendor's inventory through its
// adapter and upserts it into the plant store in fixed-size batches, keyed
// on the (vendor id, external id) natural key.
//
// Failure discipline: a misconfigured vendor or a failed listing aborts the
// whole run before any write. Once writing starts, nothing aborts: a failed
// batch falls back to per-item upserts and individual failures end up in
// the report's bounded error list.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{PlantMetrics, PlantUpsert, VendorConfig};
use crate::store::{PlantStore, StoreError};
use crate::sync::report::SyncReport;
use crate::telemetry::generate_correlation_id;
use crate::vendor::{VendorAdapter, VendorError, VendorPlant};

/// Rows per batch upsert. Bounds the size of a single write against the
/// hosted store; tunable through [`SyncEngine::with_batch_size`].
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Fatal sync failures. Per-item problems never show up here; they are
/// embedded in the report instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Sync is refused until the vendor is scoped to an organization
    #[error("vendor '{vendor}' has no organization assigned")]
    MissingOrganization { vendor: String },
    /// The adapter's listing call failed; nothing was written
    #[error("vendor listing failed")]
    Listing(#[from] VendorError),
    /// The pre-write existence lookup failed; nothing was written
    #[error("plant store unavailable")]
    Store(#[from] StoreError),
}

pub struct SyncEngine {
    store: Arc<dyn PlantStore>,
    batch_size: usize,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn PlantStore>) -> Self {
        Self {
            store,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch size must be positive");
        self.batch_size = batch_size;
        self
    }

    /// Reconcile the vendor's current inventory into the plant store.
    ///
    /// Safe to re-run at any time: upserts are idempotent by natural key, so
    /// a retried or concurrent run converges to the same stored rows. The
    /// created/updated split is computed against a single existence snapshot
    /// taken before the first write; a row deleted and recreated by someone
    /// else mid-run can make one create count as an update, which is benign.
    pub async fn sync(
        &self,
        vendor: &VendorConfig,
        adapter: &dyn VendorAdapter,
    ) -> Result<SyncReport, SyncError> {
        let org_id = vendor.org_id.ok_or_else(|| SyncError::MissingOrganization {
            vendor: vendor.name.clone(),
        })?;

        let correlation_id = generate_correlation_id();
        info!(
            vendor_id = %vendor.id,
            vendor = %vendor.name,
            correlation_id = %correlation_id,
            "Starting vendor plant sync"
        );

        let listed = adapter.list_plants().await?;
        let total = listed.len();
        if total == 0 {
            info!(vendor_id = %vendor.id, "Vendor reported no plants; nothing to sync");
            return Ok(SyncReport::new(0));
        }

        let synced_at = Utc::now();
        let normalized: Vec<PlantUpsert> = listed
            .into_iter()
            .map(|raw| normalize(org_id, vendor.id, raw, synced_at))
            .collect();

        // One existence snapshot up front; used only to split the
        // created/updated counts, never to gate the upserts themselves.
        let external_ids: Vec<String> = normalized
            .iter()
            .map(|plant| plant.external_id.clone())
            .collect();
        let existing = self
            .store
            .existing_external_ids(vendor.id, &external_ids)
            .await?;

        let mut report = SyncReport::new(total);
        for (index, batch) in normalized.chunks(self.batch_size).enumerate() {
            match self.store.upsert_batch(batch).await {
                Ok(()) => {
                    for plant in batch {
                        report.record_success(existing.contains(&plant.external_id));
                    }
                }
                Err(batch_err) => {
                    warn!(
                        vendor_id = %vendor.id,
                        batch = index,
                        size = batch.len(),
                        error = %batch_err,
                        "Batch upsert failed; retrying items individually"
                    );
                    for plant in batch {
                        match self.store.upsert_one(plant).await {
                            Ok(()) => {
                                report.record_success(existing.contains(&plant.external_id))
                            }
                            Err(item_err) => {
                                warn!(
                                    vendor_id = %vendor.id,
                                    external_id = %plant.external_id,
                                    error = %item_err,
                                    "Plant upsert failed"
                                );
                                report.record_error(&plant.external_id, &item_err);
                            }
                        }
                    }
                }
            }
        }

        info!(
            vendor_id = %vendor.id,
            correlation_id = %correlation_id,
            total = report.total,
            synced = report.synced,
            created = report.created,
            updated = report.updated,
            failed = report.failed(),
            "Vendor plant sync finished"
        );
        Ok(report)
    }
}

/// Coalesce a raw vendor record into the internal row shape: capacity
/// defaults to 0, unset metrics stay None, and a blank name becomes a
/// placeholder derived from the vendor-assigned id so re-syncs are stable.
fn normalize(
    org_id: Uuid,
    vendor_id: Uuid,
    raw: VendorPlant,
    synced_at: DateTime<Utc>,
) -> PlantUpsert {
    let name = match raw.name {
        Some(name) if !name.trim().is_empty() => name,
        _ => format!("plant-{}", raw.external_id),
    };

    PlantUpsert {
        org_id,
        vendor_id,
        external_id: raw.external_id,
        name,
        capacity_kw: raw.capacity_kw.unwrap_or(0.0),
        location: raw.location,
        metrics: PlantMetrics {
            current_power_kw: raw.current_power_kw,
            energy_today_kwh: raw.energy_today_kwh,
            energy_month_kwh: raw.energy_month_kwh,
            energy_year_kwh: raw.energy_year_kwh,
            energy_total_kwh: raw.energy_total_kwh,
            performance_ratio: raw.performance_ratio,
        },
        synced_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_defaults() {
        let vendor_id = Uuid::new_v4();
        let raw = VendorPlant {
            external_id: "st-77".to_string(),
            ..VendorPlant::default()
        };

        let row = normalize(Uuid::new_v4(), vendor_id, raw, Utc::now());
        assert_eq!(row.name, "plant-st-77");
        assert_eq!(row.capacity_kw, 0.0);
        assert_eq!(row.metrics, PlantMetrics::default());
    }

    #[test]
    fn test_normalize_blank_name_gets_placeholder() {
        let raw = VendorPlant {
            external_id: "42".to_string(),
            name: Some("   ".to_string()),
            capacity_kw: Some(12.5),
            ..VendorPlant::default()
        };

        let row = normalize(Uuid::new_v4(), Uuid::new_v4(), raw, Utc::now());
        assert_eq!(row.name, "plant-42");
        assert_eq!(row.capacity_kw, 12.5);
    }

    #[test]
    fn test_normalize_keeps_vendor_values() {
        let raw = VendorPlant {
            external_id: "9".to_string(),
            name: Some("Ridge Farm".to_string()),
            capacity_kw: Some(80.0),
            current_power_kw: Some(41.2),
            energy_total_kwh: Some(123_456.0),
            ..VendorPlant::default()
        };

        let row = normalize(Uuid::new_v4(), Uuid::new_v4(), raw, Utc::now());
        assert_eq!(row.name, "Ridge Farm");
        assert_eq!(row.metrics.current_power_kw, Some(41.2));
        assert_eq!(row.metrics.energy_total_kwh, Some(123_456.0));
        assert_eq!(row.metrics.energy_today_kwh, None);
    }
}
