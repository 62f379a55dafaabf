// Persistence seams. The surrounding application talks to a hosted
// relational store; the core depends only on these traits so tests and the
// CLI can run against the in-memory implementation.

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Plant, PlantKey, PlantUpsert, WorkOrder, WorkOrderPlant};
use crate::workorder::WorkOrderStatus;

pub mod memory;

#[cfg(feature = "database")]
pub mod sqlite;

pub use memory::{InMemoryPlantStore, InMemoryWorkOrderStore};

#[cfg(feature = "database")]
pub use sqlite::{SqlitePlantStore, SqliteStore, SqliteWorkOrderStore};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A row violated a store invariant (missing key, duplicate, bad reference)
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// The backend itself failed (connection, I/O, serialization)
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Plant persistence keyed by the (vendor id, external id) natural key
#[async_trait]
pub trait PlantStore: Send + Sync {
    /// External ids among `external_ids` that already exist for `vendor_id`.
    /// The sync engine reads this once, before any write, to split its
    /// created/updated accounting.
    async fn existing_external_ids(
        &self,
        vendor_id: Uuid,
        external_ids: &[String],
    ) -> Result<HashSet<String>, StoreError>;

    /// Atomically upsert a whole batch: every row applies or none do.
    async fn upsert_batch(&self, batch: &[PlantUpsert]) -> Result<(), StoreError>;

    /// Upsert a single plant; the per-item fallback path.
    async fn upsert_one(&self, plant: &PlantUpsert) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Plant>, StoreError>;

    async fn get_by_key(&self, key: &PlantKey) -> Result<Option<Plant>, StoreError>;

    async fn list_by_vendor(&self, vendor_id: Uuid) -> Result<Vec<Plant>, StoreError>;

    /// Hard delete. Callers gate this behind policy and the active-work-order
    /// check; the store itself just removes the row.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Work order and binding persistence
#[async_trait]
pub trait WorkOrderStore: Send + Sync {
    async fn insert(&self, order: &WorkOrder) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<WorkOrder>, StoreError>;

    async fn update_status(&self, id: Uuid, status: WorkOrderStatus) -> Result<(), StoreError>;

    /// Insert or reactivate a work-order/plant binding
    async fn attach_plant(&self, binding: &WorkOrderPlant) -> Result<(), StoreError>;

    /// Deactivate every active binding of `plant_id`, across all work
    /// orders. Returns how many bindings were deactivated.
    async fn deactivate_plant_bindings(&self, plant_id: Uuid) -> Result<u32, StoreError>;

    /// Deactivate one specific binding, preserving the row
    async fn deactivate_binding(
        &self,
        work_order_id: Uuid,
        plant_id: Uuid,
    ) -> Result<(), StoreError>;

    async fn active_bindings(&self, work_order_id: Uuid)
        -> Result<Vec<WorkOrderPlant>, StoreError>;

    /// Whether any active work order references the plant
    async fn has_active_binding(&self, plant_id: Uuid) -> Result<bool, StoreError>;
}
