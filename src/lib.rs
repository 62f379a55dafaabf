// sungrid - Solar Plant Operations Core
// Work-order lifecycle management and vendor plant reconciliation

pub mod config;
pub mod models;
pub mod observability;
pub mod plants;
pub mod policy;
pub mod priority;
pub mod store;
pub mod sync;
pub mod telemetry;
pub mod vendor;
pub mod workorder;

// Re-export key types for easy access
pub use config::{config, init_config, SungridConfig};
pub use models::{Plant, PlantKey, PlantMetrics, PlantUpsert, VendorConfig, VendorType, WorkOrder, WorkOrderPlant};
pub use observability::{vendor_metrics, OperationTimer, VendorApiMetrics};
pub use plants::{PlantError, PlantService};
pub use policy::{AccessPolicy, Actor, Capability, PolicyError, Role, RolePolicy};
pub use priority::Priority;
pub use store::{InMemoryPlantStore, InMemoryWorkOrderStore, PlantStore, StoreError, WorkOrderStore};
pub use sync::{SyncEngine, SyncError, SyncReport, DEFAULT_BATCH_SIZE};
pub use telemetry::{generate_correlation_id, init_telemetry, shutdown_telemetry};
pub use vendor::{adapter_for, SolarmanAdapter, VendorAdapter, VendorError, VendorPlant};
pub use workorder::{
    is_valid_transition, EfficiencySignal, NoopEfficiencySignal, TransitionError, WorkOrderError,
    WorkOrderService, WorkOrderStatus,
};
