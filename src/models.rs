// Core domain types shared across the sync engine and work-order services

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::priority::Priority;
use crate::workorder::WorkOrderStatus;

/// A physical solar installation tracked by the system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub id: Uuid,
    /// Organization that owns the installation
    pub org_id: Uuid,
    /// Vendor integration the plant was sourced from
    pub vendor_id: Uuid,
    /// Vendor-assigned identifier, unique within one vendor
    pub external_id: String,
    pub name: String,
    /// Rated capacity in kW; 0 when the vendor never reported one
    pub capacity_kw: f64,
    pub location: Option<Location>,
    pub metrics: PlantMetrics,
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// Natural key for plant reconciliation: (vendor, vendor-external id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlantKey {
    pub vendor_id: Uuid,
    pub external_id: String,
}

impl PlantKey {
    pub fn new(vendor_id: Uuid, external_id: impl Into<String>) -> Self {
        Self {
            vendor_id,
            external_id: external_id.into(),
        }
    }
}

impl std::fmt::Display for PlantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.vendor_id, self.external_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
}

/// Live production figures refreshed on every sync, all vendor-supplied
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantMetrics {
    pub current_power_kw: Option<f64>,
    pub energy_today_kwh: Option<f64>,
    pub energy_month_kwh: Option<f64>,
    pub energy_year_kwh: Option<f64>,
    pub energy_total_kwh: Option<f64>,
    pub performance_ratio: Option<f64>,
}

/// Normalized row shape the sync engine hands to the plant store.
/// The store assigns the internal id on insert and keeps it on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantUpsert {
    pub org_id: Uuid,
    pub vendor_id: Uuid,
    pub external_id: String,
    pub name: String,
    pub capacity_kw: f64,
    pub location: Option<Location>,
    pub metrics: PlantMetrics,
    pub synced_at: DateTime<Utc>,
}

impl PlantUpsert {
    pub fn key(&self) -> PlantKey {
        PlantKey::new(self.vendor_id, self.external_id.clone())
    }
}

/// A maintenance task grouping plants from a single organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: Uuid,
    pub org_id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: WorkOrderStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Join row binding a work order to a plant.
///
/// Bindings are soft: reassignment flips `is_active` off instead of deleting
/// the row, so the maintenance history of a plant stays queryable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrderPlant {
    pub work_order_id: Uuid,
    pub plant_id: Uuid,
    pub is_active: bool,
    pub attached_at: DateTime<Utc>,
}

/// Supported vendor integrations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorType {
    Solarman,
}

impl VendorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorType::Solarman => "solarman",
        }
    }
}

impl std::fmt::Display for VendorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured vendor integration.
///
/// `org_id` is optional at rest because operators create the integration
/// before wiring it to an organization; sync refuses to run until it is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorConfig {
    pub id: Uuid,
    pub org_id: Option<Uuid>,
    pub vendor_type: VendorType,
    pub name: String,
    pub credentials: VendorCredentials,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorCredentials {
    /// Base URL of the vendor API
    pub api_base: String,
    pub app_id: String,
    pub app_secret: String,
}
