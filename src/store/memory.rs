// In-memory store used by tests and the default CLI path. Mirrors the
// semantics the hosted database provides: natural-key upserts, soft
// work-order bindings, and an atomic batch write.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{Plant, PlantKey, PlantUpsert, WorkOrder, WorkOrderPlant};
use crate::store::{PlantStore, StoreError, WorkOrderStore};
use crate::workorder::WorkOrderStatus;

#[derive(Default)]
pub struct InMemoryPlantStore {
    plants: Mutex<HashMap<PlantKey, Plant>>,
    // Call accounting for assertions: sizes of attempted batch upserts and
    // external ids of single-item fallback upserts, in order.
    batch_sizes: Mutex<Vec<usize>>,
    single_upserts: Mutex<Vec<String>>,
}

impl InMemoryPlantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.plants.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.plants.lock().await.is_empty()
    }

    pub async fn recorded_batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().await.clone()
    }

    pub async fn recorded_single_upserts(&self) -> Vec<String> {
        self.single_upserts.lock().await.clone()
    }

    pub async fn snapshot(&self) -> Vec<Plant> {
        let mut plants: Vec<Plant> = self.plants.lock().await.values().cloned().collect();
        plants.sort_by(|a, b| a.external_id.cmp(&b.external_id));
        plants
    }

    /// Seed a plant directly, bypassing upsert accounting
    pub async fn insert_plant(&self, plant: Plant) {
        self.plants.lock().await.insert(
            PlantKey::new(plant.vendor_id, plant.external_id.clone()),
            plant,
        );
    }

    fn validate(row: &PlantUpsert) -> Result<(), StoreError> {
        if row.external_id.trim().is_empty() {
            return Err(StoreError::Constraint(
                "plant row is missing its vendor external id".to_string(),
            ));
        }
        Ok(())
    }

    fn apply(plants: &mut HashMap<PlantKey, Plant>, row: &PlantUpsert) {
        let key = row.key();
        match plants.get_mut(&key) {
            Some(existing) => {
                existing.org_id = row.org_id;
                existing.name = row.name.clone();
                existing.capacity_kw = row.capacity_kw;
                existing.location = row.location.clone();
                existing.metrics = row.metrics.clone();
                existing.last_synced_at = Some(row.synced_at);
            }
            None => {
                plants.insert(
                    key,
                    Plant {
                        id: Uuid::new_v4(),
                        org_id: row.org_id,
                        vendor_id: row.vendor_id,
                        external_id: row.external_id.clone(),
                        name: row.name.clone(),
                        capacity_kw: row.capacity_kw,
                        location: row.location.clone(),
                        metrics: row.metrics.clone(),
                        last_synced_at: Some(row.synced_at),
                    },
                );
            }
        }
    }
}

#[async_trait]
impl PlantStore for InMemoryPlantStore {
    async fn existing_external_ids(
        &self,
        vendor_id: Uuid,
        external_ids: &[String],
    ) -> Result<HashSet<String>, StoreError> {
        let plants = self.plants.lock().await;
        Ok(external_ids
            .iter()
            .filter(|id| plants.contains_key(&PlantKey::new(vendor_id, id.as_str())))
            .cloned()
            .collect())
    }

    async fn upsert_batch(&self, batch: &[PlantUpsert]) -> Result<(), StoreError> {
        self.batch_sizes.lock().await.push(batch.len());

        let mut plants = self.plants.lock().await;
        // Validate before touching anything so a bad row fails the whole
        // batch without partial writes.
        for row in batch {
            Self::validate(row)?;
        }
        for row in batch {
            Self::apply(&mut plants, row);
        }
        Ok(())
    }

    async fn upsert_one(&self, plant: &PlantUpsert) -> Result<(), StoreError> {
        self.single_upserts
            .lock()
            .await
            .push(plant.external_id.clone());

        Self::validate(plant)?;
        let mut plants = self.plants.lock().await;
        Self::apply(&mut plants, plant);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Plant>, StoreError> {
        let plants = self.plants.lock().await;
        Ok(plants.values().find(|p| p.id == id).cloned())
    }

    async fn get_by_key(&self, key: &PlantKey) -> Result<Option<Plant>, StoreError> {
        Ok(self.plants.lock().await.get(key).cloned())
    }

    async fn list_by_vendor(&self, vendor_id: Uuid) -> Result<Vec<Plant>, StoreError> {
        let plants = self.plants.lock().await;
        let mut matching: Vec<Plant> = plants
            .values()
            .filter(|p| p.vendor_id == vendor_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.external_id.cmp(&b.external_id));
        Ok(matching)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut plants = self.plants.lock().await;
        let key = plants
            .values()
            .find(|p| p.id == id)
            .map(|p| PlantKey::new(p.vendor_id, p.external_id.clone()))
            .ok_or_else(|| StoreError::NotFound(format!("plant {id}")))?;
        plants.remove(&key);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryWorkOrderStore {
    orders: Mutex<HashMap<Uuid, WorkOrder>>,
    bindings: Mutex<Vec<WorkOrderPlant>>,
}

impl InMemoryWorkOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all_bindings(&self) -> Vec<WorkOrderPlant> {
        self.bindings.lock().await.clone()
    }
}

#[async_trait]
impl WorkOrderStore for InMemoryWorkOrderStore {
    async fn insert(&self, order: &WorkOrder) -> Result<(), StoreError> {
        self.orders.lock().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<WorkOrder>, StoreError> {
        Ok(self.orders.lock().await.get(&id).cloned())
    }

    async fn update_status(&self, id: Uuid, status: WorkOrderStatus) -> Result<(), StoreError> {
        let mut orders = self.orders.lock().await;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("work order {id}")))?;
        order.status = status;
        Ok(())
    }

    async fn attach_plant(&self, binding: &WorkOrderPlant) -> Result<(), StoreError> {
        let mut bindings = self.bindings.lock().await;
        match bindings
            .iter_mut()
            .find(|b| b.work_order_id == binding.work_order_id && b.plant_id == binding.plant_id)
        {
            Some(existing) => {
                existing.is_active = binding.is_active;
                existing.attached_at = binding.attached_at;
            }
            None => bindings.push(binding.clone()),
        }
        Ok(())
    }

    async fn deactivate_plant_bindings(&self, plant_id: Uuid) -> Result<u32, StoreError> {
        let mut bindings = self.bindings.lock().await;
        let mut deactivated = 0;
        for binding in bindings
            .iter_mut()
            .filter(|b| b.plant_id == plant_id && b.is_active)
        {
            binding.is_active = false;
            deactivated += 1;
        }
        Ok(deactivated)
    }

    async fn deactivate_binding(
        &self,
        work_order_id: Uuid,
        plant_id: Uuid,
    ) -> Result<(), StoreError> {
        let mut bindings = self.bindings.lock().await;
        let binding = bindings
            .iter_mut()
            .find(|b| b.work_order_id == work_order_id && b.plant_id == plant_id)
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "binding of plant {plant_id} to work order {work_order_id}"
                ))
            })?;
        binding.is_active = false;
        Ok(())
    }

    async fn active_bindings(
        &self,
        work_order_id: Uuid,
    ) -> Result<Vec<WorkOrderPlant>, StoreError> {
        let bindings = self.bindings.lock().await;
        Ok(bindings
            .iter()
            .filter(|b| b.work_order_id == work_order_id && b.is_active)
            .cloned()
            .collect())
    }

    async fn has_active_binding(&self, plant_id: Uuid) -> Result<bool, StoreError> {
        let bindings = self.bindings.lock().await;
        Ok(bindings.iter().any(|b| b.plant_id == plant_id && b.is_active))
    }
}
