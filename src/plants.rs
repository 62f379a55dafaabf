// Plant-facing operations outside the sync path. Sync never deletes;
// deletion is an explicit, permission-gated operation here.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::Plant;
use crate::policy::{AccessPolicy, Actor, Capability, PolicyError};
use crate::store::{PlantStore, StoreError, WorkOrderStore};

#[derive(Debug, Error)]
pub enum PlantError {
    #[error(transparent)]
    Denied(#[from] PolicyError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("plant {0} not found")]
    NotFound(Uuid),
    #[error("plant {0} is referenced by an active work order")]
    ActiveWorkOrder(Uuid),
}

pub struct PlantService {
    plants: Arc<dyn PlantStore>,
    orders: Arc<dyn WorkOrderStore>,
    policy: Arc<dyn AccessPolicy>,
}

impl PlantService {
    pub fn new(
        plants: Arc<dyn PlantStore>,
        orders: Arc<dyn WorkOrderStore>,
        policy: Arc<dyn AccessPolicy>,
    ) -> Self {
        Self {
            plants,
            orders,
            policy,
        }
    }

    pub async fn get(&self, actor: &Actor, plant_id: Uuid) -> Result<Plant, PlantError> {
        self.policy.require(actor, Capability::ViewPlants)?;
        let plant = self
            .plants
            .get(plant_id)
            .await?
            .ok_or(PlantError::NotFound(plant_id))?;
        if !actor.can_access_org(plant.org_id) {
            return Err(PolicyError::WrongOrganization {
                actor: actor.id,
                org_id: plant.org_id,
            }
            .into());
        }
        Ok(plant)
    }

    pub async fn list_by_vendor(
        &self,
        actor: &Actor,
        vendor_id: Uuid,
    ) -> Result<Vec<Plant>, PlantError> {
        self.policy.require(actor, Capability::ViewPlants)?;
        let plants = self.plants.list_by_vendor(vendor_id).await?;
        Ok(plants
            .into_iter()
            .filter(|plant| actor.can_access_org(plant.org_id))
            .collect())
    }

    /// Hard-delete a plant. Refused while any active work order still
    /// references it; detach the plant first.
    pub async fn delete(&self, actor: &Actor, plant_id: Uuid) -> Result<(), PlantError> {
        self.policy.require(actor, Capability::ManagePlants)?;

        let plant = self
            .plants
            .get(plant_id)
            .await?
            .ok_or(PlantError::NotFound(plant_id))?;
        if !actor.can_access_org(plant.org_id) {
            return Err(PolicyError::WrongOrganization {
                actor: actor.id,
                org_id: plant.org_id,
            }
            .into());
        }

        if self.orders.has_active_binding(plant_id).await? {
            return Err(PlantError::ActiveWorkOrder(plant_id));
        }

        self.plants.delete(plant_id).await?;
        info!(plant_id = %plant_id, actor = %actor.id, "Plant deleted");
        Ok(())
    }
}
