// Persistence-facing operations around the status table: validate, then
// persist, then notify. The status table itself stays pure; this is where
// the stores and collaborators are wired in.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{WorkOrder, WorkOrderPlant};
use crate::policy::{AccessPolicy, Actor, Capability, PolicyError};
use crate::priority::Priority;
use crate::store::{PlantStore, StoreError, WorkOrderStore};
use crate::workorder::status::{check_transition, TransitionError, WorkOrderStatus};

/// Collaborator notified when field work actually starts, so plant
/// efficiency figures can be recomputed. Fire-and-forget: implementations
/// swallow their own failures and must not block the transition.
#[async_trait]
pub trait EfficiencySignal: Send + Sync {
    async fn work_started(&self, work_order_id: Uuid);
}

/// Default signal for deployments without the recomputation service
pub struct NoopEfficiencySignal;

#[async_trait]
impl EfficiencySignal for NoopEfficiencySignal {
    async fn work_started(&self, _work_order_id: Uuid) {}
}

#[derive(Debug, Error)]
pub enum WorkOrderError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Denied(#[from] PolicyError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("work order {0} not found")]
    NotFound(Uuid),
    #[error("plant {0} not found")]
    PlantNotFound(Uuid),
    #[error("plant {plant_id} belongs to organization {plant_org}, not {order_org} of work order {work_order_id}")]
    OrganizationMismatch {
        work_order_id: Uuid,
        order_org: Uuid,
        plant_id: Uuid,
        plant_org: Uuid,
    },
}

pub struct CreateWorkOrder {
    pub org_id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

pub struct WorkOrderService {
    orders: Arc<dyn WorkOrderStore>,
    plants: Arc<dyn PlantStore>,
    policy: Arc<dyn AccessPolicy>,
    efficiency: Arc<dyn EfficiencySignal>,
}

impl WorkOrderService {
    pub fn new(
        orders: Arc<dyn WorkOrderStore>,
        plants: Arc<dyn PlantStore>,
        policy: Arc<dyn AccessPolicy>,
        efficiency: Arc<dyn EfficiencySignal>,
    ) -> Self {
        Self {
            orders,
            plants,
            policy,
            efficiency,
        }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        request: CreateWorkOrder,
    ) -> Result<WorkOrder, WorkOrderError> {
        self.policy.require(actor, Capability::ManageWorkOrders)?;

        let order = WorkOrder {
            id: Uuid::new_v4(),
            org_id: request.org_id,
            title: request.title,
            description: request.description,
            priority: request.priority,
            status: WorkOrderStatus::Open,
            created_by: actor.id,
            created_at: Utc::now(),
        };
        self.orders.insert(&order).await?;

        info!(
            work_order_id = %order.id,
            org_id = %order.org_id,
            priority = %order.priority,
            "Work order created"
        );
        Ok(order)
    }

    /// Move a work order to `requested`, rejecting anything the transition
    /// table does not allow. The persisted status is the sole mutation; on
    /// entry into IN_PROGRESS the efficiency collaborator is notified after
    /// the write lands.
    pub async fn transition(
        &self,
        actor: &Actor,
        work_order_id: Uuid,
        requested: WorkOrderStatus,
    ) -> Result<WorkOrder, WorkOrderError> {
        self.policy.require(actor, Capability::ManageWorkOrders)?;

        let mut order = self
            .orders
            .get(work_order_id)
            .await?
            .ok_or(WorkOrderError::NotFound(work_order_id))?;

        check_transition(order.status, requested)?;

        self.orders.update_status(work_order_id, requested).await?;
        info!(
            work_order_id = %work_order_id,
            from = %order.status,
            to = %requested,
            "Work order status changed"
        );
        order.status = requested;

        if requested == WorkOrderStatus::InProgress {
            self.efficiency.work_started(work_order_id).await;
        }

        Ok(order)
    }

    /// Legal next statuses for presentation to a caller
    pub async fn next_statuses(
        &self,
        work_order_id: Uuid,
    ) -> Result<&'static [WorkOrderStatus], WorkOrderError> {
        let order = self
            .orders
            .get(work_order_id)
            .await?
            .ok_or(WorkOrderError::NotFound(work_order_id))?;
        Ok(order.status.next_valid_statuses())
    }

    /// Attach a plant to a work order.
    ///
    /// Enforces the single-organization invariant at attach time, and keeps
    /// at most one active work order per plant by deactivating any prior
    /// active bindings before inserting the new one.
    pub async fn attach_plant(
        &self,
        actor: &Actor,
        work_order_id: Uuid,
        plant_id: Uuid,
    ) -> Result<WorkOrderPlant, WorkOrderError> {
        self.policy.require(actor, Capability::ManageWorkOrders)?;

        let order = self
            .orders
            .get(work_order_id)
            .await?
            .ok_or(WorkOrderError::NotFound(work_order_id))?;
        let plant = self
            .plants
            .get(plant_id)
            .await?
            .ok_or(WorkOrderError::PlantNotFound(plant_id))?;

        if plant.org_id != order.org_id {
            return Err(WorkOrderError::OrganizationMismatch {
                work_order_id,
                order_org: order.org_id,
                plant_id,
                plant_org: plant.org_id,
            });
        }

        let displaced = self.orders.deactivate_plant_bindings(plant_id).await?;
        if displaced > 0 {
            warn!(
                plant_id = %plant_id,
                displaced,
                "Plant reassigned; prior active bindings deactivated"
            );
        }

        let binding = WorkOrderPlant {
            work_order_id,
            plant_id,
            is_active: true,
            attached_at: Utc::now(),
        };
        self.orders.attach_plant(&binding).await?;

        info!(
            work_order_id = %work_order_id,
            plant_id = %plant_id,
            "Plant attached to work order"
        );
        Ok(binding)
    }

    /// Soft-detach: the binding row stays for history, flagged inactive
    pub async fn detach_plant(
        &self,
        actor: &Actor,
        work_order_id: Uuid,
        plant_id: Uuid,
    ) -> Result<(), WorkOrderError> {
        self.policy.require(actor, Capability::ManageWorkOrders)?;
        self.orders
            .deactivate_binding(work_order_id, plant_id)
            .await?;
        info!(
            work_order_id = %work_order_id,
            plant_id = %plant_id,
            "Plant detached from work order"
        );
        Ok(())
    }

    pub async fn get(&self, work_order_id: Uuid) -> Result<WorkOrder, WorkOrderError> {
        self.orders
            .get(work_order_id)
            .await?
            .ok_or(WorkOrderError::NotFound(work_order_id))
    }
}
