// Work Order Lifecycle Module
//
// The status table is the sole authority on legal transitions; the service
// wraps it with persistence, policy checks, and the attach/detach rules.

pub mod service;
pub mod status;

pub use service::{
    CreateWorkOrder, EfficiencySignal, NoopEfficiencySignal, WorkOrderError, WorkOrderService,
};
pub use status::{
    check_transition, is_valid_transition, TransitionError, UnknownStatus, WorkOrderStatus,
};
