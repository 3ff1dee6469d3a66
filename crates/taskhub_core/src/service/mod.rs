//! Use-case services.
//!
//! # Responsibility
//! - One method per external operation: load, authorize, validate, mutate.
//! - Translate repository outcomes into the error taxonomy in [`error`].
//!
//! # Invariants
//! - Anonymous principals are turned away before any lookup.
//! - Every guard runs before the first write; a rejected call writes nothing.

pub mod error;
pub mod project_service;
pub mod task_service;

use crate::model::user::{Principal, UserId};
use error::ServiceError;
use log::warn;
use uuid::Uuid;

fn require_user(principal: Principal, action: &'static str) -> Result<UserId, ServiceError> {
    principal.user_id().ok_or_else(|| {
        warn!("event={action} module=service status=unauthenticated");
        ServiceError::Unauthenticated
    })
}

fn denied(action: &'static str, actor: UserId, target: Uuid) -> ServiceError {
    warn!("event={action} module=service status=denied actor_id={actor} target_id={target}");
    ServiceError::Forbidden { action }
}
