//! Application service: CRUD over the injected [`Store`] plus mentor suggestions.

mod accounts;
mod directory;
mod engagement;
mod moderation;
mod suggest;

use std::sync::Arc;

use thiserror::Error;

use crate::matching::{MatchingError, Weights};
use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<MatchingError> for ServiceError {
    fn from(value: MatchingError) -> Self {
        match value {
            MatchingError::Validation(msg) => ServiceError::Validation(msg),
        }
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{field} is required")));
    }
    Ok(())
}

pub(crate) fn not_found(kind: &str, id: &str) -> ServiceError {
    ServiceError::NotFound(format!("{kind} not found: {id}"))
}

/// Entry point used by request handlers. Cheap to clone.
#[derive(Clone)]
pub struct MentorshipService {
    store: Arc<dyn Store>,
    weights: Weights,
    password_cost: u32,
}

impl MentorshipService {
    /// Fails when `weights` cannot keep scores within [0, 100].
    pub fn new(store: Arc<dyn Store>, weights: Weights) -> Result<Self, ServiceError> {
        weights.validate()?;
        Ok(Self {
            store,
            weights,
            password_cost: bcrypt::DEFAULT_COST,
        })
    }

    /// Overrides the bcrypt work factor (4..=31) used for new password hashes.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }
}
