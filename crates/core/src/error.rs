//! Domain error model.

use thiserror::Error;

use crate::id::ProductId;

/// Result type used across the engine.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Validation errors are raised before any mutation happens. Allocation and
/// transition errors are raised at the point the conflicting state is observed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (non-positive dimension, empty order, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A status change is not permitted from the current state.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// The location was already occupied at mutation time.
    #[error("location {0} is unavailable")]
    LocationUnavailable(String),

    /// Fewer units are available than an order line requests.
    #[error("insufficient stock for product {product_id} (requested: {requested}, available: {available})")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: usize,
    },

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A write conflicted with existing state (duplicate id, dangling reference).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The storage collaborator failed.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(kind: &str, id: impl core::fmt::Display) -> Self {
        Self::NotFound(format!("{kind} {id}"))
    }

    pub fn invalid_transition(
        from: impl core::fmt::Debug,
        to: impl core::fmt::Debug,
    ) -> Self {
        Self::InvalidTransition(format!("{from:?} -> {to:?}"))
    }

    pub fn location_unavailable(id: impl core::fmt::Display) -> Self {
        Self::LocationUnavailable(id.to_string())
    }

    pub fn insufficient_stock(product_id: ProductId, requested: u32, available: usize) -> Self {
        Self::InsufficientStock {
            product_id,
            requested,
            available,
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// True for errors caused by the current state of the world rather than by
    /// malformed input or a broken collaborator.
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition(_)
                | Self::LocationUnavailable(_)
                | Self::InsufficientStock { .. }
                | Self::Conflict(_)
        )
    }
}
