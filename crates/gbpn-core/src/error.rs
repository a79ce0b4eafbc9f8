//! Errors raised by place stores.

use crate::graph::{PlaceId, PlaceType};

/// Failures of a [`PlaceStore`](crate::store::PlaceStore) operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("place not found: {0}")]
    NotFound(PlaceId),
    #[error("a place named '{name}' of type {place_type} already exists ({existing})")]
    DuplicateKey {
        name: String,
        place_type: PlaceType,
        existing: PlaceId,
    },
    #[error("transaction '{0}' is still open")]
    TransactionActive(String),
    #[error("no transaction is open")]
    NoTransaction,
    #[error("store backend error: {0}")]
    Backend(String),
}
