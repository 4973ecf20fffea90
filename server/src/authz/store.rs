//! Storage read interface consumed by the engine.
//!
//! The engine only ever reads: resources by id, a principal's membership on
//! one scope, and resources by a unique key inside a scope. Writes belong to
//! the mutation handlers.

use std::future::Future;

use agora_common::Role;
use serde::Serialize;
use uuid::Uuid;

use super::graph::{Resource, ResourceKind, ResourceLink};
use crate::auth::Principal;

/// A role grant binding one principal to one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub principal_id: Uuid,
    pub scope: ResourceLink,
    pub role: Role,
}

/// Storage lookup errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error.
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    /// A stored row does not match the expected shape.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// The kind has no unique key lookup.
    #[error("No unique key defined for {0}")]
    Unsupported(ResourceKind),

    /// Lookups did not finish before the request deadline.
    #[error("Lookup timed out")]
    Timeout,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read access to resources and memberships.
pub trait ResourceStore: Send + Sync + 'static {
    /// Load a resource and its scoping chain.
    fn find_by_id(
        &self,
        kind: ResourceKind,
        id: Uuid,
    ) -> impl Future<Output = StoreResult<Option<Resource>>> + Send;

    /// Point lookup of a principal's membership on exactly one scope.
    fn find_membership(
        &self,
        principal_id: Uuid,
        scope: ResourceLink,
    ) -> impl Future<Output = StoreResult<Option<Membership>>> + Send;

    /// Load the resource of `kind` holding `key` inside `scope_id`.
    fn find_by_unique_key(
        &self,
        kind: ResourceKind,
        scope_id: Uuid,
        key: &str,
    ) -> impl Future<Output = StoreResult<Option<Resource>>> + Send;
}

/// Read access to principals.
pub trait UserDirectory: Send + Sync + 'static {
    fn find_principal(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = StoreResult<Option<Principal>>> + Send;
}
