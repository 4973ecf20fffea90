//! Authorization engine
//!
//! Decides, before any write, whether a principal may run a mutation and
//! whether each of its arguments is allowed.

pub mod engine;
pub mod existence;
pub mod fields;
pub mod graph;
pub mod memory;
pub mod outcome;
pub mod policy;
pub mod resolver;
pub mod store;

pub use engine::{DecisionEngine, EngineConfig};
pub use graph::{ActiveWindow, Resource, ResourceKind, ResourceLink, ScopeReach};
pub use memory::{MemoryStore, NewResource};
pub use outcome::{AuthorizationOutcome, Denial, Grant};
pub use policy::{evaluate, OperationPolicy, RestrictedField, SelfException};
pub use store::{Membership, ResourceStore, StoreError, StoreResult, UserDirectory};
