//! Advertisement mutations.

use agora_common::{ArgumentPath, Role};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::organization::DeleteByIdInput;
use super::validation::check_window;
use super::{Operation, ScopeSource, StateCheck};
use crate::authz::graph::{ResourceKind, ScopeReach};
use crate::authz::policy::OperationPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvertisementType {
    Banner,
    Menu,
    PopUp,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "create_window", skip_on_field_errors = false))]
pub struct CreateAdvertisementInput {
    pub organization_id: Uuid,
    #[validate(length(min = 1, max = 256, message = "Name must be 1-256 characters"))]
    pub name: String,
    #[serde(rename = "type")]
    pub ad_type: AdvertisementType,
    #[validate(length(max = 2048))]
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

fn create_window(input: &CreateAdvertisementInput) -> Result<(), ValidationError> {
    check_window(Some(input.start_at), Some(input.end_at))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "update_window", skip_on_field_errors = false))]
pub struct UpdateAdvertisementInput {
    pub id: Uuid,
    #[validate(length(min = 1, max = 256, message = "Name must be 1-256 characters"))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ad_type: Option<AdvertisementType>,
    #[validate(length(max = 2048))]
    pub description: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
}

fn update_window(input: &UpdateAdvertisementInput) -> Result<(), ValidationError> {
    check_window(input.start_at, input.end_at)
}

pub(super) fn operations() -> Vec<Operation> {
    vec![
        Operation::new(OperationPolicy::new(
            "createAdvertisement",
            Role::Administrator,
            ScopeReach::Nearest,
        ))
        .target("organizationId", ResourceKind::Organization)
        .check(StateCheck::UniqueName {
            kind: ResourceKind::Advertisement,
            scope: ScopeSource::Resource(ArgumentPath::input("organizationId")),
            name: ArgumentPath::input("name"),
        })
        .input::<CreateAdvertisementInput>(),
        Operation::new(OperationPolicy::new(
            "updateAdvertisement",
            Role::Administrator,
            ScopeReach::Nearest,
        ))
        .target("id", ResourceKind::Advertisement)
        .check(StateCheck::UniqueName {
            kind: ResourceKind::Advertisement,
            scope: ScopeSource::ParentOf(ArgumentPath::input("id")),
            name: ArgumentPath::input("name"),
        })
        .input::<UpdateAdvertisementInput>(),
        Operation::new(OperationPolicy::new(
            "deleteAdvertisement",
            Role::Administrator,
            ScopeReach::Nearest,
        ))
        .target("id", ResourceKind::Advertisement)
        .input::<DeleteByIdInput>(),
    ]
}
