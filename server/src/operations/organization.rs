//! Organization and organization membership mutations.

use agora_common::{ArgumentPath, Role};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{Operation, StateCheck};
use crate::authz::graph::{ResourceKind, ScopeReach};
use crate::authz::policy::OperationPolicy;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationInput {
    #[validate(length(min = 1, max = 256, message = "Name must be 1-256 characters"))]
    pub name: String,
    #[validate(length(max = 2048))]
    pub description: Option<String>,
    #[validate(length(equal = 2, message = "Country code must be 2 characters"))]
    pub country_code: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub state: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub postal_code: Option<String>,
    #[validate(length(min = 1, max = 1024))]
    pub address_line1: Option<String>,
    #[validate(length(min = 1, max = 1024))]
    pub address_line2: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganizationInput {
    pub id: Uuid,
    #[validate(length(min = 1, max = 256, message = "Name must be 1-256 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 2048))]
    pub description: Option<String>,
    #[validate(length(equal = 2, message = "Country code must be 2 characters"))]
    pub country_code: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub city: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteByIdInput {
    pub id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMembershipInput {
    pub organization_id: Uuid,
    pub member_id: Uuid,
    #[validate(custom(function = "membership_role"))]
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMembershipInput {
    pub organization_id: Uuid,
    pub member_id: Uuid,
    #[validate(custom(function = "membership_role"))]
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMembershipInput {
    pub organization_id: Uuid,
    pub member_id: Uuid,
}

/// Memberships carry a real role; `none` is only an effective-role outcome.
pub fn membership_role(role: &Role) -> Result<(), validator::ValidationError> {
    if *role == Role::None {
        Err(validator::ValidationError::new("invalid_role")
            .with_message("Must be a membership role.".into()))
    } else {
        Ok(())
    }
}

pub(super) fn operations() -> Vec<Operation> {
    vec![
        Operation::new(OperationPolicy::new(
            "createOrganization",
            Role::Administrator,
            ScopeReach::Global,
        ))
        .input::<CreateOrganizationInput>(),
        Operation::new(OperationPolicy::new(
            "updateOrganization",
            Role::Administrator,
            ScopeReach::Nearest,
        ))
        .target("id", ResourceKind::Organization)
        .input::<UpdateOrganizationInput>(),
        Operation::new(OperationPolicy::new(
            "deleteOrganization",
            Role::Administrator,
            ScopeReach::Global,
        ))
        .target("id", ResourceKind::Organization)
        .input::<DeleteByIdInput>(),
        // Anyone may join an organization; only its administrators pick the role.
        Operation::new(
            OperationPolicy::new(
                "createOrganizationMembership",
                Role::Administrator,
                ScopeReach::Nearest,
            )
            .allow_subject("memberId")
            .restrict("role", Role::Administrator),
        )
        .target("organizationId", ResourceKind::Organization)
        .reference("memberId", ResourceKind::User)
        .check(StateCheck::NotMember {
            scope: ArgumentPath::input("organizationId"),
            member: ArgumentPath::input("memberId"),
        })
        .input::<CreateMembershipInput>(),
        Operation::new(OperationPolicy::new(
            "updateOrganizationMembership",
            Role::Administrator,
            ScopeReach::Nearest,
        ))
        .target("organizationId", ResourceKind::Organization)
        .reference("memberId", ResourceKind::User)
        .membership("organizationId", "memberId")
        .input::<UpdateMembershipInput>(),
        Operation::new(
            OperationPolicy::new(
                "deleteOrganizationMembership",
                Role::Administrator,
                ScopeReach::Nearest,
            )
            .allow_subject("memberId"),
        )
        .target("organizationId", ResourceKind::Organization)
        .reference("memberId", ResourceKind::User)
        .membership("organizationId", "memberId")
        .input::<DeleteMembershipInput>(),
    ]
}
