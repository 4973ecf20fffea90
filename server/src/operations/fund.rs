//! Fund, fund campaign and pledge mutations.

use agora_common::{ArgumentPath, Role};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::organization::DeleteByIdInput;
use super::validation::check_window;
use super::{KeySource, Operation, ScopeSource, StateCheck};
use crate::authz::graph::{ResourceKind, ScopeReach};
use crate::authz::policy::OperationPolicy;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFundInput {
    pub organization_id: Uuid,
    #[validate(length(min = 1, max = 256, message = "Name must be 1-256 characters"))]
    pub name: String,
    pub is_tax_deductible: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFundInput {
    pub id: Uuid,
    #[validate(length(min = 1, max = 256, message = "Name must be 1-256 characters"))]
    pub name: Option<String>,
    pub is_tax_deductible: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "create_campaign_window", skip_on_field_errors = false))]
pub struct CreateFundCampaignInput {
    pub fund_id: Uuid,
    #[validate(length(min = 1, max = 256, message = "Name must be 1-256 characters"))]
    pub name: String,
    #[validate(range(min = 1, message = "Goal amount must be positive"))]
    pub goal_amount: u64,
    #[validate(length(equal = 3, message = "Currency code must be 3 characters"))]
    pub currency_code: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

fn create_campaign_window(input: &CreateFundCampaignInput) -> Result<(), ValidationError> {
    check_window(Some(input.start_at), Some(input.end_at))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "update_campaign_window", skip_on_field_errors = false))]
pub struct UpdateFundCampaignInput {
    pub id: Uuid,
    #[validate(length(min = 1, max = 256, message = "Name must be 1-256 characters"))]
    pub name: Option<String>,
    #[validate(range(min = 1, message = "Goal amount must be positive"))]
    pub goal_amount: Option<u64>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
}

fn update_campaign_window(input: &UpdateFundCampaignInput) -> Result<(), ValidationError> {
    check_window(input.start_at, input.end_at)
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePledgeInput {
    pub campaign_id: Uuid,
    pub pledger_id: Uuid,
    #[validate(range(min = 1, message = "Amount must be positive"))]
    pub amount: u64,
    #[validate(length(max = 2048))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePledgeInput {
    pub id: Uuid,
    #[validate(range(min = 1, message = "Amount must be positive"))]
    pub amount: Option<u64>,
    #[validate(length(max = 2048))]
    pub note: Option<String>,
}

fn administered(name: &'static str) -> OperationPolicy {
    OperationPolicy::new(name, Role::Administrator, ScopeReach::Nearest)
}

pub(super) fn operations() -> Vec<Operation> {
    vec![
        Operation::new(administered("createFund"))
            .target("organizationId", ResourceKind::Organization)
            .check(StateCheck::UniqueName {
                kind: ResourceKind::Fund,
                scope: ScopeSource::Resource(ArgumentPath::input("organizationId")),
                name: ArgumentPath::input("name"),
            })
            .input::<CreateFundInput>(),
        Operation::new(administered("updateFund"))
            .target("id", ResourceKind::Fund)
            .check(StateCheck::UniqueName {
                kind: ResourceKind::Fund,
                scope: ScopeSource::ParentOf(ArgumentPath::input("id")),
                name: ArgumentPath::input("name"),
            })
            .input::<UpdateFundInput>(),
        Operation::new(administered("deleteFund"))
            .target("id", ResourceKind::Fund)
            .input::<DeleteByIdInput>(),
        Operation::new(administered("createFundCampaign"))
            .target("fundId", ResourceKind::Fund)
            .check(StateCheck::UniqueName {
                kind: ResourceKind::FundCampaign,
                scope: ScopeSource::Resource(ArgumentPath::input("fundId")),
                name: ArgumentPath::input("name"),
            })
            .input::<CreateFundCampaignInput>(),
        Operation::new(administered("updateFundCampaign"))
            .target("id", ResourceKind::FundCampaign)
            .check(StateCheck::UniqueName {
                kind: ResourceKind::FundCampaign,
                scope: ScopeSource::ParentOf(ArgumentPath::input("id")),
                name: ArgumentPath::input("name"),
            })
            .input::<UpdateFundCampaignInput>(),
        Operation::new(administered("deleteFundCampaign"))
            .target("id", ResourceKind::FundCampaign)
            .input::<DeleteByIdInput>(),
        // Members pledge for themselves; administrators may pledge for anyone.
        Operation::new(
            administered("createFundCampaignPledge")
                .allow_subject("pledgerId")
                .self_requires(Role::Regular),
        )
            .target("campaignId", ResourceKind::FundCampaign)
            .reference("pledgerId", ResourceKind::User)
            .check(StateCheck::ActiveWindow {
                resource: ArgumentPath::input("campaignId"),
                label: "fund campaign",
            })
            .check(StateCheck::UniqueKey {
                kind: ResourceKind::FundCampaignPledge,
                scope: ArgumentPath::input("campaignId"),
                key: KeySource::Argument(ArgumentPath::input("pledgerId")),
                message: "This fund campaign has already been pledged by the pledger.",
            })
            .input::<CreatePledgeInput>(),
        // A pledge is owned by its pledger.
        Operation::new(administered("updateFundCampaignPledge").allow_creator())
            .target("id", ResourceKind::FundCampaignPledge)
            .input::<UpdatePledgeInput>(),
        Operation::new(administered("deleteFundCampaignPledge").allow_creator())
            .target("id", ResourceKind::FundCampaignPledge)
            .input::<DeleteByIdInput>(),
    ]
}
