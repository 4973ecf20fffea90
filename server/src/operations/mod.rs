//! Declarative operation table.
//!
//! Every mutation is described once: its policy, the resource it targets,
//! what else it references, which memberships must exist, which domain state
//! checks apply, and how its input is validated. The table is built on first
//! use and never mutated.

mod advertisement;
mod chat;
pub mod checks;
mod fund;
mod organization;
mod post;
mod tag;
pub mod validation;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use agora_common::{ArgumentPath, Issue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use validator::Validate;

use crate::authz::existence::{ExistenceReport, Lookup, MembershipLookup};
use crate::authz::fields;
use crate::authz::graph::{ResourceKind, ResourceLink};
use crate::authz::policy::OperationPolicy;

pub use checks::{KeySource, ScopeSource, StateCheck};

/// Argument naming a stored resource by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub path: ArgumentPath,
    pub kind: ResourceKind,
    pub required: bool,
}

/// A membership that must already exist between two referenced resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRule {
    pub scope: ArgumentPath,
    pub member: ArgumentPath,
}

type InputValidator = fn(&Value) -> Result<(), Vec<Issue>>;

/// One mutation's authorization contract.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub policy: OperationPolicy,
    /// Resource the effective role is resolved against.
    pub target: Option<Reference>,
    pub references: Vec<Reference>,
    pub memberships: Vec<MembershipRule>,
    pub checks: Vec<StateCheck>,
    #[serde(skip)]
    validator: InputValidator,
}

impl Operation {
    #[must_use]
    pub fn new(policy: OperationPolicy) -> Self {
        Self {
            policy,
            target: None,
            references: Vec::new(),
            memberships: Vec::new(),
            checks: Vec::new(),
            validator: |_| Ok(()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.policy.name
    }

    #[must_use]
    pub fn target(mut self, field: &str, kind: ResourceKind) -> Self {
        self.target = Some(Reference {
            path: ArgumentPath::input(field),
            kind,
            required: true,
        });
        self
    }

    #[must_use]
    pub fn reference(mut self, field: &str, kind: ResourceKind) -> Self {
        self.references.push(Reference {
            path: ArgumentPath::input(field),
            kind,
            required: true,
        });
        self
    }

    #[must_use]
    pub fn optional_reference(mut self, field: &str, kind: ResourceKind) -> Self {
        self.references.push(Reference {
            path: ArgumentPath::input(field),
            kind,
            required: false,
        });
        self
    }

    #[must_use]
    pub fn membership(mut self, scope: &str, member: &str) -> Self {
        self.memberships.push(MembershipRule {
            scope: ArgumentPath::input(scope),
            member: ArgumentPath::input(member),
        });
        self
    }

    #[must_use]
    pub fn check(mut self, check: StateCheck) -> Self {
        self.checks.push(check);
        self
    }

    /// Validate the `input` argument as `T`.
    #[must_use]
    pub fn input<T: DeserializeOwned + Validate>(mut self) -> Self {
        self.validator = validation::validate_input::<T>;
        self
    }

    /// Every reference, target first.
    pub fn all_references(&self) -> impl Iterator<Item = &Reference> {
        self.target.iter().chain(&self.references)
    }

    /// Stage-two validation: every violated argument, sorted by path.
    #[must_use]
    pub fn validate(&self, args: &Value) -> Vec<Issue> {
        validation::validate_arguments(self, args, self.validator)
    }

    /// Lookups for every reference the arguments carry.
    #[must_use]
    pub fn lookups(&self, args: &Value) -> Vec<Lookup> {
        self.all_references()
            .filter_map(|reference| {
                fields::uuid_at(args, &reference.path).map(|id| Lookup {
                    path: reference.path.clone(),
                    link: ResourceLink::new(reference.kind, id),
                })
            })
            .collect()
    }

    /// Membership lookups for rules whose resources were both resolved.
    #[must_use]
    pub fn membership_lookups(&self, report: &ExistenceReport) -> Vec<MembershipLookup> {
        self.memberships
            .iter()
            .filter_map(|rule| {
                let scope = report.get(&rule.scope)?;
                let member = report.get(&rule.member)?;
                Some(MembershipLookup {
                    scope_path: rule.scope.clone(),
                    member_path: rule.member.clone(),
                    scope: scope.link(),
                    member_id: member.id,
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("policy", &self.policy)
            .field("target", &self.target)
            .field("references", &self.references)
            .field("memberships", &self.memberships)
            .field("checks", &self.checks)
            .finish_non_exhaustive()
    }
}

static REGISTRY: LazyLock<BTreeMap<&'static str, Operation>> = LazyLock::new(|| {
    organization::operations()
        .into_iter()
        .chain(chat::operations())
        .chain(post::operations())
        .chain(fund::operations())
        .chain(tag::operations())
        .chain(advertisement::operations())
        .map(|operation| (operation.name(), operation))
        .collect()
});

/// The process-wide operation table.
pub fn registry() -> &'static BTreeMap<&'static str, Operation> {
    &REGISTRY
}

/// Look up an operation by mutation name.
pub fn find(name: &str) -> Option<&'static Operation> {
    REGISTRY.get(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_common::Role;

    #[test]
    fn test_every_mutation_is_registered() {
        let expected = [
            "createOrganization",
            "updateOrganization",
            "deleteOrganization",
            "createOrganizationMembership",
            "updateOrganizationMembership",
            "deleteOrganizationMembership",
            "createChat",
            "updateChat",
            "deleteChat",
            "createChatMembership",
            "updateChatMembership",
            "deleteChatMembership",
            "createChatMessage",
            "updateChatMessage",
            "deleteChatMessage",
            "createPost",
            "updatePost",
            "deletePost",
            "createPostVote",
            "updatePostVote",
            "deletePostVote",
            "createComment",
            "updateComment",
            "deleteComment",
            "createCommentVote",
            "updateCommentVote",
            "deleteCommentVote",
            "createFund",
            "updateFund",
            "deleteFund",
            "createFundCampaign",
            "updateFundCampaign",
            "deleteFundCampaign",
            "createFundCampaignPledge",
            "updateFundCampaignPledge",
            "deleteFundCampaignPledge",
            "createTag",
            "updateTag",
            "deleteTag",
            "createTagFolder",
            "updateTagFolder",
            "deleteTagFolder",
            "assignUserTag",
            "unassignUserTag",
            "createAdvertisement",
            "updateAdvertisement",
            "deleteAdvertisement",
        ];
        for name in expected {
            assert!(find(name).is_some(), "{name} is not registered");
        }
        assert_eq!(registry().len(), expected.len());
    }

    #[test]
    fn test_targets_are_required_and_paths_unique() {
        for operation in registry().values() {
            if let Some(target) = &operation.target {
                assert!(target.required, "{} target is optional", operation.name());
            }
            let mut paths: Vec<_> = operation.all_references().map(|r| &r.path).collect();
            let total = paths.len();
            paths.sort();
            paths.dedup();
            assert_eq!(paths.len(), total, "{} repeats a reference", operation.name());
        }
    }

    #[test]
    fn test_restricted_fields_sit_above_minimum() {
        for operation in registry().values() {
            for field in &operation.policy.restricted_fields {
                assert!(
                    field.minimum_role > operation.policy.minimum_role,
                    "{} restricts {} at or below its minimum",
                    operation.name(),
                    field.path
                );
            }
        }
    }

    #[test]
    fn test_self_exception_floor_sits_below_minimum() {
        for operation in registry().values() {
            let policy = &operation.policy;
            assert!(policy.self_minimum_role < policy.minimum_role, "{}", operation.name());
            if policy.self_minimum_role > Role::None {
                assert!(policy.self_exception.is_some(), "{}", operation.name());
            }
        }
    }

    #[test]
    fn test_untargeted_operations_need_global_administrator() {
        for operation in registry().values().filter(|op| op.target.is_none()) {
            assert_eq!(operation.policy.minimum_role, Role::Administrator);
        }
    }

    #[test]
    fn test_lookups_skip_absent_optional_references() {
        let operation = find("createChatMessage").unwrap();
        let chat_id = uuid::Uuid::new_v4();
        let args = serde_json::json!({ "input": { "chatId": chat_id, "body": "hi" } });
        let lookups = operation.lookups(&args);
        assert_eq!(lookups.len(), 1);
        assert_eq!(lookups[0].link, ResourceLink::new(ResourceKind::Chat, chat_id));
    }
}
