//! Per-operation authorization policies.
//!
//! Each mutation declares one [`OperationPolicy`]; [`evaluate`] applies it to
//! an already-resolved effective role. Evaluation is pure and does no I/O.

use agora_common::{ArgumentPath, ErrorCode, Role};
use serde::Serialize;
use serde_json::Value;

use super::fields;
use super::graph::{Resource, ScopeReach};
use super::outcome::{AuthorizationOutcome, Denial};
use crate::auth::Principal;

/// Who may act below the operation's minimum role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "camelCase")]
pub enum SelfException {
    /// The principal created the target.
    Creator,
    /// The principal is the user named by this argument.
    Subject(ArgumentPath),
}

/// An argument whose presence needs more than the operation's minimum role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestrictedField {
    pub path: ArgumentPath,
    pub minimum_role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationPolicy {
    pub name: &'static str,
    pub minimum_role: Role,
    pub reach: ScopeReach,
    pub self_exception: Option<SelfException>,
    /// Role the principal still needs when acting through the self exception.
    pub self_minimum_role: Role,
    pub restricted_fields: Vec<RestrictedField>,
}

impl OperationPolicy {
    #[must_use]
    pub const fn new(name: &'static str, minimum_role: Role, reach: ScopeReach) -> Self {
        Self {
            name,
            minimum_role,
            reach,
            self_exception: None,
            self_minimum_role: Role::None,
            restricted_fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn allow_creator(mut self) -> Self {
        self.self_exception = Some(SelfException::Creator);
        self
    }

    #[must_use]
    pub fn allow_subject(mut self, field: &str) -> Self {
        self.self_exception = Some(SelfException::Subject(ArgumentPath::input(field)));
        self
    }

    /// Require `role` in the scope for the self exception to apply.
    #[must_use]
    pub fn self_requires(mut self, role: Role) -> Self {
        self.self_minimum_role = role;
        self
    }

    #[must_use]
    pub fn restrict(mut self, field: &str, minimum_role: Role) -> Self {
        self.restricted_fields.push(RestrictedField {
            path: ArgumentPath::input(field),
            minimum_role,
        });
        self
    }
}

/// Inputs to a policy evaluation.
#[derive(Debug, Clone, Copy)]
pub struct Evaluation<'a> {
    pub principal: &'a Principal,
    /// Effective role, already resolved for `target`.
    pub role: Role,
    pub target: Option<&'a Resource>,
    /// Argument that named the target.
    pub target_path: Option<&'a ArgumentPath>,
    pub args: &'a Value,
}

impl Evaluation<'_> {
    fn is_self(&self, exception: &SelfException) -> bool {
        match exception {
            SelfException::Creator => self
                .target
                .and_then(|t| t.creator_id)
                .is_some_and(|creator| creator == self.principal.id),
            SelfException::Subject(path) => {
                fields::uuid_at(self.args, path) == Some(self.principal.id)
            }
        }
    }
}

/// Apply `policy` to an evaluation.
///
/// The whole operation is checked first. Restricted fields are checked even
/// when the operation is permitted through the self exception.
#[must_use]
pub fn evaluate(policy: &OperationPolicy, eval: &Evaluation<'_>) -> AuthorizationOutcome {
    let permitted = eval.role.at_least(policy.minimum_role)
        || policy
            .self_exception
            .as_ref()
            .is_some_and(|exception| {
                eval.role.at_least(policy.self_minimum_role) && eval.is_self(exception)
            });

    if !permitted {
        return Denial::at_paths(
            ErrorCode::UnauthorizedActionOnArgumentsAssociatedResources,
            eval.target_path.cloned(),
        )
        .outcome();
    }

    let denied: Vec<ArgumentPath> = policy
        .restricted_fields
        .iter()
        .filter(|field| fields::is_present(eval.args, &field.path))
        .filter(|field| !eval.role.at_least(field.minimum_role))
        .map(|field| field.path.clone())
        .collect();

    if denied.is_empty() {
        AuthorizationOutcome::permit()
    } else {
        Denial::at_paths(ErrorCode::UnauthorizedArguments, denied).outcome()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::graph::{ResourceKind, ResourceLink};
    use serde_json::json;
    use uuid::Uuid;

    fn principal(global_role: Role) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            global_role,
        }
    }

    fn post(creator_id: Option<Uuid>) -> Resource {
        Resource {
            ancestors: vec![ResourceLink::new(ResourceKind::Organization, Uuid::new_v4())],
            creator_id,
            ..Resource::root(ResourceKind::Post, Uuid::new_v4())
        }
    }

    fn update_post() -> OperationPolicy {
        OperationPolicy::new("updatePost", Role::Administrator, ScopeReach::Nearest)
            .allow_creator()
            .restrict("isPinned", Role::Administrator)
    }

    #[test]
    fn test_below_minimum_is_denied_with_target_path() {
        let user = principal(Role::Regular);
        let target = post(None);
        let path = ArgumentPath::input("id");
        let args = json!({ "input": { "id": target.id, "caption": "x" } });

        let outcome = evaluate(
            &update_post(),
            &Evaluation {
                principal: &user,
                role: Role::Regular,
                target: Some(&target),
                target_path: Some(&path),
                args: &args,
            },
        );
        assert!(!outcome.permitted);
        assert_eq!(
            outcome.reason_code,
            Some(ErrorCode::UnauthorizedActionOnArgumentsAssociatedResources)
        );
        assert_eq!(outcome.issues[0].argument_path, path);
    }

    #[test]
    fn test_creator_passes_but_restricted_field_is_denied() {
        let user = principal(Role::Regular);
        let target = post(Some(user.id));
        let path = ArgumentPath::input("id");
        let pinned = json!({ "input": { "id": target.id, "caption": "x", "isPinned": true } });
        let plain = json!({ "input": { "id": target.id, "caption": "x" } });

        let eval = |args| Evaluation {
            principal: &user,
            role: Role::Regular,
            target: Some(&target),
            target_path: Some(&path),
            args,
        };

        let denied = evaluate(&update_post(), &eval(&pinned));
        assert_eq!(denied.reason_code, Some(ErrorCode::UnauthorizedArguments));
        assert_eq!(denied.denied_fields, vec![ArgumentPath::input("isPinned")]);

        assert_eq!(evaluate(&update_post(), &eval(&plain)), AuthorizationOutcome::permit());
    }

    #[test]
    fn test_explicit_null_counts_as_present() {
        let user = principal(Role::Regular);
        let target = post(Some(user.id));
        let args = json!({ "input": { "id": target.id, "isPinned": null } });
        let outcome = evaluate(
            &update_post(),
            &Evaluation {
                principal: &user,
                role: Role::Regular,
                target: Some(&target),
                target_path: None,
                args: &args,
            },
        );
        assert_eq!(outcome.denied_fields, vec![ArgumentPath::input("isPinned")]);
    }

    #[test]
    fn test_subject_exception() {
        let policy = OperationPolicy::new(
            "deleteOrganizationMembership",
            Role::Administrator,
            ScopeReach::Nearest,
        )
        .allow_subject("memberId");
        let user = principal(Role::Regular);
        let own = json!({ "input": { "memberId": user.id } });
        let other = json!({ "input": { "memberId": Uuid::new_v4() } });

        let eval = |args| Evaluation {
            principal: &user,
            role: Role::Regular,
            target: None,
            target_path: None,
            args,
        };
        assert!(evaluate(&policy, &eval(&own)).permitted);
        assert!(!evaluate(&policy, &eval(&other)).permitted);
    }

    #[test]
    fn test_self_exception_can_require_membership() {
        let policy = OperationPolicy::new(
            "createFundCampaignPledge",
            Role::Administrator,
            ScopeReach::Nearest,
        )
        .allow_subject("pledgerId")
        .self_requires(Role::Regular);
        let user = principal(Role::Regular);
        let own = json!({ "input": { "pledgerId": user.id } });

        let eval = |role| Evaluation {
            principal: &user,
            role,
            target: None,
            target_path: None,
            args: &own,
        };
        assert!(!evaluate(&policy, &eval(Role::None)).permitted);
        assert!(evaluate(&policy, &eval(Role::Regular)).permitted);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let user = principal(Role::Regular);
        let target = post(Some(user.id));
        let args = json!({ "input": { "id": target.id, "isPinned": true } });
        let eval = Evaluation {
            principal: &user,
            role: Role::Regular,
            target: Some(&target),
            target_path: None,
            args: &args,
        };
        let policy = update_post();
        assert_eq!(evaluate(&policy, &eval), evaluate(&policy, &eval));
        assert_eq!(policy, update_post());
    }

    #[test]
    fn test_policy_serializes_for_listing() {
        let value = serde_json::to_value(update_post()).unwrap();
        assert_eq!(value["minimumRole"], "administrator");
        assert_eq!(value["reach"], "nearest");
        assert_eq!(value["selfException"]["kind"], "creator");
        assert_eq!(value["selfMinimumRole"], "none");
        assert_eq!(value["restrictedFields"][0]["path"], json!(["input", "isPinned"]));
    }
}
