//! Decision results.

use std::collections::BTreeMap;

use agora_common::{ArgumentPath, ErrorCode, Issue, Role};
use serde::Serialize;

use super::graph::Resource;
use crate::auth::Principal;

/// Flat, transport-agnostic view of a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationOutcome {
    pub permitted: bool,
    pub missing_resources: Vec<ArgumentPath>,
    pub denied_fields: Vec<ArgumentPath>,
    pub reason_code: Option<ErrorCode>,
    pub issues: Vec<Issue>,
}

impl AuthorizationOutcome {
    #[must_use]
    pub const fn permit() -> Self {
        Self {
            permitted: true,
            missing_resources: Vec::new(),
            denied_fields: Vec::new(),
            reason_code: None,
            issues: Vec::new(),
        }
    }

    /// Convert back into a pipeline result.
    pub fn into_result(self) -> Result<(), Denial> {
        match self.reason_code {
            None if self.permitted => Ok(()),
            code => Err(Denial::new(
                code.unwrap_or(ErrorCode::Unexpected),
                self.issues,
            )),
        }
    }
}

/// A request refused at one pipeline stage, with every violation found there.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}")]
pub struct Denial {
    pub code: ErrorCode,
    pub issues: Vec<Issue>,
}

impl Denial {
    /// Issues are sorted by argument path so output is deterministic.
    #[must_use]
    pub fn new(code: ErrorCode, mut issues: Vec<Issue>) -> Self {
        issues.sort_by(|a, b| a.argument_path.cmp(&b.argument_path));
        issues.dedup();
        Self { code, issues }
    }

    /// Denial naming bare argument paths.
    #[must_use]
    pub fn at_paths(code: ErrorCode, paths: impl IntoIterator<Item = ArgumentPath>) -> Self {
        Self::new(code, paths.into_iter().map(Issue::at).collect())
    }

    #[must_use]
    pub const fn unauthenticated() -> Self {
        Self {
            code: ErrorCode::Unauthenticated,
            issues: Vec::new(),
        }
    }

    /// Generic failure; details stay in the logs.
    #[must_use]
    pub const fn unexpected() -> Self {
        Self {
            code: ErrorCode::Unexpected,
            issues: Vec::new(),
        }
    }

    fn paths(&self) -> Vec<ArgumentPath> {
        self.issues.iter().map(|i| i.argument_path.clone()).collect()
    }

    #[must_use]
    pub fn outcome(&self) -> AuthorizationOutcome {
        let (missing_resources, denied_fields) = match self.code {
            ErrorCode::ArgumentsAssociatedResourcesNotFound => (self.paths(), Vec::new()),
            ErrorCode::UnauthorizedArguments => (Vec::new(), self.paths()),
            _ => (Vec::new(), Vec::new()),
        };
        AuthorizationOutcome {
            permitted: false,
            missing_resources,
            denied_fields,
            reason_code: Some(self.code),
            issues: self.issues.clone(),
        }
    }
}

impl From<Denial> for AuthorizationOutcome {
    fn from(denial: Denial) -> Self {
        denial.outcome()
    }
}

/// A permitted request and everything loaded to decide it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    pub operation: &'static str,
    pub principal: Principal,
    pub role: Role,
    pub target: Option<Resource>,
    /// Every resolved reference keyed by the argument that named it.
    #[serde(serialize_with = "serialize_resources")]
    pub resources: BTreeMap<ArgumentPath, Resource>,
}

impl Grant {
    #[must_use]
    pub fn resource(&self, path: &ArgumentPath) -> Option<&Resource> {
        self.resources.get(path)
    }
}

// JSON object keys must be strings.
fn serialize_resources<S: serde::Serializer>(
    resources: &BTreeMap<ArgumentPath, Resource>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(resources.iter().map(|(path, r)| (path.to_string(), r)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_sorts_and_dedups() {
        let denial = Denial::at_paths(
            ErrorCode::ArgumentsAssociatedResourcesNotFound,
            [
                ArgumentPath::input("memberId"),
                ArgumentPath::input("chatId"),
                ArgumentPath::input("memberId"),
            ],
        );
        assert_eq!(
            denial.issues,
            vec![
                Issue::at(ArgumentPath::input("chatId")),
                Issue::at(ArgumentPath::input("memberId")),
            ]
        );
    }

    #[test]
    fn test_not_found_outcome_lists_missing_resources() {
        let outcome = Denial::at_paths(
            ErrorCode::ArgumentsAssociatedResourcesNotFound,
            [ArgumentPath::input("chatId")],
        )
        .outcome();
        assert!(!outcome.permitted);
        assert_eq!(outcome.missing_resources, vec![ArgumentPath::input("chatId")]);
        assert!(outcome.denied_fields.is_empty());
    }

    #[test]
    fn test_unauthorized_arguments_outcome_lists_denied_fields() {
        let outcome: AuthorizationOutcome = Denial::at_paths(
            ErrorCode::UnauthorizedArguments,
            [ArgumentPath::input("isPinned")],
        )
        .into();
        assert_eq!(outcome.denied_fields, vec![ArgumentPath::input("isPinned")]);
        assert!(outcome.missing_resources.is_empty());
        assert_eq!(outcome.reason_code, Some(ErrorCode::UnauthorizedArguments));
    }

    #[test]
    fn test_outcome_into_result() {
        assert!(AuthorizationOutcome::permit().into_result().is_ok());
        let denial = Denial::unauthenticated();
        assert_eq!(denial.outcome().into_result(), Err(denial));
    }
}
