//! Error Taxonomy

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path::ArgumentPath;

/// Stable error codes reported for every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// No valid principal.
    Unauthenticated,
    /// Structural or shape violations.
    InvalidArguments,
    /// One or more referenced resources do not exist.
    ArgumentsAssociatedResourcesNotFound,
    /// Referenced resources exist but violate a domain invariant.
    ForbiddenActionOnArgumentsAssociatedResources,
    /// Principal lacks the minimum role for the operation.
    UnauthorizedActionOnArgumentsAssociatedResources,
    /// Operation permitted, but specific arguments are not.
    UnauthorizedArguments,
    /// External defect; details are logged, never returned.
    Unexpected,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::InvalidArguments => "invalid_arguments",
            Self::ArgumentsAssociatedResourcesNotFound => {
                "arguments_associated_resources_not_found"
            }
            Self::ForbiddenActionOnArgumentsAssociatedResources => {
                "forbidden_action_on_arguments_associated_resources"
            }
            Self::UnauthorizedActionOnArgumentsAssociatedResources => {
                "unauthorized_action_on_arguments_associated_resources"
            }
            Self::UnauthorizedArguments => "unauthorized_arguments",
            Self::Unexpected => "unexpected",
        }
    }

    /// Default human-readable message for the code.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Unauthenticated => "You must be authenticated to perform this action.",
            Self::InvalidArguments => "You have provided invalid arguments for this action.",
            Self::ArgumentsAssociatedResourcesNotFound => {
                "No associated resources found for the provided arguments."
            }
            Self::ForbiddenActionOnArgumentsAssociatedResources => {
                "This action is forbidden on the resources associated to the provided arguments."
            }
            Self::UnauthorizedActionOnArgumentsAssociatedResources => {
                "You are not authorized to perform this action on the resources associated to the provided arguments."
            }
            Self::UnauthorizedArguments => {
                "You are not authorized to perform this action with the provided arguments."
            }
            Self::Unexpected => "Something went wrong. Please try again later.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One violated argument, with an optional reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub argument_path: ArgumentPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Issue {
    /// Issue without a message.
    #[must_use]
    pub const fn at(argument_path: ArgumentPath) -> Self {
        Self {
            argument_path,
            message: None,
        }
    }

    /// Issue carrying a human-readable reason.
    pub fn with_message(argument_path: ArgumentPath, message: impl Into<String>) -> Self {
        Self {
            argument_path,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_serialization_matches_as_str() {
        for code in [
            ErrorCode::Unauthenticated,
            ErrorCode::InvalidArguments,
            ErrorCode::ArgumentsAssociatedResourcesNotFound,
            ErrorCode::ForbiddenActionOnArgumentsAssociatedResources,
            ErrorCode::UnauthorizedActionOnArgumentsAssociatedResources,
            ErrorCode::UnauthorizedArguments,
            ErrorCode::Unexpected,
        ] {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, serde_json::Value::String(code.as_str().to_string()));
        }
    }

    #[test]
    fn test_issue_omits_missing_message() {
        let issue = Issue::at(ArgumentPath::input("chatId"));
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json, serde_json::json!({ "argumentPath": ["input", "chatId"] }));

        let issue = Issue::with_message(ArgumentPath::input("name"), "This name is not available.");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["message"], "This name is not available.");
    }
}
