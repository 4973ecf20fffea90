//! Role Hierarchy

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role levels, totally ordered from weakest to strongest.
///
/// The same scale is used for a principal's global role and for roles granted
/// by organization or chat memberships, so roles from different scopes can be
/// compared directly.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// No applicable role.
    #[default]
    None,
    /// Plain member of a scope.
    #[serde(alias = "member")]
    Regular,
    /// Sub-resource administrator.
    Moderator,
    /// Full authority over the scope.
    Administrator,
}

impl Role {
    /// Check if this role meets the given minimum.
    #[must_use]
    pub fn at_least(self, minimum: Self) -> bool {
        self >= minimum
    }

    /// Lowercase name as stored and serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Regular => "regular",
            Self::Moderator => "moderator",
            Self::Administrator => "administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown role string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "regular" | "member" => Ok(Self::Regular),
            "moderator" => Ok(Self::Moderator),
            "administrator" => Ok(Self::Administrator),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}
