//! Database Models

use agora_common::Role;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::Principal;
use crate::authz::{ActiveWindow, Resource, ResourceKind, ResourceLink, StoreError};

/// Uniform row shape returned by every per-kind resource query.
///
/// Ancestor columns are filled nearest first and are `NULL` past the
/// kind's depth.
#[derive(Debug, Clone, FromRow)]
pub struct ResourceRow {
    pub id: Uuid,
    pub creator_id: Option<Uuid>,
    pub name: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub ancestor_1: Option<Uuid>,
    pub ancestor_2: Option<Uuid>,
    pub ancestor_3: Option<Uuid>,
}

impl ResourceRow {
    /// Attach ancestor kinds from the scoping graph.
    pub fn into_resource(self, kind: ResourceKind) -> Result<Resource, StoreError> {
        let ids = [self.ancestor_1, self.ancestor_2, self.ancestor_3];
        let ancestors = kind
            .ancestry()
            .iter()
            .zip(ids)
            .map(|(ancestor_kind, id)| {
                id.map(|id| ResourceLink::new(*ancestor_kind, id)).ok_or_else(|| {
                    StoreError::Corrupt(format!(
                        "{kind} {} is missing its {ancestor_kind} scope",
                        self.id
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let window = match (self.starts_at, self.ends_at) {
            (Some(starts_at), Some(ends_at)) => Some(ActiveWindow { starts_at, ends_at }),
            _ => None,
        };

        Ok(Resource {
            kind,
            id: self.id,
            ancestors,
            creator_id: self.creator_id,
            name: self.name,
            window,
        })
    }
}

/// Membership row from `organization_memberships`, `chat_memberships` or `tag_assignments`.
#[derive(Debug, Clone, FromRow)]
pub struct MembershipRow {
    pub member_id: Uuid,
    pub role: String,
}

/// Minimal user row for principal resolution.
#[derive(Debug, Clone, FromRow)]
pub struct UserRoleRow {
    pub id: Uuid,
    pub role: String,
}

impl TryFrom<UserRoleRow> for Principal {
    type Error = StoreError;

    fn try_from(row: UserRoleRow) -> Result<Self, Self::Error> {
        let global_role: Role = row
            .role
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("user {}: {e}", row.id)))?;
        Ok(Self {
            id: row.id,
            global_role,
        })
    }
}
