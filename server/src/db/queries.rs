//! Database Queries
//!
//! Runtime queries (no compile-time `DATABASE_URL` required).
//!
//! All query functions include error context logging to aid debugging.

use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use super::models::{MembershipRow, ResourceRow, UserRoleRow};
use crate::auth::Principal;
use crate::authz::{
    Membership, Resource, ResourceKind, ResourceLink, ResourceStore, StoreError, StoreResult,
    UserDirectory,
};

/// Log and return a database error with context.
///
/// This helper ensures all database errors are logged with relevant context
/// before being propagated, making production debugging easier.
macro_rules! db_error {
    ($query:expr, $($field:tt)*) => {
        |e| {
            error!(query = $query, $($field)*, error = %e, "Database query failed");
            e
        }
    };
}

/// `PostgreSQL`-backed [`ResourceStore`] and [`UserDirectory`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ============================================================================
// Resource Queries
// ============================================================================

/// Select statement loading one resource of `kind` with its ancestor ids.
const fn resource_query(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::User => {
            r"
            SELECT u.id, NULL::uuid AS creator_id, u.name,
                   NULL::timestamptz AS starts_at, NULL::timestamptz AS ends_at,
                   NULL::uuid AS ancestor_1, NULL::uuid AS ancestor_2, NULL::uuid AS ancestor_3
            FROM users u
            WHERE u.id = $1
            "
        }
        ResourceKind::Organization => {
            r"
            SELECT o.id, o.creator_id, o.name,
                   NULL::timestamptz AS starts_at, NULL::timestamptz AS ends_at,
                   NULL::uuid AS ancestor_1, NULL::uuid AS ancestor_2, NULL::uuid AS ancestor_3
            FROM organizations o
            WHERE o.id = $1
            "
        }
        ResourceKind::Chat => {
            r"
            SELECT c.id, c.creator_id, c.name,
                   NULL::timestamptz AS starts_at, NULL::timestamptz AS ends_at,
                   c.organization_id AS ancestor_1, NULL::uuid AS ancestor_2, NULL::uuid AS ancestor_3
            FROM chats c
            WHERE c.id = $1
            "
        }
        ResourceKind::ChatMessage => {
            r"
            SELECT m.id, m.creator_id, NULL::text AS name,
                   NULL::timestamptz AS starts_at, NULL::timestamptz AS ends_at,
                   c.id AS ancestor_1, c.organization_id AS ancestor_2, NULL::uuid AS ancestor_3
            FROM chat_messages m
            INNER JOIN chats c ON c.id = m.chat_id
            WHERE m.id = $1
            "
        }
        ResourceKind::Post => {
            r"
            SELECT p.id, p.creator_id, NULL::text AS name,
                   NULL::timestamptz AS starts_at, NULL::timestamptz AS ends_at,
                   p.organization_id AS ancestor_1, NULL::uuid AS ancestor_2, NULL::uuid AS ancestor_3
            FROM posts p
            WHERE p.id = $1
            "
        }
        ResourceKind::Comment => {
            r"
            SELECT c.id, c.creator_id, NULL::text AS name,
                   NULL::timestamptz AS starts_at, NULL::timestamptz AS ends_at,
                   p.id AS ancestor_1, p.organization_id AS ancestor_2, NULL::uuid AS ancestor_3
            FROM comments c
            INNER JOIN posts p ON p.id = c.post_id
            WHERE c.id = $1
            "
        }
        ResourceKind::PostVote => {
            r"
            SELECT v.id, v.creator_id, NULL::text AS name,
                   NULL::timestamptz AS starts_at, NULL::timestamptz AS ends_at,
                   p.id AS ancestor_1, p.organization_id AS ancestor_2, NULL::uuid AS ancestor_3
            FROM post_votes v
            INNER JOIN posts p ON p.id = v.post_id
            WHERE v.id = $1
            "
        }
        ResourceKind::CommentVote => {
            r"
            SELECT v.id, v.creator_id, NULL::text AS name,
                   NULL::timestamptz AS starts_at, NULL::timestamptz AS ends_at,
                   c.id AS ancestor_1, p.id AS ancestor_2, p.organization_id AS ancestor_3
            FROM comment_votes v
            INNER JOIN comments c ON c.id = v.comment_id
            INNER JOIN posts p ON p.id = c.post_id
            WHERE v.id = $1
            "
        }
        ResourceKind::Fund => {
            r"
            SELECT f.id, f.creator_id, f.name,
                   NULL::timestamptz AS starts_at, NULL::timestamptz AS ends_at,
                   f.organization_id AS ancestor_1, NULL::uuid AS ancestor_2, NULL::uuid AS ancestor_3
            FROM funds f
            WHERE f.id = $1
            "
        }
        ResourceKind::FundCampaign => {
            r"
            SELECT fc.id, fc.creator_id, fc.name,
                   fc.start_at AS starts_at, fc.end_at AS ends_at,
                   f.id AS ancestor_1, f.organization_id AS ancestor_2, NULL::uuid AS ancestor_3
            FROM fund_campaigns fc
            INNER JOIN funds f ON f.id = fc.fund_id
            WHERE fc.id = $1
            "
        }
        ResourceKind::FundCampaignPledge => {
            r"
            SELECT pl.id, pl.pledger_id AS creator_id, NULL::text AS name,
                   NULL::timestamptz AS starts_at, NULL::timestamptz AS ends_at,
                   fc.id AS ancestor_1, f.id AS ancestor_2, f.organization_id AS ancestor_3
            FROM fund_campaign_pledges pl
            INNER JOIN fund_campaigns fc ON fc.id = pl.campaign_id
            INNER JOIN funds f ON f.id = fc.fund_id
            WHERE pl.id = $1
            "
        }
        ResourceKind::Tag => {
            r"
            SELECT t.id, t.creator_id, t.name,
                   NULL::timestamptz AS starts_at, NULL::timestamptz AS ends_at,
                   t.organization_id AS ancestor_1, NULL::uuid AS ancestor_2, NULL::uuid AS ancestor_3
            FROM tags t
            WHERE t.id = $1
            "
        }
        ResourceKind::TagFolder => {
            r"
            SELECT tf.id, tf.creator_id, tf.name,
                   NULL::timestamptz AS starts_at, NULL::timestamptz AS ends_at,
                   tf.organization_id AS ancestor_1, NULL::uuid AS ancestor_2, NULL::uuid AS ancestor_3
            FROM tag_folders tf
            WHERE tf.id = $1
            "
        }
        ResourceKind::Advertisement => {
            r"
            SELECT a.id, a.creator_id, a.name,
                   NULL::timestamptz AS starts_at, NULL::timestamptz AS ends_at,
                   a.organization_id AS ancestor_1, NULL::uuid AS ancestor_2, NULL::uuid AS ancestor_3
            FROM advertisements a
            WHERE a.id = $1
            "
        }
    }
}

/// Select statement returning the id holding a unique key within a scope.
const fn unique_key_query(kind: ResourceKind) -> Option<&'static str> {
    match kind {
        ResourceKind::Chat => Some("SELECT id FROM chats WHERE organization_id = $1 AND name = $2"),
        ResourceKind::Fund => Some("SELECT id FROM funds WHERE organization_id = $1 AND name = $2"),
        ResourceKind::FundCampaign => {
            Some("SELECT id FROM fund_campaigns WHERE fund_id = $1 AND name = $2")
        }
        ResourceKind::Tag => Some("SELECT id FROM tags WHERE organization_id = $1 AND name = $2"),
        ResourceKind::TagFolder => {
            Some("SELECT id FROM tag_folders WHERE organization_id = $1 AND name = $2")
        }
        ResourceKind::Advertisement => {
            Some("SELECT id FROM advertisements WHERE organization_id = $1 AND name = $2")
        }
        ResourceKind::PostVote => {
            Some("SELECT id FROM post_votes WHERE post_id = $1 AND creator_id::text = $2")
        }
        ResourceKind::CommentVote => {
            Some("SELECT id FROM comment_votes WHERE comment_id = $1 AND creator_id::text = $2")
        }
        ResourceKind::FundCampaignPledge => Some(
            "SELECT id FROM fund_campaign_pledges WHERE campaign_id = $1 AND pledger_id::text = $2",
        ),
        _ => None,
    }
}

/// Select statement for a principal's membership on a scope.
const fn membership_query(kind: ResourceKind) -> Option<&'static str> {
    match kind {
        ResourceKind::Organization => Some(
            "SELECT member_id, role FROM organization_memberships WHERE organization_id = $1 AND member_id = $2",
        ),
        ResourceKind::Chat => Some(
            "SELECT member_id, role FROM chat_memberships WHERE chat_id = $1 AND member_id = $2",
        ),
        ResourceKind::Tag => Some(
            "SELECT assignee_id AS member_id, 'none' AS role FROM tag_assignments WHERE tag_id = $1 AND assignee_id = $2",
        ),
        _ => None,
    }
}

impl ResourceStore for PgStore {
    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, kind: ResourceKind, id: Uuid) -> StoreResult<Option<Resource>> {
        let row = sqlx::query_as::<_, ResourceRow>(resource_query(kind))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error!("find_by_id", kind = %kind, id = %id))?;

        row.map(|r| r.into_resource(kind)).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn find_membership(
        &self,
        principal_id: Uuid,
        scope: ResourceLink,
    ) -> StoreResult<Option<Membership>> {
        let Some(query) = membership_query(scope.kind) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, MembershipRow>(query)
            .bind(scope.id)
            .bind(principal_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error!("find_membership", scope = %scope.id, principal = %principal_id))?;

        row.map(|r| {
            let role = r
                .role
                .parse()
                .map_err(|e| StoreError::Corrupt(format!("{} membership: {e}", scope.kind)))?;
            Ok(Membership {
                principal_id: r.member_id,
                scope,
                role,
            })
        })
        .transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_unique_key(
        &self,
        kind: ResourceKind,
        scope_id: Uuid,
        key: &str,
    ) -> StoreResult<Option<Resource>> {
        let query = unique_key_query(kind).ok_or(StoreError::Unsupported(kind))?;

        let id: Option<(Uuid,)> = sqlx::query_as(query)
            .bind(scope_id)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error!("find_by_unique_key", kind = %kind, scope = %scope_id))?;

        match id {
            Some((id,)) => self.find_by_id(kind, id).await,
            None => Ok(None),
        }
    }
}

// ============================================================================
// User Queries
// ============================================================================

impl UserDirectory for PgStore {
    #[tracing::instrument(skip(self))]
    async fn find_principal(&self, user_id: Uuid) -> StoreResult<Option<Principal>> {
        let row = sqlx::query_as::<_, UserRoleRow>("SELECT id, role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error!("find_principal", user_id = %user_id))?;

        row.map(Principal::try_from).transpose()
    }
}
