//! Resource scoping graph.
//!
//! Every resource kind has a fixed chain of scoping ancestors:
//! - organization -> chat -> chat message
//! - organization -> post -> comment (and votes on both)
//! - organization -> fund -> fund campaign -> pledge
//! - organization -> tag, tag folder
//!
//! Only organizations and chats carry role memberships, so a resource's
//! effective role is decided by the membership-bearing entries of its chain.
//! Tag assignments are stored as roleless memberships on the tag.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of resources an operation can target or reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    User,
    Organization,
    Chat,
    ChatMessage,
    Post,
    Comment,
    PostVote,
    CommentVote,
    Fund,
    FundCampaign,
    FundCampaignPledge,
    Tag,
    TagFolder,
    Advertisement,
}

impl ResourceKind {
    /// Scoping ancestors of this kind, nearest first.
    #[must_use]
    pub const fn ancestry(self) -> &'static [Self] {
        match self {
            Self::User | Self::Organization => &[],
            Self::Chat
            | Self::Post
            | Self::Fund
            | Self::Tag
            | Self::TagFolder
            | Self::Advertisement => &[Self::Organization],
            Self::ChatMessage => &[Self::Chat, Self::Organization],
            Self::Comment => &[Self::Post, Self::Organization],
            Self::PostVote => &[Self::Post, Self::Organization],
            Self::CommentVote => &[Self::Comment, Self::Post, Self::Organization],
            Self::FundCampaign => &[Self::Fund, Self::Organization],
            Self::FundCampaignPledge => &[Self::FundCampaign, Self::Fund, Self::Organization],
        }
    }

    /// Whether memberships are granted directly on this kind.
    #[must_use]
    pub const fn holds_memberships(self) -> bool {
        matches!(self, Self::Organization | Self::Chat)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Organization => "organization",
            Self::Chat => "chat",
            Self::ChatMessage => "chatMessage",
            Self::Post => "post",
            Self::Comment => "comment",
            Self::PostVote => "postVote",
            Self::CommentVote => "commentVote",
            Self::Fund => "fund",
            Self::FundCampaign => "fundCampaign",
            Self::FundCampaignPledge => "fundCampaignPledge",
            Self::Tag => "tag",
            Self::TagFolder => "tagFolder",
            Self::Advertisement => "advertisement",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed reference to a stored resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceLink {
    pub kind: ResourceKind,
    pub id: Uuid,
}

impl ResourceLink {
    #[must_use]
    pub const fn new(kind: ResourceKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

/// Which membership scopes count towards an operation's effective role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScopeReach {
    /// Only the global role counts.
    Global,
    /// The nearest membership-bearing scope.
    Nearest,
    /// Every membership-bearing scope; the highest role wins.
    Chain,
}

impl ScopeReach {
    /// Select the scopes to consult from a resource's membership scopes.
    #[must_use]
    pub fn select(self, scopes: &[ResourceLink]) -> &[ResourceLink] {
        match self {
            Self::Global => &[],
            Self::Nearest => &scopes[..scopes.len().min(1)],
            Self::Chain => scopes,
        }
    }
}

/// Time window during which a resource accepts contributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveWindow {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Where `now` falls relative to an [`ActiveWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    NotStarted,
    Open,
    Ended,
}

impl ActiveWindow {
    #[must_use]
    pub fn state_at(&self, now: DateTime<Utc>) -> WindowState {
        if now < self.starts_at {
            WindowState::NotStarted
        } else if now > self.ends_at {
            WindowState::Ended
        } else {
            WindowState::Open
        }
    }
}

/// A loaded resource together with its scoping chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub kind: ResourceKind,
    pub id: Uuid,
    /// Scoping ancestors, nearest first. Kinds follow [`ResourceKind::ancestry`].
    pub ancestors: Vec<ResourceLink>,
    /// Owner for creator exceptions. For pledges this is the pledger.
    pub creator_id: Option<Uuid>,
    pub name: Option<String>,
    pub window: Option<ActiveWindow>,
}

impl Resource {
    /// Resource with no ancestors or attributes.
    #[must_use]
    pub const fn root(kind: ResourceKind, id: Uuid) -> Self {
        Self {
            kind,
            id,
            ancestors: Vec::new(),
            creator_id: None,
            name: None,
            window: None,
        }
    }

    #[must_use]
    pub const fn link(&self) -> ResourceLink {
        ResourceLink::new(self.kind, self.id)
    }

    /// The nearest scoping ancestor.
    #[must_use]
    pub fn parent(&self) -> Option<ResourceLink> {
        self.ancestors.first().copied()
    }

    /// The ancestor of the given kind, if it is part of the chain.
    #[must_use]
    pub fn ancestor(&self, kind: ResourceKind) -> Option<ResourceLink> {
        self.ancestors.iter().copied().find(|a| a.kind == kind)
    }

    /// Membership-bearing scopes for this resource, nearest first.
    ///
    /// Includes the resource itself when memberships are granted on it.
    #[must_use]
    pub fn membership_scopes(&self) -> Vec<ResourceLink> {
        std::iter::once(self.link())
            .chain(self.ancestors.iter().copied())
            .filter(|link| link.kind.holds_memberships())
            .collect()
    }

    /// Check that the loaded chain matches the static graph.
    #[must_use]
    pub fn has_consistent_ancestry(&self) -> bool {
        let expected = self.kind.ancestry();
        self.ancestors.len() == expected.len()
            && self
                .ancestors
                .iter()
                .zip(expected)
                .all(|(link, kind)| link.kind == *kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(kind: ResourceKind) -> Resource {
        Resource {
            ancestors: kind
                .ancestry()
                .iter()
                .map(|k| ResourceLink::new(*k, Uuid::new_v4()))
                .collect(),
            ..Resource::root(kind, Uuid::new_v4())
        }
    }

    #[test]
    fn test_ancestry_depth_never_exceeds_three() {
        for kind in [
            ResourceKind::User,
            ResourceKind::Organization,
            ResourceKind::Chat,
            ResourceKind::ChatMessage,
            ResourceKind::Post,
            ResourceKind::Comment,
            ResourceKind::PostVote,
            ResourceKind::CommentVote,
            ResourceKind::Fund,
            ResourceKind::FundCampaign,
            ResourceKind::FundCampaignPledge,
            ResourceKind::Tag,
            ResourceKind::TagFolder,
            ResourceKind::Advertisement,
        ] {
            assert!(kind.ancestry().len() <= 3, "{kind} is too deep");
            assert!(!kind.ancestry().contains(&kind));
        }
    }

    #[test]
    fn test_chat_message_scopes_are_chat_then_organization() {
        let message = chain(ResourceKind::ChatMessage);
        let scopes = message.membership_scopes();
        assert_eq!(scopes.len(), 2);
        assert_eq!(scopes[0].kind, ResourceKind::Chat);
        assert_eq!(scopes[1].kind, ResourceKind::Organization);
    }

    #[test]
    fn test_chat_is_its_own_nearest_scope() {
        let chat = chain(ResourceKind::Chat);
        let scopes = chat.membership_scopes();
        assert_eq!(scopes[0], chat.link());
        assert_eq!(scopes[1].kind, ResourceKind::Organization);
    }

    #[test]
    fn test_comment_is_scoped_by_organization_only() {
        let comment = chain(ResourceKind::Comment);
        let scopes = comment.membership_scopes();
        assert_eq!(scopes.len(), 1);
        assert_eq!(scopes[0].kind, ResourceKind::Organization);
        assert_eq!(comment.parent().map(|p| p.kind), Some(ResourceKind::Post));
    }

    #[test]
    fn test_scope_reach_selection() {
        let message = chain(ResourceKind::ChatMessage);
        let scopes = message.membership_scopes();
        assert!(ScopeReach::Global.select(&scopes).is_empty());
        assert_eq!(ScopeReach::Nearest.select(&scopes), &scopes[..1]);
        assert_eq!(ScopeReach::Chain.select(&scopes), &scopes[..]);
        assert!(ScopeReach::Nearest.select(&[]).is_empty());
    }

    #[test]
    fn test_users_have_no_scopes() {
        assert!(chain(ResourceKind::User).membership_scopes().is_empty());
    }

    #[test]
    fn test_consistent_ancestry() {
        let pledge = chain(ResourceKind::FundCampaignPledge);
        assert!(pledge.has_consistent_ancestry());

        let broken = Resource {
            ancestors: vec![ResourceLink::new(ResourceKind::Organization, Uuid::new_v4())],
            ..pledge
        };
        assert!(!broken.has_consistent_ancestry());
    }

    #[test]
    fn test_window_state() {
        let now = Utc::now();
        let window = ActiveWindow {
            starts_at: now - chrono::Duration::days(1),
            ends_at: now + chrono::Duration::days(1),
        };
        assert_eq!(window.state_at(now), WindowState::Open);
        assert_eq!(
            window.state_at(now - chrono::Duration::days(2)),
            WindowState::NotStarted
        );
        assert_eq!(
            window.state_at(now + chrono::Duration::days(2)),
            WindowState::Ended
        );
    }
}
