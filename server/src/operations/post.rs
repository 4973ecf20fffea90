//! Post, comment and vote mutations.

use agora_common::{ArgumentPath, Role};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::organization::DeleteByIdInput;
use super::{KeySource, Operation, StateCheck};
use crate::authz::graph::{ResourceKind, ScopeReach};
use crate::authz::policy::OperationPolicy;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    pub organization_id: Uuid,
    #[validate(length(min = 1, max = 2048, message = "Caption must be 1-2048 characters"))]
    pub caption: String,
    pub is_pinned: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostInput {
    pub id: Uuid,
    #[validate(length(min = 1, max = 2048, message = "Caption must be 1-2048 characters"))]
    pub caption: Option<String>,
    pub is_pinned: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    UpVote,
    DownVote,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostVoteInput {
    pub post_id: Uuid,
    #[serde(rename = "type")]
    pub vote_type: VoteType,
}

/// Sets the principal's own vote on a post. A `null` type removes it.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostVoteInput {
    pub post_id: Uuid,
    #[serde(rename = "type")]
    pub vote_type: Option<VoteType>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    pub post_id: Uuid,
    #[validate(length(min = 1, max = 2048, message = "Body must be 1-2048 characters"))]
    pub body: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentInput {
    pub id: Uuid,
    #[validate(length(min = 1, max = 2048, message = "Body must be 1-2048 characters"))]
    pub body: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentVoteInput {
    pub comment_id: Uuid,
    #[serde(rename = "type")]
    pub vote_type: VoteType,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentVoteInput {
    pub comment_id: Uuid,
    #[serde(rename = "type")]
    pub vote_type: Option<VoteType>,
}

/// Administrator-or-creator policy used by every update and delete here.
fn owned(name: &'static str) -> OperationPolicy {
    OperationPolicy::new(name, Role::Administrator, ScopeReach::Nearest).allow_creator()
}

pub(super) fn operations() -> Vec<Operation> {
    vec![
        Operation::new(
            OperationPolicy::new("createPost", Role::Regular, ScopeReach::Nearest)
                .restrict("isPinned", Role::Administrator),
        )
        .target("organizationId", ResourceKind::Organization)
        .input::<CreatePostInput>(),
        Operation::new(owned("updatePost").restrict("isPinned", Role::Administrator))
            .target("id", ResourceKind::Post)
            .input::<UpdatePostInput>(),
        Operation::new(owned("deletePost"))
            .target("id", ResourceKind::Post)
            .input::<DeleteByIdInput>(),
        Operation::new(OperationPolicy::new(
            "createPostVote",
            Role::Regular,
            ScopeReach::Nearest,
        ))
        .target("postId", ResourceKind::Post)
        .check(StateCheck::UniqueKey {
            kind: ResourceKind::PostVote,
            scope: ArgumentPath::input("postId"),
            key: KeySource::Principal,
            message: "You have already voted this post.",
        })
        .input::<CreatePostVoteInput>(),
        // Only the principal's own vote is touched, so members need nothing more.
        Operation::new(OperationPolicy::new(
            "updatePostVote",
            Role::Regular,
            ScopeReach::Nearest,
        ))
        .target("postId", ResourceKind::Post)
        .input::<UpdatePostVoteInput>(),
        Operation::new(owned("deletePostVote"))
            .target("id", ResourceKind::PostVote)
            .input::<DeleteByIdInput>(),
        Operation::new(OperationPolicy::new(
            "createComment",
            Role::Regular,
            ScopeReach::Nearest,
        ))
        .target("postId", ResourceKind::Post)
        .input::<CreateCommentInput>(),
        Operation::new(owned("updateComment"))
            .target("id", ResourceKind::Comment)
            .input::<UpdateCommentInput>(),
        Operation::new(owned("deleteComment"))
            .target("id", ResourceKind::Comment)
            .input::<DeleteByIdInput>(),
        Operation::new(OperationPolicy::new(
            "createCommentVote",
            Role::Regular,
            ScopeReach::Nearest,
        ))
        .target("commentId", ResourceKind::Comment)
        .check(StateCheck::UniqueKey {
            kind: ResourceKind::CommentVote,
            scope: ArgumentPath::input("commentId"),
            key: KeySource::Principal,
            message: "You have already voted this comment.",
        })
        .input::<CreateCommentVoteInput>(),
        Operation::new(OperationPolicy::new(
            "updateCommentVote",
            Role::Regular,
            ScopeReach::Nearest,
        ))
        .target("commentId", ResourceKind::Comment)
        .input::<UpdateCommentVoteInput>(),
        Operation::new(owned("deleteCommentVote"))
            .target("id", ResourceKind::CommentVote)
            .input::<DeleteByIdInput>(),
    ]
}
