//! Chat, chat membership and chat message mutations.
//!
//! Chats carry their own memberships, so chat operations consult both the
//! chat and its organization and take the higher role.

use agora_common::{ArgumentPath, Role};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::organization::{membership_role, DeleteByIdInput};
use super::{Operation, ScopeSource, StateCheck};
use crate::authz::graph::{ResourceKind, ScopeReach};
use crate::authz::policy::OperationPolicy;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatInput {
    pub organization_id: Uuid,
    #[validate(length(min = 1, max = 256, message = "Name must be 1-256 characters"))]
    pub name: String,
    #[validate(length(max = 2048))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChatInput {
    pub id: Uuid,
    #[validate(length(min = 1, max = 256, message = "Name must be 1-256 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 2048))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatMembershipInput {
    pub chat_id: Uuid,
    pub member_id: Uuid,
    #[validate(custom(function = "membership_role"))]
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChatMembershipInput {
    pub chat_id: Uuid,
    pub member_id: Uuid,
    #[validate(custom(function = "membership_role"))]
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteChatMembershipInput {
    pub chat_id: Uuid,
    pub member_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatMessageInput {
    pub chat_id: Uuid,
    pub parent_message_id: Option<Uuid>,
    #[validate(length(min = 1, max = 2048, message = "Body must be 1-2048 characters"))]
    pub body: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChatMessageInput {
    pub id: Uuid,
    #[validate(length(min = 1, max = 2048, message = "Body must be 1-2048 characters"))]
    pub body: String,
}

pub(super) fn operations() -> Vec<Operation> {
    vec![
        Operation::new(OperationPolicy::new(
            "createChat",
            Role::Regular,
            ScopeReach::Nearest,
        ))
        .target("organizationId", ResourceKind::Organization)
        .check(StateCheck::UniqueName {
            kind: ResourceKind::Chat,
            scope: ScopeSource::Resource(ArgumentPath::input("organizationId")),
            name: ArgumentPath::input("name"),
        })
        .input::<CreateChatInput>(),
        Operation::new(OperationPolicy::new(
            "updateChat",
            Role::Administrator,
            ScopeReach::Chain,
        ))
        .target("id", ResourceKind::Chat)
        .check(StateCheck::UniqueName {
            kind: ResourceKind::Chat,
            scope: ScopeSource::ParentOf(ArgumentPath::input("id")),
            name: ArgumentPath::input("name"),
        })
        .input::<UpdateChatInput>(),
        Operation::new(OperationPolicy::new(
            "deleteChat",
            Role::Administrator,
            ScopeReach::Chain,
        ))
        .target("id", ResourceKind::Chat)
        .input::<DeleteByIdInput>(),
        // Members may add themselves; only administrators pick the role.
        Operation::new(
            OperationPolicy::new("createChatMembership", Role::Regular, ScopeReach::Chain)
                .allow_subject("memberId")
                .restrict("role", Role::Administrator),
        )
        .target("chatId", ResourceKind::Chat)
        .reference("memberId", ResourceKind::User)
        .check(StateCheck::NotMember {
            scope: ArgumentPath::input("chatId"),
            member: ArgumentPath::input("memberId"),
        })
        .input::<CreateChatMembershipInput>(),
        Operation::new(OperationPolicy::new(
            "updateChatMembership",
            Role::Administrator,
            ScopeReach::Chain,
        ))
        .target("chatId", ResourceKind::Chat)
        .reference("memberId", ResourceKind::User)
        .membership("chatId", "memberId")
        .input::<UpdateChatMembershipInput>(),
        Operation::new(
            OperationPolicy::new("deleteChatMembership", Role::Administrator, ScopeReach::Chain)
                .allow_subject("memberId"),
        )
        .target("chatId", ResourceKind::Chat)
        .reference("memberId", ResourceKind::User)
        .membership("chatId", "memberId")
        .input::<DeleteChatMembershipInput>(),
        Operation::new(OperationPolicy::new(
            "createChatMessage",
            Role::Regular,
            ScopeReach::Chain,
        ))
        .target("chatId", ResourceKind::Chat)
        .optional_reference("parentMessageId", ResourceKind::ChatMessage)
        .check(StateCheck::SameParent {
            resource: ArgumentPath::input("parentMessageId"),
            scope: ScopeSource::Resource(ArgumentPath::input("chatId")),
            message: "This message does not belong to the associated chat.",
        })
        .input::<CreateChatMessageInput>(),
        Operation::new(
            OperationPolicy::new("updateChatMessage", Role::Administrator, ScopeReach::Chain)
                .allow_creator(),
        )
        .target("id", ResourceKind::ChatMessage)
        .input::<UpdateChatMessageInput>(),
        Operation::new(
            OperationPolicy::new("deleteChatMessage", Role::Administrator, ScopeReach::Chain)
                .allow_creator(),
        )
        .target("id", ResourceKind::ChatMessage)
        .input::<DeleteByIdInput>(),
    ]
}
