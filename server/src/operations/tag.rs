//! Tag, tag folder and tag assignment mutations.

use agora_common::{ArgumentPath, Role};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::organization::DeleteByIdInput;
use super::{Operation, ScopeSource, StateCheck};
use crate::authz::graph::{ResourceKind, ScopeReach};
use crate::authz::policy::OperationPolicy;

const FOLDER_ELSEWHERE: &str = "This tag folder does not belong to the associated organization.";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagInput {
    pub organization_id: Uuid,
    #[validate(length(min = 1, max = 256, message = "Name must be 1-256 characters"))]
    pub name: String,
    pub folder_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTagInput {
    pub id: Uuid,
    #[validate(length(min = 1, max = 256, message = "Name must be 1-256 characters"))]
    pub name: Option<String>,
    pub folder_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagFolderInput {
    pub organization_id: Uuid,
    #[validate(length(min = 1, max = 256, message = "Name must be 1-256 characters"))]
    pub name: String,
    pub parent_folder_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTagFolderInput {
    pub id: Uuid,
    #[validate(length(min = 1, max = 256, message = "Name must be 1-256 characters"))]
    pub name: Option<String>,
    pub parent_folder_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TagAssignmentInput {
    pub tag_id: Uuid,
    pub assignee_id: Uuid,
}

fn administered(name: &'static str) -> OperationPolicy {
    OperationPolicy::new(name, Role::Administrator, ScopeReach::Nearest)
}

/// The folder at `field` must sit in the same organization as the scope.
fn folder_in(field: &str, scope: ScopeSource) -> StateCheck {
    StateCheck::SameParent {
        resource: ArgumentPath::input(field),
        scope,
        message: FOLDER_ELSEWHERE,
    }
}

pub(super) fn operations() -> Vec<Operation> {
    vec![
        Operation::new(administered("createTag"))
            .target("organizationId", ResourceKind::Organization)
            .optional_reference("folderId", ResourceKind::TagFolder)
            .check(StateCheck::UniqueName {
                kind: ResourceKind::Tag,
                scope: ScopeSource::Resource(ArgumentPath::input("organizationId")),
                name: ArgumentPath::input("name"),
            })
            .check(folder_in(
                "folderId",
                ScopeSource::Resource(ArgumentPath::input("organizationId")),
            ))
            .input::<CreateTagInput>(),
        Operation::new(administered("updateTag"))
            .target("id", ResourceKind::Tag)
            .optional_reference("folderId", ResourceKind::TagFolder)
            .check(StateCheck::UniqueName {
                kind: ResourceKind::Tag,
                scope: ScopeSource::ParentOf(ArgumentPath::input("id")),
                name: ArgumentPath::input("name"),
            })
            .check(folder_in("folderId", ScopeSource::ParentOf(ArgumentPath::input("id"))))
            .input::<UpdateTagInput>(),
        Operation::new(administered("deleteTag"))
            .target("id", ResourceKind::Tag)
            .input::<DeleteByIdInput>(),
        Operation::new(administered("createTagFolder"))
            .target("organizationId", ResourceKind::Organization)
            .optional_reference("parentFolderId", ResourceKind::TagFolder)
            .check(StateCheck::UniqueName {
                kind: ResourceKind::TagFolder,
                scope: ScopeSource::Resource(ArgumentPath::input("organizationId")),
                name: ArgumentPath::input("name"),
            })
            .check(folder_in(
                "parentFolderId",
                ScopeSource::Resource(ArgumentPath::input("organizationId")),
            ))
            .input::<CreateTagFolderInput>(),
        Operation::new(administered("updateTagFolder"))
            .target("id", ResourceKind::TagFolder)
            .optional_reference("parentFolderId", ResourceKind::TagFolder)
            .check(StateCheck::UniqueName {
                kind: ResourceKind::TagFolder,
                scope: ScopeSource::ParentOf(ArgumentPath::input("id")),
                name: ArgumentPath::input("name"),
            })
            .check(folder_in(
                "parentFolderId",
                ScopeSource::ParentOf(ArgumentPath::input("id")),
            ))
            .input::<UpdateTagFolderInput>(),
        Operation::new(administered("deleteTagFolder"))
            .target("id", ResourceKind::TagFolder)
            .input::<DeleteByIdInput>(),
        Operation::new(administered("assignUserTag"))
            .target("tagId", ResourceKind::Tag)
            .reference("assigneeId", ResourceKind::User)
            .check(StateCheck::NotMember {
                scope: ArgumentPath::input("tagId"),
                member: ArgumentPath::input("assigneeId"),
            })
            .input::<TagAssignmentInput>(),
        Operation::new(administered("unassignUserTag"))
            .target("tagId", ResourceKind::Tag)
            .reference("assigneeId", ResourceKind::User)
            .membership("tagId", "assigneeId")
            .input::<TagAssignmentInput>(),
    ]
}
