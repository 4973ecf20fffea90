//! In-process [`ResourceStore`] backed by concurrent maps.
//!
//! Used by tests and by embedders that keep their community data in memory.
//! Membership lookups are point lookups keyed by `(principal, scope)`.

use agora_common::Role;
use dashmap::DashMap;
use uuid::Uuid;

use super::graph::{ActiveWindow, Resource, ResourceKind, ResourceLink};
use super::store::{Membership, ResourceStore, StoreError, StoreResult, UserDirectory};
use crate::auth::Principal;

#[derive(Debug, Clone)]
struct Record {
    kind: ResourceKind,
    parent: Option<Uuid>,
    creator_id: Option<Uuid>,
    name: Option<String>,
    window: Option<ActiveWindow>,
}

/// Resource to insert into a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct NewResource {
    pub kind: ResourceKind,
    pub id: Uuid,
    pub parent: Option<Uuid>,
    pub creator_id: Option<Uuid>,
    pub name: Option<String>,
    pub window: Option<ActiveWindow>,
    /// Key registered for [`ResourceStore::find_by_unique_key`] within the parent.
    pub unique_key: Option<String>,
}

impl NewResource {
    #[must_use]
    pub fn new(kind: ResourceKind, parent: Option<Uuid>) -> Self {
        Self {
            kind,
            id: Uuid::now_v7(),
            parent,
            creator_id: None,
            name: None,
            window: None,
            unique_key: None,
        }
    }

    #[must_use]
    pub fn creator(mut self, creator_id: Uuid) -> Self {
        self.creator_id = Some(creator_id);
        self
    }

    /// Set the name, which also becomes the unique key.
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self.unique_key = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn keyed(mut self, key: impl Into<String>) -> Self {
        self.unique_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn window(mut self, window: ActiveWindow) -> Self {
        self.window = Some(window);
        self
    }
}

/// Concurrent in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    resources: DashMap<Uuid, Record>,
    unique_keys: DashMap<(ResourceKind, Uuid, String), Uuid>,
    memberships: DashMap<(Uuid, Uuid), Role>,
    principals: DashMap<Uuid, Role>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with a global role.
    pub fn add_user(&self, global_role: Role) -> Principal {
        let id = Uuid::now_v7();
        self.principals.insert(id, global_role);
        self.resources.insert(
            id,
            Record {
                kind: ResourceKind::User,
                parent: None,
                creator_id: None,
                name: None,
                window: None,
            },
        );
        Principal { id, global_role }
    }

    /// Insert a resource. The parent must already exist and have the kind
    /// the scoping graph expects.
    pub fn insert(&self, resource: NewResource) -> Result<Uuid, StoreError> {
        let expected_parent = resource.kind.ancestry().first().copied();
        match (expected_parent, resource.parent) {
            (None, None) => {}
            (Some(kind), Some(parent)) => {
                let parent_kind = self.resources.get(&parent).map(|r| r.kind);
                if parent_kind != Some(kind) {
                    return Err(StoreError::Corrupt(format!(
                        "{} needs a {kind} parent",
                        resource.kind
                    )));
                }
            }
            _ => {
                return Err(StoreError::Corrupt(format!(
                    "{} has the wrong scope arity",
                    resource.kind
                )))
            }
        }

        if let (Some(key), Some(parent)) = (resource.unique_key, resource.parent) {
            self.unique_keys
                .insert((resource.kind, parent, key), resource.id);
        }
        self.resources.insert(
            resource.id,
            Record {
                kind: resource.kind,
                parent: resource.parent,
                creator_id: resource.creator_id,
                name: resource.name,
                window: resource.window,
            },
        );
        Ok(resource.id)
    }

    /// Grant `role` to `principal_id` on a membership-bearing scope.
    pub fn grant(&self, principal_id: Uuid, scope_id: Uuid, role: Role) {
        self.memberships.insert((principal_id, scope_id), role);
    }

    /// Assign tag `tag_id` to user `assignee_id`.
    pub fn assign_tag(&self, assignee_id: Uuid, tag_id: Uuid) {
        self.grant(assignee_id, tag_id, Role::None);
    }

    /// Remove a resource. Children are left dangling, as with a missing row.
    pub fn remove(&self, id: Uuid) {
        self.resources.remove(&id);
        self.principals.remove(&id);
        self.unique_keys.retain(|_, v| *v != id);
    }

    fn load(&self, kind: ResourceKind, id: Uuid) -> StoreResult<Option<Resource>> {
        let Some(record) = self.resources.get(&id).map(|r| r.clone()) else {
            return Ok(None);
        };
        if record.kind != kind {
            return Ok(None);
        }

        let mut ancestors = Vec::with_capacity(kind.ancestry().len());
        let mut next = record.parent;
        while let Some(parent_id) = next {
            // A vanished scope hides everything under it, as the joined queries do.
            let Some((parent_kind, grandparent)) =
                self.resources.get(&parent_id).map(|r| (r.kind, r.parent))
            else {
                return Ok(None);
            };
            ancestors.push(ResourceLink::new(parent_kind, parent_id));
            next = grandparent;
        }

        let resource = Resource {
            kind,
            id,
            ancestors,
            creator_id: record.creator_id,
            name: record.name,
            window: record.window,
        };
        if !resource.has_consistent_ancestry() {
            return Err(StoreError::Corrupt(format!("{kind} {id} has a broken scope chain")));
        }
        Ok(Some(resource))
    }
}

impl ResourceStore for MemoryStore {
    async fn find_by_id(&self, kind: ResourceKind, id: Uuid) -> StoreResult<Option<Resource>> {
        self.load(kind, id)
    }

    async fn find_membership(
        &self,
        principal_id: Uuid,
        scope: ResourceLink,
    ) -> StoreResult<Option<Membership>> {
        Ok(self
            .memberships
            .get(&(principal_id, scope.id))
            .map(|role| Membership {
                principal_id,
                scope,
                role: *role,
            }))
    }

    async fn find_by_unique_key(
        &self,
        kind: ResourceKind,
        scope_id: Uuid,
        key: &str,
    ) -> StoreResult<Option<Resource>> {
        let id = self
            .unique_keys
            .get(&(kind, scope_id, key.to_string()))
            .map(|id| *id);
        match id {
            Some(id) => self.load(kind, id),
            None => Ok(None),
        }
    }
}

impl UserDirectory for MemoryStore {
    async fn find_principal(&self, user_id: Uuid) -> StoreResult<Option<Principal>> {
        Ok(self.principals.get(&user_id).map(|role| Principal {
            id: user_id,
            global_role: *role,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loads_full_chain() {
        let store = MemoryStore::new();
        let org = store
            .insert(NewResource::new(ResourceKind::Organization, None))
            .unwrap();
        let chat = store
            .insert(NewResource::new(ResourceKind::Chat, Some(org)))
            .unwrap();
        let message = store
            .insert(NewResource::new(ResourceKind::ChatMessage, Some(chat)))
            .unwrap();

        let loaded = store
            .find_by_id(ResourceKind::ChatMessage, message)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            loaded.ancestors,
            vec![
                ResourceLink::new(ResourceKind::Chat, chat),
                ResourceLink::new(ResourceKind::Organization, org),
            ]
        );
    }

    #[tokio::test]
    async fn test_kind_mismatch_is_not_found() {
        let store = MemoryStore::new();
        let org = store
            .insert(NewResource::new(ResourceKind::Organization, None))
            .unwrap();
        assert!(store
            .find_by_id(ResourceKind::Chat, org)
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_insert_rejects_wrong_parent_kind() {
        let store = MemoryStore::new();
        let org = store
            .insert(NewResource::new(ResourceKind::Organization, None))
            .unwrap();
        let result = store.insert(NewResource::new(ResourceKind::ChatMessage, Some(org)));
        assert!(matches!(result, Err(StoreError::Corrupt(_))));

        let orphan = store.insert(NewResource::new(ResourceKind::Post, None));
        assert!(matches!(orphan, Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_unique_key_lookup_is_scoped() {
        let store = MemoryStore::new();
        let org_a = store
            .insert(NewResource::new(ResourceKind::Organization, None))
            .unwrap();
        let org_b = store
            .insert(NewResource::new(ResourceKind::Organization, None))
            .unwrap();
        let tag = store
            .insert(NewResource::new(ResourceKind::Tag, Some(org_a)).named("events"))
            .unwrap();

        let found = store
            .find_by_unique_key(ResourceKind::Tag, org_a, "events")
            .await
            .unwrap();
        assert_eq!(found.map(|r| r.id), Some(tag));

        let other = store
            .find_by_unique_key(ResourceKind::Tag, org_b, "events")
            .await
            .unwrap();
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn test_membership_point_lookup() {
        let store = MemoryStore::new();
        let user = store.add_user(Role::Regular);
        let org = store
            .insert(NewResource::new(ResourceKind::Organization, None))
            .unwrap();
        let scope = ResourceLink::new(ResourceKind::Organization, org);

        assert!(store.find_membership(user.id, scope).await.unwrap().is_none());
        store.grant(user.id, org, Role::Administrator);
        let membership = store.find_membership(user.id, scope).await.unwrap().unwrap();
        assert_eq!(membership.role, Role::Administrator);
    }

    #[tokio::test]
    async fn test_removed_scope_hides_children() {
        let store = MemoryStore::new();
        let org = store
            .insert(NewResource::new(ResourceKind::Organization, None))
            .unwrap();
        let chat = store
            .insert(NewResource::new(ResourceKind::Chat, Some(org)))
            .unwrap();
        store.remove(org);

        assert!(store
            .find_by_id(ResourceKind::Chat, chat)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_removed_user_is_not_a_principal() {
        let store = MemoryStore::new();
        let user = store.add_user(Role::Administrator);
        assert_eq!(store.find_principal(user.id).await.unwrap(), Some(user));
        store.remove(user.id);
        assert!(store.find_principal(user.id).await.unwrap().is_none());
    }
}
