//! Existence resolution for every resource a request references.
//!
//! All lookups are issued together and awaited together. A miss never stops
//! another lookup, so the report always carries every missing path.

use std::collections::BTreeMap;

use agora_common::ArgumentPath;
use futures::future::join_all;
use uuid::Uuid;

use super::graph::{Resource, ResourceLink};
use super::store::{ResourceStore, StoreResult};

/// One referenced resource, named by the argument that carried its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub path: ArgumentPath,
    pub link: ResourceLink,
}

/// Outcome of resolving a request's references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistenceReport {
    pub found: BTreeMap<ArgumentPath, Resource>,
    /// Missing argument paths, in declaration order.
    pub missing: Vec<ArgumentPath>,
}

impl ExistenceReport {
    #[must_use]
    pub fn get(&self, path: &ArgumentPath) -> Option<&Resource> {
        self.found.get(path)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Resolve every lookup concurrently.
///
/// Store failures are reported only after all lookups have finished; the
/// first failure in declaration order wins.
#[tracing::instrument(skip_all, fields(lookups = lookups.len()))]
pub async fn resolve_all<S: ResourceStore>(
    store: &S,
    lookups: &[Lookup],
) -> StoreResult<ExistenceReport> {
    let results = join_all(
        lookups
            .iter()
            .map(|lookup| store.find_by_id(lookup.link.kind, lookup.link.id)),
    )
    .await;

    let mut report = ExistenceReport::default();
    for (lookup, result) in lookups.iter().zip(results) {
        match result? {
            Some(resource) => {
                report.found.insert(lookup.path.clone(), resource);
            }
            None => report.missing.push(lookup.path.clone()),
        }
    }
    Ok(report)
}

/// A membership that must exist for the request to make sense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipLookup {
    pub scope_path: ArgumentPath,
    pub member_path: ArgumentPath,
    pub scope: ResourceLink,
    pub member_id: Uuid,
}

/// Check required memberships concurrently.
///
/// Returns the scope and member paths of every absent membership.
#[tracing::instrument(skip_all, fields(lookups = lookups.len()))]
pub async fn missing_memberships<S: ResourceStore>(
    store: &S,
    lookups: &[MembershipLookup],
) -> StoreResult<Vec<ArgumentPath>> {
    let results = join_all(
        lookups
            .iter()
            .map(|lookup| store.find_membership(lookup.member_id, lookup.scope)),
    )
    .await;

    let mut missing = Vec::new();
    for (lookup, result) in lookups.iter().zip(results) {
        if result?.is_none() {
            missing.push(lookup.scope_path.clone());
            missing.push(lookup.member_path.clone());
        }
    }
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::graph::ResourceKind;
    use crate::authz::memory::{MemoryStore, NewResource};
    use agora_common::Role;

    fn lookup(field: &str, kind: ResourceKind, id: Uuid) -> Lookup {
        Lookup {
            path: ArgumentPath::input(field),
            link: ResourceLink::new(kind, id),
        }
    }

    #[tokio::test]
    async fn test_all_found() {
        let store = MemoryStore::new();
        let member = store.add_user(Role::Regular);
        let org = store
            .insert(NewResource::new(ResourceKind::Organization, None))
            .unwrap();
        let chat = store
            .insert(NewResource::new(ResourceKind::Chat, Some(org)))
            .unwrap();

        let report = resolve_all(
            &store,
            &[
                lookup("chatId", ResourceKind::Chat, chat),
                lookup("memberId", ResourceKind::User, member.id),
            ],
        )
        .await
        .unwrap();

        assert!(report.is_complete());
        assert_eq!(
            report.get(&ArgumentPath::input("chatId")).map(|r| r.id),
            Some(chat)
        );
    }

    #[tokio::test]
    async fn test_single_miss_reports_only_that_path() {
        let store = MemoryStore::new();
        let org = store
            .insert(NewResource::new(ResourceKind::Organization, None))
            .unwrap();
        let chat = store
            .insert(NewResource::new(ResourceKind::Chat, Some(org)))
            .unwrap();

        let report = resolve_all(
            &store,
            &[
                lookup("chatId", ResourceKind::Chat, chat),
                lookup("memberId", ResourceKind::User, Uuid::new_v4()),
            ],
        )
        .await
        .unwrap();

        assert_eq!(report.missing, vec![ArgumentPath::input("memberId")]);
    }

    #[tokio::test]
    async fn test_every_miss_is_reported() {
        let store = MemoryStore::new();
        let report = resolve_all(
            &store,
            &[
                lookup("chatId", ResourceKind::Chat, Uuid::new_v4()),
                lookup("memberId", ResourceKind::User, Uuid::new_v4()),
            ],
        )
        .await
        .unwrap();

        assert_eq!(
            report.missing,
            vec![ArgumentPath::input("chatId"), ArgumentPath::input("memberId")]
        );
        assert!(report.found.is_empty());
    }

    #[tokio::test]
    async fn test_missing_membership_reports_both_paths() {
        let store = MemoryStore::new();
        let member = store.add_user(Role::Regular);
        let org = store
            .insert(NewResource::new(ResourceKind::Organization, None))
            .unwrap();
        let chat = store
            .insert(NewResource::new(ResourceKind::Chat, Some(org)))
            .unwrap();

        let required = MembershipLookup {
            scope_path: ArgumentPath::input("chatId"),
            member_path: ArgumentPath::input("memberId"),
            scope: ResourceLink::new(ResourceKind::Chat, chat),
            member_id: member.id,
        };

        let missing = missing_memberships(&store, std::slice::from_ref(&required))
            .await
            .unwrap();
        assert_eq!(
            missing,
            vec![ArgumentPath::input("chatId"), ArgumentPath::input("memberId")]
        );

        store.grant(member.id, chat, Role::Regular);
        let missing = missing_memberships(&store, &[required]).await.unwrap();
        assert!(missing.is_empty());
    }
}
