//! Effective role resolution.
//!
//! A global administrator is an administrator everywhere, with or without
//! scoped memberships. Anyone else gets the highest role among the scopes the
//! operation's [`ScopeReach`] selects, or [`Role::None`].
//!
//! Whether the principal created the target is not a role; the policy
//! evaluates it separately.

use agora_common::Role;
use futures::future::join_all;

use super::graph::{Resource, ScopeReach};
use super::store::{ResourceStore, StoreResult};
use crate::auth::Principal;

/// Combine the global role with the scoped membership roles found.
#[must_use]
pub fn combine<I>(global_role: Role, scoped: I) -> Role
where
    I: IntoIterator<Item = Option<Role>>,
{
    if global_role == Role::Administrator {
        return Role::Administrator;
    }
    scoped.into_iter().flatten().max().unwrap_or_default()
}

/// Effective role of `principal` for `target`.
///
/// Operations without a target (e.g. creating an organization) are decided by
/// the global role alone.
#[tracing::instrument(skip_all, fields(principal = %principal.id, ?reach))]
pub async fn effective_role<S: ResourceStore>(
    store: &S,
    principal: &Principal,
    target: Option<&Resource>,
    reach: ScopeReach,
) -> StoreResult<Role> {
    if principal.is_administrator() {
        return Ok(Role::Administrator);
    }
    let Some(target) = target else {
        return Ok(combine(principal.global_role, std::iter::empty()));
    };

    let scopes = target.membership_scopes();
    let results = join_all(
        reach
            .select(&scopes)
            .iter()
            .map(|scope| store.find_membership(principal.id, *scope)),
    )
    .await;

    let mut roles = Vec::with_capacity(results.len());
    for result in results {
        roles.push(result?.map(|membership| membership.role));
    }
    Ok(combine(principal.global_role, roles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::graph::ResourceKind;
    use crate::authz::memory::{MemoryStore, NewResource};

    #[test]
    fn test_combine_administrator_short_circuits() {
        assert_eq!(combine(Role::Administrator, std::iter::empty()), Role::Administrator);
        assert_eq!(
            combine(Role::Administrator, [Some(Role::Regular)]),
            Role::Administrator
        );
    }

    #[test]
    fn test_combine_highest_scoped_role_wins() {
        assert_eq!(
            combine(Role::Regular, [Some(Role::Regular), Some(Role::Administrator)]),
            Role::Administrator
        );
        assert_eq!(combine(Role::Regular, [None, Some(Role::Regular)]), Role::Regular);
    }

    #[test]
    fn test_combine_global_regular_is_not_a_membership() {
        assert_eq!(combine(Role::Regular, [None, None]), Role::None);
        assert_eq!(combine(Role::Regular, std::iter::empty()), Role::None);
    }

    struct Fixture {
        store: MemoryStore,
        org: uuid::Uuid,
        chat: uuid::Uuid,
        message: Resource,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let org = store
            .insert(NewResource::new(ResourceKind::Organization, None))
            .unwrap();
        let chat = store
            .insert(NewResource::new(ResourceKind::Chat, Some(org)))
            .unwrap();
        let message_id = store
            .insert(NewResource::new(ResourceKind::ChatMessage, Some(chat)))
            .unwrap();
        let message = store
            .find_by_id(ResourceKind::ChatMessage, message_id)
            .await
            .unwrap()
            .unwrap();
        Fixture {
            store,
            org,
            chat,
            message,
        }
    }

    #[tokio::test]
    async fn test_global_administrator_without_membership() {
        let f = fixture().await;
        let admin = f.store.add_user(Role::Administrator);
        for reach in [ScopeReach::Global, ScopeReach::Nearest, ScopeReach::Chain] {
            let role = effective_role(&f.store, &admin, Some(&f.message), reach)
                .await
                .unwrap();
            assert_eq!(role, Role::Administrator);
        }
    }

    #[tokio::test]
    async fn test_chain_takes_highest_of_chat_and_organization() {
        let f = fixture().await;
        let user = f.store.add_user(Role::Regular);
        f.store.grant(user.id, f.chat, Role::Regular);
        f.store.grant(user.id, f.org, Role::Administrator);

        let chain = effective_role(&f.store, &user, Some(&f.message), ScopeReach::Chain)
            .await
            .unwrap();
        assert_eq!(chain, Role::Administrator);

        let nearest = effective_role(&f.store, &user, Some(&f.message), ScopeReach::Nearest)
            .await
            .unwrap();
        assert_eq!(nearest, Role::Regular);
    }

    #[tokio::test]
    async fn test_no_membership_is_none() {
        let f = fixture().await;
        let user = f.store.add_user(Role::Regular);
        let role = effective_role(&f.store, &user, Some(&f.message), ScopeReach::Chain)
            .await
            .unwrap();
        assert_eq!(role, Role::None);

        let untargeted = effective_role(&f.store, &user, None, ScopeReach::Global)
            .await
            .unwrap();
        assert_eq!(untargeted, Role::None);
    }
}
