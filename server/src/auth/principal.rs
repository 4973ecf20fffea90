//! Principal resolution.
//!
//! Turns a request's credentials into the acting [`Principal`]. A token
//! whose user no longer exists resolves to "unauthenticated", the same as a
//! missing token.

use std::future::Future;
use std::sync::Arc;

use agora_common::Role;
use serde::Serialize;
use uuid::Uuid;

use super::error::{AuthError, AuthResult};
use super::jwt::validate_access_token;
use crate::authz::UserDirectory;

/// The authenticated actor performing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: Uuid,
    /// Topmost authority; fixed for the duration of a request.
    pub global_role: Role,
}

impl Principal {
    #[must_use]
    pub fn is_administrator(&self) -> bool {
        self.global_role == Role::Administrator
    }
}

/// Credentials carried by a request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
}

impl RequestContext {
    #[must_use]
    pub fn bearer(token: &str) -> Self {
        Self {
            authorization: Some(format!("Bearer {token}")),
        }
    }
}

/// Resolves the principal behind a request.
pub trait PrincipalResolver: Send + Sync + 'static {
    fn resolve(
        &self,
        request: &RequestContext,
    ) -> impl Future<Output = AuthResult<Principal>> + Send;
}

/// Bearer-token resolver backed by a [`UserDirectory`].
#[derive(Debug)]
pub struct JwtPrincipalResolver<D> {
    directory: Arc<D>,
    secret: String,
}

impl<D> JwtPrincipalResolver<D> {
    pub fn new(directory: Arc<D>, secret: impl Into<String>) -> Self {
        Self {
            directory,
            secret: secret.into(),
        }
    }
}

impl<D: UserDirectory> PrincipalResolver for JwtPrincipalResolver<D> {
    #[tracing::instrument(skip_all)]
    async fn resolve(&self, request: &RequestContext) -> AuthResult<Principal> {
        let header = request
            .authorization
            .as_deref()
            .ok_or(AuthError::MissingAuthHeader)?;

        // Scheme is case-insensitive ("bearer" is common from GraphQL clients)
        let token = match header.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
            _ => return Err(AuthError::InvalidAuthHeader),
        };

        let user_id = validate_access_token(token, &self.secret)?;

        self.directory
            .find_principal(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
