//! API Router and Application State
//!
//! A thin HTTP adapter over the decision engine. Mutation handlers in other
//! transports call [`DecisionEngine::authorize`] directly.

pub mod error;

use std::collections::BTreeMap;
use std::sync::Arc;

use agora_common::{ArgumentPath, ErrorCode, Issue, Role};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tower_http::trace::TraceLayer;

use crate::auth::{PrincipalResolver, RequestContext};
use crate::authz::{DecisionEngine, Denial, Resource, ResourceStore};
use crate::operations::{self, Operation};

pub use error::ApiError;

/// Shared application state.
pub struct AppState<S, R> {
    /// Authorization engine
    pub engine: DecisionEngine<S>,
    /// Resolves request credentials to principals
    pub principals: Arc<R>,
}

impl<S, R> Clone for AppState<S, R> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            principals: Arc::clone(&self.principals),
        }
    }
}

impl<S, R> AppState<S, R> {
    /// Create new application state.
    #[must_use]
    pub const fn new(engine: DecisionEngine<S>, principals: Arc<R>) -> Self {
        Self { engine, principals }
    }
}

/// Create the main application router.
pub fn create_router<S, R>(state: AppState<S, R>) -> Router
where
    S: ResourceStore,
    R: PrincipalResolver,
{
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Policy table
        .route("/api/operations", get(list_operations))
        // Decisions
        .route("/api/authorize/{operation}", post(authorize::<S, R>))
        // Middleware
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
    /// Number of registered operations
    operations: usize,
}

/// Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        operations: operations::registry().len(),
    })
}

/// List every operation and its policy.
/// GET /api/operations
async fn list_operations() -> Json<Vec<&'static Operation>> {
    Json(operations::registry().values().collect())
}

/// Response for a permitted request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeResponse {
    pub permitted: bool,
    pub operation: &'static str,
    pub role: Role,
    pub resources: BTreeMap<String, Resource>,
}

/// Decide one mutation.
/// POST /api/authorize/{operation}
#[tracing::instrument(skip(state, headers, body))]
async fn authorize<S, R>(
    State(state): State<AppState<S, R>>,
    Path(operation): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AuthorizeResponse>, ApiError>
where
    S: ResourceStore,
    R: PrincipalResolver,
{
    let op = operations::find(&operation).ok_or(ApiError::UnknownOperation(operation))?;

    let request = RequestContext {
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    let principal = match state.principals.resolve(&request).await {
        Ok(principal) => Some(principal),
        Err(e) if e.code() == ErrorCode::Unauthenticated => None,
        Err(e) => return Err(Denial::from(e).into()),
    };

    // Malformed bodies are an argument problem, reported after authentication.
    let args: Value = match serde_json::from_slice(&body) {
        Ok(args) => args,
        Err(_) if principal.is_none() => return Err(Denial::unauthenticated().into()),
        Err(e) => {
            return Err(Denial::new(
                ErrorCode::InvalidArguments,
                vec![Issue::with_message(ArgumentPath::new(["input"]), e.to_string())],
            )
            .into())
        }
    };

    let grant = state.engine.authorize(principal.as_ref(), op, &args).await?;

    Ok(Json(AuthorizeResponse {
        permitted: true,
        operation: grant.operation,
        role: grant.role,
        resources: grant
            .resources
            .into_iter()
            .map(|(path, resource)| (path.to_string(), resource))
            .collect(),
    }))
}
