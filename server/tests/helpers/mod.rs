//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full axum
//! router on an in-memory store, plus fixtures for organizations, chats and
//! users, and JWT generation.
#![allow(dead_code)]

use std::sync::Arc;

use agora_common::Role;
use agora_server::api::{create_router, AppState};
use agora_server::auth::{generate_access_token, JwtPrincipalResolver, Principal};
use agora_server::authz::{DecisionEngine, MemoryStore, NewResource, ResourceKind};
use agora_server::config::Config;
use axum::body::Body;
use axum::http::{self, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

/// Full router over a fresh [`MemoryStore`].
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub config: Config,
}

impl TestApp {
    pub fn new() -> Self {
        let config = Config::default_for_test();
        let store = Arc::new(MemoryStore::new());
        let engine = DecisionEngine::new(Arc::clone(&store), config.engine());
        let principals = Arc::new(JwtPrincipalResolver::new(
            Arc::clone(&store),
            config.jwt_secret.clone(),
        ));
        let router = create_router(AppState::new(engine, principals));
        Self {
            router,
            store,
            config,
        }
    }

    /// Build a request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// Access token for `user_id`.
    pub fn token(&self, user_id: Uuid) -> String {
        generate_access_token(user_id, &self.config.jwt_secret, 900)
            .expect("Failed to generate token")
    }

    /// POST `/api/authorize/{operation}` with a JSON body.
    pub async fn authorize(
        &self,
        operation: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> Response<Body> {
        let mut builder = Self::request(Method::POST, &format!("/api/authorize/{operation}"))
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let req = builder
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap();
        self.oneshot(req).await
    }

    pub fn user(&self, global_role: Role) -> Principal {
        self.store.add_user(global_role)
    }

    pub fn organization(&self) -> Uuid {
        self.store
            .insert(NewResource::new(ResourceKind::Organization, None))
            .expect("Failed to create organization")
    }

    pub fn child(&self, kind: ResourceKind, parent: Uuid) -> Uuid {
        self.store
            .insert(NewResource::new(kind, Some(parent)))
            .expect("Failed to create resource")
    }

    pub fn owned_child(&self, kind: ResourceKind, parent: Uuid, creator: Uuid) -> Uuid {
        self.store
            .insert(NewResource::new(kind, Some(parent)).creator(creator))
            .expect("Failed to create resource")
    }
}

/// Collect a response body and parse it as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        let preview = String::from_utf8_lossy(&bytes);
        panic!("Failed to parse response as JSON: {e}\nBody: {preview}")
    })
}

/// Error code of a GraphQL-style error body.
pub fn error_code(json: &serde_json::Value) -> &str {
    json["errors"][0]["extensions"]["code"]
        .as_str()
        .unwrap_or_default()
}

/// Argument paths of a GraphQL-style error body, joined with dots.
pub fn issue_paths(json: &serde_json::Value) -> Vec<String> {
    json["errors"][0]["extensions"]["issues"]
        .as_array()
        .map(|issues| {
            issues
                .iter()
                .map(|issue| {
                    issue["argumentPath"]
                        .as_array()
                        .unwrap()
                        .iter()
                        .map(|s| s.as_str().unwrap())
                        .collect::<Vec<_>>()
                        .join(".")
                })
                .collect()
        })
        .unwrap_or_default()
}
