//! The decision pipeline.
//!
//! Every mutation passes the same stages in the same order:
//! 1. authentication
//! 2. input validation
//! 3. existence of every referenced resource (and required memberships)
//! 4. domain state checks
//! 5. policy evaluation against the effective role
//!
//! Each stage reports every violation it finds and stops the pipeline.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use agora_common::ErrorCode;
use chrono::Utc;
use serde_json::Value;
use tokio::time::Instant;

use super::existence::{missing_memberships, resolve_all};
use super::outcome::{Denial, Grant};
use super::policy::{evaluate, Evaluation};
use super::resolver::effective_role;
use super::store::{ResourceStore, StoreError, StoreResult};
use crate::auth::Principal;
use crate::operations::checks::{run_all, CheckContext};
use crate::operations::Operation;

/// Engine tuning.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Budget for all storage lookups of one request.
    pub lookup_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(5),
        }
    }
}

/// Authorizes mutations against a [`ResourceStore`].
#[derive(Debug)]
pub struct DecisionEngine<S> {
    store: Arc<S>,
    config: EngineConfig,
}

impl<S> Clone for DecisionEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: ResourceStore> DecisionEngine<S> {
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Decide whether `principal` may run `operation` with `args`.
    ///
    /// `principal` is `None` when the request carried no usable credentials.
    #[tracing::instrument(
        skip(self, principal, args),
        fields(operation = operation.name(), principal = ?principal.map(|p| p.id))
    )]
    pub async fn authorize(
        &self,
        principal: Option<&Principal>,
        operation: &Operation,
        args: &Value,
    ) -> Result<Grant, Denial> {
        let result = self.decide(principal, operation, args).await;
        match &result {
            Ok(grant) => tracing::debug!(role = %grant.role, "Request permitted"),
            Err(denial) => tracing::debug!(
                code = %denial.code,
                issues = denial.issues.len(),
                "Request denied"
            ),
        }
        result
    }

    async fn decide(
        &self,
        principal: Option<&Principal>,
        operation: &Operation,
        args: &Value,
    ) -> Result<Grant, Denial> {
        let principal = principal.ok_or_else(Denial::unauthenticated)?;

        let issues = operation.validate(args);
        if !issues.is_empty() {
            return Err(Denial::new(ErrorCode::InvalidArguments, issues));
        }

        let deadline = Instant::now() + self.config.lookup_timeout;
        let store = self.store.as_ref();

        let report = within(deadline, resolve_all(store, &operation.lookups(args))).await?;
        if !report.is_complete() {
            return Err(Denial::at_paths(
                ErrorCode::ArgumentsAssociatedResourcesNotFound,
                report.missing,
            ));
        }

        let missing = within(
            deadline,
            missing_memberships(store, &operation.membership_lookups(&report)),
        )
        .await?;
        if !missing.is_empty() {
            return Err(Denial::at_paths(
                ErrorCode::ArgumentsAssociatedResourcesNotFound,
                missing,
            ));
        }

        let cx = CheckContext {
            principal,
            args,
            report: &report,
            now: Utc::now(),
        };
        let issues = within(deadline, run_all(store, &operation.checks, &cx)).await?;
        if !issues.is_empty() {
            return Err(Denial::new(
                ErrorCode::ForbiddenActionOnArgumentsAssociatedResources,
                issues,
            ));
        }

        let target_path = operation.target.as_ref().map(|t| &t.path);
        let target = target_path.and_then(|path| report.get(path));
        let role = within(
            deadline,
            effective_role(store, principal, target, operation.policy.reach),
        )
        .await?;

        evaluate(
            &operation.policy,
            &Evaluation {
                principal,
                role,
                target,
                target_path,
                args,
            },
        )
        .into_result()?;

        Ok(Grant {
            operation: operation.name(),
            principal: *principal,
            role,
            target: target.cloned(),
            resources: report.found,
        })
    }
}

/// Await a lookup stage before the request deadline.
///
/// Failures are logged here and surface as a bare `unexpected` denial.
async fn within<T>(
    deadline: Instant,
    stage: impl Future<Output = StoreResult<T>>,
) -> Result<T, Denial> {
    let error = match tokio::time::timeout_at(deadline, stage).await {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(error)) => error,
        Err(_) => StoreError::Timeout,
    };
    tracing::error!(error = %error, "Authorization lookup failed");
    Err(Denial::unexpected())
}
