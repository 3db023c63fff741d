//! Capability traits for the engine's collaborators.
//!
//! The engine only needs narrow slices of the resource store, the expression
//! engine, and the exception subsystem. Keeping them behind these traits lets
//! every decision path run against scripted fakes (see [`crate::mocks`]).

use std::sync::Arc;

use admission_types::{
    EvaluationResult, LabelSelector, PolicyException, RequestContext, Resource, Rule,
};
use async_trait::async_trait;

use crate::attributes::{CompileRequest, EvaluationContext};
use crate::error::{ClientError, CompileError};

/// Read access to the resource store.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    async fn get_namespace(&self, name: &str) -> Result<Resource, ClientError>;

    async fn get_resource(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
        name: &str,
    ) -> Result<Resource, ClientError>;

    /// List objects matching `selector`, in store order. An empty namespace
    /// lists across all namespaces.
    async fn list_resource(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<Resource>, ClientError>;

    async fn is_namespaced(&self, group: &str, version: &str, kind: &str)
        -> Result<bool, ClientError>;
}

/// Turns a rule's expressions into a [`Validator`].
pub trait ExpressionCompiler: Send + Sync {
    fn compile(&self, request: CompileRequest) -> Result<Arc<dyn Validator>, CompileError>;
}

/// Compiled expressions, evaluated once per parameter object.
///
/// Returns the empty [`EvaluationResult`] when the preconditions are unmet.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, context: EvaluationContext<'_>) -> EvaluationResult;
}

/// Decides whether a policy exception applies to a request.
pub trait ExceptionMatcher: Send + Sync {
    fn matches(&self, exception: &PolicyException, rule: &Rule, request: &RequestContext) -> bool;
}
