//! Error types for rule validation.
//!
//! Every variant here surfaces to the caller as an `Error` verdict, never as
//! `Fail`: these are failures to evaluate the policy, not policy outcomes.

use std::time::Duration;

use thiserror::Error;

/// Why an external call did not complete.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Interrupt {
    #[error("evaluation cancelled by caller")]
    Cancelled,

    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

/// Errors from the resource store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("{kind} \"{name}\" not found")]
    NotFound { kind: String, name: String },

    #[error("resource store unavailable: {0}")]
    Unavailable(String),

    #[error("resource store error: {0}")]
    Other(String),

    #[error(transparent)]
    Interrupted(#[from] Interrupt),
}

/// Errors resolving the parameter objects of a rule.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("can't parse the parameter resource group version: {0}")]
    MalformedApiVersion(String),

    #[error("failed to check if resource is namespaced or not ({0})")]
    ScopeCheck(ClientError),

    #[error("paramRef.namespace must not be provided for a cluster-scoped `paramKind` (got {namespace:?})")]
    NamespaceOverrideOnClusterScoped { namespace: String },

    #[error("can't use namespaced paramRef to match cluster-scoped resources")]
    NamespacedParamForClusterScopedResource,

    #[error("failed to get parameter {name:?}: {source}")]
    Fetch { name: String, source: ClientError },

    #[error("failed to list parameters: {0}")]
    List(ClientError),

    #[error("no params found")]
    NotFound,

    #[error("no resource client configured to resolve parameters")]
    NoClient,
}

/// The compiler rejected the rule's expressions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct CompileError(pub String);

/// Errors from a rule evaluation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidateError {
    #[error("failed to compute key for exception {namespace}/{name}: {reason}")]
    ExceptionKey {
        namespace: String,
        name: String,
        reason: String,
    },

    #[error("failed to compile expressions: {0}")]
    Compile(#[from] CompileError),

    #[error("failed to get namespace {namespace:?}: {source}")]
    NamespaceFetch {
        namespace: String,
        source: ClientError,
    },

    #[error(transparent)]
    ParamResolution(#[from] ParamError),

    #[error("failed to build evaluation context: {0}")]
    ContextBuild(String),

    #[error("evaluation interrupted: {0}")]
    EvaluationInterrupted(#[from] Interrupt),
}

/// Result type for rule validation.
pub type Result<T> = std::result::Result<T, ValidateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_errors_carry_readable_messages() {
        assert_eq!(
            ParamError::NamespacedParamForClusterScopedResource.to_string(),
            "can't use namespaced paramRef to match cluster-scoped resources"
        );
        assert_eq!(ParamError::NotFound.to_string(), "no params found");
    }

    #[test]
    fn interrupts_convert_into_client_and_validate_errors() {
        let client: ClientError = Interrupt::Cancelled.into();
        assert_eq!(client, ClientError::Interrupted(Interrupt::Cancelled));

        let validate: ValidateError = Interrupt::DeadlineExceeded(Duration::from_secs(1)).into();
        assert!(validate.to_string().contains("deadline"));
    }

    #[test]
    fn param_errors_lift_into_validate_errors() {
        let err: ValidateError = ParamError::NoClient.into();
        assert!(matches!(err, ValidateError::ParamResolution(ParamError::NoClient)));
    }
}
