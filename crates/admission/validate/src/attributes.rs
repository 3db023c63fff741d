//! Evaluation context construction.
//!
//! Adapts the raw request into the attribute shape the evaluator expects and
//! bundles it with the per-invocation inputs.

use std::fmt;
use std::sync::Arc;

use admission_types::{
    AuditAnnotation, GroupVersionKind, GroupVersionResource, MatchCondition, Operation,
    RequestContext, Resource, Rule, UserInfo, Validation, Variable,
};

use crate::error::{Result, ValidateError};
use crate::traits::ResourceClient;

/// Everything the compiler needs from a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    /// Validations with the rule-level message filled in.
    pub validations: Vec<Validation>,
    pub audit_annotations: Vec<AuditAnnotation>,
    pub preconditions: Vec<MatchCondition>,
    pub variables: Vec<Variable>,
    /// Whether `params` is declared for the expressions.
    pub has_params: bool,
    /// Whether `authorizer` is declared for the expressions. Message
    /// expressions never see it.
    pub has_authorizer: bool,
}

impl CompileRequest {
    pub fn for_rule(rule: &Rule) -> Self {
        Self {
            validations: rule.effective_validations(),
            audit_annotations: rule.validation.audit_annotations.clone(),
            preconditions: rule.preconditions.clone(),
            variables: rule.validation.variables.clone(),
            has_params: rule.has_param(),
            has_authorizer: true,
        }
    }
}

/// Request attributes in the evaluator's shape.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedAttributes {
    pub object: Option<Resource>,
    pub old_object: Option<Resource>,
    pub kind: GroupVersionKind,
    pub namespace: String,
    pub name: String,
    pub resource: GroupVersionResource,
    pub operation: Operation,
    pub user_info: UserInfo,
}

impl VersionedAttributes {
    /// Build attributes for `request`, scoped to `namespace`.
    ///
    /// Either object may be absent (CONNECT carries neither). Fails when a
    /// present object declares a kind other than the request kind, since no
    /// conversion is available between versions.
    pub fn build(request: &RequestContext, namespace: &str) -> Result<Self> {
        for object in [&request.object, &request.old_object].into_iter().flatten() {
            check_kind(object, &request.kind)?;
        }

        Ok(Self {
            object: request.object.clone(),
            old_object: request.old_object.clone(),
            kind: request.kind.clone(),
            namespace: namespace.to_string(),
            name: request.name().to_string(),
            resource: request.resource.clone(),
            operation: request.operation,
            user_info: request.user_info.clone(),
        })
    }
}

fn check_kind(object: &Resource, expected: &GroupVersionKind) -> Result<()> {
    // Documents without type information take the request kind.
    if object.api_version().is_empty() && object.kind().is_empty() {
        return Ok(());
    }

    let declared = object.group_version_kind().ok_or_else(|| {
        ValidateError::ContextBuild(format!(
            "object {:?} has malformed apiVersion {:?}",
            object.name(),
            object.api_version()
        ))
    })?;

    if &declared != expected {
        return Err(ValidateError::ContextBuild(format!(
            "cannot convert object of kind {} to {}",
            declared, expected
        )));
    }
    Ok(())
}

/// Opaque authorization handle threaded to the evaluator.
#[derive(Clone)]
pub struct Authorizer {
    client: Option<Arc<dyn ResourceClient>>,
    kind: GroupVersionKind,
}

impl Authorizer {
    pub fn new(client: Option<Arc<dyn ResourceClient>>, kind: GroupVersionKind) -> Self {
        Self { client, kind }
    }

    pub fn kind(&self) -> &GroupVersionKind {
        &self.kind
    }

    pub fn client(&self) -> Option<&Arc<dyn ResourceClient>> {
        self.client.as_ref()
    }
}

impl fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorizer")
            .field("kind", &self.kind)
            .field("has_client", &self.client.is_some())
            .finish()
    }
}

/// Inputs of a single evaluator invocation.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub attributes: &'a VersionedAttributes,
    /// Exactly one parameter object, or none when the rule declares none.
    pub param: Option<&'a Resource>,
    pub namespace: &'a Resource,
    pub cost_budget: u64,
    pub authorizer: &'a Authorizer,
}
