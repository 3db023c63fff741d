//! Admission Types - Shared data model for rule validation
//!
//! The types exchanged between the validation engine and its collaborators:
//! the expression compiler/evaluator, the resource store, and the
//! policy-exception subsystem.
//!
//! - [`gvk`]: group/version/kind identifiers and `apiVersion` parsing
//! - [`resource`]: unstructured resource documents
//! - [`selector`]: label selectors
//! - [`rule`]: validation rules and parameter bindings
//! - [`request`]: the admission request and owning policy
//! - [`exception`]: policy exceptions
//! - [`decision`]: evaluator decisions and results

#![deny(unsafe_code)]

pub mod decision;
pub mod exception;
pub mod gvk;
pub mod request;
pub mod resource;
pub mod rule;
pub mod selector;

pub use decision::{
    AuditAnnotationValue, Decision, DecisionAction, EvaluationOutcome, EvaluationResult,
};
pub use exception::{ExceptionCriteria, ExceptionEntry, PolicyException, WILDCARD};
pub use gvk::{
    GroupVersion, GroupVersionKind, GroupVersionParseError, GroupVersionResource, NAMESPACE_KIND,
};
pub use request::{
    AdmissionPolicyStatus, Operation, PolicyMeta, PolicyStatus, RequestContext, UserInfo,
};
pub use resource::Resource;
pub use rule::{
    AuditAnnotation, CelValidation, MatchCondition, ParamKind, ParamRef, ParamSpec, ParamTarget,
    ParameterNotFoundAction, Rule, Validation, Variable,
};
pub use selector::{LabelSelector, SelectorOperator, SelectorRequirement};
