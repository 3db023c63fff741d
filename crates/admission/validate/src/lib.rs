//! Admission Validate - Rule validation decision engine
//!
//! Evaluates one expression-based validation rule against one admission
//! request and produces exactly one verdict: `Pass`, `Fail`, `Skip` or
//! `Error`.
//!
//! ## Pipeline
//!
//! 1. **Exceptions**: a matching policy exception skips the rule
//! 2. **Generated policy**: rules already enforced by a generated native
//!    admission policy yield no response
//! 3. **Namespace**: the request's namespace object, or a placeholder
//! 4. **Parameters**: zero or more parameter objects, by name or selector
//! 5. **Fan-out**: one evaluator invocation per parameter, in order
//! 6. **Aggregation**: the first skip, deny or evaluation error, in
//!    order, decides; otherwise pass
//!
//! The expression engine and the resource store are collaborators behind
//! the [`traits`] capability traits; [`mocks`] provides in-memory fakes.

#![deny(unsafe_code)]

pub mod aggregate;
pub mod attributes;
pub mod config;
pub mod error;
pub mod exception;
pub mod handler;
pub mod interrupt;
pub mod mocks;
pub mod namespace;
pub mod orchestrator;
pub mod params;
pub mod response;
pub mod traits;

pub use aggregate::{aggregate, DecisionAggregator};
pub use attributes::{Authorizer, CompileRequest, EvaluationContext, VersionedAttributes};
pub use config::{ValidateConfig, DEFAULT_CALL_TIMEOUT, DEFAULT_RUNTIME_COST_BUDGET};
pub use error::{ClientError, CompileError, Interrupt, ParamError, Result, ValidateError};
pub use exception::{exception_key, wildcard_match, CriteriaExceptionMatcher, ExceptionResolver};
pub use handler::CelValidationHandler;
pub use interrupt::{guarded, guarded_call, CancelSignal};
pub use namespace::{effective_namespace, NamespaceResolver};
pub use orchestrator::EvaluationOrchestrator;
pub use params::ParamResolver;
pub use response::{RuleResponse, RuleStatus, Verdict, PRECONDITIONS_NOT_MET};
pub use traits::{ExceptionMatcher, ExpressionCompiler, ResourceClient, Validator};
