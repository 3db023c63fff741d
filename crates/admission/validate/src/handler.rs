//! The rule validation handler.
//!
//! Entry point for evaluating one expression-based validation rule against
//! one admission request:
//!
//! 1. Exceptions: a matching policy exception skips the rule.
//! 2. Generated admission policy: the rule is enforced elsewhere, no response.
//! 3. Compile the rule's expressions.
//! 4. Resolve the namespace context and build the request attributes.
//! 5. Resolve parameters.
//! 6. Fan out over the parameters and aggregate the decisions.
//!
//! Every failure along the way is an `Error` verdict, never `Fail`.

use std::sync::Arc;
use std::time::Instant;

use admission_types::{PolicyException, RequestContext, Rule};
use tracing::{debug, instrument, warn};

use crate::attributes::{Authorizer, CompileRequest, VersionedAttributes};
use crate::config::ValidateConfig;
use crate::exception::{CriteriaExceptionMatcher, ExceptionResolver};
use crate::interrupt::CancelSignal;
use crate::namespace::{effective_namespace, NamespaceResolver};
use crate::orchestrator::EvaluationOrchestrator;
use crate::params::ParamResolver;
use crate::response::{RuleResponse, RuleStatus, Verdict};
use crate::traits::{ExceptionMatcher, ExpressionCompiler, ResourceClient};

/// Evaluates expression-based validation rules.
///
/// Holds no per-request state; one handler can serve concurrent evaluations.
#[derive(Clone)]
pub struct CelValidationHandler {
    client: Option<Arc<dyn ResourceClient>>,
    compiler: Arc<dyn ExpressionCompiler>,
    exception_matcher: Arc<dyn ExceptionMatcher>,
    config: ValidateConfig,
}

impl CelValidationHandler {
    /// Handler without a resource client: namespaces are synthesized and
    /// parameterized rules cannot be resolved.
    pub fn new(compiler: Arc<dyn ExpressionCompiler>) -> Self {
        Self {
            client: None,
            compiler,
            exception_matcher: Arc::new(CriteriaExceptionMatcher),
            config: ValidateConfig::default(),
        }
    }

    pub fn with_client(mut self, client: Arc<dyn ResourceClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_exception_matcher(mut self, matcher: Arc<dyn ExceptionMatcher>) -> Self {
        self.exception_matcher = matcher;
        self
    }

    pub fn with_config(mut self, config: ValidateConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ValidateConfig {
        &self.config
    }

    /// Evaluate `rule` for `request`.
    ///
    /// Returns `None` when the rule is not applicable on this path (its
    /// policy has a generated native admission policy).
    #[instrument(
        skip_all,
        fields(rule = %rule.name, policy = %request.policy.key(), operation = %request.operation)
    )]
    pub async fn process(
        &self,
        request: &RequestContext,
        rule: &Rule,
        exceptions: &[PolicyException],
        cancel: &CancelSignal,
    ) -> Option<RuleResponse> {
        let started = Instant::now();

        let resolver = ExceptionResolver::new(self.exception_matcher.as_ref());
        if let Some(verdict) = resolver.resolve(exceptions, rule, request) {
            return Some(RuleResponse::new(&rule.name, verdict, started.elapsed()));
        }

        if self.config.honor_generated_admission_policy
            && request.policy.admission_policy_generated()
        {
            debug!("admission policy generated for this policy, skipping rule");
            return None;
        }

        let verdict = self.evaluate(request, rule, cancel).await;
        match verdict.status() {
            RuleStatus::Fail | RuleStatus::Error => {
                warn!(status = %verdict.status(), verdict = %verdict, "rule did not pass")
            }
            RuleStatus::Pass | RuleStatus::Skip => {
                debug!(status = %verdict.status(), message = verdict.message(), "rule evaluated")
            }
        }

        Some(RuleResponse::new(&rule.name, verdict, started.elapsed()))
    }

    async fn evaluate(&self, request: &RequestContext, rule: &Rule, cancel: &CancelSignal) -> Verdict {
        let validator = match self.compiler.compile(CompileRequest::for_rule(rule)) {
            Ok(validator) => validator,
            Err(err) => return Verdict::error("Error while creating composited compiler", err.into()),
        };

        let client = self.client.as_deref();
        let deadline = self.config.call_timeout();
        let namespace_name = effective_namespace(request.namespace(), &request.kind);

        let namespace = match NamespaceResolver::new(client, deadline)
            .resolve(namespace_name, &request.kind, cancel)
            .await
        {
            Ok(namespace) => namespace,
            Err(err) => return Verdict::error("Error getting the resource's namespace", err),
        };

        let attributes = match VersionedAttributes::build(request, namespace_name) {
            Ok(attributes) => attributes,
            Err(err) => return Verdict::error("error while creating versioned attributes", err),
        };

        let authorizer = Authorizer::new(self.client.clone(), request.kind.clone());

        let params = match &rule.validation.param {
            None => None,
            Some(spec) => {
                match ParamResolver::new(client, deadline)
                    .collect(spec, namespace_name, cancel)
                    .await
                {
                    Ok(params) => Some(params),
                    Err(err) => return Verdict::error("error in parameterized resource", err.into()),
                }
            }
        };

        EvaluationOrchestrator::new(validator.as_ref(), &attributes, &namespace, &authorizer)
            .with_cost_budget(self.config.runtime_cost_budget)
            .with_deadline(deadline)
            .run(&rule.name, params.as_deref(), cancel)
            .await
    }
}
