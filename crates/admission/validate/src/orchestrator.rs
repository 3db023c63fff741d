//! Evaluator fan-out.
//!
//! Invokes the compiled validator once per parameter object, in resolution
//! order, feeding each result to a [`DecisionAggregator`] and stopping as
//! soon as it reaches a terminal verdict.

use std::ops::ControlFlow;
use std::time::Duration;

use admission_types::Resource;
use tracing::debug;

use crate::aggregate::DecisionAggregator;
use crate::attributes::{Authorizer, EvaluationContext, VersionedAttributes};
use crate::config::{DEFAULT_CALL_TIMEOUT, DEFAULT_RUNTIME_COST_BUDGET};
use crate::interrupt::{guarded, CancelSignal};
use crate::response::Verdict;
use crate::traits::Validator;

/// Shared, immutable inputs of every invocation for one rule.
pub struct EvaluationOrchestrator<'a> {
    validator: &'a dyn Validator,
    attributes: &'a VersionedAttributes,
    namespace: &'a Resource,
    authorizer: &'a Authorizer,
    cost_budget: u64,
    deadline: Duration,
}

impl<'a> EvaluationOrchestrator<'a> {
    pub fn new(
        validator: &'a dyn Validator,
        attributes: &'a VersionedAttributes,
        namespace: &'a Resource,
        authorizer: &'a Authorizer,
    ) -> Self {
        Self {
            validator,
            attributes,
            namespace,
            authorizer,
            cost_budget: DEFAULT_RUNTIME_COST_BUDGET,
            deadline: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_cost_budget(mut self, budget: u64) -> Self {
        self.cost_budget = budget;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Evaluate `rule_name`.
    ///
    /// `params` is `None` when the rule declares no parameters, which means
    /// exactly one invocation with an empty parameter slot. A declared but
    /// empty set means no invocation at all, and passes.
    pub async fn run(
        &self,
        rule_name: &str,
        params: Option<&[Resource]>,
        cancel: &CancelSignal,
    ) -> Verdict {
        let mut aggregator = DecisionAggregator::new(rule_name);

        let flow = match params {
            None => self.invoke(&mut aggregator, None, cancel).await,
            Some(params) => {
                let mut flow = ControlFlow::Continue(());
                for param in params {
                    flow = self.invoke(&mut aggregator, Some(param), cancel).await;
                    if flow.is_break() {
                        break;
                    }
                }
                flow
            }
        };

        match flow {
            ControlFlow::Break(verdict) => verdict,
            ControlFlow::Continue(()) => aggregator.finish(),
        }
    }

    async fn invoke(
        &self,
        aggregator: &mut DecisionAggregator,
        param: Option<&Resource>,
        cancel: &CancelSignal,
    ) -> ControlFlow<Verdict> {
        let context = EvaluationContext {
            attributes: self.attributes,
            param,
            namespace: self.namespace,
            cost_budget: self.cost_budget,
            authorizer: self.authorizer,
        };

        debug!(
            param = param.map(Resource::name).unwrap_or_default(),
            invocation = aggregator.observed(),
            "invoking validator"
        );

        match guarded(cancel, self.deadline, self.validator.validate(context)).await {
            Ok(result) => aggregator.observe(&result),
            Err(interrupt) => {
                ControlFlow::Break(Verdict::error("evaluation interrupted", interrupt.into()))
            }
        }
    }
}
