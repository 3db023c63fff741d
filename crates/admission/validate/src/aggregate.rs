//! Decision aggregation.
//!
//! Folds evaluator results, in invocation order, into exactly one verdict:
//!
//! | Observed | Outcome |
//! |---|---|
//! | an empty result | `Skip`, stop |
//! | a `Deny` decision | `Fail`, stop |
//! | an `Admit`/`Error` decision | `Error`, stop |
//! | end of input | `Pass` |
//!
//! Decisions are checked in order, so a deny only beats an evaluation error
//! that comes after it.

use std::ops::ControlFlow;

use admission_types::EvaluationResult;

use crate::response::{Verdict, PRECONDITIONS_NOT_MET};

/// Incremental aggregator; feed it results as they are produced.
#[derive(Debug, Clone)]
pub struct DecisionAggregator {
    rule_name: String,
    observed: usize,
}

impl DecisionAggregator {
    pub fn new(rule_name: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            observed: 0,
        }
    }

    /// Observe the next result. `Break` carries a terminal verdict; no
    /// further results should be produced.
    pub fn observe(&mut self, result: &EvaluationResult) -> ControlFlow<Verdict> {
        self.observed += 1;

        if result.is_empty() {
            return ControlFlow::Break(Verdict::skip(PRECONDITIONS_NOT_MET));
        }

        for decision in &result.decisions {
            if decision.is_deny() {
                return ControlFlow::Break(Verdict::fail(decision.message.clone()));
            }
            if decision.is_eval_error() {
                return ControlFlow::Break(Verdict::eval_error(decision.message.clone()));
            }
        }

        ControlFlow::Continue(())
    }

    /// Number of results observed so far.
    pub fn observed(&self) -> usize {
        self.observed
    }

    /// Verdict once every result has been observed without a terminal one.
    pub fn finish(self) -> Verdict {
        Verdict::pass(format!("Validation rule '{}' passed.", self.rule_name))
    }
}

/// Aggregate a complete sequence of results.
pub fn aggregate<I>(rule_name: &str, results: I) -> Verdict
where
    I: IntoIterator<Item = EvaluationResult>,
{
    let mut aggregator = DecisionAggregator::new(rule_name);
    match results
        .into_iter()
        .try_for_each(|result| aggregator.observe(&result))
    {
        ControlFlow::Break(verdict) => verdict,
        ControlFlow::Continue(()) => aggregator.finish(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::RuleStatus;
    use admission_types::Decision;

    fn admit() -> EvaluationResult {
        EvaluationResult::from_decisions(vec![Decision::admit(), Decision::admit()])
    }

    fn deny(message: &str) -> EvaluationResult {
        EvaluationResult::from_decisions(vec![Decision::admit(), Decision::deny(message)])
    }

    fn fault(message: &str) -> EvaluationResult {
        EvaluationResult::from_decisions(vec![Decision::eval_error(message)])
    }

    #[test]
    fn all_admits_pass() {
        let verdict = aggregate("check", vec![admit(), admit()]);
        assert_eq!(verdict, Verdict::pass("Validation rule 'check' passed."));
    }

    #[test]
    fn no_results_pass() {
        assert_eq!(aggregate("check", vec![]).status(), RuleStatus::Pass);
    }

    #[test]
    fn empty_result_skips() {
        let verdict = aggregate("check", vec![admit(), EvaluationResult::preconditions_unmet()]);
        assert_eq!(verdict, Verdict::skip(PRECONDITIONS_NOT_MET));
    }

    #[test]
    fn empty_result_before_deny_skips() {
        let verdict = aggregate(
            "check",
            vec![EvaluationResult::preconditions_unmet(), deny("nope")],
        );
        assert_eq!(verdict.status(), RuleStatus::Skip);
    }

    #[test]
    fn deny_on_fifth_parameter_overrides_admits() {
        let mut results = vec![admit(); 4];
        results.push(deny("too many replicas"));
        let verdict = aggregate("check", results);
        assert_eq!(verdict, Verdict::fail("too many replicas"));
    }

    #[test]
    fn eval_error_stops_before_a_later_deny() {
        let verdict = aggregate("check", vec![fault("no such key"), deny("denied")]);
        assert_eq!(verdict, Verdict::eval_error("no such key"));
    }

    #[test]
    fn deny_before_eval_error_fails() {
        let verdict = aggregate("check", vec![deny("denied"), fault("no such key")]);
        assert_eq!(verdict, Verdict::fail("denied"));
    }

    #[test]
    fn decision_order_within_one_result_decides() {
        let error_first = EvaluationResult::from_decisions(vec![
            Decision::eval_error("boom"),
            Decision::deny("denied"),
        ]);
        assert_eq!(aggregate("check", vec![error_first]), Verdict::eval_error("boom"));

        let deny_first = EvaluationResult::from_decisions(vec![
            Decision::deny("denied"),
            Decision::eval_error("boom"),
        ]);
        assert_eq!(aggregate("check", vec![deny_first]), Verdict::fail("denied"));
    }

    #[test]
    fn first_eval_error_is_terminal() {
        let verdict = aggregate("check", vec![admit(), fault("first"), fault("second")]);
        assert_eq!(verdict, Verdict::eval_error("first"));
        assert!(verdict.cause().is_none());

        let mut aggregator = DecisionAggregator::new("check");
        assert!(aggregator.observe(&admit()).is_continue());
        assert!(aggregator.observe(&fault("first")).is_break());
        assert_eq!(aggregator.observed(), 2);
    }

    #[test]
    fn annotation_only_result_is_not_a_skip() {
        let result = EvaluationResult::default().with_audit_annotation("owner", "infra");
        assert_eq!(aggregate("check", vec![result]).status(), RuleStatus::Pass);
    }

    #[test]
    fn observe_stops_at_terminal_result() {
        let mut aggregator = DecisionAggregator::new("check");
        assert!(aggregator.observe(&admit()).is_continue());
        assert!(aggregator.observe(&deny("x")).is_break());
        assert_eq!(aggregator.observed(), 2);
    }
}
