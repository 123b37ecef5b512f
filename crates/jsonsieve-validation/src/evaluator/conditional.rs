//! The `if`/`then`/`else` broadcast evaluator.
//!
//! All three subschemas consume events in lockstep from the same stream,
//! because re-reading is impossible. The `if` evaluator runs silently (its
//! problems are discarded); once it decides, only the selected branch's
//! verdict and problems surface.

use super::{closes_scope, BoxedEvaluator, DiscardSink, Evaluator, ProblemSink, Verdict};
use crate::problem::Problem;
use jsonsieve_json::Event;

struct Branch {
    evaluator: BoxedEvaluator,
    problems: Vec<Problem>,
    verdict: Option<Verdict>,
}

impl Branch {
    fn new(evaluator: BoxedEvaluator) -> Self {
        Self {
            evaluator,
            problems: Vec::new(),
            verdict: None,
        }
    }

    fn step(&mut self, event: &Event, depth: usize) {
        if self.verdict.is_none() {
            let verdict = self.evaluator.evaluate(event, depth, &mut self.problems);
            if verdict.is_decided() {
                self.verdict = Some(verdict);
            }
        }
    }
}

pub struct ConditionalEvaluator {
    condition: BoxedEvaluator,
    condition_verdict: Option<Verdict>,
    then_branch: Option<Branch>,
    else_branch: Option<Branch>,
    structured: bool,
    done: bool,
}

impl ConditionalEvaluator {
    /// `then_branch` / `else_branch` are `None` when the keyword is absent,
    /// which makes the missing branch an automatic pass. Under negation
    /// the caller substitutes an [`super::AlwaysFalse`] for the absent
    /// branch instead.
    pub fn new(
        condition: BoxedEvaluator,
        then_branch: Option<BoxedEvaluator>,
        else_branch: Option<BoxedEvaluator>,
        structured: bool,
    ) -> Self {
        Self {
            condition,
            condition_verdict: None,
            then_branch: then_branch.map(Branch::new),
            else_branch: else_branch.map(Branch::new),
            structured,
            done: false,
        }
    }

    fn conclude(&mut self, sink: &mut dyn ProblemSink) -> Verdict {
        // `Ignored` means the condition never activated and therefore
        // vacuously validated; it selects `then` just like `True`.
        let selected = match self.condition_verdict {
            None => return Verdict::Pending,
            Some(Verdict::True) | Some(Verdict::Ignored) => &mut self.then_branch,
            Some(_) => &mut self.else_branch,
        };
        match selected {
            None => {
                self.done = true;
                Verdict::True
            }
            Some(branch) => match branch.verdict {
                Some(verdict) => {
                    self.done = true;
                    if verdict == Verdict::False {
                        sink.dispatch_all(std::mem::take(&mut branch.problems));
                    }
                    verdict
                }
                None => Verdict::Pending,
            },
        }
    }
}

impl Evaluator for ConditionalEvaluator {
    fn evaluate(&mut self, event: &Event, depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        if self.done {
            return Verdict::Pending;
        }
        if self.condition_verdict.is_none() {
            let mut discard = DiscardSink;
            let verdict = self.condition.evaluate(event, depth, &mut discard);
            if verdict.is_decided() {
                self.condition_verdict = Some(verdict);
            }
        }
        if let Some(branch) = self.then_branch.as_mut() {
            branch.step(event, depth);
        }
        if let Some(branch) = self.else_branch.as_mut() {
            branch.step(event, depth);
        }
        if self.condition_verdict.is_some() {
            let verdict = self.conclude(sink);
            if verdict != Verdict::Pending {
                return verdict;
            }
        } else if !self.structured {
            return self.conclude(sink);
        }
        if self.structured && closes_scope(event, depth) {
            return self.conclude(sink);
        }
        Verdict::Pending
    }
}
