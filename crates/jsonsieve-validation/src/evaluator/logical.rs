//! Logical combinators over child evaluators.
//!
//! Three kinds, all parametric on whether the evaluated scope is a scalar
//! (one event decides everything) or a structured value (the verdict lands
//! on the closing bracket):
//!
//! - conjunctive: `allOf` and the implicit conjunction of keywords within a
//!   schema; problems from failing children flow straight through.
//! - disjunctive: `anyOf` and negated conjunctions; child problems are
//!   buffered per branch and only surface if every branch fails.
//! - exclusive: `oneOf`; each child is evaluated both affirmatively and
//!   negatively so that "matched more than one" can explain its branches.

use super::{closes_scope, BoxedEvaluator, Evaluator, ProblemBranch, ProblemSink, Verdict};
use crate::problem::Problem;
use jsonsieve_json::{Event, Location};

/// Dispatch buffered branch problem lists the way the original engine does:
/// prefer resolvable lists, fall back to all of them, and collapse a single
/// surviving list into plain problems instead of a compound one.
pub fn dispatch_problem_lists(
    branches: Vec<ProblemBranch>,
    message_key: &str,
    keyword: &str,
    location: Option<Location>,
    sink: &mut dyn ProblemSink,
) {
    let any_resolvable = branches.iter().any(|b| b.resolvable);
    let mut selected: Vec<Vec<Problem>> = branches
        .into_iter()
        .filter(|b| !any_resolvable || b.resolvable)
        .map(|b| b.problems)
        .collect();
    if selected.len() == 1 {
        sink.dispatch_all(selected.pop().unwrap_or_default());
        return;
    }
    let mut builder = Problem::builder(message_key).keyword(keyword).branches(selected);
    if let Some(location) = location {
        builder = builder.location(location);
    }
    sink.dispatch(builder.build());
}

struct Child {
    evaluator: BoxedEvaluator,
    verdict: Verdict,
}

impl Child {
    fn new(evaluator: BoxedEvaluator) -> Self {
        Self {
            evaluator,
            verdict: Verdict::Pending,
        }
    }

    fn step(&mut self, event: &Event, depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        if !self.verdict.is_decided() {
            self.verdict = self.evaluator.evaluate(event, depth, sink);
        }
        self.verdict
    }
}

/// `allOf` logic: false iff any child is false.
pub struct ConjunctiveEvaluator {
    children: Vec<Child>,
    structured: bool,
    has_false: bool,
}

impl ConjunctiveEvaluator {
    pub fn new(children: Vec<BoxedEvaluator>, structured: bool) -> Self {
        Self {
            children: children.into_iter().map(Child::new).collect(),
            structured,
            has_false: false,
        }
    }
}

impl Evaluator for ConjunctiveEvaluator {
    fn evaluate(&mut self, event: &Event, depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        for child in &mut self.children {
            // Problems of failing children flow straight through to the
            // caller's sink, in child order.
            if child.step(event, depth, sink) == Verdict::False {
                self.has_false = true;
            }
        }
        if self.structured && !closes_scope(event, depth) {
            return Verdict::Pending;
        }
        if self.has_false {
            Verdict::False
        } else {
            Verdict::True
        }
    }
}

/// `anyOf` logic: true as soon as any child is true.
pub struct DisjunctiveEvaluator {
    children: Vec<(Child, ProblemBranch)>,
    structured: bool,
    message_key: &'static str,
    keyword: String,
    location: Option<Location>,
}

impl DisjunctiveEvaluator {
    pub fn new(children: Vec<BoxedEvaluator>, structured: bool, keyword: &str) -> Self {
        Self::with_message(children, structured, keyword, "instance.problem.anyOf")
    }

    pub fn with_message(
        children: Vec<BoxedEvaluator>,
        structured: bool,
        keyword: &str,
        message_key: &'static str,
    ) -> Self {
        Self {
            children: children
                .into_iter()
                .map(|c| (Child::new(c), ProblemBranch::default()))
                .collect(),
            structured,
            message_key,
            keyword: keyword.to_string(),
            location: None,
        }
    }
}

impl Evaluator for DisjunctiveEvaluator {
    fn evaluate(&mut self, event: &Event, depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        if self.location.is_none() {
            self.location = Some(event.location);
        }
        for (child, branch) in &mut self.children {
            let was_decided = child.verdict.is_decided();
            match child.step(event, depth, &mut branch.problems) {
                Verdict::True | Verdict::Ignored => return Verdict::True,
                Verdict::False if !was_decided => branch.finish(),
                _ => {}
            }
        }
        if self.structured && !closes_scope(event, depth) {
            return Verdict::Pending;
        }
        let branches = std::mem::take(&mut self.children)
            .into_iter()
            .map(|(_, branch)| branch)
            .collect();
        dispatch_problem_lists(branches, self.message_key, &self.keyword, self.location, sink);
        Verdict::False
    }
}

struct ExclusiveChild {
    affirmative: Child,
    negated: Child,
    affirmative_branch: ProblemBranch,
    negated_branch: ProblemBranch,
}

/// `oneOf` logic: true iff exactly one child is true.
pub struct ExclusiveEvaluator {
    children: Vec<ExclusiveChild>,
    structured: bool,
    /// False for the evaluator produced under `not`, which fails only when
    /// exactly one child matches.
    affirmative: bool,
    location: Option<Location>,
}

impl ExclusiveEvaluator {
    pub fn new(
        children: Vec<(BoxedEvaluator, BoxedEvaluator)>,
        structured: bool,
        affirmative: bool,
    ) -> Self {
        Self {
            children: children
                .into_iter()
                .map(|(affirmative, negated)| ExclusiveChild {
                    affirmative: Child::new(affirmative),
                    negated: Child::new(negated),
                    affirmative_branch: ProblemBranch::default(),
                    negated_branch: ProblemBranch::default(),
                })
                .collect(),
            structured,
            affirmative,
            location: None,
        }
    }

    fn conclude(&mut self, sink: &mut dyn ProblemSink) -> Verdict {
        let matches = self
            .children
            .iter()
            .filter(|c| matches!(c.affirmative.verdict, Verdict::True | Verdict::Ignored))
            .count();
        if !self.affirmative {
            if matches == 1 {
                let location = self.location;
                let child = self
                    .children
                    .iter_mut()
                    .find(|c| matches!(c.affirmative.verdict, Verdict::True | Verdict::Ignored))
                    .expect("one child matched");
                let problems = std::mem::take(&mut child.negated_branch.problems);
                if problems.is_empty() {
                    let mut builder = Problem::builder("instance.problem.not.oneOf").keyword("oneOf");
                    if let Some(location) = location {
                        builder = builder.location(location);
                    }
                    sink.dispatch(builder.build());
                } else {
                    sink.dispatch_all(problems);
                }
                return Verdict::False;
            }
            return Verdict::True;
        }
        match matches {
            1 => Verdict::True,
            0 => {
                let branches = self
                    .children
                    .drain(..)
                    .map(|c| c.affirmative_branch)
                    .collect();
                dispatch_problem_lists(
                    branches,
                    "instance.problem.oneOf.few",
                    "oneOf",
                    self.location,
                    sink,
                );
                Verdict::False
            }
            _ => {
                let branches: Vec<Vec<Problem>> = self
                    .children
                    .drain(..)
                    .filter(|c| matches!(c.affirmative.verdict, Verdict::True | Verdict::Ignored))
                    .map(|c| c.negated_branch.problems)
                    .collect();
                let mut builder = Problem::builder("instance.problem.oneOf.many")
                    .keyword("oneOf")
                    .branches(branches);
                if let Some(location) = self.location {
                    builder = builder.location(location);
                }
                sink.dispatch(builder.build());
                Verdict::False
            }
        }
    }
}

impl Evaluator for ExclusiveEvaluator {
    fn evaluate(&mut self, event: &Event, depth: usize, sink: &mut dyn ProblemSink) -> Verdict {
        if self.location.is_none() {
            self.location = Some(event.location);
        }
        for child in &mut self.children {
            let was_decided = child.affirmative.verdict.is_decided();
            if child
                .affirmative
                .step(event, depth, &mut child.affirmative_branch.problems)
                == Verdict::False
                && !was_decided
            {
                child.affirmative_branch.finish();
            }
            let was_decided = child.negated.verdict.is_decided();
            if child
                .negated
                .step(event, depth, &mut child.negated_branch.problems)
                == Verdict::False
                && !was_decided
            {
                child.negated_branch.finish();
            }
        }
        if self.structured && !closes_scope(event, depth) {
            return Verdict::Pending;
        }
        self.conclude(sink)
    }
}
