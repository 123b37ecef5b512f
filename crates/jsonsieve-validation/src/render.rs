//! Text rendering for problems.
//!
//! Simple problems render as one `[row,col] message` line. Compound
//! problems (`anyOf`, `oneOf.few`, `oneOf.many`) render a header line
//! followed by indented branch groups, one group per attempted subschema.

use crate::catalog::Locale;
use crate::problem::Problem;
use std::fmt::Write;

/// Renders problems into human-readable text in a fixed locale.
#[derive(Debug, Clone, Default)]
pub struct ProblemRenderer {
    locale: Locale,
}

impl ProblemRenderer {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    /// Render one problem, including its branches, as a multi-line string
    /// without a trailing newline.
    pub fn render(&self, problem: &Problem) -> String {
        let mut out = String::new();
        self.render_into(problem, 0, &mut out);
        out
    }

    /// Render a whole problem list, one problem per line group.
    pub fn render_all(&self, problems: &[Problem]) -> String {
        let mut out = String::new();
        for (i, problem) in problems.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            self.render_into(problem, 0, &mut out);
        }
        out
    }

    fn render_into(&self, problem: &Problem, indent: usize, out: &mut String) {
        for _ in 0..indent {
            out.push_str("    ");
        }
        if let Some(location) = problem.location() {
            let _ = write!(out, "[{},{}] ", location.row + 1, location.column + 1);
        }
        out.push_str(&problem.message(&self.locale));
        for (index, branch) in problem.branches().iter().enumerate() {
            out.push('\n');
            for _ in 0..indent + 1 {
                out.push_str("    ");
            }
            let _ = write!(out, "{})", index + 1);
            for child in branch {
                out.push('\n');
                self.render_into(child, indent + 2, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonsieve_json::Location;

    #[test]
    fn test_simple_line() {
        let problem = Problem::builder("instance.problem.anyOf")
            .location(Location::new(5, 2, 4))
            .build();
        let line = ProblemRenderer::default().render(&problem);
        assert!(line.starts_with("[3,5] "), "{line}");
    }

    #[test]
    fn test_branches_are_indented() {
        let child = Problem::builder("instance.problem.rejected").build();
        let problem = Problem::builder("instance.problem.oneOf.few")
            .branches(vec![vec![child.clone()], vec![child]])
            .build();
        let text = ProblemRenderer::default().render(&problem);
        assert!(text.contains("1)"), "{text}");
        assert!(text.contains("2)"), "{text}");
        assert_eq!(text.lines().count(), 5, "{text}");
    }
}
