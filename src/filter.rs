//! Boolean filter expressions over requirement attributes.
//!
//! Filters are written in a small expression language:
//!
//! ```text
//! Tags == "Rel-1" and not link_error()
//! "UR-1" in elements(Parent) or Parent.startswith("UR-")
//! fullmatch(r"SR-\d{3}", ID) and Verified_by != ""
//! ```
//!
//! An expression is parsed once into a tree and then evaluated against each
//! requirement. Every name the expression mentions must be bound: either one
//! of the helper functions, `req`, or a requirement attribute (spaces in the
//! attribute name replaced by `_`). Any other name is rejected before
//! evaluation starts.

mod ast;
mod eval;
mod lexer;

pub use ast::{BinaryOp, CompareOp, Expr};
pub use eval::{BUILTINS, Value};

use crate::domain::{Project, Requirement};

/// Things that can go wrong compiling or evaluating a filter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// The expression is not well formed.
    #[error("syntax error at column {column}: {message}")]
    Syntax {
        /// 1-based column of the offending character.
        column: usize,
        /// What was wrong.
        message: String,
    },
    /// The expression mentions a name that is not bound.
    #[error("name '{0}' is not allowed in a filter")]
    UnknownName(String),
    /// A key or requirement that was looked up does not exist.
    #[error("lookup failed: {0}")]
    Lookup(String),
    /// An operation was applied to values it does not support.
    #[error("type error: {0}")]
    Type(String),
    /// A regular expression passed to a helper is invalid.
    #[error("invalid regular expression: {0}")]
    Pattern(String),
}

impl FilterError {
    /// Returns `true` for errors that mean "this requirement does not match"
    /// rather than "this filter is broken".
    #[must_use]
    pub const fn is_lookup(&self) -> bool {
        matches!(self, Self::Lookup(_))
    }
}

/// A compiled filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    source: String,
    expr: Expr,
    names: Vec<String>,
}

impl Filter {
    /// Parses a filter expression.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Syntax`] if the expression is malformed.
    pub fn compile(source: &str) -> Result<Self, FilterError> {
        let tokens = lexer::tokenize(source)?;
        let expr = ast::parse(&tokens)?;
        let mut names = Vec::new();
        expr.free_names(&mut names);
        Ok(Self {
            source: source.to_string(),
            expr,
            names,
        })
    }

    /// The expression as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Every free name the expression refers to, including method names, in
    /// order of first appearance.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Checks that every name used is bound for `req` within `project`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnknownName`] for the first unbound name.
    pub fn check_names(&self, req: &Requirement, project: &Project) -> Result<(), FilterError> {
        let env = eval::Environment::new(req, project);
        self.names
            .iter()
            .find(|name| !env.binds(name))
            .map_or(Ok(()), |name| Err(FilterError::UnknownName(name.clone())))
    }

    /// Evaluates the filter for one requirement.
    ///
    /// Only an expression that evaluates to `True` matches. A non-empty
    /// string or list on its own does not: write `Tags != ""` rather than
    /// `Tags`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnknownName`] if the expression refers to a
    /// name that is not bound, and the other variants if evaluation fails.
    pub fn evaluate(&self, req: &Requirement, project: &Project) -> Result<bool, FilterError> {
        self.check_names(req, project)?;
        let env = eval::Environment::new(req, project);
        Ok(matches!(env.eval(&self.expr)?, Value::Bool(true)))
    }
}

/// Compiles and evaluates `expression` for one requirement.
///
/// A failed lookup (a missing key, or a parent requirement that does not
/// exist) means the requirement does not match.
///
/// # Errors
///
/// Returns a [`FilterError`] if the expression is malformed, refers to an
/// unbound name, or fails to evaluate for a reason other than a lookup.
pub fn evaluate(
    req: &Requirement,
    project: &Project,
    expression: &str,
) -> Result<bool, FilterError> {
    match Filter::compile(expression)?.evaluate(req, project) {
        Err(error) if error.is_lookup() => Ok(false),
        result => result,
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::{Diagnostics, Document, MergeDepth};

    fn req(pairs: &[(&str, &str)]) -> Requirement {
        Requirement::try_from_pairs(pairs.iter().copied()).unwrap()
    }

    fn project(reqs: Vec<Requirement>) -> Project {
        let mut diagnostics = Diagnostics::new();
        let mut doc = Document::new("reqs.adoc");
        doc.add_requirements(reqs, &mut diagnostics);
        Project::new(doc, MergeDepth::Children, &mut diagnostics)
    }

    fn sample() -> (Requirement, Project) {
        let parent = req(&[("ID", "UR-1"), ("Text", "p"), ("Child", "SR-1, SR-2")]);
        let child = req(&[
            ("ID", "SR-1"),
            ("Text", "c"),
            ("Parent", "UR-1"),
            ("Tags", "Rel-1, Safety"),
            ("Verified by", "T-1"),
        ]);
        let other = req(&[("ID", "SR-2"), ("Text", "o"), ("Status", "draft")]);
        (child.clone(), project(vec![parent, child, other]))
    }

    #[test_case(r#"Parent.startswith("UR-")"#, true; "startswith method")]
    #[test_case(r#"startswith(Parent, "SR-")"#, false; "startswith function")]
    #[test_case(r#"Tags == "Rel-1, Safety""#, true; "equality")]
    #[test_case(r#""Safety" in elements(Tags)"#, true; "membership in elements")]
    #[test_case(r#"has_element(Tags, "Rel-2")"#, false; "has_element")]
    #[test_case(r#"has_element(Tags, "Rel")"#, true; "has_element matches part of an item")]
    #[test_case(r#"Status == """#, true; "absent attribute is empty")]
    #[test_case(r#"Verified_by == "T-1""#, true; "whitespace in attribute name")]
    #[test_case(r#"req["ID"] == ID"#, true; "req lookup")]
    #[test_case(r#""Tags" in req and not "Status" in req"#, true; "key membership")]
    #[test_case(r#"match("SR", ID) and not match("R-1", ID)"#, true; "match is anchored at start")]
    #[test_case(r#"search("R-1", ID)"#, true; "search")]
    #[test_case(r"fullmatch(r'SR-\d', ID)", true; "fullmatch with raw string")]
    #[test_case(r#"fullmatch("SR", ID)"#, false; "fullmatch needs whole string")]
    #[test_case(r#"not (Status or Parent == "")"#, true; "grouping")]
    #[test_case(
        r#"elements(Tags)[-1] == "Safety" and elements(Tags)[0] < "S""#, true;
        "indexing and ordering"
    )]
    #[test_case(r#"ID + "x" == "SR-1x" and 2 * 3 - 1 == 5 and 7 % 4 == 3"#, true; "arithmetic")]
    #[test_case(r#"ID in ["SR-1", "SR-2"] and "SR-3" not in ["SR-1"]"#, true; "list literals")]
    #[test_case("not link_error() and not has_invalid_link()", true; "consistent links")]
    fn expressions(expression: &str, expected: bool) {
        let (req, project) = sample();
        assert_eq!(evaluate(&req, &project, expression).unwrap(), expected);
    }

    #[test_case("Tags"; "non-empty string")]
    #[test_case("elements(Tags)"; "non-empty list")]
    #[test_case("1"; "non-zero number")]
    #[test_case("ID == 'SR-1' and Tags"; "and yields its last operand")]
    fn only_true_matches(expression: &str) {
        let (req, project) = sample();
        assert_eq!(evaluate(&req, &project, expression), Ok(false));
    }

    #[test_case("Tags != ''"; "explicit comparison")]
    #[test_case("Status != '' or Tags != ''"; "or falls through to a comparison")]
    fn comparisons_match(expression: &str) {
        let (req, project) = sample();
        assert_eq!(evaluate(&req, &project, expression), Ok(true));
    }

    #[test]
    fn method_other_than_startswith_is_rejected() {
        let (req, project) = sample();
        assert_eq!(
            evaluate(&req, &project, r#"Parent.endswith("Foo")"#),
            Err(FilterError::UnknownName("endswith".to_string()))
        );
    }

    #[test_case("__import__('os')"; "dunder")]
    #[test_case("open"; "plain builtin of another language")]
    #[test_case("Unknown == ''"; "attribute nobody defines")]
    fn unbound_names_are_rejected(expression: &str) {
        let (req, project) = sample();
        assert!(matches!(
            evaluate(&req, &project, expression),
            Err(FilterError::UnknownName(_))
        ));
    }

    #[test]
    fn names_are_checked_even_when_not_reached() {
        let (req, project) = sample();
        assert!(matches!(
            evaluate(&req, &project, "True or secret"),
            Err(FilterError::UnknownName(name)) if name == "secret"
        ));
    }

    #[test]
    fn attribute_from_elsewhere_in_project_is_bound() {
        let (req, project) = sample();
        let filter = Filter::compile("Status == '' and Child == ''").unwrap();
        assert!(filter.evaluate(&req, &project).unwrap());
    }

    #[test]
    fn missing_key_does_not_match() {
        let (req, project) = sample();
        assert_eq!(evaluate(&req, &project, "req['Status'] == 'draft'"), Ok(false));
        let filter = Filter::compile("req['Status'] == 'draft'").unwrap();
        assert!(filter.evaluate(&req, &project).unwrap_err().is_lookup());
    }

    #[test_case("ID ==", 6; "dangling operator")]
    #[test_case("(ID", 4; "unclosed parenthesis")]
    #[test_case("ID = 'x'", 4; "assignment")]
    #[test_case("'open", 1; "unterminated string")]
    fn syntax_errors(expression: &str, column: usize) {
        match Filter::compile(expression) {
            Err(FilterError::Syntax { column: found, .. }) => assert_eq!(found, column),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test_case("ID < 3"; "ordering across types")]
    #[test_case("ID()"; "calling a string")]
    #[test_case("elements(1)"; "wrong argument type")]
    #[test_case("link_error(ID)"; "wrong arity")]
    fn type_errors(expression: &str) {
        let (req, project) = sample();
        assert!(matches!(evaluate(&req, &project, expression), Err(FilterError::Type(_))));
    }

    #[test]
    fn invalid_regex() {
        let (req, project) = sample();
        assert!(matches!(
            evaluate(&req, &project, "search('(', ID)"),
            Err(FilterError::Pattern(_))
        ));
    }

    #[test]
    fn free_names_in_order() {
        let filter = Filter::compile("Parent.startswith('UR') and has_element(Tags, x)").unwrap();
        assert_eq!(filter.names(), ["Parent", "startswith", "has_element", "Tags", "x"]);
    }
}
