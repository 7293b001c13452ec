//! Mutation operator framework
//!
//! Every operator is a value implementing one of two small capability traits:
//! [`ExprOperator`] for expression nodes and [`StmtOperator`] for statement
//! nodes. Operators are stateless; everything they know about the traversal
//! comes from the [`MutationContext`] they are handed, and everything they
//! produce goes through a [`SiteRecorder`].
//!
//! The [`catalog`] holds the fixed set of operator names together with the
//! tokens each one may be configured with.

pub mod binary;
pub mod call;
pub mod cast;
pub mod catalog;
pub mod constant;
pub mod safety;
pub mod statement;
pub mod string;
pub mod twiddle;
pub mod unary;
pub mod variable;

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::OperatorConfig;
use crate::context::{MutationContext, RegionKind};
use crate::error::Result;
use crate::frontend::ast::{Expr, Stmt};
use crate::frontend::SourceRange;
use crate::recorder::{Recorder, SiteRecorder};

pub use catalog::{lookup, OperatorDef, TokenRule, CATALOG};

/// Operator over expression nodes
pub trait ExprOperator: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the operator has anything to say about `expr` at this point
    /// of the traversal
    fn is_applicable(&self, expr: &Expr, ctx: &MutationContext<'_>) -> bool;

    /// Emit every accepted replacement for `expr`
    fn apply(&self, expr: &Expr, ctx: &MutationContext<'_>, site: &mut SiteRecorder<'_>);
}

/// Operator over statement nodes
pub trait StmtOperator: Send + Sync {
    fn name(&self) -> &str;

    fn is_applicable(&self, stmt: &Stmt, ctx: &MutationContext<'_>) -> bool;

    fn apply(&self, stmt: &Stmt, ctx: &MutationContext<'_>, site: &mut SiteRecorder<'_>);
}

/// A configured operator of either shape
pub enum Operator {
    Expr(Box<dyn ExprOperator>),
    Stmt(Box<dyn StmtOperator>),
}

impl Operator {
    pub fn name(&self) -> &str {
        match self {
            Operator::Expr(op) => op.name(),
            Operator::Stmt(op) => op.name(),
        }
    }
}

/// Effective domain and range of a configured operator.
///
/// An empty domain matches every token; an empty range places no
/// restriction on the candidates an operator computes itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    pub domain: BTreeSet<String>,
    pub range: BTreeSet<String>,
}

impl Tokens {
    pub fn new<D, R>(domain: D, range: R) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            domain: domain.into_iter().map(Into::into).collect(),
            range: range.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches_domain(&self, token: &str) -> bool {
        self.domain.is_empty() || self.domain.contains(token)
    }

    pub fn allows(&self, candidate: &str) -> bool {
        self.range.is_empty() || self.range.contains(candidate)
    }
}

/// Checks shared by every operator: the token lies in the mutable part of
/// the file and outside typedef bodies, prototypes and field declarations
pub(crate) fn eligible(ctx: &MutationContext<'_>, range: &SourceRange) -> bool {
    ctx.is_in_mutation_range(range)
        && !ctx.in_region(RegionKind::Typedef, range.start)
        && !ctx.in_region(RegionKind::FunctionPrototype, range.start)
        && !ctx.in_region(RegionKind::FieldDecl, range.start)
}

/// The enabled operators and the per-site mutant limit
pub struct OperatorSet {
    expr_operators: Vec<Box<dyn ExprOperator>>,
    stmt_operators: Vec<Box<dyn StmtOperator>>,
    limit: usize,
}

impl OperatorSet {
    /// Build the configured operators; an empty list enables the whole
    /// catalog with default domains and ranges
    pub fn from_config(configs: &[OperatorConfig], limit: usize) -> Result<Self> {
        let mut set = Self {
            expr_operators: Vec::new(),
            stmt_operators: Vec::new(),
            limit,
        };
        if configs.is_empty() {
            for def in CATALOG {
                set.push(def.build(&[], &[])?);
            }
        } else {
            for config in configs {
                let def = lookup(&config.name)?;
                set.push(def.build(&config.domain, &config.range)?);
            }
        }
        debug!(operators = set.len(), limit, "configured operator set");
        Ok(set)
    }

    /// Every catalog operator with its defaults
    pub fn all(limit: usize) -> Result<Self> {
        Self::from_config(&[], limit)
    }

    fn push(&mut self, operator: Operator) {
        match operator {
            Operator::Expr(op) => self.expr_operators.push(op),
            Operator::Stmt(op) => self.stmt_operators.push(op),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.expr_operators.len() + self.stmt_operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self) -> Vec<&str> {
        self.expr_operators
            .iter()
            .map(|op| op.name())
            .chain(self.stmt_operators.iter().map(|op| op.name()))
            .collect()
    }

    /// Run every applicable expression operator on `expr`
    pub fn mutate_expr(&self, expr: &Expr, ctx: &MutationContext<'_>, recorder: &mut Recorder) {
        for op in &self.expr_operators {
            if op.is_applicable(expr, ctx) {
                let mut site = recorder.site(op.name(), ctx.statement_line(), self.limit);
                op.apply(expr, ctx, &mut site);
            }
        }
    }

    /// Run every applicable statement operator on `stmt`
    pub fn mutate_stmt(&self, stmt: &Stmt, ctx: &MutationContext<'_>, recorder: &mut Recorder) {
        for op in &self.stmt_operators {
            if op.is_applicable(stmt, ctx) {
                let mut site = recorder.site(op.name(), ctx.statement_line(), self.limit);
                op.apply(stmt, ctx, &mut site);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers for driving a single operator over a small program

    use super::*;
    use crate::context::{Inventory, MutationBounds};
    use crate::frontend::{parse, SourceMap};
    use crate::recorder::MutantEntry;
    use crate::runner::generate_mutants;

    /// Mutants produced by `operators` over `src`, as `(original, replacement)`
    pub fn mutants(src: &str, operators: &[OperatorConfig]) -> Vec<(String, String)> {
        entries(src, operators)
            .into_iter()
            .map(|e| (e.original, e.replacement))
            .collect()
    }

    pub fn entries(src: &str, operators: &[OperatorConfig]) -> Vec<MutantEntry> {
        let map = SourceMap::new(src);
        let tu = parse(&map).unwrap();
        let set = OperatorSet::from_config(operators, usize::MAX).unwrap();
        let inventory = Inventory::gather(&tu, &map);
        let recorder =
            generate_mutants(&map, &tu, &inventory, MutationBounds::whole_file(&map), &set).unwrap();
        recorder.entries().to_vec()
    }

    /// Only the replacements emitted by operator `name` with its defaults
    pub fn replacements(src: &str, name: &str) -> Vec<String> {
        mutants(src, &[OperatorConfig::named(name)])
            .into_iter()
            .map(|(_, replacement)| replacement)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_empty_means_any() {
        let tokens = Tokens::default();
        assert!(tokens.matches_domain("+"));
        assert!(tokens.allows("x"));

        let tokens = Tokens::new(["+"], ["-", "*"]);
        assert!(tokens.matches_domain("+"));
        assert!(!tokens.matches_domain("-"));
        assert!(tokens.allows("*"));
        assert!(!tokens.allows("/"));
    }

    #[test]
    fn test_whole_catalog_builds() {
        let set = OperatorSet::all(3).unwrap();
        assert_eq!(set.len(), CATALOG.len());
        assert_eq!(set.limit(), 3);
        assert!(set.names().contains(&"SSDL"));
    }

    #[test]
    fn test_configured_subset() {
        let set = OperatorSet::from_config(
            &[OperatorConfig::named("OAAN"), OperatorConfig::named("SSDL")],
            10,
        )
        .unwrap();
        assert_eq!(set.names(), vec!["OAAN", "SSDL"]);
    }

    #[test]
    fn test_unknown_operator_is_fatal() {
        let err = OperatorSet::from_config(&[OperatorConfig::named("XXXX")], 10)
            .err()
            .unwrap();
        assert!(matches!(err, crate::error::MutationError::UnknownOperator { .. }));
    }
}
