//! Off-by-one twiddles: VTWD on scalar references, VTWF on calls

use crate::context::{is_scalar_reference, MutationContext};
use crate::frontend::ast::{Expr, ExprKind};
use crate::recorder::SiteRecorder;

use super::{eligible, ExprOperator, Tokens};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwiddleTarget {
    /// Scalar variables, subscripts, members and dereferences
    Reference,
    /// Calls returning an arithmetic value
    Call,
}

/// `x` → `(x+1)`, `(x-1)`
#[derive(Debug)]
pub struct Twiddle {
    name: &'static str,
    target: TwiddleTarget,
    tokens: Tokens,
}

impl Twiddle {
    pub fn new(name: &'static str, target: TwiddleTarget, tokens: Tokens) -> Self {
        Self {
            name,
            target,
            tokens,
        }
    }

    /// Name the domain is matched against, if the node has one
    fn matched_name<'e>(&self, expr: &'e Expr) -> Option<&'e str> {
        match self.target {
            TwiddleTarget::Reference => match &expr.kind {
                ExprKind::Ident { name, .. } => Some(name),
                _ => None,
            },
            TwiddleTarget::Call => expr.callee_name(),
        }
    }

    fn matches_domain(&self, expr: &Expr) -> bool {
        match self.matched_name(expr) {
            Some(name) => self.tokens.matches_domain(name),
            None => self.tokens.domain.is_empty(),
        }
    }
}

impl ExprOperator for Twiddle {
    fn name(&self) -> &str {
        self.name
    }

    fn is_applicable(&self, expr: &Expr, ctx: &MutationContext<'_>) -> bool {
        let shape = match self.target {
            TwiddleTarget::Reference => {
                is_scalar_reference(expr)
                    && !ctx.in_modified_position(expr.range.start)
                    && !ctx.is_twiddle_suppressed(expr.id)
            }
            TwiddleTarget::Call => {
                matches!(expr.kind, ExprKind::Call { .. }) && expr.ty.is_arithmetic()
            }
        };
        shape
            && ctx.current_function().is_some()
            && self.matches_domain(expr)
            && eligible(ctx, &expr.range)
    }

    fn apply(&self, expr: &Expr, ctx: &MutationContext<'_>, site: &mut SiteRecorder<'_>) {
        let original = ctx.text(expr.range);
        site.emit(original, expr.range, format!("({}+1)", original));
        site.emit(original, expr.range, format!("({}-1)", original));
    }
}

#[cfg(test)]
mod tests {
    use crate::config::OperatorConfig;
    use crate::operators::testing::{mutants, replacements};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_twiddles_scalar_reference() {
        assert_eq!(
            replacements("int f(int *p, int i) { return p[i]; }", "VTWD"),
            vec!["(p[i]+1)", "(p[i]-1)", "(i+1)", "(i-1)"]
        );
    }

    #[test]
    fn test_one_reference_per_additive_chain() {
        let found = mutants(
            "int f(int a, int b, int c) { return a + b - c; }",
            &[OperatorConfig::named("VTWD")],
        );
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|(original, _)| original == "a"));
    }

    #[test]
    fn test_modified_positions_are_skipped() {
        assert!(replacements("void f(int x) { x = 1; x++; }", "VTWD").is_empty());
    }

    #[test]
    fn test_call_twiddle() {
        let src = "int g(void);\nvoid h(void);\nint f(void) { h(); return g(); }\n";
        assert_eq!(replacements(src, "VTWF"), vec!["(g()+1)", "(g()-1)"]);
        let found = mutants(src, &[OperatorConfig::new("VTWF", &["h"], &[])]);
        assert!(found.is_empty());
    }
}
