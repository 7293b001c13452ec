//! Unary and negation operators: OPPO, OMMO, OLNG, OBNG, OCNG, OIPM

use crate::context::{MutationContext, RegionKind};
use crate::frontend::ast::{Expr, ExprKind, OpFamily, UnaryOp};
use crate::frontend::SourceRange;
use crate::recorder::SiteRecorder;

use super::{eligible, ExprOperator, Tokens};

/// Operand text wrapped in parentheses unless it is already primary
fn wrapped(ctx: &MutationContext<'_>, expr: &Expr) -> String {
    let text = ctx.text(expr.range);
    match &expr.kind {
        ExprKind::Ident { .. }
        | ExprKind::IntLiteral { .. }
        | ExprKind::FloatLiteral { .. }
        | ExprKind::CharLiteral { .. }
        | ExprKind::StringLiteral { .. }
        | ExprKind::Paren(_)
        | ExprKind::Call { .. }
        | ExprKind::Index { .. }
        | ExprKind::Member { .. } => text.to_string(),
        _ => format!("({})", text),
    }
}

/// OPPO and OMMO: `x++` → `++x`, `x--` and the mirrors
#[derive(Debug)]
pub struct IncDecMutation {
    name: &'static str,
    increment: bool,
}

impl IncDecMutation {
    pub fn increment(name: &'static str) -> Self {
        Self {
            name,
            increment: true,
        }
    }

    pub fn decrement(name: &'static str) -> Self {
        Self {
            name,
            increment: false,
        }
    }
}

impl ExprOperator for IncDecMutation {
    fn name(&self) -> &str {
        self.name
    }

    fn is_applicable(&self, expr: &Expr, ctx: &MutationContext<'_>) -> bool {
        match &expr.kind {
            ExprKind::Unary { op, .. } => {
                let matches = if self.increment {
                    op.is_increment()
                } else {
                    op.is_decrement()
                };
                matches && eligible(ctx, &expr.range)
            }
            _ => false,
        }
    }

    fn apply(&self, expr: &Expr, ctx: &MutationContext<'_>, site: &mut SiteRecorder<'_>) {
        let ExprKind::Unary { op, operand, .. } = &expr.kind else {
            return;
        };
        let original = ctx.text(expr.range);
        let x = ctx.text(operand.range);
        let (same, other) = if self.increment { ("++", "--") } else { ("--", "++") };
        let (moved, flipped) = if op.is_postfix() {
            (format!("{}{}", same, x), format!("{}{}", x, other))
        } else {
            (format!("{}{}", x, same), format!("{}{}", other, x))
        };
        site.emit(original, expr.range, moved);
        site.emit(original, expr.range, flipped);
    }
}

/// Shared shape of OLNG and OBNG: negate the whole expression or either
/// operand of a binary operator
fn negations(ctx: &MutationContext<'_>, expr: &Expr, negate: &str) -> Vec<String> {
    let ExprKind::Binary { lhs, rhs, .. } = &expr.kind else {
        return Vec::new();
    };
    let whole = format!("{}({})", negate, ctx.text(expr.range));
    let left = format!(
        "{}{}{}",
        negate,
        wrapped(ctx, lhs),
        ctx.text(SourceRange::new(lhs.range.end, expr.range.end))
    );
    let right = format!(
        "{}{}{}",
        ctx.text(SourceRange::new(expr.range.start, rhs.range.start)),
        negate,
        wrapped(ctx, rhs)
    );
    vec![whole, left, right]
}

/// OLNG: `a && b` → `!(a && b)`, `!a && b`, `a && !b`
#[derive(Debug)]
pub struct LogicalNegation {
    name: &'static str,
    tokens: Tokens,
}

impl LogicalNegation {
    pub fn new(name: &'static str, tokens: Tokens) -> Self {
        Self { name, tokens }
    }
}

impl ExprOperator for LogicalNegation {
    fn name(&self) -> &str {
        self.name
    }

    fn is_applicable(&self, expr: &Expr, ctx: &MutationContext<'_>) -> bool {
        match &expr.kind {
            ExprKind::Binary { op, .. } => {
                op.family() == OpFamily::Logical
                    && self.tokens.matches_domain(op.as_str())
                    && eligible(ctx, &expr.range)
            }
            _ => false,
        }
    }

    fn apply(&self, expr: &Expr, ctx: &MutationContext<'_>, site: &mut SiteRecorder<'_>) {
        let original = ctx.text(expr.range);
        for replacement in negations(ctx, expr, "!") {
            site.emit(original, expr.range, replacement);
        }
    }
}

/// OBNG: `a & b` → `~(a & b)`, `~a & b`, `a & ~b`
#[derive(Debug)]
pub struct BitwiseNegation {
    name: &'static str,
    tokens: Tokens,
}

impl BitwiseNegation {
    pub fn new(name: &'static str, tokens: Tokens) -> Self {
        Self { name, tokens }
    }
}

impl ExprOperator for BitwiseNegation {
    fn name(&self) -> &str {
        self.name
    }

    fn is_applicable(&self, expr: &Expr, ctx: &MutationContext<'_>) -> bool {
        match &expr.kind {
            ExprKind::Binary { op, lhs, rhs, .. } => {
                op.family() == OpFamily::Bitwise
                    && self.tokens.matches_domain(op.as_str())
                    && lhs.ty.is_integral()
                    && rhs.ty.is_integral()
                    && eligible(ctx, &expr.range)
            }
            _ => false,
        }
    }

    fn apply(&self, expr: &Expr, ctx: &MutationContext<'_>, site: &mut SiteRecorder<'_>) {
        let original = ctx.text(expr.range);
        for replacement in negations(ctx, expr, "~") {
            site.emit(original, expr.range, replacement);
        }
    }
}

/// OCNG: the controlling expression `c` of a branch becomes `!(c)`
#[derive(Debug)]
pub struct ConditionNegation {
    pub name: &'static str,
}

impl ExprOperator for ConditionNegation {
    fn name(&self) -> &str {
        self.name
    }

    fn is_applicable(&self, expr: &Expr, ctx: &MutationContext<'_>) -> bool {
        ctx.regions()
            .is_exactly(RegionKind::BranchCondition, &expr.range)
            && eligible(ctx, &expr.range)
    }

    fn apply(&self, expr: &Expr, ctx: &MutationContext<'_>, site: &mut SiteRecorder<'_>) {
        let original = ctx.text(expr.range);
        site.emit(original, expr.range, format!("!({})", original));
    }
}

/// OIPM: `*p++` → `(*p)++`, `*--p` → `--(*p)`
#[derive(Debug)]
pub struct IndirectionPrecedence {
    pub name: &'static str,
}

impl IndirectionPrecedence {
    fn inner<'e>(expr: &'e Expr) -> Option<(UnaryOp, &'e Expr)> {
        let ExprKind::Unary {
            op: UnaryOp::Deref,
            operand,
            ..
        } = &expr.kind
        else {
            return None;
        };
        match &operand.kind {
            ExprKind::Unary { op, operand, .. } if op.is_increment() || op.is_decrement() => {
                Some((*op, operand))
            }
            _ => None,
        }
    }
}

impl ExprOperator for IndirectionPrecedence {
    fn name(&self) -> &str {
        self.name
    }

    fn is_applicable(&self, expr: &Expr, ctx: &MutationContext<'_>) -> bool {
        Self::inner(expr).is_some()
            && (expr.ty.is_arithmetic() || expr.ty.is_pointer())
            && !ctx.in_modified_position(expr.range.start)
            && eligible(ctx, &expr.range)
    }

    fn apply(&self, expr: &Expr, ctx: &MutationContext<'_>, site: &mut SiteRecorder<'_>) {
        let Some((op, pointer)) = Self::inner(expr) else {
            return;
        };
        let deref = format!("(*{})", ctx.text(pointer.range));
        let replacement = if op.is_postfix() {
            format!("{}{}", deref, op.as_str())
        } else {
            format!("{}{}", op.as_str(), deref)
        };
        site.emit(ctx.text(expr.range), expr.range, replacement);
    }
}

#[cfg(test)]
mod tests {
    use crate::operators::testing::{mutants, replacements};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_increment_forms() {
        assert_eq!(
            replacements("void f(int x) { x++; }", "OPPO"),
            vec!["++x", "x--"]
        );
        assert_eq!(
            replacements("void f(int x) { ++x; }", "OPPO"),
            vec!["x++", "--x"]
        );
        assert_eq!(
            replacements("void f(int x) { x--; }", "OMMO"),
            vec!["--x", "x++"]
        );
        assert!(replacements("void f(int x) { x--; }", "OPPO").is_empty());
    }

    #[test]
    fn test_logical_negation() {
        assert_eq!(
            replacements("int f(int a, int b) { return a && b < 2; }", "OLNG"),
            vec!["!(a && b < 2)", "!a && b < 2", "a && !(b < 2)"]
        );
    }

    #[test]
    fn test_bitwise_negation() {
        assert_eq!(
            replacements("int f(int a, int b) { return a | b; }", "OBNG"),
            vec!["~(a | b)", "~a | b", "a | ~b"]
        );
    }

    #[test]
    fn test_condition_negation() {
        let found = mutants(
            "void f(int a) { if (a > 1) a = 0; while (a) a--; }",
            &[crate::config::OperatorConfig::named("OCNG")],
        );
        assert_eq!(
            found,
            vec![
                ("a > 1".to_string(), "!(a > 1)".to_string()),
                ("a".to_string(), "!(a)".to_string()),
            ]
        );
    }

    #[test]
    fn test_indirection_precedence() {
        assert_eq!(
            replacements("int f(int *p) { return *p++; }", "OIPM"),
            vec!["(*p)++"]
        );
        // not an lvalue once the increment moves outside
        assert!(replacements("void f(int *p) { *p++ = 1; }", "OIPM").is_empty());
    }
}
