//! Safety filters that reject mutants which would not compile or would
//! trivially fault
//!
//! Operator substitution is textual, so a new operator may bind to
//! different operands than the node's children. The `rebound_*` walks find
//! the operand that would actually sit next to the new operator.

use crate::context::{MutationContext, RegionKind};
use crate::frontend::ast::{BinaryOp, Expr, ExprKind, OpFamily};
use crate::frontend::eval::evaluate_int;
use crate::frontend::lexer::parse_int_literal;
use crate::frontend::CType;

/// Operand that binds to the left of `op` once it replaces the node's
/// operator
pub fn rebound_left(lhs: &Expr, op: BinaryOp) -> &Expr {
    match &lhs.kind {
        ExprKind::Binary { op: inner, rhs, .. }
            if !inner.is_assignment() && inner.precedence() < op.precedence() =>
        {
            rebound_left(rhs, op)
        }
        _ => lhs,
    }
}

/// Operand that binds to the right of `op`; operators are left
/// associative, so equal precedence rebinds too
pub fn rebound_right(rhs: &Expr, op: BinaryOp) -> &Expr {
    match &rhs.kind {
        ExprKind::Binary { op: inner, lhs, .. }
            if !inner.is_assignment() && inner.precedence() <= op.precedence() =>
        {
            rebound_right(lhs, op)
        }
        _ => rhs,
    }
}

/// Operands of enclosing operators that a looser replacement operator
/// pulls into its own operands
#[derive(Debug, Default)]
pub struct Pulled<'e> {
    pub left: Vec<&'e Expr>,
    pub right: Vec<&'e Expr>,
}

/// Walk outward from `expr` through the enclosing binary operators that
/// would bind tighter than `to` after the textual swap.
///
/// In `a * b + p`, `*` → `<<` reads as `a << (b + p)`, so `p` joins the
/// right operand. `ancestors` lists the enclosing expressions, innermost
/// last.
pub fn pulled_operands<'e>(ancestors: &[&'e Expr], expr: &Expr, to: BinaryOp) -> Pulled<'e> {
    let mut pulled = Pulled::default();
    let mut child = expr.id;
    for &parent in ancestors.iter().rev() {
        let ExprKind::Binary { op, lhs, rhs, .. } = &parent.kind else {
            break;
        };
        if op.is_assignment() {
            break;
        }
        if lhs.id == child && op.precedence() > to.precedence() {
            pulled.right.push(&**rhs);
        } else if rhs.id == child && op.precedence() >= to.precedence() {
            pulled.left.push(&**lhs);
        } else {
            break;
        }
        child = parent.id;
    }
    pulled
}

/// Type an operand made of `base` and the pulled operands behaves as:
/// a pointer if any part is one, otherwise non-integral if any part is
fn operand_type(base: &Expr, pulled: &[&Expr]) -> CType {
    let rank = |ty: &CType| {
        if ty.is_pointer() {
            2
        } else if !ty.is_integral() {
            1
        } else {
            0
        }
    };
    let mut ty = base.ty.decay();
    for part in pulled {
        let candidate = part.ty.decay();
        if rank(&candidate) > rank(&ty) {
            ty = candidate;
        }
    }
    ty
}

/// Whether replacing the operator of `expr` (`from`) by `to` is accepted
pub fn substitution_allowed(ctx: &MutationContext<'_>, expr: &Expr, to: BinaryOp) -> bool {
    let ExprKind::Binary { op: from, lhs, rhs, .. } = &expr.kind else {
        return false;
    };
    let types_ok = if to.is_assignment() {
        assignment_target_allowed(to, lhs, rhs)
    } else {
        let pulled = pulled_operands(ctx.ancestors(), expr, to);
        operator_target_allowed(expr, *from, to, lhs, rhs, &pulled)
    };
    types_ok
        && !divides_by_zero(to, rhs)
        && !makes_divisor_zero(ctx, expr, to)
        && !makes_array_size_negative(ctx, expr, to)
}

fn operator_target_allowed(
    expr: &Expr,
    from: BinaryOp,
    to: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    pulled: &Pulled<'_>,
) -> bool {
    let (left_base, right_base) = (rebound_left(lhs, to), rebound_right(rhs, to));
    let left = operand_type(left_base, &pulled.left);
    let right = operand_type(right_base, &pulled.right);
    match to.family() {
        OpFamily::Bitwise | OpFamily::Shift => {
            lhs.ty.is_integral() && rhs.ty.is_integral() && left.is_integral() && right.is_integral()
        }
        OpFamily::Logical => !(from.family() == OpFamily::Arithmetic && expr.ty.decay().is_pointer()),
        OpFamily::Relational => {
            // a pointer only compares with another pointer or a null constant
            let null_constant = pulled.left.is_empty()
                && pulled.right.is_empty()
                && [left_base, right_base]
                    .into_iter()
                    .any(|e| evaluate_int(e, None) == Some(0));
            !(from.family() == OpFamily::Arithmetic && expr.ty.decay().is_pointer())
                && (left.is_pointer() == right.is_pointer() || null_constant)
        }
        OpFamily::Arithmetic if from.family() == OpFamily::Arithmetic => {
            if rhs.ty.decay().is_pointer() {
                return false;
            }
            if left.is_pointer() {
                return matches!(to, BinaryOp::Add | BinaryOp::Sub);
            }
            to != BinaryOp::Rem || (left.is_integral() && right.is_integral())
        }
        OpFamily::Arithmetic => {
            let usable = |ty: &CType| ty.is_arithmetic() || ty.is_pointer();
            if !usable(&left) || !usable(&right) {
                return false;
            }
            match to {
                BinaryOp::Add => {
                    !(left.is_pointer() && !right.is_integral())
                        && !(right.is_pointer() && !left.is_integral())
                }
                BinaryOp::Sub => !right.is_pointer() && (!left.is_pointer() || right.is_integral()),
                BinaryOp::Mul | BinaryOp::Div => left.is_arithmetic() && right.is_arithmetic(),
                BinaryOp::Rem => left.is_integral() && right.is_integral(),
                _ => false,
            }
        }
        _ => false,
    }
}

fn assignment_target_allowed(to: BinaryOp, lhs: &Expr, rhs: &Expr) -> bool {
    let target = lhs.ty.decay();
    match to.family() {
        OpFamily::BitwiseAssign | OpFamily::ShiftAssign => {
            lhs.ty.is_integral() && rhs.ty.is_integral()
        }
        OpFamily::ArithmeticAssign => {
            if target.is_pointer() {
                return matches!(to, BinaryOp::AddAssign | BinaryOp::SubAssign)
                    && rhs.ty.is_integral();
            }
            if !target.is_arithmetic() || !rhs.ty.is_arithmetic() {
                return false;
            }
            to != BinaryOp::RemAssign || (target.is_integral() && rhs.ty.is_integral())
        }
        _ => false,
    }
}

/// Switching to a division whose right operand is the constant zero
pub fn divides_by_zero(to: BinaryOp, rhs: &Expr) -> bool {
    to.is_division() && evaluate_int(rhs, None) == Some(0)
}

/// The mutation turns an enclosing divisor into the constant zero
pub fn makes_divisor_zero(ctx: &MutationContext<'_>, expr: &Expr, to: BinaryOp) -> bool {
    ctx.divisor_enclosing(&expr.range)
        .is_some_and(|divisor| evaluate_int(divisor, Some((expr.id, to))) == Some(0))
}

/// The mutation turns an enclosing local array size into a negative constant
pub fn makes_array_size_negative(ctx: &MutationContext<'_>, expr: &Expr, to: BinaryOp) -> bool {
    ctx.array_size_enclosing(&expr.range)
        .is_some_and(|size| evaluate_int(size, Some((expr.id, to))).is_some_and(|v| v < 0))
}

/// `expr` is exactly the right operand of a division
pub fn is_exact_divisor(ctx: &MutationContext<'_>, expr: &Expr) -> bool {
    ctx.regions().is_exactly(RegionKind::Divisor, &expr.range)
}

/// Numeric value of a constant candidate
pub fn constant_value(text: &str) -> Option<f64> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = match parse_int_literal(body) {
        Some(v) => v as f64,
        None => body.trim_end_matches(['f', 'F', 'l', 'L']).parse::<f64>().ok()?,
    };
    Some(if negative { -value } else { value })
}

/// Whether a constant candidate may replace `expr`.
///
/// Floating candidates are rejected where only integers compile, zero is
/// rejected as an exact divisor, negative values are rejected as a whole
/// local array size and existing case values are rejected in case labels.
pub fn constant_allowed(ctx: &MutationContext<'_>, expr: &Expr, text: &str, is_float: bool) -> bool {
    let loc = expr.range.start;
    if is_float && ctx.rejects_floating(loc) {
        return false;
    }
    let value = constant_value(text);
    if is_exact_divisor(ctx, expr) && value == Some(0.0) {
        return false;
    }
    if ctx.regions().is_exactly(RegionKind::LocalArraySize, &expr.range)
        && value.is_some_and(|v| v < 0.0)
    {
        return false;
    }
    if ctx.in_region(RegionKind::CaseLabel, loc)
        && ctx
            .case_values()
            .iter()
            .any(|v| v == text || (value.is_some() && constant_value(v) == value))
    {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::StmtKind;
    use crate::frontend::{parse, SourceMap};

    fn returned_expr(src: &str) -> Expr {
        let map = SourceMap::new(src);
        let tu = parse(&map).unwrap();
        let body = &tu.functions().next().unwrap().body;
        let StmtKind::Compound(items) = &body.kind else {
            panic!("expected compound body");
        };
        let StmtKind::Return(Some(expr)) = &items[0].kind else {
            panic!("expected return");
        };
        expr.clone()
    }

    #[test]
    fn test_rebound_left_follows_lower_precedence() {
        // a - b + c: the root is `+`; swapping it for `*` makes b bind to c
        let expr = returned_expr("int f(int a, int b, int c) { return a - b + c; }");
        let ExprKind::Binary { lhs, .. } = &expr.kind else {
            panic!("expected binary");
        };
        let left = rebound_left(lhs, BinaryOp::Mul);
        assert!(matches!(&left.kind, ExprKind::Ident { name, .. } if name == "b"));
        // same precedence does not rebind on the left
        assert_eq!(rebound_left(lhs, BinaryOp::Add).range, lhs.range);
    }

    #[test]
    fn test_rebound_right_follows_equal_precedence() {
        let expr = returned_expr("int f(int a, int b, int c) { return a < b + c; }");
        let ExprKind::Binary { rhs, .. } = &expr.kind else {
            panic!("expected binary");
        };
        let right = rebound_right(rhs, BinaryOp::Sub);
        assert!(matches!(&right.kind, ExprKind::Ident { name, .. } if name == "b"));
        assert_eq!(rebound_right(rhs, BinaryOp::Lt).range, rhs.range);
    }

    #[test]
    fn test_pointer_arithmetic_rules() {
        let expr = returned_expr("int *f(int *p, int n) { return p + n; }");
        let ExprKind::Binary { lhs, rhs, .. } = &expr.kind else {
            panic!("expected binary");
        };
        let none = Pulled::default();
        assert!(operator_target_allowed(&expr, BinaryOp::Add, BinaryOp::Sub, lhs, rhs, &none));
        assert!(!operator_target_allowed(&expr, BinaryOp::Add, BinaryOp::Mul, lhs, rhs, &none));
        assert!(!operator_target_allowed(&expr, BinaryOp::Add, BinaryOp::Lt, lhs, rhs, &none));
        assert!(!operator_target_allowed(&expr, BinaryOp::Add, BinaryOp::BitAnd, lhs, rhs, &none));
    }

    #[test]
    fn test_relational_to_arithmetic_with_pointers() {
        let expr = returned_expr("int f(int *p, int *q) { return p == q; }");
        let ExprKind::Binary { lhs, rhs, .. } = &expr.kind else {
            panic!("expected binary");
        };
        let none = Pulled::default();
        assert!(!operator_target_allowed(&expr, BinaryOp::Eq, BinaryOp::Add, lhs, rhs, &none));
        assert!(!operator_target_allowed(&expr, BinaryOp::Eq, BinaryOp::Sub, lhs, rhs, &none));
        assert!(operator_target_allowed(&expr, BinaryOp::Eq, BinaryOp::Lt, lhs, rhs, &none));
    }

    #[test]
    fn test_looser_operator_pulls_enclosing_operands() {
        // a * b + p: `*` → `<<` reads as a << (b + p)
        let expr = returned_expr("int *f(int *p, int a, int b) { return a * b + p; }");
        let ExprKind::Binary { lhs: product, .. } = &expr.kind else {
            panic!("expected binary");
        };
        let ancestors = [&expr];
        let pulled = pulled_operands(&ancestors, product, BinaryOp::Shl);
        assert!(pulled.left.is_empty());
        assert_eq!(pulled.right.len(), 1);
        assert!(pulled.right[0].ty.is_pointer());
        // `-` binds no looser than `+`, so nothing is pulled
        let pulled = pulled_operands(&ancestors, product, BinaryOp::Sub);
        assert!(pulled.left.is_empty() && pulled.right.is_empty());

        let ExprKind::Binary { lhs, rhs, .. } = &product.kind else {
            panic!("expected nested binary");
        };
        let pulled = pulled_operands(&ancestors, product, BinaryOp::BitAnd);
        assert!(!operator_target_allowed(product, BinaryOp::Mul, BinaryOp::BitAnd, lhs, rhs, &pulled));
        let pulled = pulled_operands(&ancestors, product, BinaryOp::Lt);
        assert!(!operator_target_allowed(product, BinaryOp::Mul, BinaryOp::Lt, lhs, rhs, &pulled));
    }

    #[test]
    fn test_right_operand_pulls_enclosing_left() {
        // x + a * b: `*` → `>>` reads as (x + a) >> b
        let expr = returned_expr("double f(double x, int a, int b) { return x + a * b; }");
        let ExprKind::Binary { rhs: product, .. } = &expr.kind else {
            panic!("expected binary");
        };
        let ancestors = [&expr];
        let pulled = pulled_operands(&ancestors, product, BinaryOp::Shr);
        assert_eq!(pulled.left.len(), 1);
        let ExprKind::Binary { lhs, rhs, .. } = &product.kind else {
            panic!("expected nested binary");
        };
        assert!(!operator_target_allowed(product, BinaryOp::Mul, BinaryOp::Shr, lhs, rhs, &pulled));
    }

    #[test]
    fn test_pointer_compares_with_null_constant() {
        let expr = returned_expr("int f(int *p) { return p != 0; }");
        let ExprKind::Binary { lhs, rhs, .. } = &expr.kind else {
            panic!("expected binary");
        };
        let none = Pulled::default();
        assert!(operator_target_allowed(&expr, BinaryOp::Ne, BinaryOp::Eq, lhs, rhs, &none));
    }

    #[test]
    fn test_assignment_targets() {
        let expr = returned_expr("int *f(int *p) { return p = p; }");
        let ExprKind::Binary { lhs, rhs, .. } = &expr.kind else {
            panic!("expected binary");
        };
        // pointer target with a pointer value: nothing compiles
        assert!(!assignment_target_allowed(BinaryOp::AddAssign, lhs, rhs));

        let expr = returned_expr("double f(double x, int n) { return x = n; }");
        let ExprKind::Binary { lhs, rhs, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert!(assignment_target_allowed(BinaryOp::MulAssign, lhs, rhs));
        assert!(!assignment_target_allowed(BinaryOp::RemAssign, lhs, rhs));
        assert!(!assignment_target_allowed(BinaryOp::ShlAssign, lhs, rhs));
    }

    #[test]
    fn test_divides_by_zero() {
        let expr = returned_expr("int f(int a) { return a * (1 - 1); }");
        let ExprKind::Binary { rhs, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert!(divides_by_zero(BinaryOp::Div, rhs));
        assert!(!divides_by_zero(BinaryOp::Add, rhs));
    }

    #[test]
    fn test_constant_value() {
        assert_eq!(constant_value("0x10"), Some(16.0));
        assert_eq!(constant_value("-0.0"), Some(0.0));
        assert_eq!(constant_value("-3"), Some(-3.0));
        assert_eq!(constant_value("1.5f"), Some(1.5));
        assert_eq!(constant_value("abc"), None);
    }
}
