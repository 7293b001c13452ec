//! Integer constant evaluation
//!
//! The optional override lets callers ask "what would this expression
//! evaluate to if node N used operator OP instead", without rewriting the AST.

use super::ast::{BinaryOp, Binding, Expr, ExprKind, NodeId, UnaryOp};
use super::types::CType;

/// Operator substitution applied to one binary node during evaluation
pub type OpOverride = Option<(NodeId, BinaryOp)>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(v) => v as f64,
            Num::Float(v) => v,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Num::Int(v) => v == 0,
            Num::Float(v) => v == 0.0,
        }
    }
}

/// Value of an integer constant expression, or `None` if it is not one
pub fn evaluate_int(expr: &Expr, override_op: OpOverride) -> Option<i64> {
    if !expr.ty.is_integral() {
        return None;
    }
    match evaluate(expr, override_op)? {
        Num::Int(v) => Some(v),
        Num::Float(v) => Some(v as i64),
    }
}

fn evaluate(expr: &Expr, override_op: OpOverride) -> Option<Num> {
    match &expr.kind {
        ExprKind::IntLiteral { value, .. } | ExprKind::CharLiteral { value, .. } => {
            Some(Num::Int(*value))
        }
        ExprKind::FloatLiteral { value, .. } => Some(Num::Float(*value)),
        ExprKind::Ident {
            binding: Binding::EnumConstant(v),
            ..
        } => Some(Num::Int(*v)),
        ExprKind::Paren(inner) => evaluate(inner, override_op),
        ExprKind::Cast { target, operand, .. } => {
            let value = evaluate(operand, override_op)?;
            convert(value, target)
        }
        ExprKind::Unary { op, operand, .. } => {
            let value = evaluate(operand, override_op)?;
            match (op, value) {
                (UnaryOp::Plus, v) => Some(v),
                (UnaryOp::Minus, Num::Int(v)) => Some(Num::Int(v.wrapping_neg())),
                (UnaryOp::Minus, Num::Float(v)) => Some(Num::Float(-v)),
                (UnaryOp::Not, v) => Some(Num::Int(v.is_zero() as i64)),
                (UnaryOp::BitNot, Num::Int(v)) => Some(Num::Int(!v)),
                _ => None,
            }
        }
        ExprKind::Conditional {
            cond,
            then_expr,
            else_expr,
        } => {
            if evaluate(cond, override_op)?.is_zero() {
                evaluate(else_expr, override_op)
            } else {
                evaluate(then_expr, override_op)
            }
        }
        ExprKind::Binary { op, lhs, rhs, .. } => {
            let op = match override_op {
                Some((id, replacement)) if id == expr.id => replacement,
                _ => *op,
            };
            if op.is_assignment() {
                return None;
            }
            let l = evaluate(lhs, override_op)?;
            if op == BinaryOp::And && l.is_zero() {
                return Some(Num::Int(0));
            }
            if op == BinaryOp::Or && !l.is_zero() {
                return Some(Num::Int(1));
            }
            let r = evaluate(rhs, override_op)?;
            apply_binary(op, l, r)
        }
        _ => None,
    }
}

fn convert(value: Num, target: &CType) -> Option<Num> {
    if target.is_integral() {
        Some(Num::Int(match value {
            Num::Int(v) => v,
            Num::Float(v) => v as i64,
        }))
    } else if target.is_floating() {
        Some(Num::Float(value.as_f64()))
    } else {
        None
    }
}

fn apply_binary(op: BinaryOp, l: Num, r: Num) -> Option<Num> {
    let truth = |b: bool| Some(Num::Int(b as i64));
    match (l, r) {
        (Num::Int(a), Num::Int(b)) => match op {
            BinaryOp::Add => Some(Num::Int(a.wrapping_add(b))),
            BinaryOp::Sub => Some(Num::Int(a.wrapping_sub(b))),
            BinaryOp::Mul => Some(Num::Int(a.wrapping_mul(b))),
            BinaryOp::Div => a.checked_div(b).map(Num::Int),
            BinaryOp::Rem => a.checked_rem(b).map(Num::Int),
            BinaryOp::Shl => u32::try_from(b)
                .ok()
                .filter(|s| *s < 64)
                .map(|s| Num::Int(a.wrapping_shl(s))),
            BinaryOp::Shr => u32::try_from(b)
                .ok()
                .filter(|s| *s < 64)
                .map(|s| Num::Int(a.wrapping_shr(s))),
            BinaryOp::BitAnd => Some(Num::Int(a & b)),
            BinaryOp::BitOr => Some(Num::Int(a | b)),
            BinaryOp::BitXor => Some(Num::Int(a ^ b)),
            BinaryOp::Lt => truth(a < b),
            BinaryOp::Gt => truth(a > b),
            BinaryOp::Le => truth(a <= b),
            BinaryOp::Ge => truth(a >= b),
            BinaryOp::Eq => truth(a == b),
            BinaryOp::Ne => truth(a != b),
            BinaryOp::And => truth(a != 0 && b != 0),
            BinaryOp::Or => truth(a != 0 || b != 0),
            BinaryOp::Comma => Some(Num::Int(b)),
            _ => None,
        },
        _ => {
            let (a, b) = (l.as_f64(), r.as_f64());
            match op {
                BinaryOp::Add => Some(Num::Float(a + b)),
                BinaryOp::Sub => Some(Num::Float(a - b)),
                BinaryOp::Mul => Some(Num::Float(a * b)),
                BinaryOp::Div if b != 0.0 => Some(Num::Float(a / b)),
                BinaryOp::Lt => truth(a < b),
                BinaryOp::Gt => truth(a > b),
                BinaryOp::Le => truth(a <= b),
                BinaryOp::Ge => truth(a >= b),
                BinaryOp::Eq => truth(a == b),
                BinaryOp::Ne => truth(a != b),
                BinaryOp::And => truth(a != 0.0 && b != 0.0),
                BinaryOp::Or => truth(a != 0.0 || b != 0.0),
                BinaryOp::Comma => Some(r),
                _ => None,
            }
        }
    }
}
