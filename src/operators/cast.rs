//! OCOR: cast type replacement

use crate::context::MutationContext;
use crate::frontend::ast::{Expr, ExprKind};
use crate::frontend::types::{FloatKind, IntKind};
use crate::frontend::CType;
use crate::recorder::SiteRecorder;

use super::{eligible, ExprOperator, Tokens};

/// Name of an arithmetic type as written in the operator's tokens
pub fn cast_type_name(ty: &CType) -> Option<&'static str> {
    match ty {
        CType::Int(IntKind::UInt) => Some("unsigned"),
        CType::Int(kind) => Some(kind.spelling()),
        CType::Float(kind) => Some(kind.spelling()),
        _ => None,
    }
}

fn is_floating_name(name: &str) -> bool {
    [FloatKind::Float, FloatKind::Double, FloatKind::LongDouble]
        .iter()
        .any(|kind| kind.spelling() == name)
}

/// Replaces `(T)` of an arithmetic cast by the other configured types
#[derive(Debug)]
pub struct CastReplacement {
    name: &'static str,
    tokens: Tokens,
}

impl CastReplacement {
    pub fn new(name: &'static str, tokens: Tokens) -> Self {
        Self { name, tokens }
    }
}

impl ExprOperator for CastReplacement {
    fn name(&self) -> &str {
        self.name
    }

    fn is_applicable(&self, expr: &Expr, ctx: &MutationContext<'_>) -> bool {
        let ExprKind::Cast {
            target, type_range, ..
        } = &expr.kind
        else {
            return false;
        };
        cast_type_name(target).is_some_and(|name| self.tokens.matches_domain(name))
            && eligible(ctx, type_range)
    }

    fn apply(&self, expr: &Expr, ctx: &MutationContext<'_>, site: &mut SiteRecorder<'_>) {
        let ExprKind::Cast {
            target,
            type_range,
            operand,
        } = &expr.kind
        else {
            return;
        };
        let current = cast_type_name(target);
        let no_floating =
            ctx.rejects_floating(expr.range.start) || operand.ty.decay().is_pointer();
        let original = ctx.text(*type_range);
        for candidate in &self.tokens.range {
            if Some(candidate.as_str()) == current {
                continue;
            }
            if no_floating && is_floating_name(candidate) {
                continue;
            }
            site.emit(original, *type_range, format!("({})", candidate));
            if site.is_exhausted() {
                break;
            }
        }
    }
}
