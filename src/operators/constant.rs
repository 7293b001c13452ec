//! Constant replacement: CGCR, CLCR, CGSR, CLSR, CRCR

use crate::context::{is_scalar_reference, ConstantRecord, MutationContext};
use crate::frontend::ast::{Binding, Expr, ExprKind};
use crate::recorder::SiteRecorder;

use super::catalog::Scope;
use super::safety::constant_allowed;
use super::{eligible, ExprOperator, Tokens};

/// Literal text as the inventory stores it
fn literal_text(ctx: &MutationContext<'_>, expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::IntLiteral { .. } | ExprKind::FloatLiteral { .. } => {
            Some(ctx.text(expr.range).to_string())
        }
        ExprKind::CharLiteral { value, .. } => Some(value.to_string()),
        _ => None,
    }
}

fn candidates<'a>(ctx: &MutationContext<'a>, scope: Scope) -> &'a [ConstantRecord] {
    match scope {
        Scope::Global => &ctx.inventory().global_constants,
        Scope::Local => ctx.local_constants(),
    }
}

/// Negative constants are parenthesised so they never merge with a
/// preceding operator
fn spelled(text: &str) -> String {
    if text.starts_with('-') {
        format!("({})", text)
    } else {
        text.to_string()
    }
}

/// Emit every inventory constant that may replace `expr`
fn emit_constants(
    ctx: &MutationContext<'_>,
    expr: &Expr,
    records: &[ConstantRecord],
    tokens: &Tokens,
    current: Option<&str>,
    site: &mut SiteRecorder<'_>,
) {
    let original = ctx.text(expr.range);
    for record in records {
        if Some(record.text.as_str()) == current || !tokens.allows(&record.text) {
            continue;
        }
        if !constant_allowed(ctx, expr, &record.text, record.is_float) {
            continue;
        }
        site.emit(original, expr.range, spelled(&record.text));
        if site.is_exhausted() {
            break;
        }
    }
}

/// CGCR and CLCR: a literal becomes another constant of the file or of
/// the current function
#[derive(Debug)]
pub struct ConstantReplacement {
    name: &'static str,
    scope: Scope,
    tokens: Tokens,
}

impl ConstantReplacement {
    pub fn new(name: &'static str, scope: Scope, tokens: Tokens) -> Self {
        Self {
            name,
            scope,
            tokens,
        }
    }
}

impl ExprOperator for ConstantReplacement {
    fn name(&self) -> &str {
        self.name
    }

    fn is_applicable(&self, expr: &Expr, ctx: &MutationContext<'_>) -> bool {
        let Some(text) = literal_text(ctx, expr) else {
            return false;
        };
        (self.scope == Scope::Global || ctx.current_function().is_some())
            && self.tokens.matches_domain(&text)
            && eligible(ctx, &expr.range)
    }

    fn apply(&self, expr: &Expr, ctx: &MutationContext<'_>, site: &mut SiteRecorder<'_>) {
        let current = literal_text(ctx, expr);
        emit_constants(
            ctx,
            expr,
            candidates(ctx, self.scope),
            &self.tokens,
            current.as_deref(),
            site,
        );
    }
}

/// CGSR and CLSR: a scalar variable reference becomes a constant
#[derive(Debug)]
pub struct ScalarToConstant {
    name: &'static str,
    scope: Scope,
    tokens: Tokens,
}

impl ScalarToConstant {
    pub fn new(name: &'static str, scope: Scope, tokens: Tokens) -> Self {
        Self {
            name,
            scope,
            tokens,
        }
    }
}

impl ExprOperator for ScalarToConstant {
    fn name(&self) -> &str {
        self.name
    }

    fn is_applicable(&self, expr: &Expr, ctx: &MutationContext<'_>) -> bool {
        let ExprKind::Ident {
            name,
            binding: Binding::Variable { .. },
        } = &expr.kind
        else {
            return false;
        };
        expr.ty.is_arithmetic()
            && ctx.current_function().is_some()
            && self.tokens.matches_domain(name)
            && !ctx.in_modified_position(expr.range.start)
            && eligible(ctx, &expr.range)
    }

    fn apply(&self, expr: &Expr, ctx: &MutationContext<'_>, site: &mut SiteRecorder<'_>) {
        let range_only = Tokens {
            domain: Default::default(),
            range: self.tokens.range.clone(),
        };
        emit_constants(ctx, expr, candidates(ctx, self.scope), &range_only, None, site);
    }
}

/// CRCR: a scalar reference becomes one of the required constants,
/// parenthesised
#[derive(Debug)]
pub struct RequiredConstant {
    name: &'static str,
    tokens: Tokens,
}

impl RequiredConstant {
    pub fn new(name: &'static str, tokens: Tokens) -> Self {
        Self { name, tokens }
    }
}

impl ExprOperator for RequiredConstant {
    fn name(&self) -> &str {
        self.name
    }

    fn is_applicable(&self, expr: &Expr, ctx: &MutationContext<'_>) -> bool {
        is_scalar_reference(expr)
            && ctx.current_function().is_some()
            && !ctx.in_modified_position(expr.range.start)
            && eligible(ctx, &expr.range)
    }

    fn apply(&self, expr: &Expr, ctx: &MutationContext<'_>, site: &mut SiteRecorder<'_>) {
        let floating = expr.ty.is_floating();
        let original = ctx.text(expr.range);
        for candidate in &self.tokens.range {
            if candidate.contains('.') != floating {
                continue;
            }
            if !constant_allowed(ctx, expr, candidate, floating) {
                continue;
            }
            site.emit(original, expr.range, format!("({})", candidate));
            if site.is_exhausted() {
                break;
            }
        }
    }
}
