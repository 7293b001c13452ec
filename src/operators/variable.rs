//! Variable replacement: VGSR, VLSR, VGAR, VLAR, VGTR, VLTR, VGPR, VLPR
//! and struct component replacement (VSCR)

use std::collections::HashSet;

use crate::context::{MutationContext, VariableDeclaration};
use crate::frontend::ast::{Binding, Expr, ExprKind};
use crate::frontend::{CType, SourceLocation, VarCategory};
use crate::recorder::SiteRecorder;

use super::catalog::Scope;
use super::{eligible, ExprOperator, Tokens};

/// Whether a value of type `candidate` can stand where `current` is used
pub fn same_shape(category: VarCategory, current: &CType, candidate: &CType) -> bool {
    match category {
        VarCategory::Scalar => candidate.is_arithmetic(),
        VarCategory::Array | VarCategory::Pointer => {
            candidate.category() == Some(category) && current.pointee() == candidate.pointee()
        }
        VarCategory::Struct => current == candidate,
    }
}

/// Visible variables of `category` that may replace a use of type `ty`
/// named `own` at `loc`, deduplicated by name
pub(crate) fn replacement_variables<'c>(
    ctx: &'c MutationContext<'_>,
    scope: Scope,
    category: VarCategory,
    ty: &CType,
    own: Option<&str>,
    loc: SourceLocation,
) -> Vec<&'c VariableDeclaration> {
    let visible = match scope {
        Scope::Global => ctx.symbols().globals_visible_at(loc, category),
        Scope::Local => ctx.symbols().locals_visible_at(loc, category),
    };
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    // innermost declarations first so shadowing picks the visible one
    for decl in visible.into_iter().rev() {
        if Some(decl.name.as_str()) == own || !seen.insert(decl.name.as_str()) {
            continue;
        }
        if scope == Scope::Global && ctx.is_shadowed(&decl.name, loc) {
            continue;
        }
        if !same_shape(category, ty, &decl.ty) {
            continue;
        }
        if decl.ty.is_floating() && ctx.rejects_floating(loc) {
            continue;
        }
        if decl.is_const && ctx.in_modified_position(loc) {
            continue;
        }
        found.push(decl);
    }
    found.sort_by_key(|decl| decl.location);
    found
}

/// Replaces a variable reference by another visible variable of the same
/// category and shape
#[derive(Debug)]
pub struct VariableReplacement {
    name: &'static str,
    scope: Scope,
    category: VarCategory,
    tokens: Tokens,
}

impl VariableReplacement {
    pub fn new(name: &'static str, scope: Scope, category: VarCategory, tokens: Tokens) -> Self {
        Self {
            name,
            scope,
            category,
            tokens,
        }
    }
}

impl ExprOperator for VariableReplacement {
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
        expr.ty.category() == Some(self.category)
            && ctx.current_function().is_some()
            && self.tokens.matches_domain(name)
            && eligible(ctx, &expr.range)
    }

    fn apply(&self, expr: &Expr, ctx: &MutationContext<'_>, site: &mut SiteRecorder<'_>) {
        let ExprKind::Ident { name, .. } = &expr.kind else {
            return;
        };
        let candidates = replacement_variables(
            ctx,
            self.scope,
            self.category,
            &expr.ty,
            Some(name),
            expr.range.start,
        );
        for decl in candidates {
            if !self.tokens.allows(&decl.name) {
                continue;
            }
            site.emit(name, expr.range, decl.name.clone());
            if site.is_exhausted() {
                break;
            }
        }
    }
}

/// VSCR: `s.a` → `s.b` for sibling fields of the same shape
#[derive(Debug)]
pub struct FieldReplacement {
    name: &'static str,
    tokens: Tokens,
}

impl FieldReplacement {
    pub fn new(name: &'static str, tokens: Tokens) -> Self {
        Self { name, tokens }
    }
}

fn record_tag(base: &Expr, arrow: bool) -> Option<&str> {
    let record = if arrow { base.ty.pointee()? } else { &base.ty };
    match record {
        CType::Record { tag, .. } => Some(tag),
        _ => None,
    }
}

impl ExprOperator for FieldReplacement {
    fn name(&self) -> &str {
        self.name
    }

    fn is_applicable(&self, expr: &Expr, ctx: &MutationContext<'_>) -> bool {
        let ExprKind::Member {
            base,
            member,
            member_range,
            arrow,
        } = &expr.kind
        else {
            return false;
        };
        record_tag(base, *arrow).is_some()
            && ctx.current_function().is_some()
            && self.tokens.matches_domain(member)
            && eligible(ctx, member_range)
    }

    fn apply(&self, expr: &Expr, ctx: &MutationContext<'_>, site: &mut SiteRecorder<'_>) {
        let ExprKind::Member {
            base,
            member,
            member_range,
            arrow,
        } = &expr.kind
        else {
            return;
        };
        let Some(def) = record_tag(base, *arrow).and_then(|tag| ctx.records().get(tag)) else {
            return;
        };
        let Some(category) = expr.ty.category() else {
            return;
        };
        let loc = expr.range.start;
        for field in &def.fields {
            let Some(field_name) = &field.name else {
                continue;
            };
            if field_name == member || !self.tokens.allows(field_name) {
                continue;
            }
            if field.ty.category() != Some(category) || !same_shape(category, &expr.ty, &field.ty) {
                continue;
            }
            if field.ty.is_floating() && ctx.rejects_floating(loc) {
                continue;
            }
            site.emit(member, *member_range, field_name.clone());
            if site.is_exhausted() {
                break;
            }
        }
    }
}
