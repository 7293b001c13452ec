//! Call replacement: VGSF, VLSF, VGTF, VLTF, VGPF, VLPF

use crate::context::MutationContext;
use crate::frontend::ast::{Expr, ExprKind};
use crate::frontend::VarCategory;
use crate::recorder::SiteRecorder;

use super::catalog::Scope;
use super::variable::replacement_variables;
use super::{eligible, ExprOperator, Tokens};

/// Replaces a whole call by a visible variable of the call's category
#[derive(Debug)]
pub struct CallReplacement {
    name: &'static str,
    scope: Scope,
    category: VarCategory,
    tokens: Tokens,
}

impl CallReplacement {
    pub fn new(name: &'static str, scope: Scope, category: VarCategory, tokens: Tokens) -> Self {
        Self {
            name,
            scope,
            category,
            tokens,
        }
    }
}

impl ExprOperator for CallReplacement {
    fn name(&self) -> &str {
        self.name
    }

    fn is_applicable(&self, expr: &Expr, ctx: &MutationContext<'_>) -> bool {
        if !matches!(expr.kind, ExprKind::Call { .. }) {
            return false;
        }
        let domain_ok = match expr.callee_name() {
            Some(callee) => self.tokens.matches_domain(callee),
            None => self.tokens.domain.is_empty(),
        };
        expr.ty.category() == Some(self.category)
            && domain_ok
            && ctx.current_function().is_some()
            && eligible(ctx, &expr.range)
    }

    fn apply(&self, expr: &Expr, ctx: &MutationContext<'_>, site: &mut SiteRecorder<'_>) {
        let original = ctx.text(expr.range);
        let candidates = replacement_variables(
            ctx,
            self.scope,
            self.category,
            &expr.ty,
            None,
            expr.range.start,
        );
        for decl in candidates {
            if !self.tokens.allows(&decl.name) {
                continue;
            }
            site.emit(original, expr.range, decl.name.clone());
            if site.is_exhausted() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::OperatorConfig;
    use crate::operators::testing::{mutants, replacements};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scalar_call_by_local() {
        let src = "int g(int);\nint f(int a) {\n  double d = 1.0;\n  return g(a);\n}\n";
        assert_eq!(replacements(src, "VLSF"), vec!["a", "d"]);
    }

    #[test]
    fn test_pointer_call_by_global() {
        let src = "int *p;\nchar *s;\nint *next(void);\nint f(void) { return *next(); }\n";
        assert_eq!(replacements(src, "VGPF"), vec!["p"]);
    }

    #[test]
    fn test_struct_call_range_allow_list() {
        let src = "struct pt { int x; };\nstruct pt a;\nstruct pt b;\nstruct pt mk(void);\n\
                   int f(void) { return mk().x; }\n";
        assert_eq!(replacements(src, "VGTF"), vec!["a", "b"]);
        let found = mutants(src, &[OperatorConfig::new("VGTF", &["mk"], &["b"])]);
        assert_eq!(found, vec![("mk()".to_string(), "b".to_string())]);
    }
}
