//! SSDL: statement deletion

use crate::context::MutationContext;
use crate::frontend::ast::{Stmt, StmtKind};
use crate::recorder::SiteRecorder;

use super::{eligible, StmtOperator};

/// Replaces a statement by `;`, or a block by `{}`
#[derive(Debug)]
pub struct StatementDeletion {
    pub name: &'static str,
}

impl StmtOperator for StatementDeletion {
    fn name(&self) -> &str {
        self.name
    }

    fn is_applicable(&self, stmt: &Stmt, ctx: &MutationContext<'_>) -> bool {
        let deletable = match &stmt.kind {
            StmtKind::Decl(_)
            | StmtKind::Case { .. }
            | StmtKind::Default(_)
            | StmtKind::Label { .. }
            | StmtKind::Null => false,
            StmtKind::Compound(items) => {
                !items.is_empty()
                    && ctx
                        .current_function()
                        .map_or(true, |body| body.end != stmt.range.end)
            }
            _ => true,
        };
        deletable
            && ctx.current_function().is_some()
            && eligible(ctx, &stmt.range)
            && ctx.inventory().labels_removable(&stmt.range)
    }

    fn apply(&self, stmt: &Stmt, ctx: &MutationContext<'_>, site: &mut SiteRecorder<'_>) {
        let replacement = if stmt.is_compound() { "{}" } else { ";" };
        site.emit(ctx.text(stmt.range), stmt.range, replacement);
    }
}

#[cfg(test)]
mod tests {
    use crate::operators::testing::{entries, replacements};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deletes_statements_and_blocks() {
        let src = "int f(int a) {\n  int b = 0;\n  if (a) { b = 1; }\n  return b;\n}\n";
        let found = entries(src, &[crate::config::OperatorConfig::named("SSDL")]);
        let pairs: Vec<_> = found
            .iter()
            .map(|e| (e.original.as_str(), e.replacement.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("if (a) { b = 1; }", ";"),
                ("{ b = 1; }", "{}"),
                ("b = 1;", ";"),
                ("return b;", ";"),
            ]
        );
    }

    #[test]
    fn test_label_targeted_from_outside_is_kept() {
        let src = "void f(int x) {\n  if (x) goto out;\n  { out: x = 1; }\n}\n";
        let found = entries(src, &[crate::config::OperatorConfig::named("SSDL")]);
        assert!(found.iter().all(|e| e.original != "{ out: x = 1; }"));
        // the whole if statement holds no label, so it can go
        assert!(found.iter().any(|e| e.original == "if (x) goto out;"));
    }

    #[test]
    fn test_empty_block_is_not_deleted() {
        assert!(replacements("void f(void) { {} }", "SSDL").is_empty());
    }
}
