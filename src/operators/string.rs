//! String literal operators: SCSR and SRWS

use std::collections::HashSet;

use crate::context::MutationContext;
use crate::frontend::ast::{Expr, ExprKind};
use crate::recorder::SiteRecorder;

use super::{eligible, ExprOperator};

fn literal(expr: &Expr) -> Option<&str> {
    match &expr.kind {
        ExprKind::StringLiteral { text } => Some(text),
        _ => None,
    }
}

/// SCSR: a string literal becomes another literal of the file or the
/// current function
#[derive(Debug)]
pub struct StringReplacement {
    pub name: &'static str,
}

impl ExprOperator for StringReplacement {
    fn name(&self) -> &str {
        self.name
    }

    fn is_applicable(&self, expr: &Expr, ctx: &MutationContext<'_>) -> bool {
        literal(expr).is_some() && eligible(ctx, &expr.range)
    }

    fn apply(&self, expr: &Expr, ctx: &MutationContext<'_>, site: &mut SiteRecorder<'_>) {
        let Some(original) = literal(expr) else {
            return;
        };
        let mut seen = HashSet::from([original]);
        let candidates = ctx
            .inventory()
            .global_strings
            .iter()
            .chain(ctx.local_strings());
        for record in candidates {
            if !seen.insert(record.text.as_str()) {
                continue;
            }
            site.emit(original, expr.range, record.text.clone());
            if site.is_exhausted() {
                break;
            }
        }
    }
}

/// SRWS: trim leading, trailing or both kinds of whitespace inside a
/// single-token string literal
#[derive(Debug)]
pub struct WhitespaceTrim {
    pub name: &'static str,
}

impl WhitespaceTrim {
    fn trimmed(text: &str) -> Vec<String> {
        let Some(inner) = text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) else {
            return Vec::new();
        };
        let mut variants: Vec<String> = Vec::new();
        for candidate in [inner.trim_start(), inner.trim_end(), inner.trim()] {
            let quoted = format!("\"{}\"", candidate);
            if candidate != inner && !variants.contains(&quoted) {
                variants.push(quoted);
            }
        }
        variants
    }
}

impl ExprOperator for WhitespaceTrim {
    fn name(&self) -> &str {
        self.name
    }

    fn is_applicable(&self, expr: &Expr, ctx: &MutationContext<'_>) -> bool {
        literal(expr).is_some_and(|text| text.matches('"').count() == 2)
            && eligible(ctx, &expr.range)
    }

    fn apply(&self, expr: &Expr, _ctx: &MutationContext<'_>, site: &mut SiteRecorder<'_>) {
        let Some(original) = literal(expr) else {
            return;
        };
        for variant in Self::trimmed(original) {
            site.emit(original, expr.range, variant);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::testing::replacements;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_trim_variants() {
        assert_eq!(
            WhitespaceTrim::trimmed("\"  a b \""),
            vec!["\"a b \"", "\"  a b\"", "\"a b\""]
        );
        assert_eq!(WhitespaceTrim::trimmed("\" a\""), vec!["\"a\""]);
        assert!(WhitespaceTrim::trimmed("\"ab\"").is_empty());
    }

    #[test]
    fn test_concatenated_literals_are_not_trimmed() {
        assert!(replacements("char *f(void) { return \" a\" \"b \"; }", "SRWS").is_empty());
    }

    #[test]
    fn test_string_replacement() {
        let src = "char *g = \"x\";\nchar *f(int c) { if (c) return \"y\"; return \"x\"; }\n";
        // the global literal has no other file-scope string to become
        assert_eq!(replacements(src, "SCSR"), vec!["\"x\"", "\"y\""]);
    }
}
