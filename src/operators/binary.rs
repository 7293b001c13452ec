//! Binary operator substitution (`O<from><to>N` and `O<from><to>A`)

use std::collections::BTreeSet;

use tracing::debug;

use crate::context::MutationContext;
use crate::error::{MutationError, Result};
use crate::frontend::ast::{BinaryOp, Expr, ExprKind};
use crate::recorder::SiteRecorder;

use super::safety::substitution_allowed;
use super::{eligible, ExprOperator, Tokens};

/// Replaces a binary operator token by every other operator of the
/// configured range
#[derive(Debug)]
pub struct BinarySubstitution {
    name: &'static str,
    domain: BTreeSet<String>,
    targets: Vec<BinaryOp>,
}

impl BinarySubstitution {
    pub fn new(name: &'static str, tokens: Tokens) -> Result<Self> {
        let targets = tokens
            .range
            .iter()
            .map(|token| {
                BinaryOp::from_token(token).ok_or_else(|| MutationError::UnknownOpcode {
                    operator: name.to_string(),
                    token: token.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name,
            domain: tokens.domain,
            targets,
        })
    }
}

impl ExprOperator for BinarySubstitution {
    fn name(&self) -> &str {
        self.name
    }

    fn is_applicable(&self, expr: &Expr, ctx: &MutationContext<'_>) -> bool {
        match &expr.kind {
            ExprKind::Binary { op, op_range, .. } => {
                self.domain.contains(op.as_str()) && eligible(ctx, op_range)
            }
            _ => false,
        }
    }

    fn apply(&self, expr: &Expr, ctx: &MutationContext<'_>, site: &mut SiteRecorder<'_>) {
        let ExprKind::Binary { op, op_range, .. } = &expr.kind else {
            return;
        };
        for &target in &self.targets {
            if target == *op {
                continue;
            }
            if !substitution_allowed(ctx, expr, target) {
                debug!(
                    operator = self.name,
                    at = %op_range.start,
                    from = op.as_str(),
                    to = target.as_str(),
                    "rejected substitution"
                );
                continue;
            }
            site.emit(op.as_str(), *op_range, target.as_str());
            if site.is_exhausted() {
                break;
            }
        }
    }
}
