//! Generation driver
//!
//! A run is two passes over the parsed translation unit:
//! - pass 1 gathers the constant, string and label inventory
//! - pass 2 walks the tree in source order, keeps the [`MutationContext`]
//!   current and offers every node to the enabled operators
//!
//! Nothing is written until pass 2 has finished, so a fatal error during
//! traversal leaves no partial output behind.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::codegen::{database_file_name, file_stem};
use crate::config::Config;
use crate::context::{Inventory, MutationBounds, MutationContext, RegionKind};
use crate::error::{MutationError, Result};
use crate::frontend::ast::{
    BinaryOp, Decl, DeclKind, Expr, ExprKind, FunctionDef, Stmt, StmtKind, TranslationUnit,
    UnaryOp, VarDecl,
};
use crate::frontend::eval::evaluate_int;
use crate::frontend::visit::{self, Visit};
use crate::frontend::{parse, SourceMap, SourceRange};
use crate::operators::OperatorSet;
use crate::recorder::{MutantEntry, Recorder};

/// Result of one generation run
#[derive(Debug)]
pub struct GenerationOutcome {
    pub source_file: PathBuf,
    pub database: PathBuf,
    pub mutant_files: Vec<PathBuf>,
    pub entries: Vec<MutantEntry>,
}

/// Generate the mutants of `input` and write them under the configured
/// output directory
pub fn run_generation(config: &Config, input: &Path) -> Result<GenerationOutcome> {
    if !input.exists() {
        return Err(MutationError::FileNotFound {
            file: input.to_path_buf(),
        });
    }
    let text = fs::read_to_string(input).map_err(|e| MutationError::FileReadError {
        file: input.to_path_buf(),
        error: e.to_string(),
    })?;

    let operators = OperatorSet::from_config(&config.operators, config.settings.limit)?;
    let output_dir = prepare_output_dir(&config.settings.output_dir)?;

    let map = SourceMap::new(text);
    let tu = parse(&map).map_err(|e| MutationError::Parse {
        file: input.to_path_buf(),
        line: e.location.line,
        column: e.location.column,
        message: e.message,
    })?;
    if tu.functions().next().is_none() {
        warn!(file = %input.display(), "no function definitions; only file-scope operators apply");
    }

    info!(file = %input.display(), "pass 1: gathering inventory");
    let inventory = Inventory::gather(&tu, &map);

    info!(operators = operators.len(), "pass 2: generating mutants");
    let recorder = generate_mutants(&map, &tu, &inventory, config.bounds(&map), &operators)?;
    info!(mutants = recorder.len(), "generation finished");

    let stem = file_stem(input);
    let database = output_dir.join(database_file_name(&stem));
    let source_file = input.display().to_string();
    recorder.write_database(&database, &source_file, &stem)?;

    let mutant_files = if config.settings.write_mutant_files {
        recorder.write_mutant_files(&map, &output_dir, &stem)?
    } else {
        Vec::new()
    };

    Ok(GenerationOutcome {
        source_file: input.to_path_buf(),
        database,
        mutant_files,
        entries: recorder.entries().to_vec(),
    })
}

fn prepare_output_dir(dir: &Path) -> Result<PathBuf> {
    let unusable = |error: String| MutationError::OutputDirectory {
        dir: dir.to_path_buf(),
        error,
    };
    if dir.exists() && !dir.is_dir() {
        return Err(unusable("not a directory".to_string()));
    }
    fs::create_dir_all(dir).map_err(|e| unusable(e.to_string()))?;
    Ok(dir.to_path_buf())
}

/// Run the generation pass over an already parsed and inventoried unit
pub fn generate_mutants<'ast>(
    map: &'ast SourceMap,
    tu: &'ast TranslationUnit,
    inventory: &'ast Inventory,
    bounds: MutationBounds,
    operators: &OperatorSet,
) -> Result<Recorder> {
    let mut pass = GenerationPass {
        ctx: MutationContext::new(map, inventory, &tu.records, bounds),
        operators,
        recorder: Recorder::new(),
        error: None,
    };
    pass.visit_translation_unit(tu);
    match pass.error {
        Some(error) => Err(error),
        None => Ok(pass.recorder),
    }
}

struct GenerationPass<'ast, 'o> {
    ctx: MutationContext<'ast>,
    operators: &'o OperatorSet,
    recorder: Recorder,
    /// First fatal error; traversal stops once set
    error: Option<MutationError>,
}

impl<'ast> GenerationPass<'ast, '_> {
    fn failed(&self) -> bool {
        self.error.is_some()
    }

    fn declare(&mut self, decl: &VarDecl) {
        if let Err(e) = self.ctx.record_declaration(decl) {
            self.error = Some(e);
        }
    }

    /// Visit sizes that must stay as written
    fn visit_fixed_sizes(&mut self, sizes: &'ast [Expr]) {
        for size in sizes {
            self.ctx
                .set_forbidden_region(RegionKind::ArrayDeclSize, size.range);
            self.visit_expr(size);
        }
    }

    fn enter_switch(&mut self, range: SourceRange, body: &Stmt) {
        let mut values = Vec::new();
        collect_case_values(body, &self.ctx, &mut values);
        self.ctx.enter_switch(range, values);
    }
}

impl<'ast> Visit<'ast> for GenerationPass<'ast, '_> {
    fn visit_function(&mut self, node: &'ast FunctionDef) {
        if self.failed() {
            return;
        }
        self.ctx.advance(node.range.start);
        self.ctx.enter_function(node.range);
        for param in &node.params {
            self.declare(param);
        }
        self.visit_stmt(&node.body);
        self.ctx.leave_function();
    }

    fn visit_decl(&mut self, node: &'ast Decl) {
        if self.failed() {
            return;
        }
        self.ctx.advance(node.range.start);
        match &node.kind {
            DeclKind::Var(var) => self.visit_var_decl(var),
            DeclKind::Typedef { array_sizes, .. } => {
                self.ctx.set_forbidden_region(RegionKind::Typedef, node.range);
                self.visit_fixed_sizes(array_sizes);
            }
            DeclKind::Record { fields, .. } => {
                self.ctx.set_forbidden_region(RegionKind::FieldDecl, node.range);
                for field in fields {
                    self.visit_fixed_sizes(&field.array_sizes);
                }
            }
            DeclKind::Enum { .. } => {
                self.ctx.set_forbidden_region(RegionKind::EnumDecl, node.range);
                visit::visit_decl(self, node);
            }
            // parameters of a prototype are not variables of any scope
            DeclKind::Prototype { .. } => {
                self.ctx
                    .set_forbidden_region(RegionKind::FunctionPrototype, node.range);
            }
        }
    }

    fn visit_var_decl(&mut self, node: &'ast VarDecl) {
        if self.failed() {
            return;
        }
        self.ctx.advance(node.range.start);
        self.declare(node);
        if self.failed() {
            return;
        }
        for size in &node.array_sizes {
            if node.is_global {
                self.ctx
                    .set_forbidden_region(RegionKind::ArrayDeclSize, size.range);
            } else {
                self.ctx.push_local_array_size(size);
            }
            self.visit_expr(size);
        }
        if let Some(init) = &node.init {
            self.visit_expr(init);
        }
    }

    fn visit_stmt(&mut self, node: &'ast Stmt) {
        if self.failed() {
            return;
        }
        self.ctx.advance(node.range.start);
        self.ctx.note_statement(node);
        match &node.kind {
            StmtKind::Compound(_) | StmtKind::For { .. } => self.ctx.enter_scope(node.range),
            StmtKind::Switch { cond, body } => {
                self.ctx
                    .set_forbidden_region(RegionKind::SwitchCondition, cond.range);
                self.enter_switch(node.range, body);
            }
            StmtKind::Case { value, .. } => {
                self.ctx.set_forbidden_region(RegionKind::CaseLabel, value.range);
            }
            StmtKind::If { cond, .. } | StmtKind::While { cond, .. } => {
                self.ctx
                    .set_forbidden_region(RegionKind::BranchCondition, cond.range);
            }
            _ => {}
        }

        self.operators.mutate_stmt(node, &self.ctx, &mut self.recorder);

        // conditions visited after other statements get their region on arrival
        match &node.kind {
            StmtKind::DoWhile { body, cond } => {
                self.visit_stmt(body);
                self.ctx
                    .set_forbidden_region(RegionKind::BranchCondition, cond.range);
                self.visit_expr(cond);
            }
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => {
                if let Some(init) = init {
                    self.visit_stmt(init);
                }
                if let Some(cond) = cond {
                    self.ctx
                        .set_forbidden_region(RegionKind::BranchCondition, cond.range);
                    self.visit_expr(cond);
                }
                if let Some(step) = step {
                    self.visit_expr(step);
                }
                self.visit_stmt(body);
            }
            _ => visit::visit_stmt(self, node),
        }
    }

    fn visit_expr(&mut self, node: &'ast Expr) {
        if self.failed() {
            return;
        }
        self.ctx.advance(node.range.start);
        self.ctx.note_expression(node);
        match &node.kind {
            ExprKind::Binary {
                op, op_range, lhs, rhs,
            } => {
                if op.is_assignment() {
                    self.ctx.set_forbidden_region(
                        RegionKind::AssignmentLhs,
                        SourceRange::new(lhs.range.start, op_range.start),
                    );
                    if lhs.ty.is_pointer()
                        && matches!(rhs.strip_parens().kind, ExprKind::Cast { .. })
                    {
                        self.ctx
                            .set_forbidden_region(RegionKind::IntegralOnly, rhs.range);
                    }
                }
                if op.requires_integral() {
                    self.ctx
                        .set_forbidden_region(RegionKind::IntegralOnly, node.range);
                }
                if op.is_division() {
                    self.ctx.push_divisor(rhs.strip_parens());
                }
                if matches!(op, BinaryOp::Add | BinaryOp::Sub) {
                    self.ctx.note_additive_chain(node);
                }
            }
            ExprKind::Unary { op, operand, .. } => {
                if op.is_increment() {
                    self.ctx
                        .set_forbidden_region(RegionKind::IncrementOperand, operand.range);
                } else if op.is_decrement() {
                    self.ctx
                        .set_forbidden_region(RegionKind::DecrementOperand, operand.range);
                } else if *op == UnaryOp::AddrOf && is_addressable(operand) {
                    self.ctx
                        .set_forbidden_region(RegionKind::AddressOf, operand.range);
                }
            }
            ExprKind::Index { index, .. } => {
                self.ctx
                    .set_forbidden_region(RegionKind::ArraySubscript, index.range);
            }
            _ => {}
        }

        self.operators.mutate_expr(node, &self.ctx, &mut self.recorder);
        self.ctx.push_ancestor(node);
        visit::visit_expr(self, node);
        self.ctx.pop_ancestor();
    }
}

fn is_addressable(expr: &Expr) -> bool {
    matches!(
        expr.strip_parens().kind,
        ExprKind::Ident { .. }
            | ExprKind::Index { .. }
            | ExprKind::Member { .. }
            | ExprKind::Unary {
                op: UnaryOp::Deref,
                ..
            }
    )
}

/// Case values of one switch body, not descending into nested switches
fn collect_case_values(stmt: &Stmt, ctx: &MutationContext<'_>, out: &mut Vec<String>) {
    match &stmt.kind {
        StmtKind::Case { value, body } => {
            let text = match &value.strip_parens().kind {
                ExprKind::CharLiteral { value, .. } => value.to_string(),
                _ => evaluate_int(value, None)
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| ctx.text(value.range).to_string()),
            };
            out.push(text);
            collect_case_values(body, ctx, out);
        }
        StmtKind::Compound(items) => {
            for item in items {
                collect_case_values(item, ctx, out);
            }
        }
        StmtKind::Default(body)
        | StmtKind::Label { body, .. }
        | StmtKind::While { body, .. }
        | StmtKind::DoWhile { body, .. }
        | StmtKind::For { body, .. } => collect_case_values(body, ctx, out),
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            collect_case_values(then_branch, ctx, out);
            if let Some(else_branch) = else_branch {
                collect_case_values(else_branch, ctx, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OperatorConfig;
    use crate::frontend::SourceLocation;
    use pretty_assertions::assert_eq;

    fn generate(src: &str, operators: &[OperatorConfig]) -> Vec<MutantEntry> {
        let map = SourceMap::new(src);
        let tu = parse(&map).unwrap();
        let inventory = Inventory::gather(&tu, &map);
        let set = OperatorSet::from_config(operators, usize::MAX).unwrap();
        let recorder =
            generate_mutants(&map, &tu, &inventory, MutationBounds::whole_file(&map), &set)
                .unwrap();
        recorder.entries().to_vec()
    }

    #[test]
    fn test_single_binary_mutation() {
        let entries = generate("int x = 1 + 2;", &[OperatorConfig::new("OAAN", &["+"], &["-"])]);
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.operator, "OAAN");
        assert_eq!(entry.original, "+");
        assert_eq!(entry.replacement, "-");
        assert_eq!(
            entry.original_range,
            SourceRange::new(SourceLocation::new(1, 11), SourceLocation::new(1, 12))
        );
        assert_eq!(entry.statement_line, 1);
    }

    #[test]
    fn test_file_scope_array_size_is_not_mutated() {
        let src = "int a[2 + 3];\nvoid f(void) { int b[2 + 3]; }\n";
        let entries = generate(src, &[OperatorConfig::named("OAAN")]);
        assert!(entries.iter().all(|e| e.original_range.start.line == 2));
        assert!(!entries.is_empty());
    }

    #[test]
    fn test_struct_and_typedef_bodies_are_skipped() {
        let src = "struct s { int a[1 + 1]; };\ntypedef int t[2 + 2];\nenum e { A = 1 + 1 };\n";
        assert!(generate(src, &[OperatorConfig::named("OAAN")]).is_empty());
    }

    #[test]
    fn test_case_values_are_normalized() {
        let src = "void f(int c) { switch (c) { case 'a': break; case 0x10: { case 3: break; } } }";
        let map = SourceMap::new(src);
        let tu = parse(&map).unwrap();
        let inventory = Inventory::gather(&tu, &map);
        let ctx = MutationContext::new(
            &map,
            &inventory,
            &tu.records,
            MutationBounds::whole_file(&map),
        );
        let body = &tu.functions().next().unwrap().body;
        let StmtKind::Compound(items) = &body.kind else {
            panic!("expected compound body");
        };
        let StmtKind::Switch { body, .. } = &items[0].kind else {
            panic!("expected switch");
        };
        let mut values = Vec::new();
        collect_case_values(body, &ctx, &mut values);
        assert_eq!(values, ["97", "16", "3"]);
    }

    #[test]
    fn test_do_while_condition_is_negated() {
        let src = "void f(int a) { do { if (a) a--; } while (a > 0); }";
        let found: Vec<_> = generate(src, &[OperatorConfig::named("OCNG")])
            .into_iter()
            .map(|e| e.replacement)
            .collect();
        assert_eq!(found, ["!(a)", "!(a > 0)"]);
    }

    #[test]
    fn test_for_loop_scope() {
        let src = "int f(void) {\n  int s = 0;\n  for (int i = 0; i < 3; i++) s += i;\n  return s;\n}\n";
        let found = generate(src, &[OperatorConfig::named("VLSR")]);
        // `i` is out of scope at the return
        assert!(found
            .iter()
            .filter(|e| e.original_range.start.line == 4)
            .all(|e| e.replacement != "i"));
    }
}
