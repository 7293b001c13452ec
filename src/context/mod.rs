//! Traversal-time context tracker
//!
//! [`MutationContext`] is owned by the generation pass and updated as each
//! node is visited. Operators only ever read it.

pub mod inventory;
pub mod regions;
pub mod symbols;

use std::collections::{BTreeSet, HashSet};

use crate::error::Result;
use crate::frontend::ast::{
    BinaryOp, Binding, Expr, ExprKind, NodeId, RecordTable, Stmt, StmtKind, UnaryOp, VarDecl,
};
use crate::frontend::{SourceLocation, SourceMap, SourceRange, VarCategory};

pub use inventory::{ConstantRecord, Inventory, StringLiteralRecord};
pub use regions::{RegionKind, RegionStack};
pub use symbols::{SymbolTable, VariableDeclaration};

/// User-configured part of the file that may be mutated
#[derive(Debug, Clone, PartialEq)]
pub struct MutationBounds {
    pub range: SourceRange,
    pub excluded_lines: BTreeSet<usize>,
}

impl MutationBounds {
    pub fn whole_file(map: &SourceMap) -> Self {
        Self {
            range: map.full_range(),
            excluded_lines: BTreeSet::new(),
        }
    }
}

#[derive(Debug)]
struct SwitchInfo {
    range: SourceRange,
    case_values: Vec<String>,
}

pub struct MutationContext<'ast> {
    map: &'ast SourceMap,
    inventory: &'ast Inventory,
    records: &'ast RecordTable,
    bounds: MutationBounds,
    symbols: SymbolTable,
    regions: RegionStack,
    switches: Vec<SwitchInfo>,
    divisors: Vec<&'ast Expr>,
    array_sizes: Vec<&'ast Expr>,
    /// Expressions enclosing the node being visited, outermost first
    ancestors: Vec<&'ast Expr>,
    function: Option<SourceRange>,
    constant_cursor: usize,
    string_cursor: usize,
    stmt_start_line: usize,
    stmt_end_line: usize,
    additive_chains: HashSet<NodeId>,
    twiddle_suppressed: HashSet<NodeId>,
}

impl<'ast> MutationContext<'ast> {
    pub fn new(
        map: &'ast SourceMap,
        inventory: &'ast Inventory,
        records: &'ast RecordTable,
        bounds: MutationBounds,
    ) -> Self {
        Self {
            map,
            inventory,
            records,
            bounds,
            symbols: SymbolTable::new(),
            regions: RegionStack::new(),
            switches: Vec::new(),
            divisors: Vec::new(),
            array_sizes: Vec::new(),
            ancestors: Vec::new(),
            function: None,
            constant_cursor: 0,
            string_cursor: 0,
            stmt_start_line: 0,
            stmt_end_line: 0,
            additive_chains: HashSet::new(),
            twiddle_suppressed: HashSet::new(),
        }
    }

    pub fn map(&self) -> &'ast SourceMap {
        self.map
    }

    pub fn inventory(&self) -> &'ast Inventory {
        self.inventory
    }

    pub fn records(&self) -> &'ast RecordTable {
        self.records
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn regions(&self) -> &RegionStack {
        &self.regions
    }

    /// Source text of `range`
    pub fn text(&self, range: SourceRange) -> &'ast str {
        self.map.slice(range)
    }

    // ---- traversal updates ----

    /// Move the traversal position to `loc`, closing scopes, regions and
    /// switches that end before it
    pub fn advance(&mut self, loc: SourceLocation) {
        self.symbols.leave_scopes_before(loc);
        self.regions.prune(loc);
        while let Some(top) = self.switches.last() {
            if top.range.contains(loc) {
                break;
            }
            self.switches.pop();
        }
        self.divisors.retain(|e| loc < e.range.end);
        self.array_sizes.retain(|e| loc < e.range.end);
    }

    /// Start a function body: locals, scopes and regions of the previous
    /// function are dropped and the local inventory cursors move forward
    pub fn enter_function(&mut self, range: SourceRange) {
        self.symbols.enter_function(range);
        self.regions.clear();
        self.switches.clear();
        self.divisors.clear();
        self.array_sizes.clear();
        self.ancestors.clear();
        self.function = Some(range);

        let constants = &self.inventory.local_constants;
        while self.constant_cursor < constants.len()
            && constants[self.constant_cursor].location < range.start
        {
            self.constant_cursor += 1;
        }
        let strings = &self.inventory.local_strings;
        while self.string_cursor < strings.len() && strings[self.string_cursor].location < range.start
        {
            self.string_cursor += 1;
        }
    }

    /// Leave the function body; file-scope declarations follow
    pub fn leave_function(&mut self) {
        while self.symbols.leave_scope().is_some() {}
        self.function = None;
    }

    pub fn enter_scope(&mut self, range: SourceRange) {
        self.symbols.enter_scope(range);
    }

    pub fn leave_scope(&mut self) -> Option<SourceRange> {
        self.symbols.leave_scope()
    }

    /// Range of the function body being traversed
    pub fn current_function(&self) -> Option<SourceRange> {
        self.function
    }

    pub fn record_declaration(&mut self, decl: &VarDecl) -> Result<()> {
        let scope = if decl.is_global {
            None
        } else {
            self.symbols.current_scope()
        };
        match VariableDeclaration::from_var_decl(decl, scope) {
            Some(var) => self.symbols.record(var),
            None => Ok(()),
        }
    }

    pub fn set_forbidden_region(&mut self, kind: RegionKind, range: SourceRange) {
        self.regions.set(kind, range);
    }

    pub fn enter_switch(&mut self, range: SourceRange, case_values: Vec<String>) {
        while let Some(top) = self.switches.last() {
            if top.range.encloses(&range) {
                break;
            }
            self.switches.pop();
        }
        self.switches.push(SwitchInfo { range, case_values });
    }

    /// Case values of the innermost open switch
    pub fn case_values(&self) -> &[String] {
        self.switches
            .last()
            .map(|s| s.case_values.as_slice())
            .unwrap_or_default()
    }

    /// `expr` is the right operand of a division or remainder
    pub fn push_divisor(&mut self, expr: &'ast Expr) {
        self.regions.set(RegionKind::Divisor, expr.range);
        self.divisors.push(expr);
    }

    /// Innermost divisor enclosing `range`
    pub fn divisor_enclosing(&self, range: &SourceRange) -> Option<&'ast Expr> {
        self.divisors
            .iter()
            .rev()
            .find(|e| e.range.encloses(range))
            .copied()
    }

    pub fn push_local_array_size(&mut self, expr: &'ast Expr) {
        self.regions.set(RegionKind::LocalArraySize, expr.range);
        self.array_sizes.push(expr);
    }

    /// Size expression of a local array declarator enclosing `range`
    pub fn array_size_enclosing(&self, range: &SourceRange) -> Option<&'ast Expr> {
        self.array_sizes
            .iter()
            .rev()
            .find(|e| e.range.encloses(range))
            .copied()
    }

    /// Children visited from here on sit below `expr`
    pub fn push_ancestor(&mut self, expr: &'ast Expr) {
        self.ancestors.push(expr);
    }

    pub fn pop_ancestor(&mut self) {
        self.ancestors.pop();
    }

    /// Expressions enclosing the current node, innermost last
    pub fn ancestors(&self) -> &[&'ast Expr] {
        &self.ancestors
    }

    /// Track the Proteum-style line of a statement
    pub fn note_statement(&mut self, stmt: &Stmt) {
        let start = stmt.range.start.line;
        if start <= self.stmt_end_line {
            return;
        }
        self.stmt_start_line = start;
        self.stmt_end_line = match &stmt.kind {
            StmtKind::If { cond, .. } | StmtKind::While { cond, .. } | StmtKind::Switch { cond, .. } => {
                self.map.line_of_next_brace_or_newline(cond.range.end)
            }
            StmtKind::Compound(_)
            | StmtKind::Label { .. }
            | StmtKind::DoWhile { .. }
            | StmtKind::Case { .. }
            | StmtKind::Default(_)
            | StmtKind::For { .. } => start,
            _ => stmt.range.end.line,
        };
    }

    /// Expressions starting past the current statement line span open a new one
    pub fn note_expression(&mut self, expr: &Expr) {
        let start = expr.range.start.line;
        if start > self.stmt_end_line {
            self.stmt_start_line = start;
            self.stmt_end_line = expr.range.end.line.max(start);
        }
    }

    pub fn statement_line(&self) -> usize {
        self.stmt_start_line
    }

    /// Record an additive chain so only its first scalar reference is twiddled
    pub fn note_additive_chain(&mut self, expr: &Expr) {
        if self.additive_chains.contains(&expr.id) {
            return;
        }
        let mut leaves = Vec::new();
        collect_additive_chain(expr, &mut self.additive_chains, &mut leaves);
        let mut twiddleable = leaves.into_iter().filter(|e| is_scalar_reference(e));
        if twiddleable.next().is_some() {
            self.twiddle_suppressed.extend(twiddleable.map(|e| e.id));
        }
    }

    pub fn is_twiddle_suppressed(&self, id: NodeId) -> bool {
        self.twiddle_suppressed.contains(&id)
    }

    // ---- queries ----

    /// Inside the configured bounds, not on an excluded line and not inside
    /// an array declaration size or enum declaration
    pub fn is_in_mutation_range(&self, range: &SourceRange) -> bool {
        self.bounds.range.start <= range.start
            && range.end <= self.bounds.range.end
            && !self.bounds.excluded_lines.contains(&range.start.line)
            && !self.regions.contains(RegionKind::ArrayDeclSize, range.start)
            && !self.regions.contains(RegionKind::EnumDecl, range.start)
    }

    pub fn in_region(&self, kind: RegionKind, loc: SourceLocation) -> bool {
        self.regions.contains(kind, loc)
    }

    /// Inside a modified position: assignment target, increment, decrement
    /// or address-of operand
    pub fn in_modified_position(&self, loc: SourceLocation) -> bool {
        [
            RegionKind::AssignmentLhs,
            RegionKind::IncrementOperand,
            RegionKind::DecrementOperand,
            RegionKind::AddressOf,
        ]
        .into_iter()
        .any(|kind| self.regions.contains(kind, loc))
    }

    /// Floating values are not allowed at `loc`
    pub fn rejects_floating(&self, loc: SourceLocation) -> bool {
        [
            RegionKind::ArraySubscript,
            RegionKind::SwitchCondition,
            RegionKind::CaseLabel,
            RegionKind::IntegralOnly,
            RegionKind::LocalArraySize,
        ]
        .into_iter()
        .any(|kind| self.regions.contains(kind, loc))
    }

    /// True if a local variable named `name` is visible at `loc`, hiding
    /// any global of the same name
    pub fn is_shadowed(&self, name: &str, loc: SourceLocation) -> bool {
        VarCategory::ALL.into_iter().any(|category| {
            self.symbols
                .locals_visible_at(loc, category)
                .iter()
                .any(|decl| decl.name == name)
        })
    }

    pub fn variables_visible_at(
        &self,
        loc: SourceLocation,
        category: VarCategory,
    ) -> Vec<&VariableDeclaration> {
        self.symbols.visible_at(loc, category)
    }

    /// Distinct constants of the function being traversed
    pub fn local_constants(&self) -> &'ast [ConstantRecord] {
        let all = &self.inventory.local_constants[self.constant_cursor..];
        let Some(function) = self.function else {
            return &all[..0];
        };
        let end = all
            .iter()
            .position(|c| !function.contains(c.location))
            .unwrap_or(all.len());
        &all[..end]
    }

    /// Distinct string literals of the function being traversed
    pub fn local_strings(&self) -> &'ast [StringLiteralRecord] {
        let all = &self.inventory.local_strings[self.string_cursor..];
        let Some(function) = self.function else {
            return &all[..0];
        };
        let end = all
            .iter()
            .position(|s| !function.contains(s.location))
            .unwrap_or(all.len());
        &all[..end]
    }
}

fn collect_additive_chain<'e>(
    expr: &'e Expr,
    chains: &mut HashSet<NodeId>,
    leaves: &mut Vec<&'e Expr>,
) {
    match &expr.kind {
        ExprKind::Binary {
            op: BinaryOp::Add | BinaryOp::Sub,
            lhs,
            rhs,
            ..
        } => {
            chains.insert(expr.id);
            collect_additive_chain(lhs, chains, leaves);
            collect_additive_chain(rhs, chains, leaves);
        }
        _ => leaves.push(expr),
    }
}

/// Arithmetic lvalue: variable, subscript, member or dereference
pub fn is_scalar_reference(expr: &Expr) -> bool {
    if !expr.ty.is_arithmetic() {
        return false;
    }
    match &expr.kind {
        ExprKind::Ident { binding, .. } => matches!(binding, Binding::Variable { .. }),
        ExprKind::Index { .. } | ExprKind::Member { .. } => true,
        ExprKind::Unary {
            op: UnaryOp::Deref, ..
        } => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::FunctionDef;
    use crate::frontend::parse;

    fn first_function(tu: &crate::frontend::TranslationUnit) -> &FunctionDef {
        tu.functions().next().unwrap()
    }

    #[test]
    fn test_mutation_range_checks() {
        let map = SourceMap::new("int x = 1 + 2;\nint y = 3 + 4;\n");
        let tu = parse(&map).unwrap();
        let inventory = Inventory::gather(&tu, &map);
        let mut bounds = MutationBounds::whole_file(&map);
        bounds.excluded_lines.insert(2);
        let mut ctx = MutationContext::new(&map, &inventory, &tu.records, bounds);

        let on_line = |line| {
            SourceRange::new(SourceLocation::new(line, 11), SourceLocation::new(line, 12))
        };
        assert!(ctx.is_in_mutation_range(&on_line(1)));
        assert!(!ctx.is_in_mutation_range(&on_line(2)));
        assert!(!ctx.is_in_mutation_range(&on_line(5)));

        ctx.set_forbidden_region(
            RegionKind::EnumDecl,
            SourceRange::new(SourceLocation::new(1, 1), SourceLocation::new(1, 15)),
        );
        assert!(!ctx.is_in_mutation_range(&on_line(1)));
    }

    #[test]
    fn test_enter_function_moves_local_cursor() {
        let src = "int f(void) { return 7; }\nint g(void) { return 8 + 9; }\n";
        let map = SourceMap::new(src);
        let tu = parse(&map).unwrap();
        let inventory = Inventory::gather(&tu, &map);
        let mut ctx = MutationContext::new(
            &map,
            &inventory,
            &tu.records,
            MutationBounds::whole_file(&map),
        );
        assert!(ctx.local_constants().is_empty());

        let functions: Vec<_> = tu.functions().collect();
        ctx.enter_function(functions[0].range);
        let texts: Vec<_> = ctx.local_constants().iter().map(|c| c.text.clone()).collect();
        assert_eq!(texts, ["7"]);

        ctx.enter_function(functions[1].range);
        let texts: Vec<_> = ctx.local_constants().iter().map(|c| c.text.clone()).collect();
        assert_eq!(texts, ["8", "9"]);
        assert_eq!(ctx.symbols().scope_depth(), 1);
    }

    #[test]
    fn test_additive_chain_keeps_first_reference() {
        let map = SourceMap::new("int f(int a, int b, int c) { return a + b - c; }");
        let tu = parse(&map).unwrap();
        let inventory = Inventory::gather(&tu, &map);
        let mut ctx = MutationContext::new(
            &map,
            &inventory,
            &tu.records,
            MutationBounds::whole_file(&map),
        );
        let body = &first_function(&tu).body;
        let StmtKind::Compound(items) = &body.kind else {
            panic!("expected compound body");
        };
        let StmtKind::Return(Some(expr)) = &items[0].kind else {
            panic!("expected return");
        };
        ctx.note_additive_chain(expr);
        let ExprKind::Binary { lhs, rhs, .. } = &expr.kind else {
            panic!("expected binary");
        };
        let ExprKind::Binary { lhs: a, rhs: b, .. } = &lhs.kind else {
            panic!("expected nested binary");
        };
        assert!(!ctx.is_twiddle_suppressed(a.id));
        assert!(ctx.is_twiddle_suppressed(b.id));
        assert!(ctx.is_twiddle_suppressed(rhs.id));
    }

    #[test]
    fn test_statement_lines() {
        let src = "void f(int a) {\n  if (a)\n  {\n    a = 1;\n  }\n  a =\n    2;\n}\n";
        let map = SourceMap::new(src);
        let tu = parse(&map).unwrap();
        let inventory = Inventory::gather(&tu, &map);
        let mut ctx = MutationContext::new(
            &map,
            &inventory,
            &tu.records,
            MutationBounds::whole_file(&map),
        );
        let body = &first_function(&tu).body;
        ctx.note_statement(body);
        assert_eq!(ctx.statement_line(), 1);
        let StmtKind::Compound(items) = &body.kind else {
            panic!("expected compound body");
        };
        ctx.note_statement(&items[0]);
        assert_eq!(ctx.statement_line(), 2);
        ctx.note_statement(&items[1]);
        assert_eq!(ctx.statement_line(), 6);
        // the assignment spans two lines, so its operand stays on line 6
        let StmtKind::Expr(assign) = &items[1].kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Binary { rhs, .. } = &assign.kind else {
            panic!("expected assignment");
        };
        ctx.note_expression(rhs);
        assert_eq!(ctx.statement_line(), 6);
    }
}
