//! Syntax tree traversal
//!
//! Each method of the [`Visit`] trait is a hook that can be overridden to
//! customise behaviour when visiting that kind of node. The default
//! implementation recurses into the children through the free function of the
//! same name, so an override that still wants the children visited calls it.
//!
//! Children are visited in source order, which makes the traversal a
//! depth-first pre-order walk over the file.

use super::ast::*;

pub trait Visit<'ast> {
    fn visit_translation_unit(&mut self, node: &'ast TranslationUnit) {
        visit_translation_unit(self, node);
    }

    fn visit_function(&mut self, node: &'ast FunctionDef) {
        visit_function(self, node);
    }

    fn visit_decl(&mut self, node: &'ast Decl) {
        visit_decl(self, node);
    }

    fn visit_var_decl(&mut self, node: &'ast VarDecl) {
        visit_var_decl(self, node);
    }

    fn visit_stmt(&mut self, node: &'ast Stmt) {
        visit_stmt(self, node);
    }

    fn visit_expr(&mut self, node: &'ast Expr) {
        visit_expr(self, node);
    }
}

pub fn visit_translation_unit<'ast, V>(v: &mut V, node: &'ast TranslationUnit)
where
    V: Visit<'ast> + ?Sized,
{
    for item in &node.items {
        match item {
            ExternalDecl::Function(f) => v.visit_function(f),
            ExternalDecl::Decl(d) => v.visit_decl(d),
        }
    }
}

pub fn visit_function<'ast, V>(v: &mut V, node: &'ast FunctionDef)
where
    V: Visit<'ast> + ?Sized,
{
    for param in &node.params {
        v.visit_var_decl(param);
    }
    v.visit_stmt(&node.body);
}

pub fn visit_decl<'ast, V>(v: &mut V, node: &'ast Decl)
where
    V: Visit<'ast> + ?Sized,
{
    match &node.kind {
        DeclKind::Var(var) => v.visit_var_decl(var),
        DeclKind::Typedef { array_sizes, .. } => {
            for size in array_sizes {
                v.visit_expr(size);
            }
        }
        DeclKind::Record { fields, .. } => {
            for size in fields.iter().flat_map(|f| &f.array_sizes) {
                v.visit_expr(size);
            }
        }
        DeclKind::Enum { enumerators, .. } => {
            for value in enumerators.iter().filter_map(|e| e.value.as_ref()) {
                v.visit_expr(value);
            }
        }
        DeclKind::Prototype { params, .. } => {
            for param in params {
                v.visit_var_decl(param);
            }
        }
    }
}

pub fn visit_var_decl<'ast, V>(v: &mut V, node: &'ast VarDecl)
where
    V: Visit<'ast> + ?Sized,
{
    for size in &node.array_sizes {
        v.visit_expr(size);
    }
    if let Some(init) = &node.init {
        v.visit_expr(init);
    }
}

pub fn visit_stmt<'ast, V>(v: &mut V, node: &'ast Stmt)
where
    V: Visit<'ast> + ?Sized,
{
    match &node.kind {
        StmtKind::Compound(items) => {
            for item in items {
                v.visit_stmt(item);
            }
        }
        StmtKind::Decl(decls) => {
            for decl in decls {
                v.visit_decl(decl);
            }
        }
        StmtKind::Expr(expr) => v.visit_expr(expr),
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            v.visit_expr(cond);
            v.visit_stmt(then_branch);
            if let Some(else_branch) = else_branch {
                v.visit_stmt(else_branch);
            }
        }
        StmtKind::While { cond, body } => {
            v.visit_expr(cond);
            v.visit_stmt(body);
        }
        StmtKind::DoWhile { body, cond } => {
            v.visit_stmt(body);
            v.visit_expr(cond);
        }
        StmtKind::For {
            init,
            cond,
            step,
            body,
        } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            if let Some(cond) = cond {
                v.visit_expr(cond);
            }
            if let Some(step) = step {
                v.visit_expr(step);
            }
            v.visit_stmt(body);
        }
        StmtKind::Switch { cond, body } => {
            v.visit_expr(cond);
            v.visit_stmt(body);
        }
        StmtKind::Case { value, body } => {
            v.visit_expr(value);
            v.visit_stmt(body);
        }
        StmtKind::Default(body) | StmtKind::Label { body, .. } => v.visit_stmt(body),
        StmtKind::Return(Some(expr)) => v.visit_expr(expr),
        StmtKind::Return(None)
        | StmtKind::Null
        | StmtKind::Break
        | StmtKind::Continue
        | StmtKind::Goto { .. } => {}
    }
}

pub fn visit_expr<'ast, V>(v: &mut V, node: &'ast Expr)
where
    V: Visit<'ast> + ?Sized,
{
    match &node.kind {
        ExprKind::Binary { lhs, rhs, .. } => {
            v.visit_expr(lhs);
            v.visit_expr(rhs);
        }
        ExprKind::Unary { operand, .. } | ExprKind::Cast { operand, .. } => v.visit_expr(operand),
        ExprKind::Conditional {
            cond,
            then_expr,
            else_expr,
        } => {
            v.visit_expr(cond);
            v.visit_expr(then_expr);
            v.visit_expr(else_expr);
        }
        ExprKind::Call { callee, args } => {
            v.visit_expr(callee);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        ExprKind::Index { base, index } => {
            v.visit_expr(base);
            v.visit_expr(index);
        }
        ExprKind::Member { base, .. } => v.visit_expr(base),
        ExprKind::Sizeof(SizeofArg::Expr(inner)) | ExprKind::Paren(inner) => v.visit_expr(inner),
        ExprKind::InitList(items) => {
            for item in items {
                v.visit_expr(item);
            }
        }
        ExprKind::Sizeof(SizeofArg::Type(_))
        | ExprKind::IntLiteral { .. }
        | ExprKind::FloatLiteral { .. }
        | ExprKind::CharLiteral { .. }
        | ExprKind::StringLiteral { .. }
        | ExprKind::Ident { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::parse;
    use crate::frontend::source::SourceMap;

    #[derive(Default)]
    struct Counter {
        idents: Vec<String>,
        stmts: usize,
    }

    impl<'ast> Visit<'ast> for Counter {
        fn visit_stmt(&mut self, node: &'ast Stmt) {
            self.stmts += 1;
            visit_stmt(self, node);
        }

        fn visit_expr(&mut self, node: &'ast Expr) {
            if let ExprKind::Ident { name, .. } = &node.kind {
                self.idents.push(name.clone());
            }
            visit_expr(self, node);
        }
    }

    #[test]
    fn test_visits_in_source_order() {
        let map = SourceMap::new("int f(int a, int b) { if (a) b = a; return b; }");
        let tu = parse(&map).unwrap();
        let mut counter = Counter::default();
        counter.visit_translation_unit(&tu);
        assert_eq!(counter.idents, vec!["a", "b", "a", "b"]);
        // body, if, assignment statement, return
        assert_eq!(counter.stmts, 4);
    }
}
