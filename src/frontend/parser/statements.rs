//! Statement parsing

use super::{ParseError, Parser};
use crate::frontend::ast::*;
use crate::frontend::source::{SourceLocation, SourceRange};

impl<'a> Parser<'a> {
    pub(crate) fn parse_compound_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_start();
        self.expect_punct("{")?;
        self.push_scope();
        let items = self.parse_block_items();
        self.pop_scope();
        let items = items?;
        self.expect_punct("}")?;
        let id = self.fresh_id();
        Ok(Stmt {
            id,
            kind: StmtKind::Compound(items),
            range: self.range_from(start),
        })
    }

    fn parse_block_items(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut items = Vec::new();
        while !self.check_punct("}") {
            if self.is_at_end() {
                return Err(self.error("expected '}' before end of file"));
            }
            items.push(self.parse_statement()?);
        }
        Ok(items)
    }

    pub(crate) fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_start();

        if self.check_punct("{") {
            return self.parse_compound_statement();
        }
        if self.is_declaration_start() {
            let decls = self.parse_local_declaration()?;
            return Ok(self.finish_stmt(StmtKind::Decl(decls), start));
        }
        if self.ident_text().is_some() && self.peek_at(1).is_punct(":") {
            let (name, _) = self.expect_ident()?;
            self.advance();
            let body = self.parse_labeled_body()?;
            return Ok(self.finish_stmt(
                StmtKind::Label {
                    name,
                    body: Box::new(body),
                },
                start,
            ));
        }

        let kind = if self.match_punct(";") {
            StmtKind::Null
        } else if self.match_keyword("if") {
            self.expect_punct("(")?;
            let cond = self.parse_expression()?;
            self.expect_punct(")")?;
            let then_branch = Box::new(self.parse_statement()?);
            let else_branch = if self.match_keyword("else") {
                Some(Box::new(self.parse_statement()?))
            } else {
                None
            };
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            }
        } else if self.match_keyword("while") {
            self.expect_punct("(")?;
            let cond = self.parse_expression()?;
            self.expect_punct(")")?;
            let body = Box::new(self.parse_statement()?);
            StmtKind::While { cond, body }
        } else if self.match_keyword("do") {
            let body = Box::new(self.parse_statement()?);
            if !self.match_keyword("while") {
                return Err(self.error("expected 'while' after do body"));
            }
            self.expect_punct("(")?;
            let cond = self.parse_expression()?;
            self.expect_punct(")")?;
            self.expect_punct(";")?;
            StmtKind::DoWhile { body, cond }
        } else if self.match_keyword("for") {
            return self.parse_for_statement(start);
        } else if self.match_keyword("switch") {
            self.expect_punct("(")?;
            let cond = self.parse_expression()?;
            self.expect_punct(")")?;
            let body = Box::new(self.parse_statement()?);
            StmtKind::Switch { cond, body }
        } else if self.match_keyword("case") {
            let value = self.parse_conditional_expression()?;
            self.expect_punct(":")?;
            let body = Box::new(self.parse_labeled_body()?);
            StmtKind::Case { value, body }
        } else if self.match_keyword("default") {
            self.expect_punct(":")?;
            StmtKind::Default(Box::new(self.parse_labeled_body()?))
        } else if self.match_keyword("break") {
            self.expect_punct(";")?;
            StmtKind::Break
        } else if self.match_keyword("continue") {
            self.expect_punct(";")?;
            StmtKind::Continue
        } else if self.match_keyword("return") {
            let value = if self.check_punct(";") {
                None
            } else {
                Some(self.parse_expression()?)
            };
            self.expect_punct(";")?;
            StmtKind::Return(value)
        } else if self.match_keyword("goto") {
            let (label, _) = self.expect_ident()?;
            self.expect_punct(";")?;
            StmtKind::Goto { label }
        } else {
            let expr = self.parse_expression()?;
            self.expect_punct(";")?;
            StmtKind::Expr(expr)
        };

        Ok(self.finish_stmt(kind, start))
    }

    /// Statement after a label; a label directly before `}` gets an empty body
    fn parse_labeled_body(&mut self) -> Result<Stmt, ParseError> {
        if self.check_punct("}") {
            let here = self.current_start();
            let id = self.fresh_id();
            return Ok(Stmt {
                id,
                kind: StmtKind::Null,
                range: SourceRange::new(here, here),
            });
        }
        self.parse_statement()
    }

    fn parse_for_statement(
        &mut self,
        start: SourceLocation,
    ) -> Result<Stmt, ParseError> {
        self.expect_punct("(")?;
        self.push_scope();
        let result = self.parse_for_rest(start);
        self.pop_scope();
        result
    }

    fn parse_for_rest(
        &mut self,
        start: SourceLocation,
    ) -> Result<Stmt, ParseError> {
        let init_start = self.current_start();
        let init = if self.match_punct(";") {
            None
        } else if self.is_declaration_start() {
            let decls = self.parse_local_declaration()?;
            Some(Box::new(self.finish_stmt(StmtKind::Decl(decls), init_start)))
        } else {
            let expr = self.parse_expression()?;
            self.expect_punct(";")?;
            Some(Box::new(self.finish_stmt(StmtKind::Expr(expr), init_start)))
        };

        let cond = if self.check_punct(";") {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_punct(";")?;

        let step = if self.check_punct(")") {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_punct(")")?;

        let body = Box::new(self.parse_statement()?);
        Ok(self.finish_stmt(
            StmtKind::For {
                init,
                cond,
                step,
                body,
            },
            start,
        ))
    }

    fn finish_stmt(&mut self, kind: StmtKind, start: SourceLocation) -> Stmt {
        let id = self.fresh_id();
        Stmt {
            id,
            kind,
            range: self.range_from(start),
        }
    }
}
