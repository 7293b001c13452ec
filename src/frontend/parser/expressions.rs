//! Expression parsing with precedence climbing
//!
//! Each expression is typed as it is built, so later passes can query operand
//! types without a separate semantic pass.

use super::{ParseError, Parser, Symbol};
use crate::frontend::ast::*;
use crate::frontend::lexer::{parse_char_literal, parse_int_literal, TokenKind};
use crate::frontend::source::{SourceLocation, SourceRange};
use crate::frontend::types::{CType, FloatKind, IntKind};

impl<'a> Parser<'a> {
    fn make_expr(&mut self, kind: ExprKind, ty: CType, range: SourceRange) -> Expr {
        let id = self.fresh_id();
        Expr { id, kind, ty, range }
    }

    /// Full expression, including the comma operator
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_assignment_expression()?;
        while self.check_punct(",") {
            let op_range = self.advance().range;
            let rhs = self.parse_assignment_expression()?;
            expr = self.binary(BinaryOp::Comma, op_range, expr, rhs);
        }
        Ok(expr)
    }

    pub(crate) fn parse_assignment_expression(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_conditional_expression()?;
        let op = match &self.peek().kind {
            TokenKind::Punct(p) => BinaryOp::from_token(p).filter(|op| op.is_assignment()),
            _ => None,
        };
        let Some(op) = op else {
            return Ok(lhs);
        };
        let op_range = self.advance().range;
        let rhs = self.parse_assignment_expression()?;
        Ok(self.binary(op, op_range, lhs, rhs))
    }

    pub(crate) fn parse_conditional_expression(&mut self) -> Result<Expr, ParseError> {
        let cond = self.parse_binary_expression(4)?;
        if !self.match_punct("?") {
            return Ok(cond);
        }
        let then_expr = self.parse_expression()?;
        self.expect_punct(":")?;
        let else_expr = self.parse_conditional_expression()?;
        let ty = if then_expr.ty.is_arithmetic() && else_expr.ty.is_arithmetic() {
            CType::usual_arithmetic(&then_expr.ty, &else_expr.ty)
        } else {
            then_expr.ty.decay()
        };
        let range = cond.range.to(else_expr.range);
        Ok(self.make_expr(
            ExprKind::Conditional {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            ty,
            range,
        ))
    }

    /// Precedence climbing over the non-assignment binary operators
    fn parse_binary_expression(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_cast_expression()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Punct(p) => BinaryOp::from_token(p)
                    .filter(|op| !op.is_assignment() && *op != BinaryOp::Comma),
                _ => None,
            };
            let Some(op) = op else { break };
            if op.precedence() < min_prec {
                break;
            }
            let op_range = self.advance().range;
            let rhs = self.parse_binary_expression(op.precedence() + 1)?;
            lhs = self.binary(op, op_range, lhs, rhs);
        }
        Ok(lhs)
    }

    fn binary(&mut self, op: BinaryOp, op_range: SourceRange, lhs: Expr, rhs: Expr) -> Expr {
        let ty = binary_result_type(op, &lhs.ty, &rhs.ty);
        let range = lhs.range.to(rhs.range);
        self.make_expr(
            ExprKind::Binary {
                op,
                op_range,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
            range,
        )
    }

    fn parse_cast_expression(&mut self) -> Result<Expr, ParseError> {
        if self.check_punct("(") && self.is_type_name_after_paren() {
            let start = self.current_start();
            self.advance();
            let target = self.parse_type_name()?;
            self.expect_punct(")")?;
            let type_range = self.range_from(start);
            if self.check_punct("{") {
                return Err(self.error("compound literals are not supported"));
            }
            let operand = self.parse_cast_expression()?;
            let range = SourceRange::new(start, operand.range.end);
            return Ok(self.make_expr(
                ExprKind::Cast {
                    target: target.clone(),
                    type_range,
                    operand: Box::new(operand),
                },
                target,
                range,
            ));
        }
        self.parse_unary_expression()
    }

    fn is_type_name_after_paren(&self) -> bool {
        let next = self.peek_at(1);
        match &next.kind {
            TokenKind::Keyword(k) => matches!(
                *k,
                "_Bool"
                    | "char"
                    | "const"
                    | "double"
                    | "enum"
                    | "float"
                    | "int"
                    | "long"
                    | "short"
                    | "signed"
                    | "struct"
                    | "union"
                    | "unsigned"
                    | "void"
                    | "volatile"
            ),
            TokenKind::Ident(name) => self.is_typedef_name(name),
            _ => false,
        }
    }

    fn parse_unary_expression(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_start();

        if self.match_keyword("sizeof") {
            let arg = if self.check_punct("(") && self.is_type_name_after_paren() {
                self.advance();
                let ty = self.parse_type_name()?;
                self.expect_punct(")")?;
                SizeofArg::Type(ty)
            } else {
                SizeofArg::Expr(Box::new(self.parse_unary_expression()?))
            };
            let range = self.range_from(start);
            return Ok(self.make_expr(
                ExprKind::Sizeof(arg),
                CType::Int(IntKind::ULong),
                range,
            ));
        }

        let op = match &self.peek().kind {
            TokenKind::Punct("++") => Some(UnaryOp::PreInc),
            TokenKind::Punct("--") => Some(UnaryOp::PreDec),
            TokenKind::Punct("+") => Some(UnaryOp::Plus),
            TokenKind::Punct("-") => Some(UnaryOp::Minus),
            TokenKind::Punct("!") => Some(UnaryOp::Not),
            TokenKind::Punct("~") => Some(UnaryOp::BitNot),
            TokenKind::Punct("*") => Some(UnaryOp::Deref),
            TokenKind::Punct("&") => Some(UnaryOp::AddrOf),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_postfix_expression();
        };

        let op_range = self.advance().range;
        let operand = if matches!(op, UnaryOp::PreInc | UnaryOp::PreDec) {
            self.parse_unary_expression()?
        } else {
            self.parse_cast_expression()?
        };
        let ty = unary_result_type(op, &operand.ty);
        let range = SourceRange::new(start, operand.range.end);
        Ok(self.make_expr(
            ExprKind::Unary {
                op,
                op_range,
                operand: Box::new(operand),
            },
            ty,
            range,
        ))
    }

    fn parse_postfix_expression(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary_expression()?;
        loop {
            let start = expr.range.start;
            if self.match_punct("[") {
                let index = self.parse_expression()?;
                self.expect_punct("]")?;
                let ty = index_result_type(&expr.ty, &index.ty);
                let range = self.range_from(start);
                expr = self.make_expr(
                    ExprKind::Index {
                        base: Box::new(expr),
                        index: Box::new(index),
                    },
                    ty,
                    range,
                );
            } else if self.match_punct("(") {
                let mut args = Vec::new();
                if !self.check_punct(")") {
                    loop {
                        args.push(self.parse_assignment_expression()?);
                        if !self.match_punct(",") {
                            break;
                        }
                    }
                }
                self.expect_punct(")")?;
                let ty = expr.ty.return_type().cloned().unwrap_or(CType::INT);
                let range = self.range_from(start);
                expr = self.make_expr(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    ty,
                    range,
                );
            } else if self.check_punct(".") || self.check_punct("->") {
                let arrow = self.advance().is_punct("->");
                let (member, member_range) = self.expect_ident()?;
                let record = if arrow {
                    expr.ty.pointee().cloned()
                } else {
                    Some(expr.ty.clone())
                };
                let ty = match record {
                    Some(CType::Record { tag, .. }) => {
                        self.records.field_type(&tag, &member).unwrap_or(CType::INT)
                    }
                    _ => CType::INT,
                };
                let range = self.range_from(start);
                expr = self.make_expr(
                    ExprKind::Member {
                        base: Box::new(expr),
                        member,
                        member_range,
                        arrow,
                    },
                    ty,
                    range,
                );
            } else if self.check_punct("++") || self.check_punct("--") {
                let token = self.advance();
                let op = if token.is_punct("++") {
                    UnaryOp::PostInc
                } else {
                    UnaryOp::PostDec
                };
                let ty = expr.ty.clone();
                let range = self.range_from(start);
                expr = self.make_expr(
                    ExprKind::Unary {
                        op,
                        op_range: token.range,
                        operand: Box::new(expr),
                    },
                    ty,
                    range,
                );
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary_expression(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::IntLiteral(text) => {
                self.advance();
                let value = parse_int_literal(&text)
                    .ok_or_else(|| self.error(format!("invalid integer literal '{}'", text)))?;
                let ty = int_literal_type(&text);
                Ok(self.make_expr(ExprKind::IntLiteral { text, value }, ty, token.range))
            }
            TokenKind::FloatLiteral(text) => {
                self.advance();
                let digits = text.trim_end_matches(['f', 'F', 'l', 'L']);
                let value = digits.parse::<f64>().unwrap_or(0.0);
                let ty = match text.chars().last() {
                    Some('f' | 'F') => CType::Float(FloatKind::Float),
                    Some('l' | 'L') => CType::Float(FloatKind::LongDouble),
                    _ => CType::DOUBLE,
                };
                Ok(self.make_expr(ExprKind::FloatLiteral { text, value }, ty, token.range))
            }
            TokenKind::CharLiteral(text) => {
                self.advance();
                let value = parse_char_literal(&text).unwrap_or(0);
                Ok(self.make_expr(ExprKind::CharLiteral { text, value }, CType::INT, token.range))
            }
            TokenKind::StringLiteral(_) => {
                let start = token.range.start;
                let mut length = 0u64;
                while let TokenKind::StringLiteral(part) = &self.peek().kind {
                    length += string_length(part);
                    self.advance();
                }
                let range = self.range_from(start);
                let text = self.map.slice(range).to_string();
                Ok(self.make_expr(
                    ExprKind::StringLiteral { text },
                    CType::Array(Box::new(CType::Int(IntKind::Char)), Some(length + 1)),
                    range,
                ))
            }
            TokenKind::Ident(name) => {
                self.advance();
                let (binding, ty) = match self.lookup(&name) {
                    Some(Symbol::Var { ty, decl }) => (Binding::Variable { decl: *decl }, ty.clone()),
                    Some(Symbol::Function(ty)) => (Binding::Function, ty.clone()),
                    Some(Symbol::EnumConst(v)) => (Binding::EnumConstant(*v), CType::INT),
                    Some(Symbol::Typedef(_)) => {
                        return Err(ParseError {
                            message: format!("unexpected type name '{}'", name),
                            location: token.range.start,
                        })
                    }
                    None => (Binding::Unresolved, CType::INT),
                };
                Ok(self.make_expr(ExprKind::Ident { name, binding }, ty, token.range))
            }
            TokenKind::Punct("(") => {
                let start: SourceLocation = token.range.start;
                self.advance();
                if self.check_punct("{") {
                    return Err(self.error("statement expressions are not supported"));
                }
                let inner = self.parse_expression()?;
                self.expect_punct(")")?;
                let ty = inner.ty.clone();
                let range = self.range_from(start);
                Ok(self.make_expr(ExprKind::Paren(Box::new(inner)), ty, range))
            }
            _ => Err(self.error(format!(
                "expected expression, found {}",
                token.describe()
            ))),
        }
    }
}

fn int_literal_type(text: &str) -> CType {
    let suffix: String = text
        .chars()
        .rev()
        .take_while(|c| matches!(c, 'u' | 'U' | 'l' | 'L'))
        .collect::<String>()
        .to_ascii_lowercase();
    let unsigned = suffix.contains('u');
    let longs = suffix.matches('l').count();
    CType::Int(match (longs, unsigned) {
        (0, false) => IntKind::Int,
        (0, true) => IntKind::UInt,
        (1, false) => IntKind::Long,
        (1, true) => IntKind::ULong,
        (_, false) => IntKind::LongLong,
        (_, true) => IntKind::ULongLong,
    })
}

/// Number of characters a string literal token contributes, escapes counted once
fn string_length(token: &str) -> u64 {
    let inner = token
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(token);
    let mut count = 0;
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            chars.next();
        }
        count += 1;
    }
    count
}

fn binary_result_type(op: BinaryOp, lhs: &CType, rhs: &CType) -> CType {
    let (l, r) = (lhs.decay(), rhs.decay());
    match op.family() {
        OpFamily::Relational | OpFamily::Logical => CType::INT,
        OpFamily::Comma => r,
        OpFamily::PlainAssign
        | OpFamily::ArithmeticAssign
        | OpFamily::BitwiseAssign
        | OpFamily::ShiftAssign => lhs.clone(),
        OpFamily::Shift => l.promoted(),
        OpFamily::Bitwise => CType::usual_arithmetic(&l, &r),
        OpFamily::Arithmetic => match op {
            BinaryOp::Add if l.is_pointer() => l,
            BinaryOp::Add if r.is_pointer() => r,
            BinaryOp::Sub if l.is_pointer() && r.is_pointer() => CType::Int(IntKind::Long),
            BinaryOp::Sub if l.is_pointer() => l,
            _ => CType::usual_arithmetic(&l, &r),
        },
    }
}

fn unary_result_type(op: UnaryOp, operand: &CType) -> CType {
    match op {
        UnaryOp::Plus | UnaryOp::Minus | UnaryOp::BitNot => operand.promoted(),
        UnaryOp::Not => CType::INT,
        UnaryOp::Deref => operand.decay().pointee().cloned().unwrap_or(CType::INT),
        UnaryOp::AddrOf => CType::pointer_to(operand.clone()),
        UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => operand.clone(),
    }
}

fn index_result_type(base: &CType, index: &CType) -> CType {
    base.decay()
        .pointee()
        .or_else(|| index.pointee())
        .cloned()
        .unwrap_or(CType::INT)
}

#[cfg(test)]
mod tests {
    use crate::frontend::ast::*;
    use crate::frontend::parser::parse;
    use crate::frontend::source::SourceMap;
    use crate::frontend::types::CType;

    fn first_expr(src: &str) -> Expr {
        let map = SourceMap::new(src);
        let tu = parse(&map).unwrap();
        let f = tu.functions().next().unwrap();
        let StmtKind::Compound(stmts) = &f.body.kind else {
            panic!("expected block");
        };
        stmts
            .iter()
            .find_map(|s| match &s.kind {
                StmtKind::Expr(e) => Some(e.clone()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_precedence() {
        let e = first_expr("void f(int a, int b, int c) { a + b * c; }");
        let ExprKind::Binary { op, rhs, .. } = &e.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(rhs.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_cast_and_member() {
        let e = first_expr(
            "struct p { double x; }; void f(struct p *s) { (int)s->x; }",
        );
        let ExprKind::Cast { target, type_range, operand } = &e.kind else {
            panic!("expected cast");
        };
        assert_eq!(*target, CType::INT);
        assert_eq!(type_range.start.column, 47);
        assert_eq!(type_range.end.column, 52);
        assert_eq!(operand.ty, CType::DOUBLE);
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let e = first_expr("void f(int a, int b) { a = b = 1; }");
        let ExprKind::Binary { op, rhs, .. } = &e.kind else {
            panic!("expected assignment");
        };
        assert_eq!(*op, BinaryOp::Assign);
        assert!(matches!(rhs.kind, ExprKind::Binary { op: BinaryOp::Assign, .. }));
    }

    #[test]
    fn test_operator_range() {
        let e = first_expr("void f(int a) { a <<= 2; }");
        let ExprKind::Binary { op_range, .. } = &e.kind else {
            panic!("expected binary");
        };
        assert_eq!(op_range.start.column, 19);
        assert_eq!(op_range.end.column, 22);
    }
}
