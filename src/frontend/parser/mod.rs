//! Recursive descent parser for the supported C subset
//!
//! The parser is split across files using `impl Parser` blocks:
//! - this module: parser state, token helpers, identifier scopes
//! - `declarations`: specifiers, declarators, records, enums, functions
//! - `statements`: statements and blocks
//! - `expressions`: expressions with precedence climbing and typing

mod declarations;
mod expressions;
mod statements;

use std::collections::HashMap;
use std::fmt;

use super::ast::{ExternalDecl, NodeId, RecordTable, TranslationUnit};
use super::lexer::{LexError, Lexer, Token, TokenKind};
use super::source::{SourceLocation, SourceMap, SourceRange};
use super::types::CType;

/// Parser error type
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parse error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

/// What an ordinary identifier names in the current scope
#[derive(Debug, Clone)]
pub(crate) enum Symbol {
    Var { ty: CType, decl: SourceLocation },
    Typedef(CType),
    Function(CType),
    EnumConst(i64),
}

/// Parse a whole translation unit
pub fn parse(map: &SourceMap) -> Result<TranslationUnit, ParseError> {
    Parser::new(map)?.parse_translation_unit()
}

pub struct Parser<'a> {
    pub(crate) map: &'a SourceMap,
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    next_id: NodeId,
    scopes: Vec<HashMap<String, Symbol>>,
    pub(crate) records: RecordTable,
    pub(crate) anonymous_count: usize,
}

impl<'a> Parser<'a> {
    pub fn new(map: &'a SourceMap) -> Result<Self, ParseError> {
        let tokens = Lexer::new(map)
            .tokenize()
            .map_err(|e: LexError| ParseError {
                message: e.message,
                location: map.location(e.offset),
            })?;

        let mut file_scope = HashMap::new();
        file_scope.insert(
            "__builtin_va_list".to_string(),
            Symbol::Typedef(CType::pointer_to(CType::Void)),
        );

        Ok(Self {
            map,
            tokens,
            position: 0,
            next_id: 0,
            scopes: vec![file_scope],
            records: RecordTable::default(),
            anonymous_count: 0,
        })
    }

    pub fn parse_translation_unit(mut self) -> Result<TranslationUnit, ParseError> {
        let mut items: Vec<ExternalDecl> = Vec::new();
        while !self.is_at_end() {
            if self.match_punct(";") {
                continue;
            }
            items.extend(self.parse_external_declaration()?);
        }
        Ok(TranslationUnit {
            items,
            records: self.records,
        })
    }

    // ===== Token helpers =====

    pub(crate) fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    pub(crate) fn peek_at(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.position + n).min(last)]
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.position += 1;
        }
        token
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    pub(crate) fn check_punct(&self, p: &str) -> bool {
        self.peek().is_punct(p)
    }

    pub(crate) fn check_keyword(&self, k: &str) -> bool {
        self.peek().is_keyword(k)
    }

    pub(crate) fn match_punct(&mut self, p: &str) -> bool {
        if self.check_punct(p) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn match_keyword(&mut self, k: &str) -> bool {
        if self.check_keyword(k) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_punct(&mut self, p: &str) -> Result<Token, ParseError> {
        if self.check_punct(p) {
            Ok(self.advance())
        } else {
            Err(self.error(format!(
                "expected '{}', found {}",
                p,
                self.peek().describe()
            )))
        }
    }

    pub(crate) fn expect_ident(&mut self) -> Result<(String, SourceRange), ParseError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                let token = self.advance();
                Ok((name, token.range))
            }
            _ => Err(self.error(format!(
                "expected identifier, found {}",
                self.peek().describe()
            ))),
        }
    }

    pub(crate) fn ident_text(&self) -> Option<&str> {
        match &self.peek().kind {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// Start of the current token
    pub(crate) fn current_start(&self) -> SourceLocation {
        self.peek().range.start
    }

    /// End of the most recently consumed token
    pub(crate) fn previous_end(&self) -> SourceLocation {
        if self.position == 0 {
            return self.map.start_of_file();
        }
        self.tokens[self.position - 1].range.end
    }

    pub(crate) fn range_from(&self, start: SourceLocation) -> SourceRange {
        SourceRange::new(start, self.previous_end())
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.current_start(),
        }
    }

    pub(crate) fn fresh_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Skip a balanced parenthesised group, e.g. the argument of `__attribute__`
    pub(crate) fn skip_balanced_parens(&mut self) -> Result<(), ParseError> {
        self.expect_punct("(")?;
        let mut depth = 1usize;
        while depth > 0 {
            if self.is_at_end() {
                return Err(self.error("unbalanced parentheses"));
            }
            let token = self.advance();
            if token.is_punct("(") {
                depth += 1;
            } else if token.is_punct(")") {
                depth -= 1;
            }
        }
        Ok(())
    }

    /// Consume GNU extensions that carry no meaning for mutation
    pub(crate) fn skip_gnu_noise(&mut self) -> Result<(), ParseError> {
        loop {
            match self.ident_text() {
                Some("__attribute__" | "__attribute" | "__asm__" | "__asm" | "asm") => {
                    self.advance();
                    self.skip_balanced_parens()?;
                }
                Some(
                    "__extension__" | "__restrict" | "__restrict__" | "__inline" | "__inline__"
                    | "__volatile__" | "__const",
                ) => {
                    self.advance();
                }
                _ => return Ok(()),
            }
        }
    }

    // ===== Scopes =====

    pub(crate) fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub(crate) fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub(crate) fn at_file_scope(&self) -> bool {
        self.scopes.len() == 1
    }

    pub(crate) fn declare(&mut self, name: &str, symbol: Symbol) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), symbol);
        }
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub(crate) fn is_typedef_name(&self, name: &str) -> bool {
        matches!(self.lookup(name), Some(Symbol::Typedef(_)))
    }

    /// True if the current token can begin a declaration
    pub(crate) fn is_declaration_start(&self) -> bool {
        match &self.peek().kind {
            TokenKind::Keyword(k) => matches!(
                *k,
                "_Bool"
                    | "auto"
                    | "char"
                    | "const"
                    | "double"
                    | "enum"
                    | "extern"
                    | "float"
                    | "inline"
                    | "int"
                    | "long"
                    | "register"
                    | "restrict"
                    | "short"
                    | "signed"
                    | "static"
                    | "struct"
                    | "typedef"
                    | "union"
                    | "unsigned"
                    | "void"
                    | "volatile"
            ),
            TokenKind::Ident(name) => {
                name == "__extension__"
                    || (self.is_typedef_name(name) && !self.peek_at(1).is_punct(":"))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::*;

    fn parse_src(src: &str) -> TranslationUnit {
        let map = SourceMap::new(src);
        parse(&map).unwrap()
    }

    #[test]
    fn test_parse_function_and_globals() {
        let tu = parse_src("int g = 3;\nint add(int a, int b) { return a + b; }\n");
        assert_eq!(tu.items.len(), 2);
        let f = tu.functions().next().unwrap();
        assert_eq!(f.name, "add");
        assert_eq!(f.params.len(), 2);
        assert!(f.body.is_compound());
    }

    #[test]
    fn test_binary_typing() {
        let tu = parse_src("double d; int *p; void f(void) { d + 1; p + 1; p - p; }");
        let f = tu.functions().next().unwrap();
        let StmtKind::Compound(stmts) = &f.body.kind else {
            panic!("expected block");
        };
        let types: Vec<CType> = stmts
            .iter()
            .map(|s| match &s.kind {
                StmtKind::Expr(e) => e.ty.clone(),
                _ => panic!("expected expression statement"),
            })
            .collect();
        assert_eq!(types[0], CType::DOUBLE);
        assert_eq!(types[1], CType::pointer_to(CType::INT));
        assert!(types[2].is_integral());
    }

    #[test]
    fn test_typedef_and_struct() {
        let tu = parse_src(
            "typedef struct node { int val; struct node *next; } Node;\n\
             int sum(Node *n) { return n->val + n->next->val; }\n",
        );
        assert!(tu.records.get("node").is_some());
        assert_eq!(
            tu.records.field_type("node", "val"),
            Some(CType::INT)
        );
    }

    #[test]
    fn test_parse_error_location() {
        let map = SourceMap::new("int main( {\n}");
        let err = parse(&map).unwrap_err();
        assert_eq!(err.location.line, 1);
    }

    #[test]
    fn test_switch_labels_goto() {
        let tu = parse_src(
            "int f(int x) {\n  switch (x) { case 1: x++; break; default: x--; }\n  \
             goto end;\nend:\n  return x;\n}\n",
        );
        assert_eq!(tu.functions().count(), 1);
    }
}
