//! C front end: lexer, parser, typed AST and source positions
//!
//! This is the source model the mutation passes consume. It accepts a
//! practical C subset (no preprocessing; directives are skipped) and produces
//! an immutable [`TranslationUnit`] paired with the [`SourceMap`] it was
//! parsed from.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod types;
pub mod visit;

pub use ast::TranslationUnit;
pub use parser::{parse, ParseError};
pub use source::{SourceLocation, SourceMap, SourceRange};
pub use types::{CType, VarCategory};
pub use visit::Visit;
