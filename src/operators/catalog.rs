//! The fixed operator catalog
//!
//! Each entry names an operator, what it does, which tokens it may be
//! configured with, and its default domain and range. Configuration is
//! validated against these rules before any traversal starts.

use crate::error::{MutationError, Result};
use crate::frontend::lexer::{parse_char_literal, Lexer, TokenKind};
use crate::frontend::{SourceMap, VarCategory};

use super::binary::BinarySubstitution;
use super::call::CallReplacement;
use super::cast::CastReplacement;
use super::constant::{ConstantReplacement, RequiredConstant, ScalarToConstant};
use super::statement::StatementDeletion;
use super::string::{StringReplacement, WhitespaceTrim};
use super::twiddle::{Twiddle, TwiddleTarget};
use super::unary::{
    BitwiseNegation, ConditionNegation, IncDecMutation, IndirectionPrecedence, LogicalNegation,
};
use super::variable::{FieldReplacement, VariableReplacement};
use super::{Operator, Tokens};

/// Where replacement candidates are drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Local,
}

/// Which tokens a domain or range may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRule {
    /// Only the listed tokens
    Fixed(&'static [&'static str]),
    /// C identifiers
    Identifiers,
    /// Numeric or character constants, optionally negated
    Constants,
    /// Nothing: the operator computes its own tokens
    Empty,
}

impl TokenRule {
    /// Normalised form of `token`, or `None` if the rule rejects it
    fn normalize(&self, token: &str) -> Option<String> {
        match self {
            TokenRule::Fixed(allowed) => allowed.contains(&token).then(|| token.to_string()),
            TokenRule::Identifiers => match single_token(token)? {
                TokenKind::Ident(name) => Some(name),
                _ => None,
            },
            TokenRule::Constants => normalize_constant(token),
            TokenRule::Empty => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            TokenRule::Fixed(tokens) => tokens.join(" "),
            TokenRule::Identifiers => "identifiers".to_string(),
            TokenRule::Constants => "constants".to_string(),
            TokenRule::Empty => "-".to_string(),
        }
    }
}

/// Constant text in the form the inventory stores it: character literals
/// become their integer value
pub fn normalize_constant(token: &str) -> Option<String> {
    let (sign, body) = match token.strip_prefix('-') {
        Some(rest) => ("-", rest.trim_start()),
        None => ("", token),
    };
    let body = match single_token(body)? {
        TokenKind::IntLiteral(text) | TokenKind::FloatLiteral(text) => text,
        TokenKind::CharLiteral(text) => parse_char_literal(&text)?.to_string(),
        _ => return None,
    };
    Some(format!("{}{}", sign, body))
}

fn single_token(text: &str) -> Option<TokenKind> {
    let map = SourceMap::new(text);
    let tokens = Lexer::new(&map).tokenize().ok()?;
    match tokens.as_slice() {
        [only, eof] if eof.kind == TokenKind::Eof => Some(only.kind.clone()),
        _ => None,
    }
}

/// What an operator is, independent of its configured tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    BinarySubstitution,
    Increment,
    Decrement,
    LogicalNegation,
    BitwiseNegation,
    ConditionNegation,
    IndirectionPrecedence,
    Cast,
    ConstantForConstant(Scope),
    ConstantForScalar(Scope),
    RequiredConstant,
    Variable(Scope, VarCategory),
    StructField,
    CallTwiddle,
    CallForVariable(Scope, VarCategory),
    Twiddle,
    StringReplacement,
    StringTrim,
    StatementDeletion,
}

#[derive(Debug)]
pub struct OperatorDef {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: OperatorKind,
    pub domain: TokenRule,
    pub range: TokenRule,
    pub default_domain: &'static [&'static str],
    pub default_range: &'static [&'static str],
}

impl OperatorDef {
    /// Validate the configured tokens and build the operator; empty lists
    /// fall back to the defaults
    pub fn build(&'static self, domain: &[String], range: &[String]) -> Result<Operator> {
        let domain = validate(self.domain, domain).map_err(|tokens| MutationError::InvalidDomain {
            operator: self.name.to_string(),
            tokens,
        })?;
        let range = validate(self.range, range).map_err(|tokens| MutationError::InvalidRange {
            operator: self.name.to_string(),
            tokens,
        })?;
        let tokens = Tokens::new(
            if domain.is_empty() {
                self.default_domain.iter().map(|t| t.to_string()).collect()
            } else {
                domain
            },
            if range.is_empty() {
                self.default_range.iter().map(|t| t.to_string()).collect()
            } else {
                range
            },
        );
        let name = self.name;
        let operator = match self.kind {
            OperatorKind::BinarySubstitution => {
                Operator::Expr(Box::new(BinarySubstitution::new(name, tokens)?))
            }
            OperatorKind::Increment => Operator::Expr(Box::new(IncDecMutation::increment(name))),
            OperatorKind::Decrement => Operator::Expr(Box::new(IncDecMutation::decrement(name))),
            OperatorKind::LogicalNegation => {
                Operator::Expr(Box::new(LogicalNegation::new(name, tokens)))
            }
            OperatorKind::BitwiseNegation => {
                Operator::Expr(Box::new(BitwiseNegation::new(name, tokens)))
            }
            OperatorKind::ConditionNegation => Operator::Expr(Box::new(ConditionNegation { name })),
            OperatorKind::IndirectionPrecedence => {
                Operator::Expr(Box::new(IndirectionPrecedence { name }))
            }
            OperatorKind::Cast => Operator::Expr(Box::new(CastReplacement::new(name, tokens))),
            OperatorKind::ConstantForConstant(scope) => {
                Operator::Expr(Box::new(ConstantReplacement::new(name, scope, tokens)))
            }
            OperatorKind::ConstantForScalar(scope) => {
                Operator::Expr(Box::new(ScalarToConstant::new(name, scope, tokens)))
            }
            OperatorKind::RequiredConstant => {
                Operator::Expr(Box::new(RequiredConstant::new(name, tokens)))
            }
            OperatorKind::Variable(scope, category) => Operator::Expr(Box::new(
                VariableReplacement::new(name, scope, category, tokens),
            )),
            OperatorKind::StructField => {
                Operator::Expr(Box::new(FieldReplacement::new(name, tokens)))
            }
            OperatorKind::CallTwiddle => {
                Operator::Expr(Box::new(Twiddle::new(name, TwiddleTarget::Call, tokens)))
            }
            OperatorKind::CallForVariable(scope, category) => Operator::Expr(Box::new(
                CallReplacement::new(name, scope, category, tokens),
            )),
            OperatorKind::Twiddle => {
                Operator::Expr(Box::new(Twiddle::new(name, TwiddleTarget::Reference, tokens)))
            }
            OperatorKind::StringReplacement => Operator::Expr(Box::new(StringReplacement { name })),
            OperatorKind::StringTrim => Operator::Expr(Box::new(WhitespaceTrim { name })),
            OperatorKind::StatementDeletion => {
                Operator::Stmt(Box::new(StatementDeletion { name }))
            }
        };
        Ok(operator)
    }
}

/// Normalised tokens, or the list of rejected ones
fn validate(rule: TokenRule, tokens: &[String]) -> std::result::Result<Vec<String>, Vec<String>> {
    let mut accepted = Vec::with_capacity(tokens.len());
    let mut rejected = Vec::new();
    for token in tokens {
        match rule.normalize(token.trim()) {
            Some(normalized) => accepted.push(normalized),
            None => rejected.push(token.clone()),
        }
    }
    if rejected.is_empty() {
        Ok(accepted)
    } else {
        Err(rejected)
    }
}

/// Catalog entry for `name`
pub fn lookup(name: &str) -> Result<&'static OperatorDef> {
    let wanted = name.trim().to_ascii_uppercase();
    CATALOG
        .iter()
        .find(|def| def.name == wanted)
        .ok_or_else(|| MutationError::UnknownOperator {
            name: name.to_string(),
        })
}

pub const ARITHMETIC: &[&str] = &["+", "-", "*", "/", "%"];
pub const BITWISE: &[&str] = &["&", "|", "^"];
pub const LOGICAL: &[&str] = &["&&", "||"];
pub const RELATIONAL: &[&str] = &["<", ">", "<=", ">=", "==", "!="];
pub const SHIFT: &[&str] = &["<<", ">>"];
pub const ARITHMETIC_ASSIGN: &[&str] = &["+=", "-=", "*=", "/=", "%="];
pub const BITWISE_ASSIGN: &[&str] = &["&=", "|=", "^="];
pub const SHIFT_ASSIGN: &[&str] = &["<<=", ">>="];
pub const PLAIN_ASSIGN: &[&str] = &["="];

pub const CAST_TYPES: &[&str] = &[
    "int",
    "unsigned",
    "short",
    "long",
    "unsigned long",
    "char",
    "unsigned char",
    "signed char",
    "float",
    "double",
    "long double",
];

pub const REQUIRED_CONSTANTS: &[&str] = &["0", "1", "-1", "0.0", "1.0", "-1.0"];

const fn binary(
    name: &'static str,
    description: &'static str,
    from: &'static [&'static str],
    to: &'static [&'static str],
) -> OperatorDef {
    OperatorDef {
        name,
        description,
        kind: OperatorKind::BinarySubstitution,
        domain: TokenRule::Fixed(from),
        range: TokenRule::Fixed(to),
        default_domain: from,
        default_range: to,
    }
}

const fn computed(name: &'static str, description: &'static str, kind: OperatorKind) -> OperatorDef {
    OperatorDef {
        name,
        description,
        kind,
        domain: TokenRule::Empty,
        range: TokenRule::Empty,
        default_domain: &[],
        default_range: &[],
    }
}

const fn named(
    name: &'static str,
    description: &'static str,
    kind: OperatorKind,
    range: TokenRule,
) -> OperatorDef {
    OperatorDef {
        name,
        description,
        kind,
        domain: TokenRule::Identifiers,
        range,
        default_domain: &[],
        default_range: &[],
    }
}

use OperatorKind as K;
use Scope::{Global, Local};
use VarCategory::{Array, Pointer, Scalar, Struct};

pub static CATALOG: &[OperatorDef] = &[
    binary("OAAN", "arithmetic operator by arithmetic operator", ARITHMETIC, ARITHMETIC),
    binary("OABN", "arithmetic operator by bitwise operator", ARITHMETIC, BITWISE),
    binary("OALN", "arithmetic operator by logical operator", ARITHMETIC, LOGICAL),
    binary("OARN", "arithmetic operator by relational operator", ARITHMETIC, RELATIONAL),
    binary("OASN", "arithmetic operator by shift operator", ARITHMETIC, SHIFT),
    binary("OBAN", "bitwise operator by arithmetic operator", BITWISE, ARITHMETIC),
    binary("OBBN", "bitwise operator by bitwise operator", BITWISE, BITWISE),
    binary("OBLN", "bitwise operator by logical operator", BITWISE, LOGICAL),
    binary("OBRN", "bitwise operator by relational operator", BITWISE, RELATIONAL),
    binary("OBSN", "bitwise operator by shift operator", BITWISE, SHIFT),
    binary("OLAN", "logical operator by arithmetic operator", LOGICAL, ARITHMETIC),
    binary("OLBN", "logical operator by bitwise operator", LOGICAL, BITWISE),
    binary("OLLN", "logical operator by logical operator", LOGICAL, LOGICAL),
    binary("OLRN", "logical operator by relational operator", LOGICAL, RELATIONAL),
    binary("OLSN", "logical operator by shift operator", LOGICAL, SHIFT),
    binary("ORAN", "relational operator by arithmetic operator", RELATIONAL, ARITHMETIC),
    binary("ORBN", "relational operator by bitwise operator", RELATIONAL, BITWISE),
    binary("ORLN", "relational operator by logical operator", RELATIONAL, LOGICAL),
    binary("ORRN", "relational operator by relational operator", RELATIONAL, RELATIONAL),
    binary("ORSN", "relational operator by shift operator", RELATIONAL, SHIFT),
    binary("OSAN", "shift operator by arithmetic operator", SHIFT, ARITHMETIC),
    binary("OSBN", "shift operator by bitwise operator", SHIFT, BITWISE),
    binary("OSLN", "shift operator by logical operator", SHIFT, LOGICAL),
    binary("OSRN", "shift operator by relational operator", SHIFT, RELATIONAL),
    binary("OSSN", "shift operator by shift operator", SHIFT, SHIFT),
    binary("OAAA", "arithmetic assignment by arithmetic assignment", ARITHMETIC_ASSIGN, ARITHMETIC_ASSIGN),
    binary("OABA", "arithmetic assignment by bitwise assignment", ARITHMETIC_ASSIGN, BITWISE_ASSIGN),
    binary("OASA", "arithmetic assignment by shift assignment", ARITHMETIC_ASSIGN, SHIFT_ASSIGN),
    binary("OBAA", "bitwise assignment by arithmetic assignment", BITWISE_ASSIGN, ARITHMETIC_ASSIGN),
    binary("OBBA", "bitwise assignment by bitwise assignment", BITWISE_ASSIGN, BITWISE_ASSIGN),
    binary("OBSA", "bitwise assignment by shift assignment", BITWISE_ASSIGN, SHIFT_ASSIGN),
    binary("OSAA", "shift assignment by arithmetic assignment", SHIFT_ASSIGN, ARITHMETIC_ASSIGN),
    binary("OSBA", "shift assignment by bitwise assignment", SHIFT_ASSIGN, BITWISE_ASSIGN),
    binary("OSSA", "shift assignment by shift assignment", SHIFT_ASSIGN, SHIFT_ASSIGN),
    binary("OEAA", "plain assignment by arithmetic assignment", PLAIN_ASSIGN, ARITHMETIC_ASSIGN),
    binary("OEBA", "plain assignment by bitwise assignment", PLAIN_ASSIGN, BITWISE_ASSIGN),
    binary("OESA", "plain assignment by shift assignment", PLAIN_ASSIGN, SHIFT_ASSIGN),
    computed("OPPO", "increment mutation", K::Increment),
    computed("OMMO", "decrement mutation", K::Decrement),
    OperatorDef {
        name: "OLNG",
        description: "logical negation",
        kind: K::LogicalNegation,
        domain: TokenRule::Fixed(LOGICAL),
        range: TokenRule::Empty,
        default_domain: LOGICAL,
        default_range: &[],
    },
    OperatorDef {
        name: "OBNG",
        description: "bitwise negation",
        kind: K::BitwiseNegation,
        domain: TokenRule::Fixed(BITWISE),
        range: TokenRule::Empty,
        default_domain: BITWISE,
        default_range: &[],
    },
    computed("OCNG", "logical context negation", K::ConditionNegation),
    computed("OIPM", "indirection operator precedence mutation", K::IndirectionPrecedence),
    OperatorDef {
        name: "OCOR",
        description: "cast operator by cast operator",
        kind: K::Cast,
        domain: TokenRule::Fixed(CAST_TYPES),
        range: TokenRule::Fixed(CAST_TYPES),
        default_domain: &[],
        default_range: CAST_TYPES,
    },
    OperatorDef {
        name: "CGCR",
        description: "constant by global constant",
        kind: K::ConstantForConstant(Global),
        domain: TokenRule::Constants,
        range: TokenRule::Constants,
        default_domain: &[],
        default_range: &[],
    },
    OperatorDef {
        name: "CLCR",
        description: "constant by local constant",
        kind: K::ConstantForConstant(Local),
        domain: TokenRule::Constants,
        range: TokenRule::Constants,
        default_domain: &[],
        default_range: &[],
    },
    named("CGSR", "scalar reference by global constant", K::ConstantForScalar(Global), TokenRule::Constants),
    named("CLSR", "scalar reference by local constant", K::ConstantForScalar(Local), TokenRule::Constants),
    OperatorDef {
        name: "CRCR",
        description: "scalar reference by required constant",
        kind: K::RequiredConstant,
        domain: TokenRule::Empty,
        range: TokenRule::Constants,
        default_domain: &[],
        default_range: REQUIRED_CONSTANTS,
    },
    named("VGSR", "scalar reference by global scalar", K::Variable(Global, Scalar), TokenRule::Identifiers),
    named("VLSR", "scalar reference by local scalar", K::Variable(Local, Scalar), TokenRule::Identifiers),
    named("VGAR", "array reference by global array", K::Variable(Global, Array), TokenRule::Identifiers),
    named("VLAR", "array reference by local array", K::Variable(Local, Array), TokenRule::Identifiers),
    named("VGTR", "struct reference by global struct", K::Variable(Global, Struct), TokenRule::Identifiers),
    named("VLTR", "struct reference by local struct", K::Variable(Local, Struct), TokenRule::Identifiers),
    named("VGPR", "pointer reference by global pointer", K::Variable(Global, Pointer), TokenRule::Identifiers),
    named("VLPR", "pointer reference by local pointer", K::Variable(Local, Pointer), TokenRule::Identifiers),
    named("VSCR", "structure component replacement", K::StructField, TokenRule::Identifiers),
    named("VTWF", "twiddle mutation of function calls", K::CallTwiddle, TokenRule::Empty),
    named("VGSF", "scalar call by global scalar", K::CallForVariable(Global, Scalar), TokenRule::Identifiers),
    named("VLSF", "scalar call by local scalar", K::CallForVariable(Local, Scalar), TokenRule::Identifiers),
    named("VGTF", "struct call by global struct", K::CallForVariable(Global, Struct), TokenRule::Identifiers),
    named("VLTF", "struct call by local struct", K::CallForVariable(Local, Struct), TokenRule::Identifiers),
    named("VGPF", "pointer call by global pointer", K::CallForVariable(Global, Pointer), TokenRule::Identifiers),
    named("VLPF", "pointer call by local pointer", K::CallForVariable(Local, Pointer), TokenRule::Identifiers),
    named("VTWD", "twiddle mutation of scalar references", K::Twiddle, TokenRule::Empty),
    computed("SCSR", "string constant replacement", K::StringReplacement),
    computed("SRWS", "string whitespace trimming", K::StringTrim),
    computed("SSDL", "statement deletion", K::StatementDeletion),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = CATALOG.iter().map(|def| def.name).collect();
        assert_eq!(names.len(), CATALOG.len());
        assert_eq!(CATALOG.len(), 69);
    }

    #[test]
    fn test_catalog_families() {
        let count = |kind: OperatorKind| CATALOG.iter().filter(|def| def.kind == kind).count();
        assert_eq!(count(OperatorKind::BinarySubstitution), 37);
        let names: Vec<_> = CATALOG.iter().map(|def| def.name).collect();
        assert_eq!(
            &names[names.len() - 12..],
            [
                "VSCR", "VTWF", "VGSF", "VLSF", "VGTF", "VLTF", "VGPF", "VLPF", "VTWD", "SCSR",
                "SRWS", "SSDL"
            ]
        );
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("OAAN").unwrap().kind, OperatorKind::BinarySubstitution);
        assert_eq!(lookup("oaan").unwrap().name, "OAAN");
        assert_eq!(lookup(" Vtwd ").unwrap().name, "VTWD");
        assert!(matches!(
            lookup("OAAX"),
            Err(MutationError::UnknownOperator { .. })
        ));
    }

    #[test]
    fn test_domain_outside_family_is_rejected() {
        let err = lookup("OAAN")
            .unwrap()
            .build(&strings(&["+", "&"]), &[])
            .err()
            .unwrap();
        match err {
            MutationError::InvalidDomain { operator, tokens } => {
                assert_eq!(operator, "OAAN");
                assert_eq!(tokens, vec!["&"]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_range_rules() {
        assert!(matches!(
            lookup("OBBN").unwrap().build(&[], &strings(&["&&"])),
            Err(MutationError::InvalidRange { .. })
        ));
        assert!(matches!(
            lookup("SSDL").unwrap().build(&[], &strings(&["x"])),
            Err(MutationError::InvalidRange { .. })
        ));
        assert!(matches!(
            lookup("VGSR").unwrap().build(&strings(&["int"]), &[]),
            Err(MutationError::InvalidDomain { .. })
        ));
        assert!(lookup("CRCR").unwrap().build(&[], &strings(&["-2", "0x10", "'a'"])).is_ok());
        assert!(lookup("CRCR").unwrap().build(&[], &strings(&["x"])).is_err());
    }

    #[test]
    fn test_normalize_constant() {
        assert_eq!(normalize_constant("'a'").as_deref(), Some("97"));
        assert_eq!(normalize_constant("-1.5").as_deref(), Some("-1.5"));
        assert_eq!(normalize_constant("1 + 2"), None);
        assert_eq!(normalize_constant("\"s\""), None);
    }
}
