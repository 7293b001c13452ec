//! Typed abstract syntax tree for the supported C subset
//!
//! Every expression and statement carries a [`NodeId`] unique within its
//! translation unit and a half-open [`SourceRange`]. Expressions also carry
//! their [`CType`] as computed by the parser.

use std::collections::HashMap;

use super::source::{SourceLocation, SourceRange};
use super::types::CType;

pub type NodeId = usize;

/// Binary operators, including assignments and the comma operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
    Assign,
    MulAssign,
    DivAssign,
    RemAssign,
    AddAssign,
    SubAssign,
    ShlAssign,
    ShrAssign,
    AndAssign,
    XorAssign,
    OrAssign,
    Comma,
}

/// Operator families as grouped by the substitution operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpFamily {
    Arithmetic,
    Bitwise,
    Logical,
    Relational,
    Shift,
    ArithmeticAssign,
    BitwiseAssign,
    ShiftAssign,
    PlainAssign,
    Comma,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 30] = [
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Rem,
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Shl,
        BinaryOp::Shr,
        BinaryOp::Lt,
        BinaryOp::Gt,
        BinaryOp::Le,
        BinaryOp::Ge,
        BinaryOp::Eq,
        BinaryOp::Ne,
        BinaryOp::BitAnd,
        BinaryOp::BitXor,
        BinaryOp::BitOr,
        BinaryOp::And,
        BinaryOp::Or,
        BinaryOp::Assign,
        BinaryOp::MulAssign,
        BinaryOp::DivAssign,
        BinaryOp::RemAssign,
        BinaryOp::AddAssign,
        BinaryOp::SubAssign,
        BinaryOp::ShlAssign,
        BinaryOp::ShrAssign,
        BinaryOp::AndAssign,
        BinaryOp::XorAssign,
        BinaryOp::OrAssign,
        BinaryOp::Comma,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Assign => "=",
            BinaryOp::MulAssign => "*=",
            BinaryOp::DivAssign => "/=",
            BinaryOp::RemAssign => "%=",
            BinaryOp::AddAssign => "+=",
            BinaryOp::SubAssign => "-=",
            BinaryOp::ShlAssign => "<<=",
            BinaryOp::ShrAssign => ">>=",
            BinaryOp::AndAssign => "&=",
            BinaryOp::XorAssign => "^=",
            BinaryOp::OrAssign => "|=",
            BinaryOp::Comma => ",",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.as_str() == token)
    }

    /// Binding strength; larger binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 13,
            BinaryOp::Add | BinaryOp::Sub => 12,
            BinaryOp::Shl | BinaryOp::Shr => 11,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => 10,
            BinaryOp::Eq | BinaryOp::Ne => 9,
            BinaryOp::BitAnd => 8,
            BinaryOp::BitXor => 7,
            BinaryOp::BitOr => 6,
            BinaryOp::And => 5,
            BinaryOp::Or => 4,
            BinaryOp::Comma => 1,
            _ => 2,
        }
    }

    pub fn family(self) -> OpFamily {
        match self {
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem | BinaryOp::Add | BinaryOp::Sub => {
                OpFamily::Arithmetic
            }
            BinaryOp::BitAnd | BinaryOp::BitXor | BinaryOp::BitOr => OpFamily::Bitwise,
            BinaryOp::And | BinaryOp::Or => OpFamily::Logical,
            BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::Le
            | BinaryOp::Ge
            | BinaryOp::Eq
            | BinaryOp::Ne => OpFamily::Relational,
            BinaryOp::Shl | BinaryOp::Shr => OpFamily::Shift,
            BinaryOp::MulAssign
            | BinaryOp::DivAssign
            | BinaryOp::RemAssign
            | BinaryOp::AddAssign
            | BinaryOp::SubAssign => OpFamily::ArithmeticAssign,
            BinaryOp::AndAssign | BinaryOp::XorAssign | BinaryOp::OrAssign => {
                OpFamily::BitwiseAssign
            }
            BinaryOp::ShlAssign | BinaryOp::ShrAssign => OpFamily::ShiftAssign,
            BinaryOp::Assign => OpFamily::PlainAssign,
            BinaryOp::Comma => OpFamily::Comma,
        }
    }

    pub fn is_assignment(self) -> bool {
        self.precedence() == 2
    }

    /// `/`, `%`, `/=`, `%=`: operators whose right operand must not be zero
    pub fn is_division(self) -> bool {
        matches!(
            self,
            BinaryOp::Div | BinaryOp::Rem | BinaryOp::DivAssign | BinaryOp::RemAssign
        )
    }

    /// `%`, bitwise and shift operators (and their assignment forms) only
    /// accept integral operands
    pub fn requires_integral(self) -> bool {
        matches!(
            self,
            BinaryOp::Rem | BinaryOp::RemAssign
        ) || matches!(
            self.family(),
            OpFamily::Bitwise | OpFamily::Shift | OpFamily::BitwiseAssign | OpFamily::ShiftAssign
        )
    }

    /// The plain operator a compound assignment applies
    pub fn underlying(self) -> Option<BinaryOp> {
        match self {
            BinaryOp::MulAssign => Some(BinaryOp::Mul),
            BinaryOp::DivAssign => Some(BinaryOp::Div),
            BinaryOp::RemAssign => Some(BinaryOp::Rem),
            BinaryOp::AddAssign => Some(BinaryOp::Add),
            BinaryOp::SubAssign => Some(BinaryOp::Sub),
            BinaryOp::ShlAssign => Some(BinaryOp::Shl),
            BinaryOp::ShrAssign => Some(BinaryOp::Shr),
            BinaryOp::AndAssign => Some(BinaryOp::BitAnd),
            BinaryOp::XorAssign => Some(BinaryOp::BitXor),
            BinaryOp::OrAssign => Some(BinaryOp::BitOr),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
    Deref,
    AddrOf,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Deref => "*",
            UnaryOp::AddrOf => "&",
            UnaryOp::PreInc | UnaryOp::PostInc => "++",
            UnaryOp::PreDec | UnaryOp::PostDec => "--",
        }
    }

    pub fn is_postfix(self) -> bool {
        matches!(self, UnaryOp::PostInc | UnaryOp::PostDec)
    }

    pub fn is_increment(self) -> bool {
        matches!(self, UnaryOp::PreInc | UnaryOp::PostInc)
    }

    pub fn is_decrement(self) -> bool {
        matches!(self, UnaryOp::PreDec | UnaryOp::PostDec)
    }
}

/// What an identifier expression refers to
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// A variable, identified by the location of its declarator name
    Variable { decl: SourceLocation },
    Function,
    EnumConstant(i64),
    Unresolved,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SizeofArg {
    Type(CType),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub ty: CType,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    IntLiteral {
        text: String,
        value: i64,
    },
    FloatLiteral {
        text: String,
        value: f64,
    },
    CharLiteral {
        text: String,
        value: i64,
    },
    /// One or more adjacent string literal tokens
    StringLiteral {
        text: String,
    },
    Ident {
        name: String,
        binding: Binding,
    },
    Binary {
        op: BinaryOp,
        op_range: SourceRange,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        op_range: SourceRange,
        operand: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Member {
        base: Box<Expr>,
        member: String,
        member_range: SourceRange,
        arrow: bool,
    },
    Cast {
        target: CType,
        /// Span of the parenthesised type, `(` through `)`
        type_range: SourceRange,
        operand: Box<Expr>,
    },
    Sizeof(SizeofArg),
    Paren(Box<Expr>),
    InitList(Vec<Expr>),
}

impl Expr {
    /// Innermost expression beneath any parentheses
    pub fn strip_parens(&self) -> &Expr {
        match &self.kind {
            ExprKind::Paren(inner) => inner.strip_parens(),
            _ => self,
        }
    }

    pub fn is_paren(&self) -> bool {
        matches!(self.kind, ExprKind::Paren(_))
    }

    /// Name of the called function for direct calls
    pub fn callee_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Call { callee, .. } => match &callee.strip_parens().kind {
                ExprKind::Ident { name, .. } => Some(name),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub id: NodeId,
    pub name: String,
    pub ty: CType,
    /// Whole declarator including initializer
    pub range: SourceRange,
    pub name_loc: SourceLocation,
    pub init: Option<Expr>,
    /// Size expressions of array declarators, outermost first
    pub array_sizes: Vec<Expr>,
    pub is_global: bool,
    pub is_const: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: Option<String>,
    pub ty: CType,
    pub range: SourceRange,
    pub array_sizes: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enumerator {
    pub name: String,
    pub value: Option<Expr>,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub kind: DeclKind,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Var(VarDecl),
    Typedef {
        name: String,
        ty: CType,
        array_sizes: Vec<Expr>,
    },
    Record {
        tag: String,
        is_union: bool,
        fields: Vec<FieldDecl>,
    },
    Enum {
        tag: String,
        enumerators: Vec<Enumerator>,
    },
    Prototype {
        name: String,
        ty: CType,
        params: Vec<VarDecl>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Compound(Vec<Stmt>),
    Decl(Vec<Decl>),
    Expr(Expr),
    Null,
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    Switch {
        cond: Expr,
        body: Box<Stmt>,
    },
    Case {
        value: Expr,
        body: Box<Stmt>,
    },
    Default(Box<Stmt>),
    Break,
    Continue,
    Return(Option<Expr>),
    Goto {
        label: String,
    },
    Label {
        name: String,
        body: Box<Stmt>,
    },
}

impl Stmt {
    pub fn is_compound(&self) -> bool {
        matches!(self.kind, StmtKind::Compound(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub name_loc: SourceLocation,
    pub ty: CType,
    pub params: Vec<VarDecl>,
    pub body: Stmt,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExternalDecl {
    Function(FunctionDef),
    Decl(Decl),
}

/// Field layout of a struct or union definition
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDef {
    pub is_union: bool,
    pub fields: Vec<RecordField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    /// `None` for anonymous nested records and unnamed bit-fields
    pub name: Option<String>,
    pub ty: CType,
}

/// Record definitions keyed by tag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    records: HashMap<String, RecordDef>,
}

impl RecordTable {
    pub fn insert(&mut self, tag: String, def: RecordDef) {
        self.records.insert(tag, def);
    }

    pub fn get(&self, tag: &str) -> Option<&RecordDef> {
        self.records.get(tag)
    }

    /// Type of `member` in record `tag`, searching anonymous members too
    pub fn field_type(&self, tag: &str, member: &str) -> Option<CType> {
        let def = self.records.get(tag)?;
        for field in &def.fields {
            match &field.name {
                Some(name) if name == member => return Some(field.ty.clone()),
                None => {
                    if let CType::Record { tag: inner, .. } = &field.ty {
                        if let Some(ty) = self.field_type(inner, member) {
                            return Some(ty);
                        }
                    }
                }
                _ => {}
            }
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranslationUnit {
    pub items: Vec<ExternalDecl>,
    pub records: RecordTable,
}

impl TranslationUnit {
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.items.iter().filter_map(|item| match item {
            ExternalDecl::Function(f) => Some(f),
            ExternalDecl::Decl(_) => None,
        })
    }
}
