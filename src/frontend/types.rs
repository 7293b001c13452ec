//! C type model used to annotate the AST

use std::fmt;

/// Integer type kinds, ordered by conversion rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntKind {
    Bool,
    Char,
    SChar,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
}

impl IntKind {
    fn rank(self) -> u8 {
        match self {
            IntKind::Bool => 0,
            IntKind::Char | IntKind::SChar | IntKind::UChar => 1,
            IntKind::Short | IntKind::UShort => 2,
            IntKind::Int | IntKind::UInt => 3,
            IntKind::Long | IntKind::ULong => 4,
            IntKind::LongLong | IntKind::ULongLong => 5,
        }
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            IntKind::Bool
                | IntKind::UChar
                | IntKind::UShort
                | IntKind::UInt
                | IntKind::ULong
                | IntKind::ULongLong
        )
    }

    fn to_unsigned(self) -> Self {
        match self {
            IntKind::Int => IntKind::UInt,
            IntKind::Long => IntKind::ULong,
            IntKind::LongLong => IntKind::ULongLong,
            other => other,
        }
    }

    pub fn spelling(self) -> &'static str {
        match self {
            IntKind::Bool => "_Bool",
            IntKind::Char => "char",
            IntKind::SChar => "signed char",
            IntKind::UChar => "unsigned char",
            IntKind::Short => "short",
            IntKind::UShort => "unsigned short",
            IntKind::Int => "int",
            IntKind::UInt => "unsigned int",
            IntKind::Long => "long",
            IntKind::ULong => "unsigned long",
            IntKind::LongLong => "long long",
            IntKind::ULongLong => "unsigned long long",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FloatKind {
    Float,
    Double,
    LongDouble,
}

impl FloatKind {
    pub fn spelling(self) -> &'static str {
        match self {
            FloatKind::Float => "float",
            FloatKind::Double => "double",
            FloatKind::LongDouble => "long double",
        }
    }
}

/// A C type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CType {
    Void,
    Int(IntKind),
    Float(FloatKind),
    Pointer(Box<CType>),
    Array(Box<CType>, Option<u64>),
    Record { tag: String, is_union: bool },
    Enum(String),
    Function {
        ret: Box<CType>,
        params: Vec<CType>,
        variadic: bool,
    },
}

/// The four categories variables are partitioned into for replacement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarCategory {
    Scalar,
    Array,
    Struct,
    Pointer,
}

impl VarCategory {
    pub const ALL: [VarCategory; 4] = [
        VarCategory::Scalar,
        VarCategory::Array,
        VarCategory::Struct,
        VarCategory::Pointer,
    ];

    pub fn index(self) -> usize {
        match self {
            VarCategory::Scalar => 0,
            VarCategory::Array => 1,
            VarCategory::Struct => 2,
            VarCategory::Pointer => 3,
        }
    }
}

impl CType {
    pub const INT: CType = CType::Int(IntKind::Int);
    pub const DOUBLE: CType = CType::Float(FloatKind::Double);

    pub fn pointer_to(ty: CType) -> Self {
        CType::Pointer(Box::new(ty))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, CType::Void)
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, CType::Int(_) | CType::Enum(_))
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, CType::Float(_))
    }

    /// Integral or floating
    pub fn is_arithmetic(&self) -> bool {
        self.is_integral() || self.is_floating()
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, CType::Pointer(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, CType::Array(..))
    }

    pub fn is_record(&self) -> bool {
        matches!(self, CType::Record { .. })
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, CType::Record { is_union: false, .. })
    }

    pub fn is_function(&self) -> bool {
        matches!(self, CType::Function { .. })
    }

    /// Pointer or array: something that can be dereferenced
    pub fn is_pointer_like(&self) -> bool {
        self.is_pointer() || self.is_array()
    }

    pub fn pointee(&self) -> Option<&CType> {
        match self {
            CType::Pointer(inner) | CType::Array(inner, _) => Some(inner),
            _ => None,
        }
    }

    /// Arrays and functions decay to pointers when used as values
    pub fn decay(&self) -> CType {
        match self {
            CType::Array(inner, _) => CType::Pointer(inner.clone()),
            CType::Function { .. } => CType::pointer_to(self.clone()),
            other => other.clone(),
        }
    }

    pub fn return_type(&self) -> Option<&CType> {
        match self {
            CType::Function { ret, .. } => Some(ret),
            CType::Pointer(inner) => inner.return_type(),
            _ => None,
        }
    }

    pub fn category(&self) -> Option<VarCategory> {
        match self {
            t if t.is_arithmetic() => Some(VarCategory::Scalar),
            CType::Array(..) => Some(VarCategory::Array),
            CType::Record { .. } => Some(VarCategory::Struct),
            CType::Pointer(_) => Some(VarCategory::Pointer),
            _ => None,
        }
    }

    /// Result of integer promotion
    pub fn promoted(&self) -> CType {
        match self {
            CType::Int(k) if k.rank() < IntKind::Int.rank() => CType::INT,
            CType::Enum(_) => CType::INT,
            other => other.clone(),
        }
    }

    /// Common type under the usual arithmetic conversions
    pub fn usual_arithmetic(lhs: &CType, rhs: &CType) -> CType {
        match (lhs, rhs) {
            (CType::Float(a), CType::Float(b)) => CType::Float((*a).max(*b)),
            (CType::Float(a), _) | (_, CType::Float(a)) => CType::Float(*a),
            _ => match (lhs.promoted(), rhs.promoted()) {
                (CType::Int(a), CType::Int(b)) => {
                    if a == b {
                        CType::Int(a)
                    } else if a.rank() == b.rank() {
                        CType::Int(a.to_unsigned())
                    } else if a.rank() > b.rank() {
                        CType::Int(a)
                    } else {
                        CType::Int(b)
                    }
                }
                _ => CType::INT,
            },
        }
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CType::Void => write!(f, "void"),
            CType::Int(k) => write!(f, "{}", k.spelling()),
            CType::Float(k) => write!(f, "{}", k.spelling()),
            CType::Pointer(inner) => write!(f, "{} *", inner),
            CType::Array(inner, Some(n)) => write!(f, "{} [{}]", inner, n),
            CType::Array(inner, None) => write!(f, "{} []", inner),
            CType::Record { tag, is_union } => {
                write!(f, "{} {}", if *is_union { "union" } else { "struct" }, tag)
            }
            CType::Enum(tag) => write!(f, "enum {}", tag),
            CType::Function { ret, params, variadic } => {
                let mut parts: Vec<String> = params.iter().map(|p| p.to_string()).collect();
                if *variadic {
                    parts.push("...".to_string());
                }
                write!(f, "{} ({})", ret, parts.join(", "))
            }
        }
    }
}
