//! Declaration parsing: specifiers, declarators, records, enums and functions

use super::{ParseError, Parser, Symbol};
use crate::frontend::ast::*;
use crate::frontend::eval::evaluate_int;
use crate::frontend::lexer::TokenKind;
use crate::frontend::source::{SourceLocation, SourceRange};
use crate::frontend::types::{CType, FloatKind, IntKind};

/// Declaration specifiers shared by every declarator of one declaration
pub(crate) struct DeclSpecs {
    pub base: CType,
    pub is_typedef: bool,
    pub is_const: bool,
    pub start: SourceLocation,
    /// Record and enum definitions written inside the specifiers
    pub definitions: Vec<Decl>,
}

/// One type derivation applied by a declarator
enum Derived {
    Pointer { is_const: bool },
    Array(Option<u64>),
    Function { params: Vec<CType>, variadic: bool },
}

pub(crate) struct Declarator {
    pub name: Option<String>,
    pub name_range: SourceRange,
    /// Derivations in the order they apply to the base type
    derived: Vec<Derived>,
    pub array_sizes: Vec<Expr>,
    pub params: Option<Vec<VarDecl>>,
}

impl Declarator {
    pub fn build_type(&self, base: CType) -> CType {
        self.derived.iter().fold(base, |ty, d| match d {
            Derived::Pointer { .. } => CType::pointer_to(ty),
            Derived::Array(len) => CType::Array(Box::new(ty), *len),
            Derived::Function { params, variadic } => CType::Function {
                ret: Box::new(ty),
                params: params.clone(),
                variadic: *variadic,
            },
        })
    }

    /// Whether the declared object itself (not what it points to) is const
    pub fn is_const(&self, specifiers_const: bool) -> bool {
        match self.derived.last() {
            Some(Derived::Pointer { is_const }) => *is_const,
            Some(Derived::Function { .. }) => false,
            _ => specifiers_const,
        }
    }
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_decl_specifiers(&mut self) -> Result<DeclSpecs, ParseError> {
        self.skip_gnu_noise()?;
        let start = self.current_start();
        let mut base: Option<CType> = None;
        let mut is_typedef = false;
        let mut is_const = false;
        let mut signedness: Option<bool> = None;
        let mut longs = 0;
        let mut short = false;
        let mut int_seen = false;
        let mut char_seen = false;
        let mut bool_seen = false;
        let mut float_kind: Option<FloatKind> = None;
        let mut definitions = Vec::new();
        let mut any = false;

        loop {
            self.skip_gnu_noise()?;
            let token = self.peek().clone();
            let type_seen = base.is_some()
                || signedness.is_some()
                || short
                || longs > 0
                || int_seen
                || char_seen
                || bool_seen
                || float_kind.is_some();

            match &token.kind {
                TokenKind::Keyword(k) => match *k {
                    "typedef" => is_typedef = true,
                    "extern" | "static" | "auto" | "register" | "inline" | "volatile"
                    | "restrict" => {}
                    "const" => is_const = true,
                    "signed" => signedness = Some(true),
                    "unsigned" => signedness = Some(false),
                    "short" => short = true,
                    "long" => longs += 1,
                    "int" => int_seen = true,
                    "char" => char_seen = true,
                    "_Bool" => bool_seen = true,
                    "void" => base = Some(CType::Void),
                    "float" => float_kind = Some(FloatKind::Float),
                    "double" => float_kind = Some(FloatKind::Double),
                    "struct" | "union" => {
                        self.advance();
                        let (ty, def) = self.parse_record_specifier(*k == "union", token.range.start)?;
                        base = Some(ty);
                        definitions.extend(def);
                        any = true;
                        continue;
                    }
                    "enum" => {
                        self.advance();
                        let (ty, def) = self.parse_enum_specifier(token.range.start)?;
                        base = Some(ty);
                        definitions.extend(def);
                        any = true;
                        continue;
                    }
                    _ => break,
                },
                TokenKind::Ident(name) if !type_seen => match self.lookup(name) {
                    Some(Symbol::Typedef(ty)) => base = Some(ty.clone()),
                    _ => break,
                },
                _ => break,
            }
            self.advance();
            any = true;
        }

        if !any {
            return Err(self.error(format!(
                "expected declaration specifiers, found {}",
                self.peek().describe()
            )));
        }

        let base = if let Some(ty) = base {
            ty
        } else if let Some(kind) = float_kind {
            if kind == FloatKind::Double && longs > 0 {
                CType::Float(FloatKind::LongDouble)
            } else {
                CType::Float(kind)
            }
        } else if bool_seen {
            CType::Int(IntKind::Bool)
        } else if char_seen {
            CType::Int(match signedness {
                None => IntKind::Char,
                Some(true) => IntKind::SChar,
                Some(false) => IntKind::UChar,
            })
        } else {
            let unsigned = signedness == Some(false);
            CType::Int(match (short, longs, unsigned) {
                (true, _, false) => IntKind::Short,
                (true, _, true) => IntKind::UShort,
                (false, 0, false) => IntKind::Int,
                (false, 0, true) => IntKind::UInt,
                (false, 1, false) => IntKind::Long,
                (false, 1, true) => IntKind::ULong,
                (false, _, false) => IntKind::LongLong,
                (false, _, true) => IntKind::ULongLong,
            })
        };

        Ok(DeclSpecs {
            base,
            is_typedef,
            is_const,
            start,
            definitions,
        })
    }

    fn parse_tag(&mut self, keyword: &str) -> Result<String, ParseError> {
        self.skip_gnu_noise()?;
        if let Some(name) = self.ident_text() {
            let name = name.to_string();
            self.advance();
            return Ok(name);
        }
        if !self.check_punct("{") {
            return Err(self.error(format!("expected tag or '{{' after '{}'", keyword)));
        }
        self.anonymous_count += 1;
        Ok(format!("<anonymous {}>", self.anonymous_count))
    }

    fn parse_record_specifier(
        &mut self,
        is_union: bool,
        start: SourceLocation,
    ) -> Result<(CType, Option<Decl>), ParseError> {
        let tag = self.parse_tag(if is_union { "union" } else { "struct" })?;
        let ty = CType::Record {
            tag: tag.clone(),
            is_union,
        };
        if !self.match_punct("{") {
            return Ok((ty, None));
        }

        let mut fields = Vec::new();
        let mut layout = Vec::new();
        while !self.check_punct("}") {
            if self.is_at_end() {
                return Err(self.error("unterminated record definition"));
            }
            let field_start = self.current_start();
            let specs = self.parse_decl_specifiers()?;

            if self.match_punct(";") {
                if specs.base.is_record() {
                    fields.push(FieldDecl {
                        name: None,
                        ty: specs.base.clone(),
                        range: self.range_from(field_start),
                        array_sizes: Vec::new(),
                    });
                    layout.push(RecordField {
                        name: None,
                        ty: specs.base,
                    });
                }
                continue;
            }

            loop {
                let declarator = self.parse_declarator()?;
                if self.match_punct(":") {
                    self.parse_conditional_expression()?;
                }
                self.skip_gnu_noise()?;
                let ty = declarator.build_type(specs.base.clone());
                fields.push(FieldDecl {
                    name: declarator.name.clone(),
                    ty: ty.clone(),
                    range: self.range_from(field_start),
                    array_sizes: declarator.array_sizes,
                });
                layout.push(RecordField {
                    name: declarator.name,
                    ty,
                });
                if !self.match_punct(",") {
                    break;
                }
            }
            self.expect_punct(";")?;
        }
        self.expect_punct("}")?;

        self.records.insert(
            tag.clone(),
            RecordDef {
                is_union,
                fields: layout,
            },
        );
        let decl = Decl {
            kind: DeclKind::Record {
                tag,
                is_union,
                fields,
            },
            range: self.range_from(start),
        };
        Ok((ty, Some(decl)))
    }

    fn parse_enum_specifier(
        &mut self,
        start: SourceLocation,
    ) -> Result<(CType, Option<Decl>), ParseError> {
        let tag = self.parse_tag("enum")?;
        let ty = CType::Enum(tag.clone());
        if !self.match_punct("{") {
            return Ok((ty, None));
        }

        let mut next_value = 0i64;
        let mut enumerators = Vec::new();
        while !self.check_punct("}") {
            let item_start = self.current_start();
            let (name, _) = self.expect_ident()?;
            let value = if self.match_punct("=") {
                Some(self.parse_conditional_expression()?)
            } else {
                None
            };
            if let Some(v) = value.as_ref().and_then(|e| evaluate_int(e, None)) {
                next_value = v;
            }
            self.declare(&name, Symbol::EnumConst(next_value));
            next_value = next_value.wrapping_add(1);
            enumerators.push(Enumerator {
                name,
                value,
                range: self.range_from(item_start),
            });
            if !self.match_punct(",") {
                break;
            }
        }
        self.expect_punct("}")?;

        let decl = Decl {
            kind: DeclKind::Enum { tag, enumerators },
            range: self.range_from(start),
        };
        Ok((ty, Some(decl)))
    }

    /// Parse a (possibly abstract) declarator
    pub(crate) fn parse_declarator(&mut self) -> Result<Declarator, ParseError> {
        self.skip_gnu_noise()?;
        let mut pointers = Vec::new();
        while self.match_punct("*") {
            let mut is_const = false;
            loop {
                self.skip_gnu_noise()?;
                if self.match_keyword("const") {
                    is_const = true;
                } else if !(self.match_keyword("volatile") || self.match_keyword("restrict")) {
                    break;
                }
            }
            pointers.push(Derived::Pointer { is_const });
        }

        let mut declarator = if self.check_punct("(") && self.peek_at(1).is_punct("*") {
            self.advance();
            let inner = self.parse_declarator()?;
            self.expect_punct(")")?;
            inner
        } else if let Some(name) = self.ident_text() {
            let name = name.to_string();
            let token = self.advance();
            Declarator {
                name: Some(name),
                name_range: token.range,
                derived: Vec::new(),
                array_sizes: Vec::new(),
                params: None,
            }
        } else {
            let here = self.current_start();
            Declarator {
                name: None,
                name_range: SourceRange::new(here, here),
                derived: Vec::new(),
                array_sizes: Vec::new(),
                params: None,
            }
        };

        let mut suffixes = Vec::new();
        loop {
            if self.match_punct("[") {
                while self.match_keyword("static")
                    || self.match_keyword("const")
                    || self.match_keyword("restrict")
                    || self.match_keyword("volatile")
                {}
                if self.match_punct("]") {
                    suffixes.push(Derived::Array(None));
                    continue;
                }
                let size = self.parse_assignment_expression()?;
                self.expect_punct("]")?;
                let len = evaluate_int(&size, None).and_then(|v| u64::try_from(v).ok());
                suffixes.push(Derived::Array(len));
                declarator.array_sizes.push(size);
            } else if self.match_punct("(") {
                let (params, variadic) = self.parse_parameter_list()?;
                suffixes.push(Derived::Function {
                    params: params.iter().map(|p| p.ty.clone()).collect(),
                    variadic,
                });
                if declarator.params.is_none() {
                    declarator.params = Some(params);
                }
            } else {
                break;
            }
        }
        self.skip_gnu_noise()?;

        let inner = std::mem::take(&mut declarator.derived);
        declarator.derived = pointers;
        declarator.derived.extend(suffixes.into_iter().rev());
        declarator.derived.extend(inner);
        Ok(declarator)
    }

    /// Parameters after the opening parenthesis, through the closing one
    fn parse_parameter_list(&mut self) -> Result<(Vec<VarDecl>, bool), ParseError> {
        let mut params = Vec::new();
        let mut variadic = false;
        if self.match_punct(")") {
            return Ok((params, false));
        }
        if self.check_keyword("void") && self.peek_at(1).is_punct(")") {
            self.advance();
            self.advance();
            return Ok((params, false));
        }

        loop {
            if self.match_punct("...") {
                variadic = true;
                break;
            }
            if !self.is_declaration_start() {
                return Err(self.error(format!(
                    "expected parameter declaration, found {}",
                    self.peek().describe()
                )));
            }
            let start = self.current_start();
            let specs = self.parse_decl_specifiers()?;
            let declarator = self.parse_declarator()?;
            let is_const = declarator.is_const(specs.is_const);
            let ty = match declarator.build_type(specs.base) {
                CType::Array(inner, _) => CType::Pointer(inner),
                f @ CType::Function { .. } => CType::pointer_to(f),
                ty => ty,
            };
            let id = self.fresh_id();
            params.push(VarDecl {
                id,
                name: declarator.name.unwrap_or_default(),
                ty,
                range: self.range_from(start),
                name_loc: declarator.name_range.start,
                init: None,
                array_sizes: declarator.array_sizes,
                is_global: false,
                is_const,
            });
            if !self.match_punct(",") {
                break;
            }
        }
        self.expect_punct(")")?;
        Ok((params, variadic))
    }

    /// Parse a type name as written in casts and `sizeof`
    pub(crate) fn parse_type_name(&mut self) -> Result<CType, ParseError> {
        let specs = self.parse_decl_specifiers()?;
        let declarator = self.parse_declarator()?;
        if declarator.name.is_some() {
            return Err(self.error("unexpected identifier in type name"));
        }
        Ok(declarator.build_type(specs.base))
    }

    pub(crate) fn parse_external_declaration(&mut self) -> Result<Vec<ExternalDecl>, ParseError> {
        let mut specs = self.parse_decl_specifiers()?;
        let mut out: Vec<ExternalDecl> = specs
            .definitions
            .drain(..)
            .map(ExternalDecl::Decl)
            .collect();
        if self.match_punct(";") {
            return Ok(out);
        }

        let first = self.parse_declarator()?;
        let ty = first.build_type(specs.base.clone());
        if ty.is_function() && !specs.is_typedef && self.check_punct("{") {
            let function = self.parse_function_definition(&specs, first, ty)?;
            out.push(ExternalDecl::Function(function));
            return Ok(out);
        }

        let decls = self.parse_init_declarators(&specs, first, true)?;
        out.extend(decls.into_iter().map(ExternalDecl::Decl));
        Ok(out)
    }

    /// Block-scope declaration, through the terminating `;`
    pub(crate) fn parse_local_declaration(&mut self) -> Result<Vec<Decl>, ParseError> {
        let mut specs = self.parse_decl_specifiers()?;
        let mut decls = std::mem::take(&mut specs.definitions);
        if self.match_punct(";") {
            return Ok(decls);
        }
        let first = self.parse_declarator()?;
        let is_global = self.at_file_scope();
        decls.extend(self.parse_init_declarators(&specs, first, is_global)?);
        Ok(decls)
    }

    fn parse_init_declarators(
        &mut self,
        specs: &DeclSpecs,
        first: Declarator,
        is_global: bool,
    ) -> Result<Vec<Decl>, ParseError> {
        let mut decls = Vec::new();
        let mut declarator = first;
        loop {
            decls.push(self.finish_declarator(specs, declarator, is_global)?);
            if !self.match_punct(",") {
                break;
            }
            declarator = self.parse_declarator()?;
        }
        self.expect_punct(";")?;
        Ok(decls)
    }

    fn finish_declarator(
        &mut self,
        specs: &DeclSpecs,
        declarator: Declarator,
        is_global: bool,
    ) -> Result<Decl, ParseError> {
        let ty = declarator.build_type(specs.base.clone());
        let is_const = declarator.is_const(specs.is_const);
        let Some(name) = declarator.name else {
            return Err(self.error("expected declarator name"));
        };

        if specs.is_typedef {
            self.declare(&name, Symbol::Typedef(ty.clone()));
            return Ok(Decl {
                kind: DeclKind::Typedef {
                    name,
                    ty,
                    array_sizes: declarator.array_sizes,
                },
                range: self.range_from(specs.start),
            });
        }

        if ty.is_function() {
            self.declare(&name, Symbol::Function(ty.clone()));
            return Ok(Decl {
                kind: DeclKind::Prototype {
                    name,
                    ty,
                    params: declarator.params.unwrap_or_default(),
                },
                range: self.range_from(specs.start),
            });
        }

        let name_loc = declarator.name_range.start;
        self.declare(
            &name,
            Symbol::Var {
                ty: ty.clone(),
                decl: name_loc,
            },
        );
        let init = if self.match_punct("=") {
            Some(self.parse_initializer()?)
        } else {
            None
        };

        // `int a[] = {1, 2}` and `char s[] = "ab"` complete the array type
        let ty = match (ty, &init) {
            (CType::Array(inner, None), Some(init)) => {
                let len = match &init.kind {
                    ExprKind::InitList(items) => Some(items.len() as u64),
                    ExprKind::StringLiteral { .. } => match &init.ty {
                        CType::Array(_, n) => *n,
                        _ => None,
                    },
                    _ => None,
                };
                CType::Array(inner, len)
            }
            (ty, _) => ty,
        };
        self.declare(
            &name,
            Symbol::Var {
                ty: ty.clone(),
                decl: name_loc,
            },
        );

        let id = self.fresh_id();
        let range = self.range_from(specs.start);
        Ok(Decl {
            kind: DeclKind::Var(VarDecl {
                id,
                name,
                ty,
                range,
                name_loc,
                init,
                array_sizes: declarator.array_sizes,
                is_global,
                is_const,
            }),
            range,
        })
    }

    fn parse_initializer(&mut self) -> Result<Expr, ParseError> {
        if !self.check_punct("{") {
            return self.parse_assignment_expression();
        }
        let start = self.current_start();
        self.advance();
        let mut items = Vec::new();
        while !self.check_punct("}") {
            // designators are accepted and dropped
            loop {
                if self.check_punct(".") && self.peek_at(2).is_punct("=") {
                    self.advance();
                    self.advance();
                    self.advance();
                } else if self.check_punct("[") {
                    self.advance();
                    self.parse_conditional_expression()?;
                    self.expect_punct("]")?;
                    self.expect_punct("=")?;
                } else {
                    break;
                }
            }
            items.push(self.parse_initializer()?);
            if !self.match_punct(",") {
                break;
            }
        }
        self.expect_punct("}")?;
        let id = self.fresh_id();
        Ok(Expr {
            id,
            kind: ExprKind::InitList(items),
            ty: CType::Void,
            range: self.range_from(start),
        })
    }

    pub(crate) fn parse_function_definition(
        &mut self,
        specs: &DeclSpecs,
        declarator: Declarator,
        ty: CType,
    ) -> Result<FunctionDef, ParseError> {
        let Some(name) = declarator.name else {
            return Err(self.error("function definition without a name"));
        };
        self.declare(&name, Symbol::Function(ty.clone()));
        let params = declarator.params.unwrap_or_default();

        self.push_scope();
        for param in params.iter().filter(|p| !p.name.is_empty()) {
            self.declare(
                &param.name,
                Symbol::Var {
                    ty: param.ty.clone(),
                    decl: param.name_loc,
                },
            );
        }
        let body = self.parse_compound_statement();
        self.pop_scope();
        let body = body?;

        Ok(FunctionDef {
            name,
            name_loc: declarator.name_range.start,
            ty,
            params,
            body,
            range: self.range_from(specs.start),
        })
    }
}
