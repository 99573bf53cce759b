//! Reader for the compact signature notation of the builtin table.
//!
//! ```text
//! signature := ti ":" name [ "(" ti { "," ti } ")" ]
//! ti        := [ "array" "[" index { "," index } "]" "of" ]
//!              [ "any" ] [ "var" | "par" ] [ "opt" ] [ "set" "of" ] base
//! index     := "int" | "$X" | "$$E"
//! base      := "int" | "bool" | "float" | "string" | "ann" | "$T" | "$$E"
//! ```
//!
//! Type-insts are built with the types the type-inst rule would compute,
//! so builtin overloads can be registered before the first typing pass.

use mzn_ir::{BaseType, ExprId, Inst, Model, Name, Span, Type};

use crate::TypeCheckError;

/// One parsed signature line.
pub(super) struct ParsedSig {
    pub name: Name,
    pub ti: ExprId,
    /// `None` for an annotation atom (no parameter list).
    pub params: Option<Vec<ExprId>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Tok<'s> {
    Word(&'s str),
    TiVar { name: &'s str, is_enum: bool },
    Punct(char),
}

fn tokenize(line: &str) -> Option<Vec<Tok<'_>>> {
    let mut toks = Vec::new();
    let mut rest = line.trim_start();
    while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            rest = rest.trim_start();
            continue;
        }
        if c == '\'' {
            let end = rest[1..].find('\'')? + 2;
            toks.push(Tok::Word(&rest[..end]));
            rest = &rest[end..];
        } else if c == '$' {
            let is_enum = rest.starts_with("$$");
            let start = if is_enum { 2 } else { 1 };
            let len = rest[start..]
                .find(|ch: char| !(ch.is_alphanumeric() || ch == '_'))
                .unwrap_or(rest.len() - start);
            toks.push(Tok::TiVar {
                name: &rest[start..start + len],
                is_enum,
            });
            rest = &rest[start + len..];
        } else if "[](),:".contains(c) {
            toks.push(Tok::Punct(c));
            rest = &rest[1..];
        } else {
            let len = rest
                .find(|ch: char| ch.is_whitespace() || "[](),:".contains(ch))
                .unwrap_or(rest.len());
            toks.push(Tok::Word(&rest[..len]));
            rest = &rest[len..];
        }
    }
    Some(toks)
}

pub(super) struct SigParser<'m, 's> {
    model: &'m mut Model,
    line: &'s str,
    toks: Vec<Tok<'s>>,
    pos: usize,
}

impl<'m, 's> SigParser<'m, 's> {
    pub fn new(model: &'m mut Model, line: &'s str) -> Result<Self, TypeCheckError> {
        let toks = tokenize(line).ok_or_else(|| malformed(line))?;
        Ok(SigParser {
            model,
            line,
            toks,
            pos: 0,
        })
    }

    fn err(&self) -> TypeCheckError {
        malformed(self.line)
    }

    fn peek(&self) -> Option<Tok<'s>> {
        self.toks.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Tok<'s>> {
        let t = self.peek();
        self.pos += 1;
        t
    }

    fn eat_word(&mut self, w: &str) -> bool {
        if self.peek() == Some(Tok::Word(w)) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.peek() == Some(Tok::Punct(c)) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn expect_punct(&mut self, c: char) -> Result<(), TypeCheckError> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(self.err())
        }
    }

    fn expect_word(&mut self, w: &str) -> Result<(), TypeCheckError> {
        if self.eat_word(w) {
            Ok(())
        } else {
            Err(self.err())
        }
    }

    pub fn signature(mut self) -> Result<ParsedSig, TypeCheckError> {
        let ti = self.ti()?;
        self.expect_punct(':')?;
        let Some(Tok::Word(name)) = self.bump() else {
            return Err(self.err());
        };
        let name = self.model.intern(name);
        let params = if self.eat_punct('(') {
            let mut params = Vec::new();
            if !self.eat_punct(')') {
                loop {
                    params.push(self.ti()?);
                    if self.eat_punct(')') {
                        break;
                    }
                    self.expect_punct(',')?;
                }
            }
            Some(params)
        } else {
            None
        };
        if self.pos != self.toks.len() {
            return Err(self.err());
        }
        Ok(ParsedSig { name, ti, params })
    }

    fn index(&mut self) -> Result<ExprId, TypeCheckError> {
        match self.bump() {
            Some(Tok::Word("int")) => Ok(self.model.ti_index_int()),
            Some(Tok::TiVar {
                name,
                is_enum: false,
            }) => Ok(self.model.ti_index_var(name)),
            Some(Tok::TiVar {
                name,
                is_enum: true,
            }) => {
                let tiid = self.model.ti_id(name, true);
                Ok(self
                    .model
                    .type_inst_node(Vec::new(), Type::par_int(), Some(tiid), false))
            }
            _ => Err(self.err()),
        }
    }

    fn ti(&mut self) -> Result<ExprId, TypeCheckError> {
        let mut ranges = Vec::new();
        let mut generic_index = false;
        if self.eat_word("array") {
            self.expect_punct('[')?;
            loop {
                if matches!(self.peek(), Some(Tok::TiVar { is_enum: false, .. })) {
                    generic_index = true;
                }
                ranges.push(self.index()?);
                if self.eat_punct(']') {
                    break;
                }
                self.expect_punct(',')?;
            }
            self.expect_word("of")?;
        }

        let mut ty = Type::unknown();
        if self.eat_word("any") {
            ty = ty.to_var().with_opt(true).with_any(true);
        }
        if self.eat_word("var") {
            ty.inst = Inst::Var;
        } else {
            self.eat_word("par");
        }
        if self.eat_word("opt") {
            ty.opt = true;
        }
        if self.eat_word("set") {
            self.expect_word("of")?;
            ty.set = true;
        }
        let mut domain = None;
        ty.base = match self.bump() {
            Some(Tok::Word("int")) => BaseType::Int,
            Some(Tok::Word("bool")) => BaseType::Bool,
            Some(Tok::Word("float")) => BaseType::Float,
            Some(Tok::Word("string")) => BaseType::String,
            Some(Tok::Word("ann")) => BaseType::Ann,
            Some(Tok::TiVar { name, is_enum }) => {
                domain = Some(self.model.ti_id(name, is_enum));
                if is_enum {
                    BaseType::Int
                } else {
                    BaseType::Top
                }
            }
            _ => return Err(self.err()),
        };
        if !ranges.is_empty() {
            ty.dim = if generic_index {
                -1
            } else {
                i8::try_from(ranges.len()).map_err(|_| self.err())?
            };
        }
        Ok(self.model.type_inst_node(ranges, ty, domain, false))
    }
}

fn malformed(line: &str) -> TypeCheckError {
    TypeCheckError::internal(Span::DUMMY, format!("malformed builtin signature `{line}'"))
}
