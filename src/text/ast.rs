//! Parsed form of a text specification
//!
//! The builder and the matcher interpret the same AST; parsing the token
//! stream happens exactly once, and every grammar-level diagnostic (unknown
//! keyword, malformed literal, bad tag spec) is raised here as a
//! [`FormatError`] with the byte offset of the offending token.

use crate::ber::{Class, Tag, MAX_DEPTH};
use crate::codec::{self, Charset, TimeKind};
use crate::error::{FormatError, FormatErrorKind};
use crate::oid::Oid;
use crate::registry;
use crate::text::lexer::{Lexer, Token};
use num_bigint::BigInt;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub(crate) struct Spec {
    pub(crate) root: Item,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Repeat {
    One,
    Optional,
    Star,
    Plus,
}

#[derive(Debug, Clone)]
pub(crate) struct Item {
    pub(crate) offset: usize,
    pub(crate) repeat: Repeat,
    pub(crate) node: ItemNode,
    pub(crate) replacement: Option<Vec<Replacement>>,
}

#[derive(Debug, Clone)]
pub(crate) enum ItemNode {
    Object(Object),
    Param(usize),
    Ignore,
}

#[derive(Debug, Clone)]
pub(crate) struct Object {
    pub(crate) offset: usize,
    pub(crate) tag: Option<TagSpec>,
    pub(crate) kind: ObjectKind,
}

#[derive(Debug, Clone)]
pub(crate) struct TagSpec {
    pub(crate) offset: usize,
    pub(crate) class: Option<ClassSpec>,
    pub(crate) value: TagValueSpec,
}

#[derive(Debug, Clone)]
pub(crate) enum ClassSpec {
    Lit(Class),
    Param(usize),
}

#[derive(Debug, Clone)]
pub(crate) enum TagValueSpec {
    /// Bare integer; without a class keyword it implies CONTEXT
    Number(u32),
    /// Universal type keyword; without a class keyword it implies UNIVERSAL
    Keyword(Tag),
    Param(usize),
}

/// A literal of type `T` or a parameter slot
#[derive(Debug, Clone)]
pub(crate) enum Scalar<T> {
    Lit(T),
    Param(usize),
}

/// Payload position of `blob` and `bits`
#[derive(Debug, Clone)]
pub(crate) enum Payload {
    Hex(Vec<u8>),
    Object(Box<Object>),
    Param(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ConsKind {
    Sequence,
    Set,
    SetDer,
    SetOf,
}

#[derive(Debug, Clone)]
pub(crate) enum ObjectKind {
    Bool(Scalar<bool>),
    Int(Scalar<BigInt>),
    Enum(Scalar<BigInt>),
    Bits {
        ignored: Scalar<u8>,
        payload: Payload,
    },
    Blob(Payload),
    Null,
    Oid(Scalar<Oid>),
    Str(Charset, Scalar<String>),
    Time(TimeKind, Scalar<String>),
    /// Explicit-tag wrapper around exactly one sub-object
    ExplicitTag(Box<Item>),
    Constructed {
        kind: ConsKind,
        nz: bool,
        children: Vec<Item>,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct Replacement {
    pub(crate) offset: usize,
    pub(crate) param: usize,
    pub(crate) value: ReplValue,
}

#[derive(Debug, Clone)]
pub(crate) enum ReplValue {
    Bool(bool),
    Int(BigInt),
    Blob(Vec<u8>),
    OidVal(Oid),
    Str(Charset, String),
    Time(TimeKind, String),
    Asn(Object),
}

/// Keyword classification shared by object heads, tag values and
/// replacement types
#[derive(Debug, Clone, Copy, PartialEq)]
enum Keyword {
    Bool,
    Int,
    Enum,
    Bits,
    Blob,
    Null,
    Oid,
    Str(Charset),
    Time(TimeKind),
    Tag,
    Cons(ConsKind, bool),
}

fn keyword(word: &str) -> Option<Keyword> {
    let lower = word.to_ascii_lowercase();
    let (base, nz) = match lower.strip_suffix("-nz") {
        Some(base) => (base, true),
        None => (lower.as_str(), false),
    };
    let kw = match base {
        "bool" | "boolean" => Keyword::Bool,
        "int" | "integer" => Keyword::Int,
        "enum" | "enumerated" => Keyword::Enum,
        "bits" | "bitstring" => Keyword::Bits,
        "blob" | "bytes" | "octetstring" => Keyword::Blob,
        "null" => Keyword::Null,
        "oid" => Keyword::Oid,
        "numeric" | "numericstring" => Keyword::Str(Charset::Numeric),
        "printable" | "printablestring" => Keyword::Str(Charset::Printable),
        "ia5" | "ia5string" => Keyword::Str(Charset::Ia5),
        "teletex" | "teletexstring" | "t61" | "t61string" => Keyword::Str(Charset::Teletex),
        "general" | "generalstring" => Keyword::Str(Charset::General),
        "utf8" | "utf-8" | "utf8string" => Keyword::Str(Charset::Utf8),
        "utf16" | "utf-16" | "bmp" | "bmpstring" => Keyword::Str(Charset::Bmp),
        "utf32" | "utf-32" | "universal" | "universalstring" => Keyword::Str(Charset::Universal),
        "utc" | "utctime" => Keyword::Time(TimeKind::Utc),
        "gentime" | "generalizedtime" | "generalized-time" => Keyword::Time(TimeKind::Generalized),
        "tag" => Keyword::Tag,
        "sequence" | "seq" => Keyword::Cons(ConsKind::Sequence, nz),
        "set" => Keyword::Cons(ConsKind::Set, nz),
        "setder" => Keyword::Cons(ConsKind::SetDer, nz),
        "setof" => Keyword::Cons(ConsKind::SetOf, nz),
        _ => return None,
    };
    if nz && !matches!(kw, Keyword::Cons(..)) {
        return None;
    }
    Some(kw)
}

/// Universal tag implied by a tag-value keyword.
fn keyword_tag(kw: Keyword) -> Option<Tag> {
    match kw {
        Keyword::Bool => Some(Tag::Boolean),
        Keyword::Int => Some(Tag::Integer),
        Keyword::Enum => Some(Tag::Enumerated),
        Keyword::Bits => Some(Tag::BitString),
        Keyword::Blob => Some(Tag::OctetString),
        Keyword::Null => Some(Tag::Null),
        Keyword::Oid => Some(Tag::Oid),
        Keyword::Str(cs) => Some(cs.tag()),
        Keyword::Time(TimeKind::Utc) => Some(Tag::UtcTime),
        Keyword::Time(TimeKind::Generalized) => Some(Tag::GeneralizedTime),
        Keyword::Cons(ConsKind::Sequence, false) => Some(Tag::Sequence),
        Keyword::Cons(ConsKind::Set, false) => Some(Tag::Set),
        _ => None,
    }
}

pub(crate) fn parse(text: &str) -> Result<Spec, FormatError> {
    let mut parser = Parser::new(text);
    let root = parser.item(0)?;
    if let Some((off, token)) = parser.next()? {
        return Err(FormatError::new(
            off,
            FormatErrorKind::UnexpectedToken(token_name(&token)),
        ));
    }
    Ok(Spec { root })
}

fn token_name(token: &Token) -> String {
    match token {
        Token::LParen => "(".into(),
        Token::RParen => ")".into(),
        Token::LBracket => "[".into(),
        Token::RBracket => "]".into(),
        Token::Star => "*".into(),
        Token::Question => "?".into(),
        Token::Colon => ":".into(),
        Token::Word(w) => w.clone(),
        Token::Str(_) => "string literal".into(),
        Token::Param(n) => format!("%{}", n),
    }
}

struct Parser<'a> {
    lex: Lexer<'a>,
    peeked: Option<Option<(usize, Token)>>,
    end: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Parser<'a> {
        Parser {
            lex: Lexer::new(text),
            peeked: None,
            end: text.len(),
        }
    }

    fn next(&mut self) -> Result<Option<(usize, Token)>, FormatError> {
        match self.peeked.take() {
            Some(t) => Ok(t),
            None => self.lex.next_token(),
        }
    }

    fn peek(&mut self) -> Result<Option<&(usize, Token)>, FormatError> {
        if self.peeked.is_none() {
            self.peeked = Some(self.lex.next_token()?);
        }
        match &self.peeked {
            Some(t) => Ok(t.as_ref()),
            None => Ok(None),
        }
    }

    fn require(&mut self) -> Result<(usize, Token), FormatError> {
        self.next()?
            .ok_or_else(|| FormatError::new(self.end, FormatErrorKind::UnexpectedEof))
    }

    fn expect(&mut self, want: Token) -> Result<usize, FormatError> {
        let (off, token) = self.require()?;
        if token == want {
            Ok(off)
        } else {
            Err(FormatError::new(
                off,
                FormatErrorKind::UnexpectedToken(token_name(&token)),
            ))
        }
    }

    fn at_rparen(&mut self) -> Result<bool, FormatError> {
        Ok(matches!(self.peek()?, Some((_, Token::RParen))))
    }

    /// One item: repetition marker, node, optional replacement action.
    fn item(&mut self, depth: usize) -> Result<Item, FormatError> {
        if depth > MAX_DEPTH {
            return Err(FormatError::new(self.end, FormatErrorKind::TooDeep));
        }
        let repeat = match self.peek()? {
            Some((_, Token::Star)) => {
                self.next()?;
                Repeat::Star
            }
            Some((_, Token::Word(w))) if w == "+" => {
                self.next()?;
                Repeat::Plus
            }
            Some((_, Token::Question)) => {
                self.next()?;
                Repeat::Optional
            }
            _ => Repeat::One,
        };
        let (offset, token) = self.require()?;
        let node = match token {
            Token::LParen => ItemNode::Object(self.object(offset, depth + 1)?),
            Token::Param(n) => ItemNode::Param(n),
            Token::Word(w) if w == "." => ItemNode::Ignore,
            other => {
                return Err(FormatError::new(
                    offset,
                    FormatErrorKind::UnexpectedToken(token_name(&other)),
                ))
            }
        };
        let replacement = match self.peek()? {
            Some((_, Token::Colon)) => {
                self.next()?;
                Some(self.replacement(depth + 1)?)
            }
            _ => None,
        };
        Ok(Item {
            offset,
            repeat,
            node,
            replacement,
        })
    }

    /// One object, the opening parenthesis already consumed.
    fn object(&mut self, offset: usize, depth: usize) -> Result<Object, FormatError> {
        if depth > MAX_DEPTH {
            return Err(FormatError::new(offset, FormatErrorKind::TooDeep));
        }
        let tag = match self.peek()? {
            Some((_, Token::LBracket)) => Some(self.tag_spec()?),
            _ => None,
        };
        let (kw_off, token) = self.require()?;
        let word = match token {
            Token::Word(w) => w,
            other => {
                return Err(FormatError::new(
                    kw_off,
                    FormatErrorKind::UnexpectedToken(token_name(&other)),
                ))
            }
        };
        let kw = keyword(&word)
            .ok_or_else(|| FormatError::new(kw_off, FormatErrorKind::UnknownKeyword(word)))?;
        let kind = match kw {
            Keyword::Bool => ObjectKind::Bool(self.bool_scalar()?),
            Keyword::Int => ObjectKind::Int(self.int_scalar()?),
            Keyword::Enum => ObjectKind::Enum(self.int_scalar()?),
            Keyword::Bits => {
                let ignored = self.ignored_scalar()?;
                let payload = self.payload(depth)?;
                ObjectKind::Bits { ignored, payload }
            }
            Keyword::Blob => ObjectKind::Blob(self.payload(depth)?),
            Keyword::Null => ObjectKind::Null,
            Keyword::Oid => ObjectKind::Oid(self.oid_scalar()?),
            Keyword::Str(cs) => ObjectKind::Str(cs, self.string_scalar()?),
            Keyword::Time(kind) => ObjectKind::Time(kind, self.time_scalar(kind)?),
            Keyword::Tag => {
                if tag.is_none() {
                    return Err(FormatError::new(
                        kw_off,
                        FormatErrorKind::TagWrapperWithoutTag,
                    ));
                }
                ObjectKind::ExplicitTag(Box::new(self.item(depth + 1)?))
            }
            Keyword::Cons(kind, nz) => {
                let mut children = Vec::new();
                while !self.at_rparen()? {
                    children.push(self.item(depth + 1)?);
                }
                ObjectKind::Constructed { kind, nz, children }
            }
        };
        self.expect(Token::RParen)?;
        Ok(Object { offset, tag, kind })
    }

    /// `[ class? value ]`, the opening bracket not yet consumed.
    fn tag_spec(&mut self) -> Result<TagSpec, FormatError> {
        let offset = self.expect(Token::LBracket)?;
        let mut fields = Vec::new();
        loop {
            let (off, token) = self.require()?;
            match token {
                Token::RBracket => break,
                Token::Word(_) | Token::Param(_) => fields.push((off, token)),
                other => {
                    return Err(FormatError::new(
                        off,
                        FormatErrorKind::UnexpectedToken(token_name(&other)),
                    ))
                }
            }
            if fields.len() > 2 {
                return Err(FormatError::new(
                    fields[2].0,
                    FormatErrorKind::UnexpectedToken(token_name(&fields[2].1)),
                ));
            }
        }
        let mut fields = fields.into_iter();
        let (class, value_field) = match (fields.next(), fields.next()) {
            (Some(value), None) => (None, value),
            (Some((class_off, class_token)), Some(value)) => {
                let class = match class_token {
                    Token::Param(n) => ClassSpec::Param(n),
                    Token::Word(w) => ClassSpec::Lit(Class::from_keyword(&w).ok_or_else(
                        || FormatError::new(class_off, FormatErrorKind::UnknownKeyword(w)),
                    )?),
                    _ => unreachable!("filtered above"),
                };
                (Some(class), value)
            }
            _ => return Err(FormatError::new(offset, FormatErrorKind::UnexpectedEof)),
        };
        let (value_off, value_token) = value_field;
        let value = match value_token {
            Token::Param(n) => TagValueSpec::Param(n),
            Token::Word(w) => {
                if w.bytes().all(|b| b.is_ascii_digit()) {
                    let n: u32 = w.parse().map_err(|_| {
                        FormatError::new(value_off, FormatErrorKind::InvalidNumber(w.clone()))
                    })?;
                    if n > Tag::MAX {
                        return Err(FormatError::new(value_off, FormatErrorKind::TagOutOfRange));
                    }
                    TagValueSpec::Number(n)
                } else {
                    let kw = keyword(&w).and_then(keyword_tag).ok_or_else(|| {
                        FormatError::new(value_off, FormatErrorKind::UnknownKeyword(w.clone()))
                    })?;
                    TagValueSpec::Keyword(kw)
                }
            }
            _ => unreachable!("filtered above"),
        };
        Ok(TagSpec {
            offset,
            class,
            value,
        })
    }

    fn bool_scalar(&mut self) -> Result<Scalar<bool>, FormatError> {
        let (off, token) = self.require()?;
        match token {
            Token::Param(n) => Ok(Scalar::Param(n)),
            Token::Word(w) => bool_from_word(&w)
                .map(Scalar::Lit)
                .ok_or_else(|| FormatError::new(off, FormatErrorKind::InvalidNumber(w))),
            other => Err(FormatError::new(
                off,
                FormatErrorKind::UnexpectedToken(token_name(&other)),
            )),
        }
    }

    fn int_scalar(&mut self) -> Result<Scalar<BigInt>, FormatError> {
        let (off, token) = self.require()?;
        match token {
            Token::Param(n) => Ok(Scalar::Param(n)),
            Token::Word(w) => w
                .parse::<BigInt>()
                .map(Scalar::Lit)
                .map_err(|_| FormatError::new(off, FormatErrorKind::InvalidNumber(w))),
            other => Err(FormatError::new(
                off,
                FormatErrorKind::UnexpectedToken(token_name(&other)),
            )),
        }
    }

    fn ignored_scalar(&mut self) -> Result<Scalar<u8>, FormatError> {
        let (off, token) = self.require()?;
        match token {
            Token::Param(n) => Ok(Scalar::Param(n)),
            Token::Word(w) => {
                let n: u8 = w
                    .parse()
                    .map_err(|_| FormatError::new(off, FormatErrorKind::InvalidNumber(w)))?;
                if n > 7 {
                    return Err(FormatError::new(
                        off,
                        FormatErrorKind::Value(crate::error::CodecError::InvalidBitString),
                    ));
                }
                Ok(Scalar::Lit(n))
            }
            other => Err(FormatError::new(
                off,
                FormatErrorKind::UnexpectedToken(token_name(&other)),
            )),
        }
    }

    fn oid_scalar(&mut self) -> Result<Scalar<Oid>, FormatError> {
        let (off, token) = self.require()?;
        match token {
            Token::Param(n) => Ok(Scalar::Param(n)),
            Token::Word(w) => {
                let oid = registry::registry().to_oid(&w).map_err(|_| {
                    FormatError::new(off, FormatErrorKind::UnknownOidName(w.clone()))
                })?;
                Ok(Scalar::Lit(oid))
            }
            other => Err(FormatError::new(
                off,
                FormatErrorKind::UnexpectedToken(token_name(&other)),
            )),
        }
    }

    fn string_scalar(&mut self) -> Result<Scalar<String>, FormatError> {
        let (off, token) = self.require()?;
        match token {
            Token::Param(n) => Ok(Scalar::Param(n)),
            Token::Str(s) => Ok(Scalar::Lit(s)),
            other => Err(FormatError::new(
                off,
                FormatErrorKind::UnexpectedToken(token_name(&other)),
            )),
        }
    }

    /// Time literals may be bare words (`170822063935Z`) or quoted.
    fn time_scalar(&mut self, kind: TimeKind) -> Result<Scalar<String>, FormatError> {
        let (off, token) = self.require()?;
        let literal = match token {
            Token::Param(n) => return Ok(Scalar::Param(n)),
            Token::Str(s) => s,
            Token::Word(w) => w,
            other => {
                return Err(FormatError::new(
                    off,
                    FormatErrorKind::UnexpectedToken(token_name(&other)),
                ))
            }
        };
        codec::time::parse(kind, &literal)
            .map_err(|e| FormatError::new(off, FormatErrorKind::Value(e)))?;
        Ok(Scalar::Lit(literal))
    }

    /// Payload of `blob`/`bits`: a hex run, a nested object, or a parameter.
    fn payload(&mut self, depth: usize) -> Result<Payload, FormatError> {
        match self.peek()? {
            Some((_, Token::LParen)) => {
                let (off, _) = self.require()?;
                Ok(Payload::Object(Box::new(self.object(off, depth + 1)?)))
            }
            Some((_, Token::Param(_))) => match self.require()? {
                (_, Token::Param(n)) => Ok(Payload::Param(n)),
                _ => unreachable!("peeked above"),
            },
            _ => Ok(Payload::Hex(self.hex_run()?)),
        }
    }

    /// Hex pairs separated by whitespace or colons, up to the closing
    /// parenthesis. An odd total number of digits is an error; an empty
    /// run is allowed.
    fn hex_run(&mut self) -> Result<Vec<u8>, FormatError> {
        let mut digits: Vec<u8> = Vec::new();
        let mut run_start = None;
        loop {
            match self.peek()? {
                Some((_, Token::RParen)) | None => break,
                Some((_, Token::Colon)) => {
                    self.next()?;
                }
                Some((_, Token::Word(_))) => {
                    let (off, token) = self.require()?;
                    let w = match token {
                        Token::Word(w) => w,
                        _ => unreachable!("peeked above"),
                    };
                    run_start.get_or_insert(off);
                    for c in w.chars() {
                        match c.to_digit(16) {
                            Some(d) => digits.push(d as u8),
                            None => {
                                return Err(FormatError::new(
                                    off,
                                    FormatErrorKind::UnexpectedToken(w.clone()),
                                ))
                            }
                        }
                    }
                }
                Some(&(off, ref token)) => {
                    return Err(FormatError::new(
                        off,
                        FormatErrorKind::UnexpectedToken(token_name(token)),
                    ))
                }
            }
        }
        if digits.len() % 2 != 0 {
            return Err(FormatError::new(
                run_start.unwrap_or(self.end),
                FormatErrorKind::OddHexDigits,
            ));
        }
        Ok(digits
            .chunks(2)
            .map(|pair| (pair[0] << 4) | pair[1])
            .collect())
    }

    /// `:( %N (type literal) … )`, the colon already consumed.
    fn replacement(&mut self, depth: usize) -> Result<Vec<Replacement>, FormatError> {
        self.expect(Token::LParen)?;
        let mut out = Vec::new();
        while !self.at_rparen()? {
            let (offset, token) = self.require()?;
            let param = match token {
                Token::Param(n) => n,
                other => {
                    return Err(FormatError::new(
                        offset,
                        FormatErrorKind::UnexpectedToken(token_name(&other)),
                    ))
                }
            };
            self.expect(Token::LParen)?;
            let (kw_off, kw_token) = self.require()?;
            let word = match kw_token {
                Token::Word(w) => w,
                other => {
                    return Err(FormatError::new(
                        kw_off,
                        FormatErrorKind::UnexpectedToken(token_name(&other)),
                    ))
                }
            };
            let value = if word.eq_ignore_ascii_case("asn") {
                let off = self.expect(Token::LParen)?;
                ReplValue::Asn(self.object(off, depth + 1)?)
            } else {
                let kw = keyword(&word).ok_or_else(|| {
                    FormatError::new(kw_off, FormatErrorKind::UnknownKeyword(word.clone()))
                })?;
                match kw {
                    Keyword::Bool => match self.bool_scalar()? {
                        Scalar::Lit(b) => ReplValue::Bool(b),
                        Scalar::Param(n) => {
                            return Err(FormatError::new(kw_off, FormatErrorKind::ParamType(n)))
                        }
                    },
                    Keyword::Int | Keyword::Enum => match self.int_scalar()? {
                        Scalar::Lit(n) => ReplValue::Int(n),
                        Scalar::Param(n) => {
                            return Err(FormatError::new(kw_off, FormatErrorKind::ParamType(n)))
                        }
                    },
                    Keyword::Blob => ReplValue::Blob(self.hex_run()?),
                    Keyword::Oid => match self.oid_scalar()? {
                        Scalar::Lit(oid) => ReplValue::OidVal(oid),
                        Scalar::Param(n) => {
                            return Err(FormatError::new(kw_off, FormatErrorKind::ParamType(n)))
                        }
                    },
                    Keyword::Str(cs) => match self.string_scalar()? {
                        Scalar::Lit(s) => ReplValue::Str(cs, s),
                        Scalar::Param(n) => {
                            return Err(FormatError::new(kw_off, FormatErrorKind::ParamType(n)))
                        }
                    },
                    Keyword::Time(kind) => match self.time_scalar(kind)? {
                        Scalar::Lit(s) => ReplValue::Time(kind, s),
                        Scalar::Param(n) => {
                            return Err(FormatError::new(kw_off, FormatErrorKind::ParamType(n)))
                        }
                    },
                    _ => {
                        return Err(FormatError::new(
                            kw_off,
                            FormatErrorKind::UnknownKeyword(word),
                        ))
                    }
                }
            };
            self.expect(Token::RParen)?;
            out.push(Replacement {
                offset,
                param,
                value,
            });
        }
        self.expect(Token::RParen)?;
        Ok(out)
    }
}

/// Universal tag for a tag-value keyword handed in as a parameter string.
pub(crate) fn tag_keyword(word: &str) -> Option<Tag> {
    keyword(word).and_then(keyword_tag)
}

/// The boolean word set, shared with parameter coercion in build mode.
pub(crate) fn bool_from_word(w: &str) -> Option<bool> {
    match w.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

impl Item {
    /// Collect every parameter index referenced below this item (tag
    /// fields included, replacement targets excluded).
    pub(crate) fn collect_params(&self, into: &mut BTreeSet<usize>) {
        match &self.node {
            ItemNode::Param(n) => {
                into.insert(*n);
            }
            ItemNode::Ignore => (),
            ItemNode::Object(obj) => obj.collect_params(into),
        }
    }
}

impl Object {
    pub(crate) fn collect_params(&self, into: &mut BTreeSet<usize>) {
        if let Some(tag) = &self.tag {
            if let Some(ClassSpec::Param(n)) = &tag.class {
                into.insert(*n);
            }
            if let TagValueSpec::Param(n) = &tag.value {
                into.insert(*n);
            }
        }
        match &self.kind {
            ObjectKind::Bool(s) => collect_scalar(s, into),
            ObjectKind::Int(s) | ObjectKind::Enum(s) => collect_scalar(s, into),
            ObjectKind::Bits { ignored, payload } => {
                collect_scalar(ignored, into);
                collect_payload(payload, into);
            }
            ObjectKind::Blob(payload) => collect_payload(payload, into),
            ObjectKind::Null => (),
            ObjectKind::Oid(s) => collect_scalar(s, into),
            ObjectKind::Str(_, s) => collect_scalar(s, into),
            ObjectKind::Time(_, s) => collect_scalar(s, into),
            ObjectKind::ExplicitTag(item) => item.collect_params(into),
            ObjectKind::Constructed { children, .. } => {
                for child in children {
                    child.collect_params(into);
                }
            }
        }
    }
}

fn collect_scalar<T>(scalar: &Scalar<T>, into: &mut BTreeSet<usize>) {
    if let Scalar::Param(n) = scalar {
        into.insert(*n);
    }
}

fn collect_payload(payload: &Payload, into: &mut BTreeSet<usize>) {
    match payload {
        Payload::Param(n) => {
            into.insert(*n);
        }
        Payload::Object(obj) => obj.collect_params(into),
        Payload::Hex(_) => (),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_object() {
        let spec = parse("(bool true)").unwrap();
        match spec.root.node {
            ItemNode::Object(Object {
                kind: ObjectKind::Bool(Scalar::Lit(true)),
                ..
            }) => (),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_tagged_and_nested() {
        let spec = parse("([0] sequence (int %1) ?(bool %2):(%2 (bool false)))").unwrap();
        let obj = match spec.root.node {
            ItemNode::Object(obj) => obj,
            other => panic!("unexpected {:?}", other),
        };
        let tag = obj.tag.expect("tag spec");
        assert!(tag.class.is_none());
        assert!(matches!(tag.value, TagValueSpec::Number(0)));
        match obj.kind {
            ObjectKind::Constructed { kind, nz, children } => {
                assert_eq!(kind, ConsKind::Sequence);
                assert!(!nz);
                assert_eq!(children.len(), 2);
                assert_eq!(children[1].repeat, Repeat::Optional);
                let repl = children[1].replacement.as_ref().expect("replacement");
                assert_eq!(repl.len(), 1);
                assert_eq!(repl[0].param, 2);
                assert!(matches!(repl[0].value, ReplValue::Bool(false)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_hex_run() {
        let spec = parse("(blob 0 1:a3 ff)").unwrap();
        match spec.root.node {
            ItemNode::Object(Object {
                kind: ObjectKind::Blob(Payload::Hex(bytes)),
                ..
            }) => assert_eq!(bytes, vec![0x01, 0xa3, 0xff]),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            parse("(blob 012)").unwrap_err().kind,
            FormatErrorKind::OddHexDigits
        );
    }

    #[test]
    fn test_unknown_keyword() {
        assert_eq!(
            parse("(bogus 1)").unwrap_err().kind,
            FormatErrorKind::UnknownKeyword("bogus".into())
        );
    }

    #[test]
    fn test_tag_wrapper_requires_tag() {
        assert_eq!(
            parse("(tag (int 1))").unwrap_err().kind,
            FormatErrorKind::TagWrapperWithoutTag
        );
        assert!(parse("([app 3] tag (int 1))").is_ok());
    }

    #[test]
    fn test_nz_suffix() {
        let spec = parse("(setof-nz (int 1))").unwrap();
        match spec.root.node {
            ItemNode::Object(Object {
                kind: ObjectKind::Constructed { kind, nz, .. },
                ..
            }) => {
                assert_eq!(kind, ConsKind::SetOf);
                assert!(nz);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(parse("(bool-nz true)").is_err());
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        assert!(parse("(null) (null)").is_err());
    }
}
