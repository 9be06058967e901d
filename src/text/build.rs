//! Build mode: text specification + parameters → element tree
//!
//! The builder only ever reads parameter slots. A `Null` parameter in a
//! value, tag or ignored-bit position makes the surrounding node absent;
//! parents skip absent children and an absent top level builds to `None`.

use crate::ber::{Class, Tag, MAX_DEPTH};
use crate::codec::TimeKind;
use crate::element::Element;
use crate::error::{Error, FormatError, FormatErrorKind};
use crate::text::ast::{
    self, ClassSpec, ConsKind, Item, ItemNode, Object, ObjectKind, Payload, Scalar, TagSpec,
    TagValueSpec,
};
use crate::text::value::Value;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use std::collections::BTreeSet;

/// Build an element from a text specification and a parameter vector.
///
/// Returns `Ok(None)` when the top-level node is absent (a `Null`
/// parameter in one of its key positions, or an empty `-nz` constructed).
pub fn build(spec: &str, params: &[Value]) -> Result<Option<Element>, Error> {
    let spec = ast::parse(spec)?;
    let mut builder = Builder {
        params,
        overrides: Vec::new(),
        depth: 0,
    };
    builder.single(&spec.root)
}

/// Build a literal object spec with no parameters (replacement actions).
pub(crate) fn build_literal_object(obj: &Object) -> Result<Option<Element>, Error> {
    let mut builder = Builder {
        params: &[],
        overrides: Vec::new(),
        depth: 0,
    };
    builder.object(obj)
}

struct Builder<'a> {
    params: &'a [Value],
    /// Innermost-last stack of repetition bindings
    overrides: Vec<(usize, Value)>,
    depth: usize,
}

impl<'a> Builder<'a> {
    fn get(&self, idx: usize, offset: usize) -> Result<&Value, FormatError> {
        for (i, v) in self.overrides.iter().rev() {
            if *i == idx {
                return Ok(v);
            }
        }
        self.params
            .get(idx)
            .ok_or_else(|| FormatError::new(offset, FormatErrorKind::ParamOutOfRange(idx)))
    }

    fn param_err(&self, offset: usize, idx: usize) -> Error {
        FormatError::new(offset, FormatErrorKind::ParamType(idx)).into()
    }

    /// Build an item in a position that takes exactly one object.
    fn single(&mut self, item: &Item) -> Result<Option<Element>, Error> {
        let mut out = self.item(item)?;
        match out.len() {
            0 => Ok(None),
            1 => Ok(out.pop()),
            _ => Err(FormatError::new(item.offset, FormatErrorKind::SingleObjectRequired).into()),
        }
    }

    /// Build an item in child position: zero, one or many elements.
    fn item(&mut self, item: &Item) -> Result<Vec<Element>, Error> {
        match item.repeat {
            ast::Repeat::One | ast::Repeat::Optional => {
                Ok(self.node(item)?.into_iter().collect())
            }
            ast::Repeat::Star | ast::Repeat::Plus => {
                let mut refs = BTreeSet::new();
                item.collect_params(&mut refs);
                let mut lists: Vec<(usize, Vec<Value>)> = Vec::new();
                for &idx in &refs {
                    if let Value::List(items) = self.get(idx, item.offset)? {
                        lists.push((idx, items.clone()));
                    }
                }
                let mut out = Vec::new();
                if !lists.is_empty() {
                    let steps = lists.iter().map(|(_, l)| l.len()).min().unwrap_or(0);
                    for step in 0..steps {
                        let mark = self.overrides.len();
                        for (idx, items) in &lists {
                            self.overrides.push((*idx, items[step].clone()));
                        }
                        let built = self.node(item);
                        self.overrides.truncate(mark);
                        out.extend(built?);
                    }
                }
                if item.repeat == ast::Repeat::Plus && out.is_empty() {
                    return Err(
                        FormatError::new(item.offset, FormatErrorKind::RepetitionEmpty).into()
                    );
                }
                Ok(out)
            }
        }
    }

    fn node(&mut self, item: &Item) -> Result<Option<Element>, Error> {
        match &item.node {
            ItemNode::Ignore => {
                Err(FormatError::new(item.offset, FormatErrorKind::IgnoreInBuild).into())
            }
            ItemNode::Param(n) => match self.get(*n, item.offset)? {
                Value::Null => Ok(None),
                Value::Elem(e) => Ok(Some(e.clone())),
                _ => Err(self.param_err(item.offset, *n)),
            },
            ItemNode::Object(obj) => self.object(obj),
        }
    }

    fn object(&mut self, obj: &Object) -> Result<Option<Element>, Error> {
        if self.depth > MAX_DEPTH {
            return Err(FormatError::new(obj.offset, FormatErrorKind::TooDeep).into());
        }
        self.depth += 1;
        let result = self.object_inner(obj);
        self.depth -= 1;
        result
    }

    fn object_inner(&mut self, obj: &Object) -> Result<Option<Element>, Error> {
        let tag_override = match &obj.tag {
            None => None,
            Some(spec) => match self.resolve_tag(spec)? {
                Some(ct) => Some(ct),
                None => return Ok(None),
            },
        };
        let built = match &obj.kind {
            ObjectKind::Bool(scalar) => {
                let v = match scalar {
                    Scalar::Lit(b) => *b,
                    Scalar::Param(n) => match self.get(*n, obj.offset)? {
                        Value::Null => return Ok(None),
                        Value::Bool(b) => *b,
                        Value::Str(s) => ast::bool_from_word(s)
                            .ok_or_else(|| self.param_err(obj.offset, *n))?,
                        _ => return Err(self.param_err(obj.offset, *n)),
                    },
                };
                Element::boolean(v)
            }
            ObjectKind::Int(scalar) => match self.int_value(scalar, obj.offset)? {
                Some(n) => Element::integer(&n),
                None => return Ok(None),
            },
            ObjectKind::Enum(scalar) => match self.int_value(scalar, obj.offset)? {
                Some(n) => Element::enumerated(&n),
                None => return Ok(None),
            },
            ObjectKind::Bits { ignored, payload } => {
                let count = match ignored {
                    Scalar::Lit(v) => *v,
                    Scalar::Param(n) => match self.get(*n, obj.offset)? {
                        Value::Null => return Ok(None),
                        Value::Int(i) => {
                            u8::try_from(i).map_err(|_| self.param_err(obj.offset, *n))?
                        }
                        _ => return Err(self.param_err(obj.offset, *n)),
                    },
                };
                match self.payload_bytes(payload, obj.offset, false)? {
                    Some(bytes) => {
                        // a nested object as payload requires zero ignored bits
                        if count != 0 && matches!(payload, Payload::Object(_)) {
                            return Err(FormatError::new(
                                obj.offset,
                                FormatErrorKind::Value(
                                    crate::error::CodecError::InvalidBitString,
                                ),
                            )
                            .into());
                        }
                        Element::bit_string(count, &bytes).map_err(Error::Codec)?
                    }
                    None => return Ok(None),
                }
            }
            ObjectKind::Blob(payload) => match self.payload_bytes(payload, obj.offset, true)? {
                Some(bytes) => Element::octet_string(bytes),
                None => return Ok(None),
            },
            ObjectKind::Null => Element::null(),
            ObjectKind::Oid(scalar) => {
                let oid = match scalar {
                    Scalar::Lit(oid) => oid.clone(),
                    Scalar::Param(n) => match self.get(*n, obj.offset)? {
                        Value::Null => return Ok(None),
                        Value::Str(s) => crate::registry::registry().to_oid(s).map_err(|_| {
                            Error::Format(FormatError::new(
                                obj.offset,
                                FormatErrorKind::UnknownOidName(s.clone()),
                            ))
                        })?,
                        Value::Elem(e) => e.as_oid().map_err(Error::Codec)?,
                        _ => return Err(self.param_err(obj.offset, *n)),
                    },
                };
                Element::oid(&oid)
            }
            ObjectKind::Str(cs, scalar) => {
                let s = match scalar {
                    Scalar::Lit(s) => s.clone(),
                    Scalar::Param(n) => match self.get(*n, obj.offset)? {
                        Value::Null => return Ok(None),
                        Value::Str(s) => s.clone(),
                        _ => return Err(self.param_err(obj.offset, *n)),
                    },
                };
                Element::string(*cs, &s).map_err(Error::Codec)?
            }
            ObjectKind::Time(kind, scalar) => match self.time_element(*kind, scalar, obj.offset)? {
                Some(e) => e,
                None => return Ok(None),
            },
            ObjectKind::ExplicitTag(body) => {
                let (class, tag) = match tag_override {
                    Some(ct) => ct,
                    None => {
                        return Err(FormatError::new(
                            obj.offset,
                            FormatErrorKind::TagWrapperWithoutTag,
                        )
                        .into())
                    }
                };
                return match self.single(body)? {
                    Some(child) => Ok(Some(Element::constructed(class, tag, vec![child]))),
                    None => Ok(None),
                };
            }
            ObjectKind::Constructed { kind, nz, children } => {
                let mut built = Vec::new();
                for child in children {
                    built.extend(self.item(child)?);
                }
                if built.is_empty() && *nz {
                    return Ok(None);
                }
                match kind {
                    ConsKind::Sequence => Element::sequence(built),
                    ConsKind::Set => Element::set(built),
                    ConsKind::SetOf => Element::set_of(built),
                    ConsKind::SetDer => Element::set_der(built).map_err(Error::Codec)?,
                }
            }
        };
        Ok(Some(match tag_override {
            Some((class, tag)) => built.with_tag(class, tag),
            None => built,
        }))
    }

    fn int_value(
        &mut self,
        scalar: &Scalar<BigInt>,
        offset: usize,
    ) -> Result<Option<BigInt>, Error> {
        match scalar {
            Scalar::Lit(n) => Ok(Some(n.clone())),
            Scalar::Param(n) => match self.get(*n, offset)? {
                Value::Null => Ok(None),
                Value::Int(i) => Ok(Some(i.clone())),
                Value::Str(s) => s
                    .trim()
                    .parse::<BigInt>()
                    .map(Some)
                    .map_err(|_| self.param_err(offset, *n)),
                _ => Err(self.param_err(offset, *n)),
            },
        }
    }

    fn time_element(
        &mut self,
        kind: TimeKind,
        scalar: &Scalar<String>,
        offset: usize,
    ) -> Result<Option<Element>, Error> {
        let from_str = |s: &str| -> Result<Element, Error> {
            match kind {
                TimeKind::Utc => Element::utc_time(s),
                TimeKind::Generalized => Element::generalized_time(s),
            }
            .map_err(Error::Codec)
        };
        match scalar {
            Scalar::Lit(s) => Ok(Some(from_str(s)?)),
            Scalar::Param(n) => match self.get(*n, offset)? {
                Value::Null => Ok(None),
                Value::Str(s) => Ok(Some(from_str(s)?)),
                Value::Time(t) => {
                    // the minimum instant is the "unset" sentinel
                    if *t == DateTime::<Utc>::MIN_UTC {
                        Ok(None)
                    } else {
                        Ok(Some(Element::time(kind, &t.clone()).map_err(Error::Codec)?))
                    }
                }
                _ => Err(self.param_err(offset, *n)),
            },
        }
    }

    /// Bytes for a `blob`/`bits` payload. `allow_spec` enables the
    /// blob-only coercion of a string parameter into a nested build.
    fn payload_bytes(
        &mut self,
        payload: &Payload,
        offset: usize,
        allow_spec: bool,
    ) -> Result<Option<Vec<u8>>, Error> {
        match payload {
            Payload::Hex(bytes) => Ok(Some(bytes.clone())),
            Payload::Object(obj) => match self.object(obj)? {
                Some(e) => Ok(Some(e.to_der())),
                None => Ok(None),
            },
            Payload::Param(n) => {
                let value = self.get(*n, offset)?.clone();
                match value {
                    Value::Null => Ok(None),
                    Value::Bytes(b) => Ok(Some(b)),
                    Value::Elem(e) => Ok(Some(e.to_der())),
                    Value::Str(s) if allow_spec => {
                        if self.depth > MAX_DEPTH {
                            return Err(
                                FormatError::new(offset, FormatErrorKind::TooDeep).into()
                            );
                        }
                        let nested = ast::parse(&s)?;
                        self.depth += 1;
                        let built = self.single(&nested.root);
                        self.depth -= 1;
                        match built? {
                            Some(e) => Ok(Some(e.to_der())),
                            None => Ok(None),
                        }
                    }
                    _ => Err(self.param_err(offset, *n)),
                }
            }
        }
    }

    /// Resolve a `[class value]` override. `Ok(None)` means a tag field
    /// was a null parameter and the node is absent.
    fn resolve_tag(&mut self, spec: &TagSpec) -> Result<Option<(Class, Tag)>, Error> {
        let (value, default_class) = match &spec.value {
            TagValueSpec::Number(n) => (*n, Class::ContextSpecific),
            TagValueSpec::Keyword(t) => (t.0, Class::Universal),
            TagValueSpec::Param(n) => match self.get(*n, spec.offset)? {
                Value::Null => return Ok(None),
                Value::Int(i) => {
                    let v = u32::try_from(i).map_err(|_| {
                        Error::Format(FormatError::new(
                            spec.offset,
                            FormatErrorKind::TagOutOfRange,
                        ))
                    })?;
                    (v, Class::ContextSpecific)
                }
                Value::Str(s) => {
                    if s.bytes().all(|b| b.is_ascii_digit()) {
                        let v = s.parse::<u32>().map_err(|_| {
                            Error::Format(FormatError::new(
                                spec.offset,
                                FormatErrorKind::TagOutOfRange,
                            ))
                        })?;
                        (v, Class::ContextSpecific)
                    } else {
                        let tag = ast::tag_keyword(s).ok_or_else(|| {
                            Error::Format(FormatError::new(
                                spec.offset,
                                FormatErrorKind::UnknownKeyword(s.clone()),
                            ))
                        })?;
                        (tag.0, Class::Universal)
                    }
                }
                _ => return Err(self.param_err(spec.offset, *n)),
            },
        };
        let class = match &spec.class {
            None => default_class,
            Some(ClassSpec::Lit(c)) => *c,
            Some(ClassSpec::Param(n)) => match self.get(*n, spec.offset)? {
                Value::Null => return Ok(None),
                Value::Str(s) => Class::from_keyword(s).ok_or_else(|| {
                    Error::Format(FormatError::new(
                        spec.offset,
                        FormatErrorKind::UnknownKeyword(s.clone()),
                    ))
                })?,
                Value::Int(i) => {
                    let v = u8::try_from(i).map_err(|_| self.param_err(spec.offset, *n))?;
                    match v {
                        0 => Class::Universal,
                        1 => Class::Application,
                        2 => Class::ContextSpecific,
                        3 => Class::Private,
                        _ => return Err(self.param_err(spec.offset, *n)),
                    }
                }
                _ => return Err(self.param_err(spec.offset, *n)),
            },
        };
        if value > Tag::MAX {
            return Err(FormatError::new(spec.offset, FormatErrorKind::TagOutOfRange).into());
        }
        Ok(Some((class, Tag(value))))
    }
}
