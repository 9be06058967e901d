//! Match mode: element tree + text specification → parameter values
//!
//! The matcher walks the specification and the tree in parallel and only
//! ever writes parameter slots. Captures made before a failure stay in the
//! vector; callers that need all-or-nothing semantics match into a scratch
//! vector first.

use crate::ber::{Class, Tag};
use crate::codec::{self, TimeKind};
use crate::element::Element;
use crate::error::{CodecError, Error, MatchError};
use crate::oid::Oid;
use crate::text::ast::{
    self, ClassSpec, ConsKind, Item, ItemNode, Object, ObjectKind, Payload, Repeat, Scalar,
    TagSpec, TagValueSpec,
};
use crate::text::build;
use crate::text::value::Value;
use num_bigint::BigInt;

/// Match an element against a text specification, writing captures into
/// `params` (growing it as needed).
pub fn match_element(spec: &str, element: &Element, params: &mut Vec<Value>) -> Result<(), Error> {
    let spec = ast::parse(spec)?;
    let mut matcher = Matcher {
        params,
        accumulate: false,
    };
    matcher.item(&spec.root, std::slice::from_ref(element), 0)?;
    Ok(())
}

struct Matcher<'a> {
    params: &'a mut Vec<Value>,
    accumulate: bool,
}

fn mismatch<T>(_: CodecError) -> Result<T, Error> {
    Err(MatchError::ValueMismatch.into())
}

impl<'a> Matcher<'a> {
    fn store(&mut self, idx: usize, value: Value) {
        if self.params.len() <= idx {
            self.params.resize(idx + 1, Value::Null);
        }
        if self.accumulate {
            match &mut self.params[idx] {
                Value::List(items) => items.push(value),
                slot => *slot = Value::List(vec![value]),
            }
        } else {
            self.params[idx] = value;
        }
    }

    /// Match one item against the child list at `off`; returns the new
    /// cursor position.
    fn item(&mut self, item: &Item, children: &[Element], mut off: usize) -> Result<usize, Error> {
        match item.repeat {
            Repeat::One => {
                if off >= children.len() {
                    return Err(MatchError::MissingChild.into());
                }
                self.node(item, &children[off])?;
                Ok(off + 1)
            }
            Repeat::Optional => {
                if off < children.len() && self.node_accepts(item, &children[off]) {
                    self.node(item, &children[off])?;
                    Ok(off + 1)
                } else {
                    self.apply_replacement(item)?;
                    Ok(off)
                }
            }
            Repeat::Star | Repeat::Plus => self.repeated(item, children, &mut off).map(|_| off),
        }
    }

    fn repeated(
        &mut self,
        item: &Item,
        children: &[Element],
        off: &mut usize,
    ) -> Result<(), Error> {
        // `*%N` captures every remaining child; `*.` skips them
        match item.node {
            ItemNode::Param(n) => {
                let rest: Vec<Value> = children[*off..]
                    .iter()
                    .map(|e| Value::Elem(e.clone()))
                    .collect();
                if item.repeat == Repeat::Plus && rest.is_empty() {
                    return Err(MatchError::RepetitionRequired.into());
                }
                self.store(n, Value::List(rest));
                *off = children.len();
                return Ok(());
            }
            ItemNode::Ignore => {
                if item.repeat == Repeat::Plus && *off >= children.len() {
                    return Err(MatchError::RepetitionRequired.into());
                }
                *off = children.len();
                return Ok(());
            }
            ItemNode::Object(_) => (),
        }
        let saved = self.accumulate;
        self.accumulate = true;
        let mut count = 0;
        let mut result = Ok(());
        while *off < children.len() && self.node_accepts(item, &children[*off]) {
            match self.node(item, &children[*off]) {
                Ok(()) => {
                    *off += 1;
                    count += 1;
                }
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        self.accumulate = saved;
        result?;
        if item.repeat == Repeat::Plus && count == 0 {
            return Err(MatchError::RepetitionRequired.into());
        }
        Ok(())
    }

    /// Cheap tag-level predicate used by `?` and `*`/`+` to decide
    /// whether to try the node on the current child.
    fn node_accepts(&self, item: &Item, child: &Element) -> bool {
        match &item.node {
            ItemNode::Param(_) | ItemNode::Ignore => true,
            ItemNode::Object(obj) => {
                let (class, tag, form) = expected_of(obj);
                class.map_or(true, |c| child.class() == c)
                    && tag.map_or(true, |t| child.tag().0 == t)
                    && form.map_or(true, |f| child.is_constructed() == f)
            }
        }
    }

    fn node(&mut self, item: &Item, child: &Element) -> Result<(), Error> {
        match &item.node {
            ItemNode::Param(n) => {
                self.store(*n, Value::Elem(child.clone()));
                Ok(())
            }
            ItemNode::Ignore => Ok(()),
            ItemNode::Object(obj) => self.object(obj, child),
        }
    }

    fn object(&mut self, obj: &Object, child: &Element) -> Result<(), Error> {
        self.check_tag(obj, child)?;
        match &obj.kind {
            ObjectKind::Bool(scalar) => {
                let v = match codec::decode_boolean(child.value()?) {
                    Ok(v) => v,
                    Err(e) => return mismatch(e),
                };
                match scalar {
                    Scalar::Lit(expected) => self.literal(v == *expected),
                    Scalar::Param(n) => {
                        self.store(*n, Value::Bool(v));
                        Ok(())
                    }
                }
            }
            ObjectKind::Int(scalar) | ObjectKind::Enum(scalar) => {
                let v = match codec::decode_integer(child.value()?) {
                    Ok(v) => v,
                    Err(e) => return mismatch(e),
                };
                match scalar {
                    Scalar::Lit(expected) => self.literal(v == *expected),
                    Scalar::Param(n) => {
                        self.store(*n, Value::Int(v));
                        Ok(())
                    }
                }
            }
            ObjectKind::Bits { ignored, payload } => {
                let (count, bits) = match codec::bit_string_parts(child.value()?) {
                    Ok(parts) => parts,
                    Err(e) => return mismatch(e),
                };
                match ignored {
                    Scalar::Lit(expected) => self.literal(count == *expected)?,
                    Scalar::Param(n) => self.store(*n, Value::Int(BigInt::from(count))),
                }
                let bits = bits.to_vec();
                self.payload(payload, &bits)
            }
            ObjectKind::Blob(payload) => {
                let bytes = child.value()?.to_vec();
                self.payload(payload, &bytes)
            }
            ObjectKind::Null => self.literal(child.value()?.is_empty()),
            ObjectKind::Oid(scalar) => {
                let oid = match Oid::from_der_content(child.value()?) {
                    Ok(oid) => oid,
                    Err(e) => return mismatch(e),
                };
                match scalar {
                    Scalar::Lit(expected) => self.literal(oid == *expected),
                    Scalar::Param(n) => {
                        self.store(*n, Value::Str(oid.to_string()));
                        Ok(())
                    }
                }
            }
            ObjectKind::Str(cs, scalar) => {
                let v = match codec::strings::decode(*cs, child.value()?) {
                    Ok(v) => v,
                    Err(e) => return mismatch(e),
                };
                match scalar {
                    Scalar::Lit(expected) => self.literal(v == *expected),
                    Scalar::Param(n) => {
                        self.store(*n, Value::Str(v));
                        Ok(())
                    }
                }
            }
            ObjectKind::Time(kind, scalar) => {
                let raw = child.value()?;
                let s = match std::str::from_utf8(raw) {
                    Ok(s) => s,
                    Err(_) => return Err(MatchError::ValueMismatch.into()),
                };
                match scalar {
                    Scalar::Lit(expected) => self.literal(s == expected.as_str()),
                    Scalar::Param(n) => {
                        let t = match codec::time::parse(*kind, s) {
                            Ok(t) => t,
                            Err(e) => return mismatch(e),
                        };
                        self.store(*n, Value::Time(t));
                        Ok(())
                    }
                }
            }
            ObjectKind::ExplicitTag(body) => {
                let inner = child.children()?;
                let end = self.item(body, inner, 0)?;
                if end != inner.len() {
                    return Err(MatchError::TrailingChildren.into());
                }
                Ok(())
            }
            ObjectKind::Constructed { nz, children, .. } => {
                let inner = child.children()?;
                if *nz && inner.is_empty() {
                    return Err(MatchError::EmptyConstructed.into());
                }
                let mut off = 0;
                for spec in children {
                    off = self.item(spec, inner, off)?;
                }
                if off != inner.len() {
                    return Err(MatchError::TrailingChildren.into());
                }
                Ok(())
            }
        }
    }

    fn literal(&self, matched: bool) -> Result<(), Error> {
        if matched {
            Ok(())
        } else {
            Err(MatchError::ValueMismatch.into())
        }
    }

    /// Blob/bits payload position: literal bytes, capture, or a nested
    /// match against the decoded payload.
    fn payload(&mut self, payload: &Payload, bytes: &[u8]) -> Result<(), Error> {
        match payload {
            Payload::Hex(expected) => self.literal(bytes == &expected[..]),
            Payload::Param(n) => {
                self.store(*n, Value::Bytes(bytes.to_vec()));
                Ok(())
            }
            Payload::Object(obj) => {
                let nested = match crate::ber::decode(bytes) {
                    Ok(e) => e,
                    Err(_) => return Err(MatchError::ValueMismatch.into()),
                };
                self.object(obj, &nested)
            }
        }
    }

    /// Check the expected tag and form, then capture any tag-position
    /// parameters from the child.
    fn check_tag(&mut self, obj: &Object, child: &Element) -> Result<(), Error> {
        let (class, tag, form) = expected_of(obj);
        let class_ok = class.map_or(true, |c| child.class() == c);
        let tag_ok = tag.map_or(true, |t| child.tag().0 == t);
        if !class_ok || !tag_ok {
            return Err(MatchError::TagMismatch {
                expected_class: class.unwrap_or_else(|| child.class()),
                expected_tag: Tag(tag.unwrap_or(child.tag().0)),
                found_class: child.class(),
                found_tag: child.tag(),
            }
            .into());
        }
        if form.map_or(false, |f| child.is_constructed() != f) {
            return Err(MatchError::FormMismatch.into());
        }
        if let Some(TagSpec { class, value, .. }) = &obj.tag {
            if let Some(ClassSpec::Param(n)) = class {
                self.store(*n, Value::Int(BigInt::from(child.class() as u8)));
            }
            if let TagValueSpec::Param(n) = value {
                self.store(*n, Value::Int(BigInt::from(child.tag().0)));
            }
        }
        Ok(())
    }

    /// Seed parameters from a `:(…)` action after an optional node was
    /// skipped.
    fn apply_replacement(&mut self, item: &Item) -> Result<(), Error> {
        let actions = match &item.replacement {
            Some(actions) => actions,
            None => return Ok(()),
        };
        for action in actions {
            let value = match &action.value {
                ast::ReplValue::Bool(b) => Value::Bool(*b),
                ast::ReplValue::Int(n) => Value::Int(n.clone()),
                ast::ReplValue::Blob(b) => Value::Bytes(b.clone()),
                ast::ReplValue::OidVal(oid) => Value::Str(oid.to_string()),
                ast::ReplValue::Str(_, s) => Value::Str(s.clone()),
                ast::ReplValue::Time(kind, s) => {
                    Value::Time(codec::time::parse(*kind, s).map_err(Error::Codec)?)
                }
                ast::ReplValue::Asn(obj) => match build::build_literal_object(obj)? {
                    Some(e) => Value::Elem(e),
                    None => Value::Null,
                },
            };
            self.store(action.param, value);
        }
        Ok(())
    }
}

/// Expected (class, tag number, constructed form) of an object node;
/// `None` fields are wildcards introduced by parameter tag fields.
fn expected_of(obj: &Object) -> (Option<Class>, Option<u32>, Option<bool>) {
    let form = match &obj.kind {
        ObjectKind::ExplicitTag(_) | ObjectKind::Constructed { .. } => Some(true),
        _ => Some(false),
    };
    match &obj.tag {
        None => {
            let tag = natural_tag(&obj.kind);
            (Some(Class::Universal), tag.map(|t| t.0), form)
        }
        Some(spec) => {
            let value = match &spec.value {
                TagValueSpec::Number(n) => Some(*n),
                TagValueSpec::Keyword(t) => Some(t.0),
                TagValueSpec::Param(_) => None,
            };
            let class = match (&spec.class, &spec.value) {
                (Some(ClassSpec::Lit(c)), _) => Some(*c),
                (Some(ClassSpec::Param(_)), _) => None,
                (None, TagValueSpec::Number(_)) => Some(Class::ContextSpecific),
                (None, TagValueSpec::Keyword(_)) => Some(Class::Universal),
                (None, TagValueSpec::Param(_)) => None,
            };
            (class, value, form)
        }
    }
}

fn natural_tag(kind: &ObjectKind) -> Option<Tag> {
    match kind {
        ObjectKind::Bool(_) => Some(Tag::Boolean),
        ObjectKind::Int(_) => Some(Tag::Integer),
        ObjectKind::Enum(_) => Some(Tag::Enumerated),
        ObjectKind::Bits { .. } => Some(Tag::BitString),
        ObjectKind::Blob(_) => Some(Tag::OctetString),
        ObjectKind::Null => Some(Tag::Null),
        ObjectKind::Oid(_) => Some(Tag::Oid),
        ObjectKind::Str(cs, _) => Some(cs.tag()),
        ObjectKind::Time(TimeKind::Utc, _) => Some(Tag::UtcTime),
        ObjectKind::Time(TimeKind::Generalized, _) => Some(Tag::GeneralizedTime),
        ObjectKind::ExplicitTag(_) => None,
        ObjectKind::Constructed { kind, .. } => match kind {
            ConsKind::Sequence => Some(Tag::Sequence),
            _ => Some(Tag::Set),
        },
    }
}
