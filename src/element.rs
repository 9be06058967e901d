//! The in-memory ASN.1 tree
//!
//! An [`Element`] is an immutable node: a tag (class + number + form) and
//! either content octets or a list of children. Elements produced by the
//! decoder share one reference-counted buffer and remember their exact
//! encoded span; elements built programmatically own fresh buffers and are
//! always encoded in strict DER form.

use crate::ber::integer::*;
use crate::ber::{Class, Tag};
use crate::codec;
use crate::codec::{Charset, TimeKind};
use crate::debug::HexSlice;
use crate::error::CodecError;
use crate::oid::Oid;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use core::fmt;
use num_bigint::BigInt;

/// Content of an element: raw octets or an ordered child list
#[derive(Clone, PartialEq)]
pub enum Content {
    Primitive(Bytes),
    Constructed(Vec<Element>),
}

/// An ASN.1 element
#[derive(Clone)]
pub struct Element {
    class: Class,
    tag: Tag,
    constructed: bool,
    content: Content,
    source: Option<Bytes>,
}

/// Equality ignores the memoised source span: two elements are equal when
/// they describe the same value, wherever they came from.
impl PartialEq for Element {
    fn eq(&self, other: &Element) -> bool {
        self.class == other.class
            && self.tag == other.tag
            && self.constructed == other.constructed
            && self.content == other.content
    }
}

impl Element {
    /// Build a primitive element from raw content octets.
    ///
    /// The octets are taken as-is; the typed constructors below are the
    /// canonical way to build well-formed values.
    pub fn primitive<B: Into<Bytes>>(class: Class, tag: Tag, value: B) -> Element {
        Element {
            class,
            tag,
            constructed: false,
            content: Content::Primitive(value.into()),
            source: None,
        }
    }

    /// Build a constructed element from a child list.
    pub fn constructed(class: Class, tag: Tag, children: Vec<Element>) -> Element {
        Element {
            class,
            tag,
            constructed: true,
            content: Content::Constructed(children),
            source: None,
        }
    }

    pub(crate) fn with_source(mut self, source: Bytes) -> Element {
        self.source = Some(source);
        self
    }

    /// Replace the tag while keeping content and form (implicit tagging).
    pub fn with_tag(self, class: Class, tag: Tag) -> Element {
        Element {
            class,
            tag,
            source: None,
            ..self
        }
    }

    // -- typed constructors --------------------------------------------

    pub fn boolean(v: bool) -> Element {
        Element::primitive(
            Class::Universal,
            Tag::Boolean,
            Bytes::from_static(codec::encode_boolean(v)),
        )
    }

    pub fn integer(n: &BigInt) -> Element {
        Element::primitive(Class::Universal, Tag::Integer, codec::encode_integer(n))
    }

    pub fn enumerated(n: &BigInt) -> Element {
        Element::primitive(Class::Universal, Tag::Enumerated, codec::encode_integer(n))
    }

    pub fn bit_string(ignored: u8, payload: &[u8]) -> Result<Element, CodecError> {
        let content = codec::encode_bit_string(ignored, payload)?;
        Ok(Element::primitive(
            Class::Universal,
            Tag::BitString,
            content,
        ))
    }

    pub fn octet_string<B: Into<Bytes>>(value: B) -> Element {
        Element::primitive(Class::Universal, Tag::OctetString, value)
    }

    pub fn null() -> Element {
        Element::primitive(Class::Universal, Tag::Null, Bytes::new())
    }

    pub fn oid(oid: &Oid) -> Element {
        Element::primitive(Class::Universal, Tag::Oid, oid.to_der_content())
    }

    /// A character string of the given set; fails when the string cannot
    /// be represented in that set.
    pub fn string(cs: Charset, s: &str) -> Result<Element, CodecError> {
        let content = codec::strings::encode(cs, s)?;
        Ok(Element::primitive(Class::Universal, cs.tag(), content))
    }

    /// A UTCTime element from its literal string form. The string is
    /// validated but stored verbatim.
    pub fn utc_time(s: &str) -> Result<Element, CodecError> {
        codec::time::parse_utc(s)?;
        Ok(Element::primitive(
            Class::Universal,
            Tag::UtcTime,
            s.as_bytes().to_vec(),
        ))
    }

    /// A GeneralizedTime element from its literal string form.
    pub fn generalized_time(s: &str) -> Result<Element, CodecError> {
        codec::time::parse_generalized(s)?;
        Ok(Element::primitive(
            Class::Universal,
            Tag::GeneralizedTime,
            s.as_bytes().to_vec(),
        ))
    }

    /// A time element of either flavour from a calendar instant.
    pub fn time(kind: TimeKind, t: &DateTime<Utc>) -> Result<Element, CodecError> {
        let s = codec::time::format(kind, t)?;
        let tag = match kind {
            TimeKind::Utc => Tag::UtcTime,
            TimeKind::Generalized => Tag::GeneralizedTime,
        };
        Ok(Element::primitive(Class::Universal, tag, s.into_bytes()))
    }

    pub fn sequence(children: Vec<Element>) -> Element {
        Element::constructed(Class::Universal, Tag::Sequence, children)
    }

    pub fn set(children: Vec<Element>) -> Element {
        Element::constructed(Class::Universal, Tag::Set, children)
    }

    /// A SET OF: children are sorted by their DER encodings and duplicates
    /// (children with identical encodings) are merged, so the stored order
    /// is already the DER emission order.
    pub fn set_of(children: Vec<Element>) -> Element {
        let mut keyed: Vec<(Vec<u8>, Element)> = children
            .into_iter()
            .map(|c| (crate::der::to_der(&c), c))
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        keyed.dedup_by(|a, b| a.0 == b.0);
        Element::set(keyed.into_iter().map(|(_, c)| c).collect())
    }

    /// A SET whose children are sorted by (class, tag); two children with
    /// the same tag are an error.
    pub fn set_der(children: Vec<Element>) -> Result<Element, CodecError> {
        let mut children = children;
        children.sort_by_key(|c| (c.class(), c.tag()));
        for pair in children.windows(2) {
            if pair[0].class() == pair[1].class() && pair[0].tag() == pair[1].tag() {
                return Err(CodecError::SetDuplicateTag);
            }
        }
        Ok(Element::set(children))
    }

    // -- structure accessors -------------------------------------------

    #[inline]
    pub fn class(&self) -> Class {
        self.class
    }

    #[inline]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    #[inline]
    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    #[inline]
    pub fn is_universal(&self) -> bool {
        self.class == Class::Universal
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Content octets of a primitive element.
    pub fn value(&self) -> Result<&Bytes, CodecError> {
        match &self.content {
            Content::Primitive(v) => Ok(v),
            Content::Constructed(_) => Err(CodecError::ConstructUnexpected),
        }
    }

    /// Children of a constructed element.
    pub fn children(&self) -> Result<&[Element], CodecError> {
        match &self.content {
            Content::Constructed(c) => Ok(c),
            Content::Primitive(_) => Err(CodecError::ConstructExpected),
        }
    }

    /// The exact encoded span this element was decoded from, if any.
    pub fn source(&self) -> Option<&Bytes> {
        self.source.as_ref()
    }

    // -- typed accessors -----------------------------------------------

    pub fn as_bool(&self) -> Result<bool, CodecError> {
        self.expect(Tag::Boolean)?;
        codec::decode_boolean(self.value()?)
    }

    pub fn as_bigint(&self) -> Result<BigInt, CodecError> {
        self.expect_int()?;
        codec::decode_integer(self.value()?)
    }

    /// Attempt to read the integer as an `u64`; fails when the element is
    /// not an integer, is negative, or does not fit.
    pub fn as_u64(&self) -> Result<u64, CodecError> {
        self.expect_int()?;
        decode_array_uint8(self.value()?)
    }

    pub fn as_u32(&self) -> Result<u32, CodecError> {
        self.expect_int()?;
        decode_array_uint4(self.value()?)
    }

    pub fn as_i64(&self) -> Result<i64, CodecError> {
        self.expect_int()?;
        let v = self.value()?;
        if v.is_empty() {
            return Err(CodecError::EmptyInteger);
        }
        decode_array_int8(v)
    }

    pub fn as_i32(&self) -> Result<i32, CodecError> {
        self.expect_int()?;
        let v = self.value()?;
        if v.is_empty() {
            return Err(CodecError::EmptyInteger);
        }
        decode_array_int4(v)
    }

    /// (ignored-bit count, payload) of a BIT STRING.
    pub fn bit_string_parts(&self) -> Result<(u8, &[u8]), CodecError> {
        self.expect(Tag::BitString)?;
        codec::bit_string_parts(self.value()?)
    }

    pub fn as_oid(&self) -> Result<Oid, CodecError> {
        self.expect(Tag::Oid)?;
        Oid::from_der_content(self.value()?)
    }

    /// Decode a character string element of any of the eight sets.
    pub fn as_str(&self) -> Result<String, CodecError> {
        if self.class != Class::Universal {
            return Err(CodecError::TypeError);
        }
        let cs = Charset::for_tag(self.tag).ok_or(CodecError::TypeError)?;
        codec::strings::decode(cs, self.value()?)
    }

    /// The literal string form of a time element.
    pub fn time_string(&self) -> Result<&str, CodecError> {
        self.time_kind()?;
        std::str::from_utf8(self.value()?).map_err(|_| CodecError::InvalidTime)
    }

    /// Parse a time element into a calendar instant.
    pub fn as_datetime(&self) -> Result<DateTime<Utc>, CodecError> {
        let kind = self.time_kind()?;
        let s = std::str::from_utf8(self.value()?).map_err(|_| CodecError::InvalidTime)?;
        codec::time::parse(kind, s)
    }

    fn time_kind(&self) -> Result<TimeKind, CodecError> {
        if self.class != Class::Universal {
            return Err(CodecError::TypeError);
        }
        match self.tag {
            Tag::UtcTime => Ok(TimeKind::Utc),
            Tag::GeneralizedTime => Ok(TimeKind::Generalized),
            _ => Err(CodecError::TypeError),
        }
    }

    fn expect(&self, tag: Tag) -> Result<(), CodecError> {
        if self.class == Class::Universal && self.tag == tag {
            Ok(())
        } else {
            Err(CodecError::TypeError)
        }
    }

    fn expect_int(&self) -> Result<(), CodecError> {
        if self.class == Class::Universal
            && (self.tag == Tag::Integer || self.tag == Tag::Enumerated)
        {
            Ok(())
        } else {
            Err(CodecError::TypeError)
        }
    }

    // -- codec entry points --------------------------------------------

    /// Decode a single BER object. See [`crate::ber::decode`].
    pub fn from_der(data: &[u8]) -> Result<Element, crate::error::Error> {
        crate::ber::decode(data)
    }

    /// Encode this element in strict DER. See [`crate::der::to_der`].
    pub fn to_der(&self) -> Vec<u8> {
        crate::der::to_der(self)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.content {
            Content::Primitive(v) => write!(
                f,
                "Element({:?} {:?} prim [{:?}])",
                self.class,
                self.tag,
                HexSlice { d: v }
            ),
            Content::Constructed(c) => {
                write!(f, "Element({:?} {:?} cons {:?})", self.class, self.tag, c)
            }
        }
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Content::Primitive(v) => write!(f, "Primitive({:?})", HexSlice { d: v }),
            Content::Constructed(c) => f.debug_tuple("Constructed").field(c).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_constructors() {
        assert_eq!(Element::boolean(true).to_der(), vec![0x01, 0x01, 0xff]);
        assert_eq!(
            Element::integer(&BigInt::from(65537)).to_der(),
            vec![0x02, 0x03, 0x01, 0x00, 0x01]
        );
        assert_eq!(Element::null().to_der(), vec![0x05, 0x00]);
    }

    #[test]
    fn test_accessor_type_errors() {
        let e = Element::boolean(true);
        assert_eq!(e.as_bigint(), Err(CodecError::TypeError));
        assert_eq!(e.children().err(), Some(CodecError::ConstructExpected));
        assert_eq!(e.as_bool(), Ok(true));
    }

    #[test]
    fn test_int_accessors() {
        let e = Element::integer(&BigInt::from(-128));
        assert_eq!(e.as_i64(), Ok(-128));
        assert_eq!(e.as_u64(), Err(CodecError::IntegerNegative));
        let e = Element::integer(&BigInt::from(u64::MAX));
        assert_eq!(e.as_u64(), Ok(u64::MAX));
        assert_eq!(e.as_i64(), Err(CodecError::IntegerTooLarge));
    }

    #[test]
    fn test_set_of_sorts_and_dedups() {
        let e = Element::set_of(vec![
            Element::octet_string(&b"\x02"[..]),
            Element::octet_string(&b"\x01"[..]),
            Element::octet_string(&b"\x02"[..]),
        ]);
        let children = e.children().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(&children[0].value().unwrap()[..], b"\x01");
        assert_eq!(&children[1].value().unwrap()[..], b"\x02");
    }

    #[test]
    fn test_set_der_duplicate() {
        let r = Element::set_der(vec![Element::boolean(true), Element::boolean(false)]);
        assert_eq!(r.err(), Some(CodecError::SetDuplicateTag));
        let e = Element::set_der(vec![
            Element::null(),
            Element::boolean(true),
        ])
        .unwrap();
        let tags: Vec<Tag> = e.children().unwrap().iter().map(|c| c.tag()).collect();
        assert_eq!(tags, vec![Tag::Boolean, Tag::Null]);
    }

    #[test]
    fn test_implicit_retag() {
        let e = Element::string(Charset::Ia5, "foo")
            .unwrap()
            .with_tag(Class::ContextSpecific, Tag(0));
        assert_eq!(e.to_der(), vec![0x80, 0x03, 0x66, 0x6f, 0x6f]);
    }
}
