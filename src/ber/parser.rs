//! The BER decoder
//!
//! The decoder copies its input once into a reference-counted buffer;
//! every element of the resulting tree holds zero-copy slices of that one
//! buffer for its content octets and its memoised encoded span. Content
//! octets of universal primitive types are canonicalised while parsing, so
//! re-encoding a decoded tree always yields strict DER.

use crate::ber::{Class, Length, Tag};
use crate::codec;
use crate::element::Element;
use crate::error::{BerResult, CodecError, Error};
use bytes::Bytes;
use nom::bytes::complete::take;
use nom::number::complete::be_u8;

/// Depth cap for the recursive descent
pub const MAX_DEPTH: usize = 256;

/// Parse identifier octets: class, primitive/constructed bit, tag number.
///
/// High-tag-number form is accepted with non-minimal (leading 0x80)
/// continuation octets; the tag value itself is capped at [`Tag::MAX`].
pub(crate) fn parse_identifier(i: &[u8]) -> BerResult<'_, (Class, bool, Tag)> {
    let (mut i, b0) = be_u8(i)?;
    let class = Class::from_identifier(b0);
    let constructed = b0 & 0b0010_0000 != 0;
    let mut tag = u32::from(b0 & 0b0001_1111);
    if tag == 0x1f {
        tag = 0;
        loop {
            let (rem, b) = be_u8(i)?;
            i = rem;
            if tag > Tag::MAX >> 7 {
                return Err(CodecError::TagTooLarge.into());
            }
            tag = (tag << 7) | u32::from(b & 0x7f);
            if b & 0x80 == 0 {
                break;
            }
        }
    }
    Ok((i, (class, constructed, Tag(tag))))
}

/// Parse length octets: short form, long form (non-minimal tolerated) or
/// the indefinite marker. 0xff as the first octet is reserved (8.1.3.5).
pub(crate) fn parse_length(i: &[u8]) -> BerResult<'_, Length> {
    let (i, b0) = be_u8(i)?;
    match b0 {
        0x00..=0x7f => Ok((i, Length::Definite(usize::from(b0)))),
        0x80 => Ok((i, Length::Indefinite)),
        0xff => Err(CodecError::InvalidLength.into()),
        _ => {
            let (i, octets) = take(usize::from(b0 & 0x7f))(i)?;
            let mut len: u64 = 0;
            for &b in octets {
                if len > u64::MAX >> 8 {
                    return Err(CodecError::InvalidLength.into());
                }
                len = (len << 8) | u64::from(b);
            }
            let len = usize::try_from(len)
                .map_err(|_| nom::Err::Error(CodecError::InvalidLength))?;
            Ok((i, Length::Definite(len)))
        }
    }
}

/// Decode a single BER object occupying the whole input.
pub fn decode(data: &[u8]) -> Result<Element, Error> {
    let buf = Bytes::copy_from_slice(data);
    let decoder = Decoder { buf: &buf };
    let (rem, element) = decoder.parse_element(&buf, 0)?;
    if !rem.is_empty() {
        return Err(CodecError::TrailingBytes.into());
    }
    Ok(element)
}

struct Decoder<'a> {
    buf: &'a Bytes,
}

impl<'a> Decoder<'a> {
    fn offset(&self, rem: &[u8]) -> usize {
        self.buf.len() - rem.len()
    }

    fn parse_element<'i>(&self, i: &'i [u8], depth: usize) -> BerResult<'i, Element> {
        if depth >= MAX_DEPTH {
            return Err(CodecError::MaxDepthExceeded.into());
        }
        let start = self.offset(i);
        let (i, (class, constructed, tag)) = parse_identifier(i)?;
        if class == Class::Universal && tag == Tag::EndOfContent {
            // only the indefinite-length loop may consume one of these
            return Err(CodecError::UnexpectedEndOfContents.into());
        }
        let (i, length) = parse_length(i)?;
        if constructed {
            check_constructed(class, tag)?;
        } else {
            check_primitive(class, tag)?;
        }
        match length {
            Length::Definite(len) => {
                if len > i.len() {
                    return Err(CodecError::InvalidLength.into());
                }
                let (rest, content) = take(len)(i)?;
                let element = if constructed {
                    let children = self.parse_children(content, depth)?;
                    Element::constructed(class, tag, children)
                } else {
                    let value_start = self.offset(content);
                    let raw = self.buf.slice(value_start..value_start + len);
                    let value = if class == Class::Universal {
                        codec::normalize(tag, raw)?
                    } else {
                        raw
                    };
                    Element::primitive(class, tag, value)
                };
                let end = self.offset(rest);
                Ok((rest, element.with_source(self.buf.slice(start..end))))
            }
            Length::Indefinite => {
                if !constructed {
                    return Err(CodecError::IndefiniteLengthUnexpected.into());
                }
                let mut rem = i;
                let mut children = Vec::new();
                loop {
                    if rem.starts_with(&[0x00, 0x00]) {
                        rem = &rem[2..];
                        break;
                    }
                    if rem.is_empty() {
                        return Err(CodecError::Truncated.into());
                    }
                    let (r, child) = self.parse_element(rem, depth + 1)?;
                    children.push(child);
                    rem = r;
                }
                let end = self.offset(rem);
                let element = Element::constructed(class, tag, children)
                    .with_source(self.buf.slice(start..end));
                Ok((rem, element))
            }
        }
    }

    fn parse_children<'i>(
        &self,
        content: &'i [u8],
        depth: usize,
    ) -> Result<Vec<Element>, nom::Err<CodecError>> {
        let mut rem = content;
        let mut children = Vec::new();
        while !rem.is_empty() {
            let (r, child) = self.parse_element(rem, depth + 1)?;
            children.push(child);
            rem = r;
        }
        Ok(children)
    }
}

/// Universal SEQUENCE and SET must carry the constructed bit; every other
/// universal type must be primitive (constructed string segments are not
/// tolerated). Non-universal tags may use either form.
fn check_constructed(class: Class, tag: Tag) -> Result<(), nom::Err<CodecError>> {
    if class == Class::Universal && tag != Tag::Sequence && tag != Tag::Set {
        return Err(CodecError::ConstructUnexpected.into());
    }
    Ok(())
}

fn check_primitive(class: Class, tag: Tag) -> Result<(), nom::Err<CodecError>> {
    if class == Class::Universal && (tag == Tag::Sequence || tag == Tag::Set) {
        return Err(CodecError::ConstructExpected.into());
    }
    Ok(())
}
