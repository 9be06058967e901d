//! The DER encoder
//!
//! Encoding is infallible: ordering disciplines (SET OF, DER SET) and
//! value canonicalisation are applied when an [`Element`] is constructed,
//! so emission is a plain depth-first write of minimal identifier and
//! length octets around the stored content.

use crate::ber::{Class, Tag};
use crate::element::{Content, Element};

/// Encode an element in strict DER.
pub fn to_der(element: &Element) -> Vec<u8> {
    let mut out = Vec::new();
    write_element(element, &mut out);
    out
}

fn write_element(element: &Element, out: &mut Vec<u8>) {
    match element.content() {
        Content::Primitive(value) => {
            write_header(
                element.class(),
                false,
                element.tag(),
                value.len(),
                out,
            );
            out.extend_from_slice(value);
        }
        Content::Constructed(children) => {
            let mut body = Vec::new();
            for child in children {
                write_element(child, &mut body);
            }
            write_header(element.class(), true, element.tag(), body.len(), out);
            out.extend_from_slice(&body);
        }
    }
}

fn write_header(class: Class, constructed: bool, tag: Tag, len: usize, out: &mut Vec<u8>) {
    write_identifier(class, constructed, tag, out);
    write_length(len, out);
}

/// Minimal identifier octets: low-tag form below 31, high-tag base-128
/// continuation form otherwise.
fn write_identifier(class: Class, constructed: bool, tag: Tag, out: &mut Vec<u8>) {
    let leading = class.bits() | if constructed { 0x20 } else { 0x00 };
    let value = tag.0;
    if value < 31 {
        out.push(leading | value as u8);
    } else {
        out.push(leading | 0x1f);
        let mut shift = (31 - value.leading_zeros()) / 7 * 7;
        while shift > 0 {
            out.push(0x80 | ((value >> shift) & 0x7f) as u8);
            shift -= 7;
        }
        out.push((value & 0x7f) as u8);
    }
}

/// Minimal length octets: short form below 128, otherwise the shortest
/// long form.
fn write_length(len: usize, out: &mut Vec<u8>) {
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let octets = len.to_be_bytes();
        let skip = octets.iter().take_while(|&&b| b == 0).count();
        out.push(0x80 | (octets.len() - skip) as u8);
        out.extend_from_slice(&octets[skip..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use num_bigint::BigInt;

    #[test]
    fn test_write_identifier_forms() {
        let mut out = Vec::new();
        write_identifier(Class::Universal, false, Tag::Boolean, &mut out);
        assert_eq!(out, vec![0x01]);
        out.clear();
        write_identifier(Class::ContextSpecific, true, Tag(0), &mut out);
        assert_eq!(out, vec![0xa0]);
        out.clear();
        write_identifier(Class::Universal, false, Tag(31), &mut out);
        assert_eq!(out, vec![0x1f, 0x1f]);
        out.clear();
        write_identifier(Class::Application, true, Tag(0xa3), &mut out);
        assert_eq!(out, vec![0x7f, 0x81, 0x23]);
    }

    #[test]
    fn test_write_length_forms() {
        let mut out = Vec::new();
        write_length(0x7f, &mut out);
        assert_eq!(out, vec![0x7f]);
        out.clear();
        write_length(0x80, &mut out);
        assert_eq!(out, vec![0x81, 0x80]);
        out.clear();
        write_length(0x1234, &mut out);
        assert_eq!(out, vec![0x82, 0x12, 0x34]);
    }

    #[test]
    fn test_nested_encoding() {
        let e = Element::sequence(vec![
            Element::integer(&BigInt::from(65537)),
            Element::boolean(false),
        ]);
        assert_eq!(
            to_der(&e),
            vec![0x30, 0x08, 0x02, 0x03, 0x01, 0x00, 0x01, 0x01, 0x01, 0x00]
        );
    }
}
