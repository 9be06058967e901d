//! Character-set codecs for the restricted and unrestricted string types
//!
//! Decoding tolerates the laxities listed for the wire format: a leading
//! BOM in UTF8/BMP/Universal strings, little-endian BMP/Universal when the
//! BOM says so, and surrogate pairs smuggled into UTF8/Universal content.
//! Encoding always produces the canonical big-endian, BOM-less form with
//! no surrogates.

use crate::ber::Tag;
use crate::error::CodecError;

/// The eight supported character sets
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Charset {
    Numeric,
    Printable,
    Ia5,
    Teletex,
    General,
    Utf8,
    Bmp,
    Universal,
}

impl Charset {
    /// Universal tag of the string type using this character set.
    pub fn tag(self) -> Tag {
        match self {
            Charset::Numeric => Tag::NumericString,
            Charset::Printable => Tag::PrintableString,
            Charset::Ia5 => Tag::Ia5String,
            Charset::Teletex => Tag::TeletexString,
            Charset::General => Tag::GeneralString,
            Charset::Utf8 => Tag::Utf8String,
            Charset::Bmp => Tag::BmpString,
            Charset::Universal => Tag::UniversalString,
        }
    }

    /// Character set of a universal string tag, if it is one.
    pub fn for_tag(tag: Tag) -> Option<Charset> {
        match tag {
            Tag::NumericString => Some(Charset::Numeric),
            Tag::PrintableString => Some(Charset::Printable),
            Tag::Ia5String => Some(Charset::Ia5),
            Tag::TeletexString => Some(Charset::Teletex),
            Tag::GeneralString => Some(Charset::General),
            Tag::Utf8String => Some(Charset::Utf8),
            Tag::BmpString => Some(Charset::Bmp),
            Tag::UniversalString => Some(Charset::Universal),
            _ => None,
        }
    }
}

fn is_printable_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b" '()+,-./:=?".contains(&b)
}

/// Decode content octets into a string, enforcing the character set.
pub fn decode(cs: Charset, bytes: &[u8]) -> Result<String, CodecError> {
    match cs {
        Charset::Numeric => {
            if !bytes.iter().all(|&b| b.is_ascii_digit() || b == b' ') {
                return Err(CodecError::StringInvalidCharset);
            }
            Ok(bytes.iter().map(|&b| b as char).collect())
        }
        Charset::Printable => {
            if !bytes.iter().all(|&b| is_printable_char(b)) {
                return Err(CodecError::StringInvalidCharset);
            }
            Ok(bytes.iter().map(|&b| b as char).collect())
        }
        Charset::Ia5 => {
            if !bytes.iter().all(|&b| b < 0x80) {
                return Err(CodecError::StringInvalidCharset);
            }
            Ok(bytes.iter().map(|&b| b as char).collect())
        }
        // Teletex and General content is treated as latin-1 by convention
        Charset::Teletex | Charset::General => Ok(bytes.iter().map(|&b| b as char).collect()),
        Charset::Utf8 => decode_utf8(bytes),
        Charset::Bmp => decode_units(bytes, 2),
        Charset::Universal => decode_units(bytes, 4),
    }
}

/// Encode a string into canonical content octets for the character set.
pub fn encode(cs: Charset, s: &str) -> Result<Vec<u8>, CodecError> {
    match cs {
        Charset::Numeric => {
            if !s.bytes().all(|b| b.is_ascii_digit() || b == b' ') {
                return Err(CodecError::StringInvalidCharset);
            }
            Ok(s.as_bytes().to_vec())
        }
        Charset::Printable => {
            if !s.bytes().all(is_printable_char) {
                return Err(CodecError::StringInvalidCharset);
            }
            Ok(s.as_bytes().to_vec())
        }
        Charset::Ia5 => {
            if !s.bytes().all(|b| b < 0x80) {
                return Err(CodecError::StringInvalidCharset);
            }
            Ok(s.as_bytes().to_vec())
        }
        Charset::Teletex | Charset::General => s
            .chars()
            .map(|c| {
                u8::try_from(u32::from(c)).map_err(|_| CodecError::StringInvalidCharset)
            })
            .collect(),
        Charset::Utf8 => Ok(s.as_bytes().to_vec()),
        Charset::Bmp => {
            let mut out = Vec::with_capacity(s.len() * 2);
            for unit in s.encode_utf16() {
                out.extend_from_slice(&unit.to_be_bytes());
            }
            Ok(out)
        }
        Charset::Universal => {
            let mut out = Vec::with_capacity(s.len() * 4);
            for c in s.chars() {
                out.extend_from_slice(&u32::from(c).to_be_bytes());
            }
            Ok(out)
        }
    }
}

const fn is_high_surrogate(v: u32) -> bool {
    v >= 0xd800 && v < 0xdc00
}

const fn is_low_surrogate(v: u32) -> bool {
    v >= 0xdc00 && v < 0xe000
}

/// Combine a stream of code-point values that may contain UTF-16 surrogate
/// pairs into chars.
fn combine_surrogates<I>(values: I) -> Result<String, CodecError>
where
    I: IntoIterator<Item = u32>,
{
    let mut out = String::new();
    let mut pending: Option<u32> = None;
    for v in values {
        match pending.take() {
            Some(high) => {
                if !is_low_surrogate(v) {
                    return Err(CodecError::StringInvalidCharset);
                }
                let cp = 0x10000 + ((high - 0xd800) << 10) + (v - 0xdc00);
                out.push(char::from_u32(cp).ok_or(CodecError::StringInvalidCharset)?);
            }
            None => {
                if is_high_surrogate(v) {
                    pending = Some(v);
                } else if is_low_surrogate(v) {
                    return Err(CodecError::StringInvalidCharset);
                } else {
                    out.push(char::from_u32(v).ok_or(CodecError::StringInvalidCharset)?);
                }
            }
        }
    }
    if pending.is_some() {
        return Err(CodecError::StringInvalidCharset);
    }
    Ok(out)
}

/// UTF-8 decoder that strips a leading U+FEFF BOM and reassembles
/// CESU-8-style surrogate pairs up to U+10FFFF.
fn decode_utf8(bytes: &[u8]) -> Result<String, CodecError> {
    let mut values = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        let (len, mut cp) = if b0 < 0x80 {
            (1, u32::from(b0))
        } else if b0 & 0xe0 == 0xc0 {
            (2, u32::from(b0 & 0x1f))
        } else if b0 & 0xf0 == 0xe0 {
            (3, u32::from(b0 & 0x0f))
        } else if b0 & 0xf8 == 0xf0 {
            (4, u32::from(b0 & 0x07))
        } else {
            return Err(CodecError::StringInvalidCharset);
        };
        if i + len > bytes.len() {
            return Err(CodecError::StringInvalidCharset);
        }
        for &b in &bytes[i + 1..i + len] {
            if b & 0xc0 != 0x80 {
                return Err(CodecError::StringInvalidCharset);
            }
            cp = (cp << 6) | u32::from(b & 0x3f);
        }
        // reject overlong forms; surrogate values pass through and are
        // paired up afterwards
        let min = match len {
            1 => 0,
            2 => 0x80,
            3 => 0x800,
            _ => 0x10000,
        };
        if cp < min || cp > 0x10ffff {
            return Err(CodecError::StringInvalidCharset);
        }
        values.push(cp);
        i += len;
    }
    if values.first() == Some(&0xfeff) {
        values.remove(0);
    }
    combine_surrogates(values)
}

/// Shared BMP (16-bit) / Universal (32-bit) decoder: optional BOM, optional
/// little-endian order when the BOM says so, surrogate reassembly.
fn decode_units(bytes: &[u8], width: usize) -> Result<String, CodecError> {
    if bytes.len() % width != 0 {
        return Err(CodecError::StringInvalidCharset);
    }
    let read_be = |chunk: &[u8]| -> u32 {
        chunk.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
    };
    let read_le = |chunk: &[u8]| -> u32 {
        chunk.iter().rev().fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
    };
    let mut chunks = bytes.chunks(width);
    let mut little_endian = false;
    let mut first: Option<u32> = None;
    if let Some(head) = chunks.next() {
        match read_be(head) {
            0xfeff => (),
            v if read_le(head) == 0xfeff && v != 0xfeff => little_endian = true,
            v => first = Some(v),
        }
    }
    let rest = chunks.map(|c| if little_endian { read_le(c) } else { read_be(c) });
    combine_surrogates(first.into_iter().chain(rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_charset() {
        assert_eq!(decode(Charset::Printable, b"Able '()").unwrap(), "Able '()");
        assert_eq!(
            decode(Charset::Printable, b"not@ok"),
            Err(CodecError::StringInvalidCharset)
        );
        assert!(encode(Charset::Printable, "a*b").is_err());
    }

    #[test]
    fn test_ia5_charset() {
        assert_eq!(decode(Charset::Ia5, b"a\x7f").unwrap(), "a\x7f");
        assert!(decode(Charset::Ia5, b"\x80").is_err());
    }

    #[test]
    fn test_latin1() {
        assert_eq!(decode(Charset::Teletex, &[0x63, 0xe9]).unwrap(), "c\u{e9}");
        assert_eq!(encode(Charset::Teletex, "c\u{e9}").unwrap(), vec![0x63, 0xe9]);
        assert!(encode(Charset::General, "\u{100}").is_err());
    }

    #[test]
    fn test_utf8_bom_and_surrogates() {
        assert_eq!(decode(Charset::Utf8, b"\xef\xbb\xbfabc").unwrap(), "abc");
        // U+1F600 as a CESU-8 surrogate pair: D83D DE00
        let cesu = [0xed, 0xa0, 0xbd, 0xed, 0xb8, 0x80];
        assert_eq!(decode(Charset::Utf8, &cesu).unwrap(), "\u{1f600}");
        // lone high surrogate
        assert!(decode(Charset::Utf8, &cesu[..3]).is_err());
        // canonical form survives untouched
        assert_eq!(decode(Charset::Utf8, "\u{1f600}".as_bytes()).unwrap(), "\u{1f600}");
    }

    #[test]
    fn test_bmp() {
        let be = [0x00, 0x61, 0x30, 0x42];
        assert_eq!(decode(Charset::Bmp, &be).unwrap(), "a\u{3042}");
        let with_bom = [0xfe, 0xff, 0x00, 0x61];
        assert_eq!(decode(Charset::Bmp, &with_bom).unwrap(), "a");
        let le_bom = [0xff, 0xfe, 0x61, 0x00];
        assert_eq!(decode(Charset::Bmp, &le_bom).unwrap(), "a");
        assert_eq!(encode(Charset::Bmp, "a\u{3042}").unwrap(), be.to_vec());
        // surrogate pair for U+1F600
        let pair = [0xd8, 0x3d, 0xde, 0x00];
        assert_eq!(decode(Charset::Bmp, &pair).unwrap(), "\u{1f600}");
        assert!(decode(Charset::Bmp, &[0x00]).is_err());
    }

    #[test]
    fn test_universal() {
        let be = [0x00, 0x00, 0x00, 0x61, 0x00, 0x01, 0xf6, 0x00];
        assert_eq!(decode(Charset::Universal, &be).unwrap(), "a\u{1f600}");
        assert_eq!(encode(Charset::Universal, "a\u{1f600}").unwrap(), be.to_vec());
        let le_bom = [0xff, 0xfe, 0x00, 0x00, 0x61, 0x00, 0x00, 0x00];
        assert_eq!(decode(Charset::Universal, &le_bom).unwrap(), "a");
    }
}
