//! Primitive value codecs
//!
//! Each universal primitive type has a decode side (tolerating the wire
//! laxities) and an encode side (canonical DER content). [`normalize`] is
//! the decoder's hook: it maps freshly read content octets to their
//! canonical form, so that every `Element` in a decoded tree already
//! carries DER content and re-encoding is a plain write.

pub mod strings;
pub mod time;

use crate::ber::Tag;
use crate::error::CodecError;
use crate::oid::Oid;
use bytes::Bytes;
use num_bigint::BigInt;

pub use strings::Charset;
pub use time::TimeKind;

/// Canonical content octets for a BOOLEAN.
pub fn encode_boolean(v: bool) -> &'static [u8] {
    if v {
        &[0xff]
    } else {
        &[0x00]
    }
}

/// Decode BOOLEAN content octets. Any non-zero octet is TRUE.
pub fn decode_boolean(bytes: &[u8]) -> Result<bool, CodecError> {
    match bytes {
        [0] => Ok(false),
        [_] => Ok(true),
        _ => Err(CodecError::InvalidBoolean),
    }
}

/// Decode INTEGER/ENUMERATED content octets as a signed big integer.
pub fn decode_integer(bytes: &[u8]) -> Result<BigInt, CodecError> {
    if bytes.is_empty() {
        return Err(CodecError::EmptyInteger);
    }
    Ok(BigInt::from_signed_bytes_be(bytes))
}

/// Minimal two's-complement content octets for an INTEGER/ENUMERATED.
pub fn encode_integer(n: &BigInt) -> Vec<u8> {
    let v = n.to_signed_bytes_be();
    if v.is_empty() {
        vec![0]
    } else {
        v
    }
}

/// Split BIT STRING content octets into (ignored-bit count, payload).
pub fn bit_string_parts(bytes: &[u8]) -> Result<(u8, &[u8]), CodecError> {
    let (&ignored, payload) = bytes.split_first().ok_or(CodecError::InvalidBitString)?;
    if ignored > 7 || (payload.is_empty() && ignored != 0) {
        return Err(CodecError::InvalidBitString);
    }
    Ok((ignored, payload))
}

/// Canonical BIT STRING content octets: the count octet followed by the
/// payload with the ignored bits forced to zero.
pub fn encode_bit_string(ignored: u8, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    if ignored > 7 || (payload.is_empty() && ignored != 0) {
        return Err(CodecError::InvalidBitString);
    }
    let mut out = Vec::with_capacity(payload.len() + 1);
    out.push(ignored);
    out.extend_from_slice(payload);
    if ignored > 0 {
        if let Some(last) = out.last_mut() {
            *last &= 0xffu8 << ignored;
        }
    }
    Ok(out)
}

fn normalize_integer(value: Bytes) -> Result<Bytes, CodecError> {
    if value.is_empty() {
        return Err(CodecError::EmptyInteger);
    }
    let mut skip = 0;
    while skip + 1 < value.len() {
        let (a, b) = (value[skip], value[skip + 1]);
        if (a == 0x00 && b < 0x80) || (a == 0xff && b >= 0x80) {
            skip += 1;
        } else {
            break;
        }
    }
    Ok(value.slice(skip..))
}

fn normalize_bit_string(value: Bytes) -> Result<Bytes, CodecError> {
    let (ignored, payload) = bit_string_parts(&value)?;
    if ignored == 0 {
        return Ok(value);
    }
    let mask = 0xffu8 << ignored;
    match payload.last() {
        Some(&last) if last & mask != last => {
            Ok(Bytes::from(encode_bit_string(ignored, payload)?))
        }
        _ => Ok(value),
    }
}

fn normalize_oid(value: Bytes) -> Result<Bytes, CodecError> {
    let oid = Oid::from_der_content(&value)?;
    let canonical = oid.to_der_content();
    if canonical[..] == value[..] {
        Ok(value)
    } else {
        Ok(Bytes::from(canonical))
    }
}

fn normalize_string(cs: Charset, value: Bytes) -> Result<Bytes, CodecError> {
    let s = strings::decode(cs, &value)?;
    let canonical = strings::encode(cs, &s)?;
    if canonical[..] == value[..] {
        Ok(value)
    } else {
        Ok(Bytes::from(canonical))
    }
}

fn check_time(kind: TimeKind, value: &[u8]) -> Result<(), CodecError> {
    let s = std::str::from_utf8(value).map_err(|_| CodecError::InvalidTime)?;
    time::parse(kind, s)?;
    Ok(())
}

/// Canonicalise freshly decoded content octets for a universal primitive
/// tag. Unknown universal tags pass through untouched; time strings are
/// validated but kept verbatim.
pub(crate) fn normalize(tag: Tag, value: Bytes) -> Result<Bytes, CodecError> {
    match tag {
        Tag::Boolean => {
            let b = decode_boolean(&value)?;
            Ok(Bytes::from_static(encode_boolean(b)))
        }
        Tag::Integer | Tag::Enumerated => normalize_integer(value),
        Tag::BitString => normalize_bit_string(value),
        Tag::Null => {
            if value.is_empty() {
                Ok(value)
            } else {
                Err(CodecError::InvalidNull)
            }
        }
        Tag::Oid => normalize_oid(value),
        Tag::UtcTime => {
            check_time(TimeKind::Utc, &value)?;
            Ok(value)
        }
        Tag::GeneralizedTime => {
            check_time(TimeKind::Generalized, &value)?;
            Ok(value)
        }
        _ => match Charset::for_tag(tag) {
            Some(cs) => normalize_string(cs, value),
            None => Ok(value),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean() {
        assert_eq!(decode_boolean(&[0x00]), Ok(false));
        assert_eq!(decode_boolean(&[0xff]), Ok(true));
        assert_eq!(decode_boolean(&[0x7f]), Ok(true));
        assert!(decode_boolean(&[]).is_err());
        assert!(decode_boolean(&[0, 0]).is_err());
    }

    #[test]
    fn test_integer_normalize() {
        let n = normalize_integer(Bytes::from_static(&[0x00, 0x7f])).unwrap();
        assert_eq!(&n[..], &[0x7f]);
        let n = normalize_integer(Bytes::from_static(&[0x00, 0xff])).unwrap();
        assert_eq!(&n[..], &[0x00, 0xff]);
        let n = normalize_integer(Bytes::from_static(&[0xff, 0xff, 0x80])).unwrap();
        assert_eq!(&n[..], &[0xff, 0x80]);
        let n = normalize_integer(Bytes::from_static(&[0x00, 0x00])).unwrap();
        assert_eq!(&n[..], &[0x00]);
    }

    #[test]
    fn test_integer_encode_minimal() {
        assert_eq!(encode_integer(&BigInt::from(0)), vec![0x00]);
        assert_eq!(encode_integer(&BigInt::from(127)), vec![0x7f]);
        assert_eq!(encode_integer(&BigInt::from(128)), vec![0x00, 0x80]);
        assert_eq!(encode_integer(&BigInt::from(-128)), vec![0x80]);
        assert_eq!(encode_integer(&BigInt::from(-129)), vec![0xff, 0x7f]);
    }

    #[test]
    fn test_bit_string_normalize() {
        // six ignored bits, dirty padding
        let n = normalize_bit_string(Bytes::from_static(&[0x06, 0x6e, 0x5d, 0xe3])).unwrap();
        assert_eq!(&n[..], &[0x06, 0x6e, 0x5d, 0xc0]);
        // clean padding is shared untouched
        let n = normalize_bit_string(Bytes::from_static(&[0x06, 0x6e, 0x5d, 0xc0])).unwrap();
        assert_eq!(&n[..], &[0x06, 0x6e, 0x5d, 0xc0]);
        assert!(normalize_bit_string(Bytes::from_static(&[0x08, 0x00])).is_err());
        assert!(normalize_bit_string(Bytes::from_static(&[])).is_err());
        assert!(normalize_bit_string(Bytes::from_static(&[0x01])).is_err());
    }

    #[test]
    fn test_normalize_unknown_universal() {
        let raw = Bytes::from_static(&[0x01, 0x02]);
        assert_eq!(normalize(Tag(9), raw.clone()).unwrap(), raw);
    }

    #[test]
    fn test_normalize_bmp_le() {
        let le = Bytes::from_static(&[0xff, 0xfe, 0x61, 0x00]);
        let n = normalize(Tag::BmpString, le).unwrap();
        assert_eq!(&n[..], &[0x00, 0x61]);
    }
}
