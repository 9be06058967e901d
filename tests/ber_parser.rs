#[macro_use]
extern crate pretty_assertions;

#[macro_use]
extern crate hex_literal;

use der_text::ber::{decode, Class, Tag};
use der_text::{CodecError, Element, Error};
use num_bigint::BigInt;

#[test]
fn test_ber_bool() {
    assert_eq!(decode(&[0x01, 0x01, 0x00]).unwrap(), Element::boolean(false));
    assert_eq!(decode(&[0x01, 0x01, 0xff]).unwrap(), Element::boolean(true));
    // any non-zero octet is TRUE, normalised to 0xff
    let lax = decode(&[0x01, 0x01, 0x7f]).unwrap();
    assert_eq!(lax, Element::boolean(true));
    assert_eq!(lax.to_der(), vec![0x01, 0x01, 0xff]);
    assert_eq!(
        decode(&[0x01, 0x02, 0x12, 0x34]),
        Err(Error::Codec(CodecError::InvalidBoolean))
    );
}

#[test]
fn test_ber_int() {
    let obj = decode(&hex!("02 03 01 00 01")).unwrap();
    assert_eq!(obj.as_u64(), Ok(65537));
    assert_eq!(obj.as_bigint(), Ok(BigInt::from(65537)));
    // redundant leading octets are stripped while parsing
    let lax = decode(&hex!("02 03 00 00 7f")).unwrap();
    assert_eq!(lax.as_u64(), Ok(0x7f));
    assert_eq!(lax.to_der(), hex!("02 01 7f").to_vec());
    let neg = decode(&hex!("02 03 ff ff 80")).unwrap();
    assert_eq!(neg.as_i64(), Ok(-128));
    assert_eq!(neg.to_der(), hex!("02 01 80").to_vec());
    assert_eq!(
        decode(&hex!("02 00")),
        Err(Error::Codec(CodecError::EmptyInteger))
    );
}

#[test]
fn test_ber_bitstring_primitive() {
    let obj = decode(&hex!("03 07 04 0a 3b 5f 29 1c d0")).unwrap();
    assert_eq!(
        obj.bit_string_parts().unwrap(),
        (4, &hex!("0a 3b 5f 29 1c d0")[..])
    );
    // ignored bits may be dirty on input; they are zeroed while parsing
    let lax = decode(&hex!("03 04 06 6e 5d e0")).unwrap();
    assert_eq!(lax.bit_string_parts().unwrap(), (6, &hex!("6e 5d c0")[..]));
    assert_eq!(lax.to_der(), hex!("03 04 06 6e 5d c0").to_vec());
    // long form of length
    let obj = decode(&hex!("03 81 04 06 6e 5d c0")).unwrap();
    assert_eq!(obj.bit_string_parts().unwrap(), (6, &hex!("6e 5d c0")[..]));
    // out-of-range ignored count
    assert_eq!(
        decode(&hex!("03 02 08 00")),
        Err(Error::Codec(CodecError::InvalidBitString))
    );
}

#[test]
fn test_ber_bitstring_constructed_rejected() {
    let bytes = hex!("23 80 03 03 00 0a 3b 03 05 04 5f 29 1c d0 00 00");
    assert_eq!(
        decode(&bytes),
        Err(Error::Codec(CodecError::ConstructUnexpected))
    );
}

#[test]
fn test_ber_octetstring() {
    let obj = decode(&hex!("04 05 41 41 41 41 41")).unwrap();
    assert_eq!(&obj.value().unwrap()[..], b"AAAAA");
}

#[test]
fn test_ber_null() {
    assert_eq!(decode(&[0x05, 0x00]).unwrap(), Element::null());
    assert_eq!(
        decode(&[0x05, 0x01, 0x00]),
        Err(Error::Codec(CodecError::InvalidNull))
    );
}

#[test]
fn test_ber_oid() {
    let obj = decode(&hex!("06 09 2a 86 48 86 f7 0d 01 01 05")).unwrap();
    assert_eq!(obj.as_oid().unwrap().to_string(), "1.2.840.113549.1.1.5");
    assert_eq!(
        decode(&hex!("06 02 2a 86")),
        Err(Error::Codec(CodecError::InvalidOid))
    );
}

#[test]
fn test_seq_indefinite_length() {
    let data = hex!("30 80 04 03 56 78 90 00 00");
    let obj = decode(&data).unwrap();
    assert_eq!(
        obj,
        Element::sequence(vec![Element::octet_string(&hex!("56 78 90")[..])])
    );
    // re-encoding uses a definite length
    assert_eq!(obj.to_der(), hex!("30 05 04 03 56 78 90").to_vec());
}

#[test]
fn test_set_indefinite_length() {
    let data = hex!("31 80 04 03 56 78 90 00 00");
    let obj = decode(&data).unwrap();
    assert_eq!(
        obj,
        Element::set(vec![Element::octet_string(&hex!("56 78 90")[..])])
    );
}

#[test]
fn test_indefinite_primitive_rejected() {
    assert_eq!(
        decode(&hex!("04 80 00 00")),
        Err(Error::Codec(CodecError::IndefiniteLengthUnexpected))
    );
}

#[test]
fn test_unexpected_end_of_contents() {
    assert_eq!(
        decode(&hex!("30 02 00 00")),
        Err(Error::Codec(CodecError::UnexpectedEndOfContents))
    );
}

#[test]
fn test_missing_end_of_contents() {
    assert_eq!(
        decode(&hex!("30 80 04 01 56")),
        Err(Error::Codec(CodecError::Truncated))
    );
}

#[test]
fn test_form_bit_enforced() {
    // SEQUENCE with the primitive form
    assert_eq!(
        decode(&hex!("10 01 00")),
        Err(Error::Codec(CodecError::ConstructExpected))
    );
    // INTEGER with the constructed form
    assert_eq!(
        decode(&hex!("22 00")),
        Err(Error::Codec(CodecError::ConstructUnexpected))
    );
}

#[test]
fn test_trailing_bytes() {
    assert_eq!(
        decode(&hex!("05 00 01 01 ff")),
        Err(Error::Codec(CodecError::TrailingBytes))
    );
}

#[test]
fn test_length_beyond_buffer() {
    assert_eq!(
        decode(&hex!("30 05 02 01 2a")),
        Err(Error::Codec(CodecError::InvalidLength))
    );
    assert_eq!(
        decode(&hex!("02 03 01 00")),
        Err(Error::Codec(CodecError::InvalidLength))
    );
}

#[test]
fn test_high_tag_number() {
    let obj = decode(&hex!("5f 1f 01 aa")).unwrap();
    assert_eq!(obj.class(), Class::Application);
    assert_eq!(obj.tag(), Tag(31));
    assert_eq!(&obj.value().unwrap()[..], &[0xaa]);
    // non-minimal identifier is accepted, re-encoded minimally
    let lax = decode(&hex!("5f 80 1f 01 aa")).unwrap();
    assert_eq!(lax.tag(), Tag(31));
    assert_eq!(lax.to_der(), hex!("5f 1f 01 aa").to_vec());
}

#[test]
fn test_context_constructed_descends() {
    let data = hex!("a0 03 02 01 02");
    let obj = decode(&data).unwrap();
    assert_eq!(obj.class(), Class::ContextSpecific);
    assert!(obj.is_constructed());
    assert_eq!(obj.children().unwrap().len(), 1);
    assert_eq!(obj.children().unwrap()[0].as_u32(), Ok(2));
}

#[test]
fn test_source_memoised() {
    let data = hex!("30 06 02 01 2a 01 01 ff");
    let obj = decode(&data).unwrap();
    assert_eq!(&obj.source().unwrap()[..], &data[..]);
    assert_eq!(&obj.children().unwrap()[0].source().unwrap()[..], &data[2..5]);
    // built elements carry no source
    assert!(Element::boolean(true).source().is_none());
}

#[test]
fn test_string_normalisation() {
    // UTF-8 BOM is stripped
    let obj = decode(&hex!("0c 06 ef bb bf 66 6f 6f")).unwrap();
    assert_eq!(obj.as_str().unwrap(), "foo");
    assert_eq!(obj.to_der(), hex!("0c 03 66 6f 6f").to_vec());
    // little-endian BMP with BOM becomes big-endian without
    let obj = decode(&hex!("1e 04 ff fe 61 00")).unwrap();
    assert_eq!(obj.as_str().unwrap(), "a");
    assert_eq!(obj.to_der(), hex!("1e 02 00 61").to_vec());
    // charset violations fail
    assert_eq!(
        decode(&hex!("12 01 41")),
        Err(Error::Codec(CodecError::StringInvalidCharset))
    );
}

#[test]
fn test_time_validation() {
    let obj = decode(b"\x17\x0d170822063935Z").unwrap();
    assert_eq!(obj.time_string().unwrap(), "170822063935Z");
    assert!(obj.as_datetime().is_ok());
    assert_eq!(
        decode(b"\x17\x01X"),
        Err(Error::Codec(CodecError::InvalidTime))
    );
}

#[test]
fn test_depth_bound() {
    // 300 nested indefinite-length sequences around a NULL
    let mut data = Vec::new();
    for _ in 0..300 {
        data.extend_from_slice(&[0x30, 0x80]);
    }
    data.extend_from_slice(&[0x05, 0x00]);
    for _ in 0..300 {
        data.extend_from_slice(&[0x00, 0x00]);
    }
    assert_eq!(
        decode(&data),
        Err(Error::Codec(CodecError::MaxDepthExceeded))
    );
}

#[test]
fn test_unknown_universal_primitive_kept_raw() {
    // REAL (tag 9) is not interpreted; content is kept verbatim
    let obj = decode(&hex!("09 03 80 fb 05")).unwrap();
    assert_eq!(obj.tag(), Tag(9));
    assert_eq!(&obj.value().unwrap()[..], &hex!("80 fb 05")[..]);
    assert_eq!(obj.to_der(), hex!("09 03 80 fb 05").to_vec());
}
