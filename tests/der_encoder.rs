#[macro_use]
extern crate pretty_assertions;

#[macro_use]
extern crate hex_literal;

use der_text::ber::{decode, Class, Tag};
use der_text::{CodecError, Element};
use num_bigint::BigInt;

/// Strict DER vectors must survive a decode/encode round trip unchanged.
#[test]
fn test_roundtrip_strict_der() {
    let vectors: &[&[u8]] = &[
        &hex!("01 01 ff"),
        &hex!("02 01 00"),
        &hex!("02 09 00 ff ff ff ff ff ff ff ff"),
        &hex!("03 04 06 6e 5d c0"),
        &hex!("04 00"),
        &hex!("05 00"),
        &hex!("06 03 55 04 03"),
        &hex!("0c 06 48 65 6c 6c c3 b6"),
        &hex!("13 02 43 4e"),
        &hex!("30 0a 02 03 01 00 01 02 03 01 00 00"),
        &hex!("31 06 04 01 01 04 01 02"),
        &hex!("a0 03 02 01 02"),
        &hex!("30 0d 06 09 2a 86 48 86 f7 0d 01 01 05 05 00"),
        b"\x17\x0d170822063935Z",
        b"\x18\x0f20170822063935Z",
    ];
    for &bytes in vectors {
        let obj = decode(bytes).unwrap_or_else(|e| panic!("decode {:02x?}: {}", bytes, e));
        assert_eq!(obj.to_der(), bytes.to_vec(), "roundtrip {:02x?}", bytes);
    }
}

/// Long content (two length octets) round trips.
#[test]
fn test_roundtrip_long_length() {
    let payload = vec![0x5a; 300];
    let mut bytes = hex!("04 82 01 2c").to_vec();
    bytes.extend_from_slice(&payload);
    let obj = decode(&bytes).unwrap();
    assert_eq!(obj.to_der(), bytes);
}

/// Every tolerated BER variant encodes back to the canonical DER form.
#[test]
fn test_canonicalisation_of_lax_input() {
    let cases: &[(&[u8], &[u8])] = &[
        // BOOLEAN TRUE with a non-0xff payload
        (&hex!("01 01 7f"), &hex!("01 01 ff")),
        // non-minimal length
        (&hex!("01 81 01 ff"), &hex!("01 01 ff")),
        (&hex!("02 82 00 01 2a"), &hex!("02 01 2a")),
        // redundant integer sign octets
        (&hex!("02 02 00 2a"), &hex!("02 01 2a")),
        (&hex!("02 03 ff ff 80"), &hex!("02 01 80")),
        // dirty ignored bits
        (&hex!("03 04 06 6e 5d e3"), &hex!("03 04 06 6e 5d c0")),
        // indefinite length
        (
            &hex!("30 80 04 03 56 78 90 00 00"),
            &hex!("30 05 04 03 56 78 90"),
        ),
        // non-minimal OID component encoding
        (&hex!("06 04 55 04 80 03"), &hex!("06 03 55 04 03")),
        // non-minimal tag number encoding
        (&hex!("5f 80 1f 01 aa"), &hex!("5f 1f 01 aa")),
        // UTF-8 BOM
        (&hex!("0c 06 ef bb bf 66 6f 6f"), &hex!("0c 03 66 6f 6f")),
        // little-endian BMP with BOM
        (&hex!("1e 04 ff fe 61 00"), &hex!("1e 02 00 61")),
        // big-endian BMP with BOM
        (&hex!("1e 04 fe ff 00 61"), &hex!("1e 02 00 61")),
        // CESU-8 surrogate pair reassembled to a 4-byte sequence
        (
            &hex!("0c 06 ed a0 bd ed b8 80"),
            &hex!("0c 04 f0 9f 98 80"),
        ),
    ];
    for &(lax, canonical) in cases {
        let obj = decode(lax).unwrap_or_else(|e| panic!("decode {:02x?}: {}", lax, e));
        assert_eq!(obj.to_der(), canonical.to_vec(), "canonical {:02x?}", lax);
        // and the canonical form is a fixed point
        let again = decode(canonical).unwrap();
        assert_eq!(again.to_der(), canonical.to_vec());
        assert_eq!(obj, again);
    }
}

#[test]
fn test_high_tag_encoding() {
    let obj = Element::primitive(Class::Private, Tag(1_000_000), &b"x"[..]);
    let der = obj.to_der();
    assert_eq!(der, hex!("df bd 84 40 01 78").to_vec());
    assert_eq!(decode(&der).unwrap(), obj);
}

#[test]
fn test_set_of_reordering_is_deterministic() {
    let a = Element::set_of(vec![
        Element::integer(&BigInt::from(300)),
        Element::boolean(false),
        Element::octet_string(&b"\x01"[..]),
    ]);
    let b = Element::set_of(vec![
        Element::octet_string(&b"\x01"[..]),
        Element::boolean(false),
        Element::integer(&BigInt::from(300)),
    ]);
    assert_eq!(a.to_der(), b.to_der());
}

#[test]
fn test_set_der_duplicate_tag_fails() {
    assert_eq!(
        Element::set_der(vec![
            Element::integer(&BigInt::from(1)),
            Element::integer(&BigInt::from(2)),
        ])
        .err(),
        Some(CodecError::SetDuplicateTag)
    );
}

#[test]
fn test_set_der_orders_by_class_then_tag() {
    let obj = Element::set_der(vec![
        Element::octet_string(&b"x"[..]).with_tag(Class::ContextSpecific, Tag(0)),
        Element::oid(&"2.5.4.3".parse().unwrap()),
        Element::integer(&BigInt::from(5)),
    ])
    .unwrap();
    let tags: Vec<(Class, Tag)> = obj
        .children()
        .unwrap()
        .iter()
        .map(|c| (c.class(), c.tag()))
        .collect();
    assert_eq!(
        tags,
        vec![
            (Class::Universal, Tag::Integer),
            (Class::Universal, Tag::Oid),
            (Class::ContextSpecific, Tag(0)),
        ]
    );
}

#[test]
fn test_oid_first_pair_rule() {
    assert_eq!(
        "1.40.1".parse::<der_text::Oid>().err(),
        Some(CodecError::OidFirstPair)
    );
    assert_eq!(
        "4.1".parse::<der_text::Oid>().err(),
        Some(CodecError::OidFirstPair)
    );
}

#[test]
fn test_decode_encode_equals_fresh_build() {
    let decoded = decode(&hex!("30 06 02 01 2a 01 01 ff")).unwrap();
    let built = Element::sequence(vec![
        Element::integer(&BigInt::from(42)),
        Element::boolean(true),
    ]);
    assert_eq!(decoded, built);
    assert_eq!(decoded.to_der(), built.to_der());
}
