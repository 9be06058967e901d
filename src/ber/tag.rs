use core::fmt;

/// BER/DER tag number, as defined in X.680 section 8.4
///
/// Tag values are capped at `2^31 - 1`; larger values are rejected by the
/// decoder with `CodecError::TagTooLarge`.
#[derive(Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Tag(pub u32);

impl Tag {
    pub const EndOfContent: Tag = Tag(0x00);
    pub const Boolean: Tag = Tag(0x01);
    pub const Integer: Tag = Tag(0x02);
    pub const BitString: Tag = Tag(0x03);
    pub const OctetString: Tag = Tag(0x04);
    pub const Null: Tag = Tag(0x05);
    pub const Oid: Tag = Tag(0x06);
    pub const Enumerated: Tag = Tag(0x0a);
    pub const Utf8String: Tag = Tag(0x0c);
    pub const Sequence: Tag = Tag(0x10);
    pub const Set: Tag = Tag(0x11);
    pub const NumericString: Tag = Tag(0x12);
    pub const PrintableString: Tag = Tag(0x13);
    pub const TeletexString: Tag = Tag(0x14);
    pub const Ia5String: Tag = Tag(0x16);
    pub const UtcTime: Tag = Tag(0x17);
    pub const GeneralizedTime: Tag = Tag(0x18);
    pub const GeneralString: Tag = Tag(0x1b);
    pub const UniversalString: Tag = Tag(0x1c);
    pub const BmpString: Tag = Tag(0x1e);

    /// Largest supported tag value.
    pub const MAX: u32 = 0x7fff_ffff;

    /// Name of a known universal tag, if any.
    pub const fn universal_name(self) -> Option<&'static str> {
        match self {
            Tag::EndOfContent => Some("END-OF-CONTENT"),
            Tag::Boolean => Some("BOOLEAN"),
            Tag::Integer => Some("INTEGER"),
            Tag::BitString => Some("BIT STRING"),
            Tag::OctetString => Some("OCTET STRING"),
            Tag::Null => Some("NULL"),
            Tag::Oid => Some("OBJECT IDENTIFIER"),
            Tag::Enumerated => Some("ENUMERATED"),
            Tag::Utf8String => Some("UTF8String"),
            Tag::Sequence => Some("SEQUENCE"),
            Tag::Set => Some("SET"),
            Tag::NumericString => Some("NumericString"),
            Tag::PrintableString => Some("PrintableString"),
            Tag::TeletexString => Some("TeletexString"),
            Tag::Ia5String => Some("IA5String"),
            Tag::UtcTime => Some("UTCTime"),
            Tag::GeneralizedTime => Some("GeneralizedTime"),
            Tag::GeneralString => Some("GeneralString"),
            Tag::UniversalString => Some("UniversalString"),
            Tag::BmpString => Some("BMPString"),
            _ => None,
        }
    }
}

impl From<u32> for Tag {
    fn from(v: u32) -> Self {
        Tag(v)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.universal_name() {
            Some(name) => write!(f, "Tag({} [{}])", self.0, name),
            None => write!(f, "Tag({})", self.0),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
