use super::{Class, Length, Tag};
use crate::ber::parser::{parse_identifier, parse_length};
use crate::error::BerResult;

/// Identifier and length octets of one BER object
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Header {
    class: Class,
    constructed: bool,
    tag: Tag,
    length: Length,
}

impl Header {
    /// Read identifier and length octets off the front of `i`.
    pub(crate) fn parse(i: &[u8]) -> BerResult<'_, Header> {
        let (i, (class, constructed, tag)) = parse_identifier(i)?;
        let (i, length) = parse_length(i)?;
        Ok((
            i,
            Header {
                class,
                constructed,
                tag,
                length,
            },
        ))
    }

    #[inline]
    pub const fn class(&self) -> Class {
        self.class
    }

    #[inline]
    pub const fn tag(&self) -> Tag {
        self.tag
    }

    #[inline]
    pub const fn length(&self) -> Length {
        self.length
    }

    #[inline]
    pub const fn is_constructed(&self) -> bool {
        self.constructed
    }

    #[inline]
    pub const fn is_primitive(&self) -> bool {
        !self.constructed
    }
}
