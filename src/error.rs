//! Error types for the binary codec and the text format

use crate::ber::{Class, Tag};
use displaydoc::Display;
use nom::error::{ErrorKind, FromExternalError, ParseError};
use nom::IResult;
use thiserror::Error;

/// Holds the result of the internal nom-based decoding functions
///
/// `O` is the output type. This type is a wrapper around nom's `IResult`.
pub(crate) type BerResult<'a, O> = IResult<&'a [u8], O, CodecError>;

/// Errors raised while decoding BER or producing DER
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum CodecError {
    /// invalid tag encoding
    InvalidTag,
    /// tag value too large
    TagTooLarge,
    /// invalid length encoding or value
    InvalidLength,
    /// input truncated
    Truncated,
    /// trailing bytes after object
    TrailingBytes,
    /// indefinite length on a primitive element
    IndefiniteLengthUnexpected,
    /// unexpected end-of-contents marker
    UnexpectedEndOfContents,
    /// element was expected to be constructed
    ConstructExpected,
    /// element was expected to be primitive
    ConstructUnexpected,
    /// maximum nesting depth exceeded
    MaxDepthExceeded,
    /// boolean content must be a single octet
    InvalidBoolean,
    /// integer content must be at least one octet
    EmptyInteger,
    /// integer too large to fit in a native type
    IntegerTooLarge,
    /// integer is negative, while an unsigned value was requested
    IntegerNegative,
    /// null content must be empty
    InvalidNull,
    /// bit string ignored-bit count out of range
    InvalidBitString,
    /// malformed object identifier
    InvalidOid,
    /// object identifier first pair out of range
    OidFirstPair,
    /// string content violates its character set
    StringInvalidCharset,
    /// malformed time value
    InvalidTime,
    /// year outside the supported range 1..=9999
    YearOutOfRange,
    /// duplicate tag in DER set
    SetDuplicateTag,
    /// element does not have the expected type
    TypeError,
    /// error raised by the underlying parser: {0:?}
    Nom(ErrorKind),
}

impl From<CodecError> for nom::Err<CodecError> {
    #[inline]
    fn from(e: CodecError) -> nom::Err<CodecError> {
        nom::Err::Error(e)
    }
}

impl<I> ParseError<I> for CodecError {
    fn from_error_kind(_input: I, kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Eof => CodecError::Truncated,
            _ => CodecError::Nom(kind),
        }
    }
    fn append(_input: I, kind: ErrorKind, _other: Self) -> Self {
        CodecError::Nom(kind)
    }
}

impl<I, E> FromExternalError<I, E> for CodecError {
    fn from_external_error(_input: I, kind: ErrorKind, _e: E) -> CodecError {
        CodecError::Nom(kind)
    }
}

/// Syntax or parameter error in the text format
///
/// `offset` is the byte offset into the spec text where the error was
/// detected. Parameter errors raised while interpreting a spec reuse the
/// offset of the token that referenced the parameter.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("format error at byte {offset}: {kind}")]
pub struct FormatError {
    /// Byte offset into the spec text
    pub offset: usize,
    /// What went wrong
    pub kind: FormatErrorKind,
}

impl FormatError {
    pub(crate) fn new(offset: usize, kind: FormatErrorKind) -> Self {
        FormatError { offset, kind }
    }
}

/// Kinds of text-format errors
#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum FormatErrorKind {
    /// unexpected end of input
    UnexpectedEof,
    /// unexpected token `{0}`
    UnexpectedToken(String),
    /// unknown keyword `{0}`
    UnknownKeyword(String),
    /// unknown object identifier name `{0}`
    UnknownOidName(String),
    /// unterminated string literal
    UnterminatedString,
    /// unterminated block comment
    UnterminatedComment,
    /// invalid escape sequence
    InvalidEscape,
    /// lone surrogate in string literal
    LoneSurrogate,
    /// odd number of hex digits in blob
    OddHexDigits,
    /// malformed number `{0}`
    InvalidNumber(String),
    /// tag value out of range
    TagOutOfRange,
    /// `tag` wrapper requires an explicit [class value] prefix
    TagWrapperWithoutTag,
    /// parameter index %{0} out of range
    ParamOutOfRange(usize),
    /// parameter %{0} has an unsupported type for this position
    ParamType(usize),
    /// `.` is only meaningful when matching
    IgnoreInBuild,
    /// `+` repetition produced no elements
    RepetitionEmpty,
    /// repetition produced more than one element where a single object is required
    SingleObjectRequired,
    /// specification nested too deeply
    TooDeep,
    /// invalid value: {0}
    Value(CodecError),
}

/// Mismatch between an element tree and a match specification
#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum MatchError {
    /// tag mismatch: expected {expected_class:?}/{expected_tag}, found {found_class:?}/{found_tag}
    TagMismatch {
        /// Class required by the specification
        expected_class: Class,
        /// Tag required by the specification
        expected_tag: Tag,
        /// Class of the element under the cursor
        found_class: Class,
        /// Tag of the element under the cursor
        found_tag: Tag,
    },
    /// element primitive/constructed form does not match the specification
    FormMismatch,
    /// element value does not match the literal in the specification
    ValueMismatch,
    /// element has fewer children than the specification requires
    MissingChild,
    /// element has more children than the specification allows
    TrailingChildren,
    /// constructed element is empty
    EmptyConstructed,
    /// at least one repetition is required
    RepetitionRequired,
}

/// Top-level error type
///
/// The three kinds are deliberately distinct: a [`FormatError`] is a defect
/// in the spec text or its parameters, a [`CodecError`] is a defect in the
/// binary data, and a [`MatchError`] only reports that a well-formed tree
/// did not have the expected shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Error while decoding BER or producing DER
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// Syntax or parameter error in the text format
    #[error(transparent)]
    Format(#[from] FormatError),
    /// Tree does not match the specification
    #[error(transparent)]
    Match(#[from] MatchError),
}

impl From<nom::Err<CodecError>> for Error {
    fn from(e: nom::Err<CodecError>) -> Error {
        match e {
            nom::Err::Incomplete(_) => Error::Codec(CodecError::Truncated),
            nom::Err::Error(e) | nom::Err::Failure(e) => Error::Codec(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn test_error_wrapping() {
        let e = Error::from(CodecError::IntegerTooLarge);
        let _: Result<(), Box<dyn StdError>> = Err(Box::new(e));
        let f = FormatError::new(12, FormatErrorKind::UnknownKeyword("foo".into()));
        assert_eq!(
            f.to_string(),
            "format error at byte 12: unknown keyword `foo`"
        );
    }
}
