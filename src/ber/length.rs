use crate::error::CodecError;
use core::convert::TryFrom;

/// BER object length
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Length {
    /// Definite form (X.690 8.1.3.3)
    Definite(usize),
    /// Indefinite form (X.690 8.1.3.6), constructed values only
    Indefinite,
}

impl Length {
    /// Return true if length is definite and equal to 0
    pub fn is_null(&self) -> bool {
        *self == Length::Definite(0)
    }

    /// Get the length of a primitive object
    #[inline]
    pub fn definite(&self) -> Result<usize, CodecError> {
        match self {
            Length::Definite(sz) => Ok(*sz),
            Length::Indefinite => Err(CodecError::IndefiniteLengthUnexpected),
        }
    }
}

impl From<usize> for Length {
    fn from(v: usize) -> Self {
        Length::Definite(v)
    }
}

impl TryFrom<Length> for usize {
    type Error = CodecError;

    #[inline]
    fn try_from(value: Length) -> Result<Self, Self::Error> {
        value.definite()
    }
}
