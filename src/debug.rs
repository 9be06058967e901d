//! Helpers for Debug implementations

use core::fmt;

/// Wrapper to print a byte slice as space-separated hex pairs
pub struct HexSlice<'a> {
    pub d: &'a [u8],
}

impl<'a> fmt::Debug for HexSlice<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.d.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}
