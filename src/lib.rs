//! # BER/DER codec with an isomorphic text format
//!
//! This crate reads and writes ASN.1 values encoded with the Basic and
//! Distinguished Encoding Rules (X.690), and maps them to a parenthesised
//! text format that humans can read and programs can parameterise.
//!
//! Three subsystems share one data model, the [`Element`] tree:
//!
//! * the **binary codec**: [`ber::decode`] accepts BER with the common
//!   laxities (indefinite lengths, non-minimal encodings, dirty BIT STRING
//!   padding, BOMs and odd endianness in the string types) and produces a
//!   normalised tree; [`der::to_der`] writes the tree back as strict DER.
//! * the **text format**: [`text::pretty`] renders a tree as
//!   S-expression-like text, [`text::build`] constructs a tree from such
//!   text plus a vector of typed parameters (`%0`, `%1`, …), and
//!   [`text::match_element`] runs the same grammar in reverse, checking a
//!   tree against a pattern and capturing values.
//! * the **OID registry**: a process-wide bidirectional map between
//!   dotted OIDs and symbolic names, used to prettify output and resolve
//!   names on input.
//!
//! ```rust
//! use der_text::{ber, text};
//!
//! let tree = ber::decode(&[0x30, 0x06, 0x02, 0x01, 0x2a, 0x01, 0x01, 0xff])?;
//! assert_eq!(
//!     text::pretty_with(&tree, &text::PrettyOptions { numeric_oid: false, indent: None })?,
//!     "(sequence (int 42) (bool true))"
//! );
//!
//! let rebuilt = text::build("(sequence (int %0) (bool %1))",
//!     &[42i64.into(), true.into()])?.expect("present");
//! assert_eq!(rebuilt.to_der(), tree.to_der());
//! # Ok::<(), der_text::Error>(())
//! ```
//!
//! Decoding copies the input once; every element references that single
//! buffer for its content and its original encoded span. Elements are
//! immutable once constructed.

#![forbid(unsafe_code)]
#![deny(unstable_features, unused_import_braces, unused_qualifications)]
#![warn(missing_debug_implementations)]

pub mod ber;
pub mod codec;
pub(crate) mod debug;
pub mod der;
mod element;
pub mod error;
mod oid;
pub mod registry;
pub mod sniff;
pub mod text;

pub use element::{Content, Element};
pub use error::{CodecError, Error, FormatError, FormatErrorKind, MatchError};
pub use oid::Oid;

// compatibility: the codec entry points are also reachable at the root
pub use ber::decode;
pub use der::to_der;
