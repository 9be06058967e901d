//! The parenthesised text format
//!
//! One grammar serves three operations over the same token stream and
//! specification AST:
//!
//! * [`pretty`] / [`pretty_with`] render an element tree as text,
//! * [`build`] reads a specification plus parameters and produces a tree,
//! * [`match_element`] walks a tree along a specification and captures
//!   parameter values.

pub(crate) mod ast;
mod build;
mod lexer;
mod matcher;
mod print;
mod value;

pub use build::build;
pub use matcher::match_element;
pub use print::{pretty, pretty_with, PrettyOptions};
pub use value::Value;
