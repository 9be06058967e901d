//! Parameter values for the builder and the matcher
//!
//! A [`Value`] is the tagged union behind every `%N` slot: the builder
//! reads them, the matcher writes them, and repetition iterates over the
//! `List` variant. `Null` marks an absent value in both directions.

use crate::element::Element;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;

/// A parameter slot value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent; propagates optionality in build mode
    Null,
    Bool(bool),
    Int(BigInt),
    Bytes(Vec<u8>),
    Str(String),
    Elem(Element),
    Time(DateTime<Utc>),
    /// An iterable sequence, produced by accumulation and consumed by
    /// `*`/`+` repetition
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Bytes(_) => "bytes",
            Value::Str(_) => "string",
            Value::Elem(_) => "element",
            Value::Time(_) => "time",
            Value::List(_) => "list",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Int(BigInt::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Value {
        Value::Int(BigInt::from(v))
    }
}

impl From<BigInt> for Value {
    fn from(v: BigInt) -> Value {
        Value::Int(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Value {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Value {
        Value::Bytes(v.to_vec())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::Str(v)
    }
}

impl From<Element> for Value {
    fn from(v: Element) -> Value {
        Value::Elem(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Value {
        Value::Time(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Value {
        Value::List(v)
    }
}
