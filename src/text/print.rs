//! Pretty-printer: element tree → parenthesised text
//!
//! The output is itself a valid build specification; for any element `e`,
//! building the printed text yields an element with the same DER encoding.
//! OCTET STRING and zero-unused-bit BIT STRING payloads are tentatively
//! decoded and rendered structurally, but only when re-encoding the decoded
//! payload reproduces the payload bytes exactly — re-encoding never
//! consults a memoised source span, so a laxly encoded payload can never
//! masquerade as structure.

use crate::ber::{Class, Tag};
use crate::codec::{self, Charset};
use crate::element::{Content, Element};
use crate::error::{CodecError, Error};
use crate::oid::Oid;
use crate::registry;

/// Output policy for the pretty-printer
#[derive(Debug, Clone)]
pub struct PrettyOptions {
    /// Emit OIDs numerically instead of looking up symbolic names
    pub numeric_oid: bool,
    /// Per-level indentation prefix; `None` renders on a single line and
    /// suppresses all comments
    pub indent: Option<String>,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        PrettyOptions {
            numeric_oid: false,
            indent: Some("    ".to_string()),
        }
    }
}

/// Pretty-print with default options.
pub fn pretty(element: &Element) -> Result<String, Error> {
    pretty_with(element, &PrettyOptions::default())
}

/// Pretty-print with explicit options.
pub fn pretty_with(element: &Element, options: &PrettyOptions) -> Result<String, Error> {
    let mut printer = Printer {
        out: String::new(),
        options,
    };
    printer.node(element, 0)?;
    Ok(printer.out)
}

struct Printer<'a> {
    out: String,
    options: &'a PrettyOptions,
}

impl<'a> Printer<'a> {
    fn sep(&mut self, depth: usize) {
        match &self.options.indent {
            Some(prefix) => {
                self.out.push('\n');
                for _ in 0..depth {
                    self.out.push_str(prefix);
                }
            }
            None => self.out.push(' '),
        }
    }

    fn node(&mut self, element: &Element, depth: usize) -> Result<(), Error> {
        self.out.push('(');
        if element.is_universal() {
            match element.tag() {
                Tag::Sequence | Tag::Set => {
                    if !element.is_constructed() {
                        return Err(CodecError::ConstructExpected.into());
                    }
                    let keyword = if element.tag() == Tag::Sequence {
                        "sequence"
                    } else {
                        "set"
                    };
                    self.out.push_str(keyword);
                    self.children(element.children()?, depth)?;
                }
                tag if universal_keyword(tag).is_some() => {
                    if element.is_constructed() {
                        return Err(CodecError::ConstructUnexpected.into());
                    }
                    self.primitive(element, depth)?;
                }
                tag => {
                    self.out.push_str(&format!("[universal {}] ", tag.0));
                    self.unknown_body(element, depth)?;
                }
            }
        } else {
            let bracket = match element.class() {
                Class::ContextSpecific => format!("[{}] ", element.tag().0),
                Class::Application => format!("[application {}] ", element.tag().0),
                Class::Private => format!("[private {}] ", element.tag().0),
                Class::Universal => unreachable!("handled above"),
            };
            self.out.push_str(&bracket);
            self.unknown_body(element, depth)?;
        }
        self.out.push(')');
        Ok(())
    }

    /// Body of a tag-overridden node: the content shape is all we know.
    fn unknown_body(&mut self, element: &Element, depth: usize) -> Result<(), Error> {
        match element.content() {
            Content::Constructed(children) => {
                self.out.push_str("sequence");
                self.children(children, depth)?;
            }
            Content::Primitive(value) => {
                self.out.push_str("blob");
                let value = value.clone();
                self.hex(&value, depth);
                self.ascii_peek(&value);
            }
        }
        Ok(())
    }

    fn children(&mut self, children: &[Element], depth: usize) -> Result<(), Error> {
        for child in children {
            self.sep(depth + 1);
            self.node(child, depth + 1)?;
        }
        Ok(())
    }

    fn primitive(&mut self, element: &Element, depth: usize) -> Result<(), Error> {
        let tag = element.tag();
        match tag {
            Tag::Boolean => {
                let v = element.as_bool()?;
                self.out.push_str(if v { "bool true" } else { "bool false" });
            }
            Tag::Integer => {
                self.out.push_str(&format!("int {}", element.as_bigint()?));
            }
            Tag::Enumerated => {
                self.out.push_str(&format!("enum {}", element.as_bigint()?));
            }
            Tag::BitString => {
                let (ignored, payload) = element.bit_string_parts()?;
                let payload = payload.to_vec();
                self.out.push_str(&format!("bits {}", ignored));
                match (ignored == 0).then(|| self.try_nested(&payload)).flatten() {
                    Some(nested) => {
                        self.sep(depth + 1);
                        self.node(&nested, depth + 1)?;
                    }
                    None => self.hex(&payload, depth),
                }
            }
            Tag::OctetString => {
                let value = element.value()?.clone();
                self.out.push_str("blob");
                match self.try_nested(&value) {
                    Some(nested) => {
                        self.sep(depth + 1);
                        self.node(&nested, depth + 1)?;
                    }
                    None => {
                        self.hex(&value, depth);
                        self.ascii_peek(&value);
                    }
                }
            }
            Tag::Null => {
                if !element.value()?.is_empty() {
                    return Err(CodecError::InvalidNull.into());
                }
                self.out.push_str("null");
            }
            Tag::Oid => {
                let oid: Oid = element.as_oid()?;
                let shown = if self.options.numeric_oid {
                    oid.to_string()
                } else {
                    registry::registry().to_name(&oid)
                };
                self.out.push_str(&format!("oid {}", shown));
            }
            Tag::UtcTime | Tag::GeneralizedTime => {
                let keyword = if tag == Tag::UtcTime { "utc" } else { "gentime" };
                let literal = element.time_string()?.to_string();
                let instant = element.as_datetime()?;
                self.out.push_str(&format!("{} {}", keyword, literal));
                if self.options.indent.is_some() {
                    self.out
                        .push_str(&format!(" {{ {} }}", codec::time::format_comment(&instant)));
                }
            }
            tag => match Charset::for_tag(tag) {
                Some(cs) => {
                    let s = element.as_str()?;
                    self.out
                        .push_str(&format!("{} \"{}\"", charset_keyword(cs), escape(&s)));
                }
                None => unreachable!("caller checked universal_keyword"),
            },
        }
        Ok(())
    }

    /// Decode a payload as a nested element, accepting it only when its
    /// fresh re-encoding is byte-identical to the payload.
    fn try_nested(&self, payload: &[u8]) -> Option<Element> {
        if payload.is_empty() {
            return None;
        }
        let decoded = crate::ber::decode(payload).ok()?;
        if decoded.to_der() == payload {
            Some(decoded)
        } else {
            None
        }
    }

    fn hex(&mut self, bytes: &[u8], depth: usize) {
        if self.options.indent.is_some() && bytes.len() > 16 {
            for chunk in bytes.chunks(16) {
                self.sep(depth + 1);
                for (i, b) in chunk.iter().enumerate() {
                    if i > 0 {
                        self.out.push(' ');
                    }
                    self.out.push_str(&format!("{:02x}", b));
                }
            }
        } else {
            for b in bytes {
                self.out.push_str(&format!(" {:02x}", b));
            }
        }
    }

    /// When every byte is printable ASCII (or tab/LF/CR), append the
    /// text reading as a brace comment after the hex dump.
    fn ascii_peek(&mut self, bytes: &[u8]) {
        if self.options.indent.is_none() || bytes.is_empty() {
            return;
        }
        let printable = bytes
            .iter()
            .all(|&b| matches!(b, 9 | 10 | 13) || (0x20..0x7f).contains(&b));
        if !printable {
            return;
        }
        let text: String = bytes.iter().map(|&b| b as char).collect();
        self.out.push_str(&format!(" {{\"{}\"}}", escape(&text)));
    }
}

fn universal_keyword(tag: Tag) -> Option<&'static str> {
    match tag {
        Tag::Boolean => Some("bool"),
        Tag::Integer => Some("int"),
        Tag::Enumerated => Some("enum"),
        Tag::BitString => Some("bits"),
        Tag::OctetString => Some("blob"),
        Tag::Null => Some("null"),
        Tag::Oid => Some("oid"),
        Tag::Sequence => Some("sequence"),
        Tag::Set => Some("set"),
        Tag::UtcTime => Some("utc"),
        Tag::GeneralizedTime => Some("gentime"),
        tag => Charset::for_tag(tag).map(charset_keyword),
    }
}

fn charset_keyword(cs: Charset) -> &'static str {
    match cs {
        Charset::Numeric => "numeric",
        Charset::Printable => "printable",
        Charset::Ia5 => "ia5",
        Charset::Teletex => "teletex",
        Charset::General => "general",
        Charset::Utf8 => "utf8",
        Charset::Bmp => "bmp",
        Charset::Universal => "universal",
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32))
            }
            c => out.push(c),
        }
    }
    out
}
