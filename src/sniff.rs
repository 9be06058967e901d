//! Input sniffer: raw BER, Base64, or PEM armour
//!
//! Front ends hand this module whatever they read from disk; it locates
//! the BER object inside. PEM armour wins over everything, then a
//! plausible raw BER header, then a whole-input Base64 decode.

use crate::ber::Header;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Extract BER bytes from raw input. Returns `None` when no BER object
/// can be located.
pub fn extract_ber(data: &[u8]) -> Option<Vec<u8>> {
    if let Some(body) = pem_body(data) {
        log::debug!("input sniffer: PEM armour detected");
        return decode_base64(&body);
    }
    if looks_like_ber(data) {
        return Some(data.to_vec());
    }
    let text = std::str::from_utf8(data).ok()?;
    let decoded = decode_base64(text)?;
    log::debug!("input sniffer: bare Base64 detected");
    if looks_like_ber(&decoded) {
        Some(decoded)
    } else {
        None
    }
}

/// A header must parse and its definite length must not overrun the
/// input for the bytes to count as raw BER.
fn looks_like_ber(data: &[u8]) -> bool {
    match Header::parse(data) {
        Ok((rem, header)) => match header.length() {
            crate::ber::Length::Definite(len) => len <= rem.len(),
            crate::ber::Length::Indefinite => header.is_constructed(),
        },
        Err(_) => false,
    }
}

/// Base64 body between the first BEGIN/END marker pair, any label.
fn pem_body(data: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(data).ok()?;
    let mut body = String::new();
    let mut inside = false;
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with("-----BEGIN ") && line.ends_with("-----") {
            inside = true;
            continue;
        }
        if line.starts_with("-----END ") {
            if inside {
                return Some(body);
            }
            return None;
        }
        if inside {
            body.push_str(line);
        }
    }
    None
}

fn decode_base64(text: &str) -> Option<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }
    BASE64.decode(compact.as_bytes()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DER_BOOL: &[u8] = &[0x01, 0x01, 0xff];

    #[test]
    fn test_raw_ber_passthrough() {
        assert_eq!(extract_ber(DER_BOOL), Some(DER_BOOL.to_vec()));
    }

    #[test]
    fn test_bare_base64() {
        // "AQH/" is 01 01 ff
        assert_eq!(extract_ber(b"AQH/\n"), Some(DER_BOOL.to_vec()));
    }

    #[test]
    fn test_pem_armour() {
        let pem = b"-----BEGIN THING-----\nAQH/\n-----END THING-----\n";
        assert_eq!(extract_ber(pem), Some(DER_BOOL.to_vec()));
    }

    #[test]
    fn test_no_ber_found() {
        assert_eq!(extract_ber(b"this is not ber at all!"), None);
        assert_eq!(extract_ber(b""), None);
        // valid base64 that does not decode to a BER object
        assert_eq!(extract_ber(b"8J+Yhg=="), None);
    }

    #[test]
    fn test_truncated_header_rejected() {
        // claims 5 content bytes, provides 1
        assert_eq!(extract_ber(&[0x30, 0x05, 0x00]), None);
    }
}
