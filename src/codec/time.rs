//! UTCTime and GeneralizedTime
//!
//! Time values are stored in their element as the literal string from the
//! wire; this module parses such strings into `DateTime<Utc>` on demand and
//! formats instants back into canonical time strings. The calendar is
//! chrono's proleptic Gregorian.

use crate::error::CodecError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};

/// The two time string flavours
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TimeKind {
    Utc,
    Generalized,
}

struct Cursor<'a> {
    s: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a [u8]) -> Self {
        Cursor { s, pos: 0 }
    }

    fn digits(&mut self, n: usize) -> Result<u32, CodecError> {
        if self.pos + n > self.s.len() {
            return Err(CodecError::InvalidTime);
        }
        let mut v = 0u32;
        for &b in &self.s[self.pos..self.pos + n] {
            if !b.is_ascii_digit() {
                return Err(CodecError::InvalidTime);
            }
            v = v * 10 + u32::from(b - b'0');
        }
        self.pos += n;
        Ok(v)
    }

    fn has_digit(&self) -> bool {
        self.s.get(self.pos).map_or(false, |b| b.is_ascii_digit())
    }

    fn next(&mut self) -> Option<u8> {
        let b = self.s.get(self.pos).copied();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn done(&self) -> bool {
        self.pos == self.s.len()
    }
}

/// Parse a UTCTime string: `YYMMDDHHMM[SS]` followed by `Z` or `±HHMM`.
///
/// Two-digit years map to 2000..=2049 and 1950..=1999.
pub fn parse_utc(s: &str) -> Result<DateTime<Utc>, CodecError> {
    let mut c = Cursor::new(s.as_bytes());
    let yy = c.digits(2)?;
    let year = if yy < 50 { 2000 + yy } else { 1900 + yy } as i32;
    let month = c.digits(2)?;
    let day = c.digits(2)?;
    let hour = c.digits(2)?;
    let minute = c.digits(2)?;
    let second = if c.has_digit() { c.digits(2)? } else { 0 };
    let offset = parse_offset(&mut c)?;
    if !c.done() {
        return Err(CodecError::InvalidTime);
    }
    assemble(year, month, day, hour, minute, second, 0, offset)
}

/// Parse a GeneralizedTime string: `YYYYMMDDHH[MM[SS[.fffffff]]]` with an
/// optional `Z` or `±HHMM` suffix. Up to seven fractional digits are
/// consumed; further digits are ignored.
pub fn parse_generalized(s: &str) -> Result<DateTime<Utc>, CodecError> {
    let mut c = Cursor::new(s.as_bytes());
    let year = c.digits(4)? as i32;
    let month = c.digits(2)?;
    let day = c.digits(2)?;
    let hour = c.digits(2)?;
    let mut minute = 0;
    let mut second = 0;
    let mut nanos = 0u32;
    if c.has_digit() {
        minute = c.digits(2)?;
        if c.has_digit() {
            second = c.digits(2)?;
            if matches!(c.s.get(c.pos), Some(&b'.') | Some(&b',')) {
                c.pos += 1;
                if !c.has_digit() {
                    return Err(CodecError::InvalidTime);
                }
                let mut scale = 100_000_000u32;
                let mut taken = 0;
                while c.has_digit() {
                    let d = u32::from(c.s[c.pos] - b'0');
                    if taken < 7 {
                        nanos += d * scale;
                        scale /= 10;
                    }
                    taken += 1;
                    c.pos += 1;
                }
            }
        }
    }
    let offset = parse_offset(&mut c)?;
    if !c.done() {
        return Err(CodecError::InvalidTime);
    }
    assemble(year, month, day, hour, minute, second, nanos, offset)
}

/// Offset suffix: nothing (local treated as UTC), `Z`, or `±HH[MM]`.
/// Returns the offset east of UTC in minutes.
fn parse_offset(c: &mut Cursor<'_>) -> Result<i32, CodecError> {
    match c.next() {
        None => Ok(0),
        Some(b'Z') => Ok(0),
        Some(sign @ (b'+' | b'-')) => {
            let hh = c.digits(2)? as i32;
            let mm = if c.has_digit() { c.digits(2)? as i32 } else { 0 };
            if hh > 23 || mm > 59 {
                return Err(CodecError::InvalidTime);
            }
            let total = hh * 60 + mm;
            Ok(if sign == b'-' { -total } else { total })
        }
        Some(_) => Err(CodecError::InvalidTime),
    }
}

#[allow(clippy::too_many_arguments)]
fn assemble(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    mut second: u32,
    nanos: u32,
    offset_minutes: i32,
) -> Result<DateTime<Utc>, CodecError> {
    if !(1..=9999).contains(&year) {
        return Err(CodecError::YearOutOfRange);
    }
    if second == 60 {
        // leap seconds are coerced to the previous second
        second = 59;
    }
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(CodecError::InvalidTime)?;
    let naive = date
        .and_hms_nano_opt(hour, minute, second, nanos)
        .ok_or(CodecError::InvalidTime)?;
    let utc = Utc.from_utc_datetime(&naive) - Duration::minutes(i64::from(offset_minutes));
    if !(1..=9999).contains(&utc.year()) {
        return Err(CodecError::YearOutOfRange);
    }
    Ok(utc)
}

/// Format an instant as a canonical UTCTime string `YYMMDDHHMMSSZ`.
/// The year must fall in the two-digit window 1950..=2049.
pub fn format_utc(t: &DateTime<Utc>) -> Result<String, CodecError> {
    let year = t.year();
    if !(1950..=2049).contains(&year) {
        return Err(CodecError::YearOutOfRange);
    }
    Ok(format!(
        "{:02}{:02}{:02}{:02}{:02}{:02}Z",
        year % 100,
        t.month(),
        t.day(),
        t.hour(),
        t.minute(),
        t.second()
    ))
}

/// Format an instant as a canonical GeneralizedTime string
/// `YYYYMMDDHHMMSS[.fffffff]Z`, fraction omitted when zero and trimmed of
/// trailing zeros otherwise.
pub fn format_generalized(t: &DateTime<Utc>) -> Result<String, CodecError> {
    let year = t.year();
    if !(1..=9999).contains(&year) {
        return Err(CodecError::YearOutOfRange);
    }
    let mut s = format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}",
        year,
        t.month(),
        t.day(),
        t.hour(),
        t.minute(),
        t.second()
    );
    push_fraction(&mut s, t.nanosecond());
    s.push('Z');
    Ok(s)
}

/// Calendar comment form used by the pretty-printer:
/// `YYYY-MM-DD HH:MM:SS[.fffffff] UTC`.
pub fn format_comment(t: &DateTime<Utc>) -> String {
    let mut s = format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        t.year(),
        t.month(),
        t.day(),
        t.hour(),
        t.minute(),
        t.second()
    );
    push_fraction(&mut s, t.nanosecond());
    s.push_str(" UTC");
    s
}

fn push_fraction(s: &mut String, nanos: u32) {
    let mut frac = nanos / 100;
    if frac == 0 {
        return;
    }
    let mut digits = 7;
    while frac % 10 == 0 {
        frac /= 10;
        digits -= 1;
    }
    s.push('.');
    s.push_str(&format!("{:0width$}", frac, width = digits));
}

/// Parse a stored time string according to its flavour.
pub fn parse(kind: TimeKind, s: &str) -> Result<DateTime<Utc>, CodecError> {
    match kind {
        TimeKind::Utc => parse_utc(s),
        TimeKind::Generalized => parse_generalized(s),
    }
}

/// Format an instant according to the flavour's canonical string form.
pub fn format(kind: TimeKind, t: &DateTime<Utc>) -> Result<String, CodecError> {
    match kind {
        TimeKind::Utc => format_utc(t),
        TimeKind::Generalized => format_generalized(t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_utc() {
        let t = parse_utc("170822063935Z").unwrap();
        assert_eq!(format_comment(&t), "2017-08-22 06:39:35 UTC");
        // two-digit year window
        let t = parse_utc("620822063935Z").unwrap();
        assert_eq!(t.year(), 1962);
        // seconds optional
        let t = parse_utc("1708220639Z").unwrap();
        assert_eq!(t.second(), 0);
    }

    #[test]
    fn test_parse_utc_offset() {
        let t = parse_utc("170822063935+0200").unwrap();
        assert_eq!(format_comment(&t), "2017-08-22 04:39:35 UTC");
        let t = parse_utc("170822063935-0130").unwrap();
        assert_eq!(format_comment(&t), "2017-08-22 08:09:35 UTC");
    }

    #[test]
    fn test_parse_generalized() {
        let t = parse_generalized("20170822063935Z").unwrap();
        assert_eq!(format_comment(&t), "2017-08-22 06:39:35 UTC");
        let t = parse_generalized("20170822063935.25Z").unwrap();
        assert_eq!(format_comment(&t), "2017-08-22 06:39:35.25 UTC");
        // more than seven fractional digits are consumed but ignored
        let t = parse_generalized("20170822063935.123456789Z").unwrap();
        assert_eq!(format_comment(&t), "2017-08-22 06:39:35.1234567 UTC");
        // truncated forms
        let t = parse_generalized("2017082206Z").unwrap();
        assert_eq!(format_comment(&t), "2017-08-22 06:00:00 UTC");
    }

    #[test]
    fn test_leap_second_coerced() {
        let t = parse_utc("161231235960Z").unwrap();
        assert_eq!(format_comment(&t), "2016-12-31 23:59:59 UTC");
    }

    #[test]
    fn test_year_bounds() {
        assert_eq!(
            parse_generalized("00001231120000Z"),
            Err(CodecError::YearOutOfRange)
        );
        assert!(parse_generalized("99991231120000Z").is_ok());
        // offset pushing the instant past year 9999
        assert_eq!(
            parse_generalized("99991231230000-0200"),
            Err(CodecError::YearOutOfRange)
        );
    }

    #[test]
    fn test_invalid_times() {
        assert!(parse_utc("17082206393Z").is_err());
        assert!(parse_utc("170822063935X").is_err());
        assert!(parse_generalized("20170845063935Z").is_err());
        assert!(parse_generalized("20170822063935.Z").is_err());
    }

    #[test]
    fn test_format_roundtrip() {
        let t = parse_generalized("20501231235959.5Z").unwrap();
        assert_eq!(format_generalized(&t).unwrap(), "20501231235959.5Z");
        assert_eq!(
            format_utc(&parse_utc("491231235959Z").unwrap()).unwrap(),
            "491231235959Z"
        );
        assert!(format_utc(&parse_generalized("20700101000000Z").unwrap()).is_err());
    }
}
