//! Number literal scanner (spec section 4.4).
//!
//! Scans the grammar
//! ```text
//! number  := sign? integer fraction? exponent? unit?
//! integer := '0' | onenine digit*
//! fraction := '.' digit+
//! exponent := [eE] sign? digit+
//! unit     := ratio_unit | metric_prefix? generic_unit
//! ratio_unit := 'dB' | 'X' | '%'
//! ```
//! from the start of a `&str` and records the offsets of each part rather
//! than building a value directly — `EngrNum` does the conversion once the
//! traits are known, so the same scan result can be reused for both a bare
//! number token and a quoted string that turns out to parse as one (the
//! validator's in-place string-to-number rewrite, spec section 4.7).

use super::units::{MetricPrefix, Unit};

/// Offsets (byte indices into the scanned text) of each grammar piece, or
/// `None` if that piece wasn't present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberTraits {
    pub decimal_point: Option<usize>,
    pub exponent: Option<usize>,
    pub ratio_units: Option<usize>,
    pub metric_prefix: Option<usize>,
    pub generic_units: Option<usize>,
    pub end: usize,
    pub could_be_a_number: bool,
}

impl NumberTraits {
    pub fn has_decimal(&self) -> bool {
        self.decimal_point.is_some()
    }
    pub fn has_exponent(&self) -> bool {
        self.exponent.is_some()
    }
    pub fn is_whole_number(&self) -> bool {
        !self.has_decimal() && !self.has_exponent()
    }
    pub fn has_ratio_units(&self) -> bool {
        self.ratio_units.is_some()
    }
    pub fn has_metric_prefix(&self) -> bool {
        self.metric_prefix.is_some()
    }
    pub fn has_generic_units(&self) -> bool {
        self.generic_units.is_some()
    }
}

fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

/// Scan a numeric literal starting at byte 0 of `s`. Returns `None` if `s`
/// doesn't start with a valid number (no partial/garbage traits are ever
/// returned — `could_be_a_number` is only meaningful on `Some`, and is
/// always true there; the field exists so callers that pre-scanned a
/// quoted string can tell a full match from a `None`).
pub fn scan(s: &str) -> Option<NumberTraits> {
    let b = s.as_bytes();
    let mut i = 0usize;

    if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
        i += 1;
    }

    let int_start = i;
    if i < b.len() && b[i] == b'0' {
        i += 1;
    } else if i < b.len() && b[i] >= b'1' && b[i] <= b'9' {
        i += 1;
        while i < b.len() && is_digit(b[i]) {
            i += 1;
        }
    } else {
        return None;
    }
    if i == int_start {
        return None;
    }

    let mut decimal_point = None;
    if i < b.len() && b[i] == b'.' {
        decimal_point = Some(i);
        i += 1;
        let frac_start = i;
        while i < b.len() && is_digit(b[i]) {
            i += 1;
        }
        if i == frac_start {
            return None; // fraction requires at least one digit
        }
    }

    let mut exponent = None;
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        let exp_start = i;
        let mut j = i + 1;
        if j < b.len() && (b[j] == b'+' || b[j] == b'-') {
            j += 1;
        }
        let digits_start = j;
        while j < b.len() && is_digit(b[j]) {
            j += 1;
        }
        if j == digits_start {
            // not actually an exponent (e.g. trailing "e" unit name) — leave unit scan to handle it
        } else {
            exponent = Some(exp_start);
            i = j;
        }
    }

    let rest = &s[i..];
    let mut ratio_units = None;
    let mut metric_prefix = None;
    let mut generic_units = None;

    if let Some((_, len)) = Unit::match_ratio(rest) {
        ratio_units = Some(i);
        i += len;
    } else if !rest.is_empty() {
        let first = rest.chars().next().unwrap();
        if first.is_ascii_alphabetic() {
            let mut rest_chars = rest.char_indices();
            let (_, c0) = rest_chars.next().unwrap();
            let prefix_len = if MetricPrefix::from_char(c0).is_some() && rest.len() > 1 {
                metric_prefix = Some(i);
                c0.len_utf8()
            } else {
                0
            };
            let unit_start = i + prefix_len;
            let unit_text = &s[unit_start..];
            let unit_len: usize = unit_text
                .char_indices()
                .take_while(|(_, c)| c.is_ascii_alphabetic())
                .last()
                .map(|(idx, c)| idx + c.len_utf8())
                .unwrap_or(0);
            if unit_len > 0 {
                generic_units = Some(unit_start);
                i = unit_start + unit_len;
            } else {
                // lone prefix char wasn't followed by a unit name; it was
                // actually the generic unit itself
                metric_prefix = None;
                generic_units = Some(i);
                i += prefix_len;
            }
        }
    }

    Some(NumberTraits {
        decimal_point,
        exponent,
        ratio_units,
        metric_prefix,
        generic_units,
        end: i,
        could_be_a_number: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_integer() {
        let t = scan("42").unwrap();
        assert_eq!(t.end, 2);
        assert!(t.is_whole_number());
    }

    #[test]
    fn signed_float_with_exponent() {
        let t = scan("-1.2345e-3").unwrap();
        assert!(t.has_decimal());
        assert!(t.has_exponent());
        assert_eq!(t.end, "-1.2345e-3".len());
    }

    #[test]
    fn ratio_unit_db() {
        let t = scan("-6dB").unwrap();
        assert!(t.has_ratio_units());
        assert_eq!(&"-6dB"[t.ratio_units.unwrap()..], "dB");
    }

    #[test]
    fn ratio_unit_percent_with_trailing_text() {
        let t = scan("50%,").unwrap();
        assert!(t.has_ratio_units());
        assert_eq!(t.end, 3);
    }

    #[test]
    fn metric_prefix_plus_generic_unit() {
        let t = scan("10kHz").unwrap();
        assert!(t.has_metric_prefix());
        assert!(t.has_generic_units());
    }

    #[test]
    fn not_a_number() {
        assert!(scan("abc").is_none());
        assert!(scan(".5").is_none());
    }

    #[test]
    fn leading_zero_is_single_digit_integer() {
        let t = scan("0.5").unwrap();
        assert_eq!(t.decimal_point, Some(1));
    }
}
