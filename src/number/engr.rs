//! Converts a number literal plus its [`NumberTraits`] into a scalar.
//!
//! Spec section 4.4 describes `EngrNum` as carrying a decimal-text mantissa
//! so a human-written file round-trips exactly on re-serialization. This
//! crate never re-serializes a font (no text-editing tool in scope), so we
//! take option (b) from the Design Notes: always convert to `f64` and
//! accept the resulting few-ulp round-trip drift. `tens_exp` is kept as a
//! field for structural fidelity with the spec but is always folded into
//! `engr_exp` at construction time rather than tracked separately.

use super::lexer::NumberTraits;
use super::units::Unit;
use crate::error::FontError;

/// Whether the value is an ordinary finite number or one of the special
/// IEEE states the original format can represent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngrNumFlag {
    Ordinary,
    PositiveInfinity,
    NegativeInfinity,
    NaN,
}

/// A normalized engineering-notation number: `sign * mantissa *
/// 10^(engr_exp + tens_exp)`, with `|mantissa| < 1000` and `engr_exp` a
/// multiple of 3, plus an optional unit tag.
#[derive(Debug, Clone, PartialEq)]
pub struct EngrNum {
    pub sign: f64,
    pub mantissa: f64,
    pub engr_exp: i32,
    pub tens_exp: i32,
    pub unit: Option<Unit>,
    pub value_flag: EngrNumFlag,
}

impl EngrNum {
    /// Parse `text` (the exact span matched by [`scan`](super::lexer::scan))
    /// using its pre-computed traits.
    pub fn parse(text: &str, traits: &NumberTraits, row: usize, col: usize) -> Result<EngrNum, FontError> {
        let unit_start = traits
            .ratio_units
            .or(traits.metric_prefix)
            .or(traits.generic_units)
            .unwrap_or(traits.end);
        let numeric_text = &text[..unit_start];

        let (sign, magnitude_text) = match numeric_text.as_bytes().first() {
            Some(b'-') => (-1.0, &numeric_text[1..]),
            Some(b'+') => (1.0, &numeric_text[1..]),
            _ => (1.0, numeric_text),
        };

        let raw: f64 = magnitude_text.parse().map_err(|_| FontError::InvalidNumber {
            row,
            col,
            reason: format!("could not parse {magnitude_text:?} as a number"),
        })?;

        if !raw.is_finite() {
            let flag = if sign < 0.0 {
                EngrNumFlag::NegativeInfinity
            } else {
                EngrNumFlag::PositiveInfinity
            };
            return Ok(EngrNum {
                sign,
                mantissa: 0.0,
                engr_exp: 0,
                tens_exp: 0,
                unit: None,
                value_flag: flag,
            });
        }

        let prefix_exp = traits
            .metric_prefix
            .map(|off| {
                let ch = text[off..].chars().next().unwrap();
                super::units::MetricPrefix::from_char(ch).map(|p| p.tens_exp()).unwrap_or(0)
            })
            .unwrap_or(0);

        let unit = if let Some(off) = traits.ratio_units {
            Unit::match_ratio(&text[off..]).map(|(u, _)| u)
        } else if traits.generic_units.is_some() {
            Some(Unit::Generic)
        } else {
            None
        };

        let scaled = raw * 10f64.powi(prefix_exp);

        let (mantissa, engr_exp) = if scaled == 0.0 {
            (0.0, 0)
        } else {
            let mut exp = (scaled.abs().log10() / 3.0).floor() as i32 * 3;
            let mut mantissa = scaled / 10f64.powi(exp);
            // floating point can land mantissa just outside [1, 1000) at the boundary
            if mantissa.abs() >= 1000.0 {
                mantissa /= 1000.0;
                exp += 3;
            } else if mantissa.abs() < 1.0 {
                mantissa *= 1000.0;
                exp -= 3;
            }
            (mantissa, exp)
        };

        Ok(EngrNum {
            sign,
            mantissa,
            engr_exp,
            tens_exp: 0,
            unit,
            value_flag: EngrNumFlag::Ordinary,
        })
    }

    /// The scalar value, with ratio-unit conversion applied (spec section
    /// 4.4): dB to linear amplitude, `%` to a fraction, `X`/no unit as-is.
    pub fn x(&self) -> f64 {
        let raw = match self.value_flag {
            EngrNumFlag::PositiveInfinity => return f64::INFINITY,
            EngrNumFlag::NegativeInfinity => return f64::NEG_INFINITY,
            EngrNumFlag::NaN => return f64::NAN,
            EngrNumFlag::Ordinary => self.sign * self.mantissa * 10f64.powi(self.engr_exp + self.tens_exp),
        };

        match self.unit {
            Some(Unit::Decibel) => 10f64.powf(raw / 20.0),
            Some(Unit::Percent) => raw / 100.0,
            Some(Unit::Ratio) | Some(Unit::Generic) | None => raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::lexer::scan;

    fn parse_str(s: &str) -> f64 {
        let traits = scan(s).unwrap();
        EngrNum::parse(s, &traits, 1, 1).unwrap().x()
    }

    #[test]
    fn plain_float_and_exponent_form_agree_within_ulp() {
        let a = parse_str("1.2345e-3");
        let b = 1.2345e-3;
        assert!((a - b).abs() < 1e-18, "a={a} b={b}");
    }

    #[test]
    fn db_converts_to_amplitude_ratio() {
        let v = parse_str("-6dB");
        assert!((v - 10f64.powf(-6.0 / 20.0)).abs() < 1e-12);
    }

    #[test]
    fn x_unit_is_identity_ratio() {
        assert!((parse_str("0.3X") - 0.3).abs() < 1e-12);
    }

    #[test]
    fn percent_divides_by_100() {
        assert!((parse_str("50%") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn kilo_prefix_scales_value() {
        assert!((parse_str("10kHz") - 10_000.0).abs() < 1e-9);
    }

    #[test]
    fn zero_has_zero_mantissa_and_exponent() {
        let traits = scan("0").unwrap();
        let n = EngrNum::parse("0", &traits, 1, 1).unwrap();
        assert_eq!(n.mantissa, 0.0);
        assert_eq!(n.engr_exp, 0);
        assert_eq!(n.x(), 0.0);
    }
}
