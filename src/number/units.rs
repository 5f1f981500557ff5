//! Unit and metric-prefix lookup for engineering-notation numbers.
//!
//! Scoped to what the drum-font grammar actually uses (spec section 4.4):
//! the three ratio units (`dB`, `X`, `%`) and the eleven metric prefixes.
//! The original `bflamig/DFX` sources carry a much larger electrical-unit
//! catalog (`Units.h`); the font schema never needs anything but ratios, so
//! only that category is implemented here.

/// A unit recognized by the number lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Decibels: `new = 10^(old/20)` to convert to a linear ratio.
    Decibel,
    /// Bare ratio suffix `X`, or no unit at all: identity.
    Ratio,
    /// Percent: divide by 100.
    Percent,
    /// A generic (non-ratio) unit tag the lexer recognized but whose value
    /// is passed through unconverted — units outside the ratio category
    /// aren't used by anything in the drum-font schema.
    Generic,
}

impl Unit {
    /// True if this unit converts via the ratio-category rules in
    /// `EngrNum::x` (spec section 4.4).
    pub fn is_ratio(self) -> bool {
        matches!(self, Unit::Decibel | Unit::Ratio | Unit::Percent)
    }

    /// Longest-match lookup among the three ratio unit monikers.
    pub fn match_ratio(text: &str) -> Option<(Unit, usize)> {
        const RATIO_UNITS: [(&str, Unit); 3] =
            [("dB", Unit::Decibel), ("X", Unit::Ratio), ("%", Unit::Percent)];

        RATIO_UNITS
            .iter()
            .filter(|(name, _)| text.starts_with(name))
            .max_by_key(|(name, _)| name.len())
            .map(|(name, unit)| (*unit, name.len()))
    }
}

/// Metric prefix, one of `{f p n u m (none) k M G T P}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricPrefix {
    Femto,
    Pico,
    Nano,
    Micro,
    Milli,
    None,
    Kilo,
    Mega,
    Giga,
    Tera,
    Peta,
}

impl MetricPrefix {
    const CHARS: [char; 11] = ['f', 'p', 'n', 'u', 'm', '\0', 'k', 'M', 'G', 'T', 'P'];
    const VARIANTS: [MetricPrefix; 11] = [
        MetricPrefix::Femto,
        MetricPrefix::Pico,
        MetricPrefix::Nano,
        MetricPrefix::Micro,
        MetricPrefix::Milli,
        MetricPrefix::None,
        MetricPrefix::Kilo,
        MetricPrefix::Mega,
        MetricPrefix::Giga,
        MetricPrefix::Tera,
        MetricPrefix::Peta,
    ];
    const TENS_EXP: [i32; 11] = [-15, -12, -9, -6, -3, 0, 3, 6, 9, 12, 15];

    /// Match a single prefix character. `None` is never matched this way
    /// since it has no character — callers treat "no prefix char" as `None`.
    pub fn from_char(c: char) -> Option<MetricPrefix> {
        Self::CHARS
            .iter()
            .zip(Self::VARIANTS.iter())
            .find(|(ch, variant)| **ch == c && **variant != MetricPrefix::None)
            .map(|(_, variant)| *variant)
    }

    /// Power-of-ten exponent this prefix contributes.
    pub fn tens_exp(self) -> i32 {
        Self::TENS_EXP[Self::VARIANTS.iter().position(|v| *v == self).unwrap()]
    }
}
