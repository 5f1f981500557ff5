//! Numeric literal lexing and engineering-notation conversion (spec
//! section 4.4).

pub mod engr;
pub mod lexer;
pub mod units;

pub use engr::{EngrNum, EngrNumFlag};
pub use lexer::{scan, NumberTraits};
pub use units::{MetricPrefix, Unit};
