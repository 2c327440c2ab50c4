use std::sync::OnceLock;

use fancy_regex::Regex;
use num_bigint::BigUint;
use num_traits::One;

use crate::is_js_whitespace;

pub const DEFAULT_DECIMALS: usize = 2;
/// Largest fraction digit count the fixed-point primitive accepts.
pub const MAX_FRACTION_DIGITS: usize = 100;

/// Something that can be formatted as a number: either a number already or
/// text that is parsed the way `parseFloat` does.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberInput {
    Number(f64),
    Text(String),
}

impl NumberInput {
    pub fn to_f64(&self) -> f64 {
        match self {
            Self::Number(value) => *value,
            Self::Text(text) => parse_float(text),
        }
    }
}

impl From<f64> for NumberInput {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for NumberInput {
    fn from(value: f32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i32> for NumberInput {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for NumberInput {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for NumberInput {
    fn from(value: i64) -> Self {
        // Same rounding as a JavaScript number literal of that value.
        Self::Number(value as f64)
    }
}

impl From<&str> for NumberInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for NumberInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    decimals: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            decimals: DEFAULT_DECIMALS,
        }
    }
}

impl FormatOptions {
    /// Digits after the decimal point, clamped to [`MAX_FRACTION_DIGITS`].
    pub fn with_decimals(mut self, decimals: usize) -> Self {
        self.decimals = decimals.min(MAX_FRACTION_DIGITS);
        self
    }

    pub fn decimals(&self) -> usize {
        self.decimals
    }
}

/// Renders `input` with exactly `decimals` digits after the decimal point.
///
/// Text is parsed like `parseFloat`; input that is not a number renders as
/// `"NaN"`. Never fails.
pub fn format_number(input: impl Into<NumberInput>, decimals: usize) -> String {
    to_fixed(input.into().to_f64(), decimals)
}

pub fn format_number_with(input: impl Into<NumberInput>, options: &FormatOptions) -> String {
    to_fixed(input.into().to_f64(), options.decimals)
}

fn float_prefix_regex() -> Option<&'static Regex> {
    static FLOAT_PREFIX: OnceLock<Option<Regex>> = OnceLock::new();
    FLOAT_PREFIX
        .get_or_init(|| {
            Regex::new(r"^[+-]?(?:Infinity|(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)").ok()
        })
        .as_ref()
}

/// Parses the longest numeric prefix of `src` after leading whitespace, the
/// way `parseFloat` does. Returns NaN when there is none.
pub fn parse_float(src: &str) -> f64 {
    let src = src.trim_start_matches(is_js_whitespace);
    let Some(regex) = float_prefix_regex() else {
        return f64::NAN;
    };
    match regex.find(src) {
        Ok(Some(matched)) => {
            let literal = matched.as_str();
            match literal.trim_start_matches(['+', '-']) {
                "Infinity" if literal.starts_with('-') => f64::NEG_INFINITY,
                "Infinity" => f64::INFINITY,
                _ => literal.parse::<f64>().unwrap_or(f64::NAN),
            }
        }
        _ => f64::NAN,
    }
}

/// Fixed-point rendering with `Number.prototype.toFixed` semantics.
///
/// The exact binary value is rounded; a tie goes to the larger magnitude.
/// Magnitudes of 1e21 and above fall back to the exponent form.
pub fn to_fixed(value: f64, fraction_digits: usize) -> String {
    let digits = fraction_digits.min(MAX_FRACTION_DIGITS);
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
        return text.to_string();
    }
    if value.abs() >= 1e21 {
        return format_exponent(value);
    }

    let (mantissa, exponent) = decompose(value.abs());
    let scaled = BigUint::from(mantissa) * BigUint::from(10u32).pow(digits as u32);
    let rounded = if exponent >= 0 {
        scaled << exponent.unsigned_abs()
    } else {
        let shift = exponent.unsigned_abs();
        let quotient = &scaled >> shift;
        let remainder = &scaled - (&quotient << shift);
        let half = BigUint::one() << (shift - 1);
        if remainder >= half {
            quotient + 1u32
        } else {
            quotient
        }
    };

    let mut out = rounded.to_string();
    if digits > 0 {
        if out.len() <= digits {
            out.insert_str(0, &"0".repeat(digits + 1 - out.len()));
        }
        out.insert(out.len() - digits, '.');
    }
    // -0 has no sign; a negative value that rounds to zero keeps it.
    if value < 0.0 {
        out.insert(0, '-');
    }
    out
}

// `value == mantissa * 2^exponent` for a finite, non-negative value.
fn decompose(value: f64) -> (u64, i32) {
    let bits = value.to_bits();
    let exponent_bits = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    if exponent_bits == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), exponent_bits - 1075)
    }
}

fn format_exponent(value: f64) -> String {
    let raw = format!("{value:e}");
    let Some((mantissa, exponent_src)) = raw.split_once('e') else {
        return raw;
    };
    let exponent = exponent_src.parse::<i32>().unwrap_or(0);
    format!("{mantissa}e{exponent:+}")
}
