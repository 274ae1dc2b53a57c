//! IEEE 754-2008 128-bit decimal, binary integer decimal (BID) encoding.
//!
//! The codec never does arithmetic on these values; the 16 bytes pass through
//! untouched. Only the canonical string form is implemented here so the JSON
//! bridge can print and parse `$numberDecimal`.

use alloc::string::{String, ToString};
use core::{fmt, str::FromStr};

use crate::error::Error;

const EXPONENT_BIAS: i32 = 6176;
const EXPONENT_MAX: i32 = 6111;
const EXPONENT_MIN: i32 = -6176;
const MAX_DIGITS: usize = 34;
const COEFFICIENT_MASK: u128 = (1 << 113) - 1;
const SIGN_BIT: u128 = 1 << 127;
const INFINITY: u128 = 0x7800_0000_0000_0000 << 64;
const NAN: u128 = 0x7C00_0000_0000_0000 << 64;

#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal128([u8; 16]);

enum Parts {
    Finite {
        negative: bool,
        coefficient: u128,
        exponent: i32,
    },
    Infinite {
        negative: bool,
    },
    NaN,
}

impl Decimal128 {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn bytes(&self) -> [u8; 16] {
        self.0
    }

    fn bits(self) -> u128 {
        u128::from_le_bytes(self.0)
    }

    fn from_bits(bits: u128) -> Self {
        Self(bits.to_le_bytes())
    }

    fn parts(self) -> Parts {
        let bits = self.bits();
        let negative = bits & SIGN_BIT != 0;
        let combination = (bits >> 122) & 0x1F;
        if combination >> 3 == 0b11 {
            match combination {
                0b11110 => return Parts::Infinite { negative },
                0b11111 => return Parts::NaN,
                _ => {
                    // The implied significand exceeds 10^34 - 1, which makes
                    // the value a non-canonical zero.
                    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                    let biased = ((bits >> 111) & 0x3FFF) as i32;
                    return Parts::Finite {
                        negative,
                        coefficient: 0,
                        exponent: biased - EXPONENT_BIAS,
                    };
                }
            }
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let biased = ((bits >> 113) & 0x3FFF) as i32;
        let mut coefficient = bits & COEFFICIENT_MASK;
        if coefficient > max_coefficient() {
            coefficient = 0;
        }
        Parts::Finite {
            negative,
            coefficient,
            exponent: biased - EXPONENT_BIAS,
        }
    }

    /// Parses the canonical string form (`"1.5"`, `"-0E+3"`, `"Infinity"`,
    /// `"NaN"`, ...).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDecimal128`] if `s` is not a decimal number, or if it
    /// cannot be represented without rounding.
    pub fn parse_str(s: &str) -> Result<Self, Error> {
        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        if body.eq_ignore_ascii_case("inf") || body.eq_ignore_ascii_case("infinity") {
            let sign = if negative { SIGN_BIT } else { 0 };
            return Ok(Self::from_bits(INFINITY | sign));
        }
        if body.eq_ignore_ascii_case("nan") {
            return Ok(Self::from_bits(NAN));
        }

        let (mantissa, exponent_part) = match body.find(['e', 'E']) {
            Some(at) => (&body[..at], Some(&body[at + 1..])),
            None => (body, None),
        };
        let mut exponent: i32 = match exponent_part {
            Some(e) => parse_exponent(e)?,
            None => 0,
        };

        let mut digits = String::with_capacity(mantissa.len());
        let mut seen_point = false;
        let mut seen_digit = false;
        for c in mantissa.chars() {
            match c {
                '0'..='9' => {
                    seen_digit = true;
                    if seen_point {
                        exponent = exponent.checked_sub(1).ok_or(Error::InvalidDecimal128)?;
                    }
                    if !(c == '0' && digits.is_empty()) {
                        digits.push(c);
                    }
                }
                '.' if !seen_point => seen_point = true,
                _ => return Err(Error::InvalidDecimal128),
            }
        }
        if !seen_digit {
            return Err(Error::InvalidDecimal128);
        }

        // Trailing zeros beyond 34 digits can be folded into the exponent.
        while digits.len() > MAX_DIGITS && digits.ends_with('0') {
            digits.pop();
            exponent = exponent.checked_add(1).ok_or(Error::InvalidDecimal128)?;
        }
        if digits.len() > MAX_DIGITS {
            return Err(Error::InvalidDecimal128);
        }
        let mut coefficient: u128 = if digits.is_empty() {
            0
        } else {
            digits.parse().map_err(|_| Error::InvalidDecimal128)?
        };
        let mut digit_count = digits.len();

        if coefficient == 0 {
            exponent = exponent.clamp(EXPONENT_MIN, EXPONENT_MAX);
        }
        while exponent > EXPONENT_MAX {
            if digit_count >= MAX_DIGITS {
                return Err(Error::InvalidDecimal128);
            }
            coefficient *= 10;
            digit_count += 1;
            exponent -= 1;
        }
        while exponent < EXPONENT_MIN {
            if coefficient % 10 != 0 {
                return Err(Error::InvalidDecimal128);
            }
            coefficient /= 10;
            exponent += 1;
        }

        #[allow(clippy::cast_sign_loss)]
        let biased = (exponent + EXPONENT_BIAS) as u128;
        let sign = if negative { SIGN_BIT } else { 0 };
        Ok(Self::from_bits(sign | (biased << 113) | coefficient))
    }
}

fn max_coefficient() -> u128 {
    10u128.pow(34) - 1
}

fn parse_exponent(e: &str) -> Result<i32, Error> {
    let digits = e.strip_prefix(['+', '-']).unwrap_or(e);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidDecimal128);
    }
    // Anything this large is out of range no matter how many digits follow.
    if digits.len() > 6 {
        return Err(Error::InvalidDecimal128);
    }
    e.parse().map_err(|_| Error::InvalidDecimal128)
}

impl fmt::Display for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (negative, coefficient, exponent) = match self.parts() {
            Parts::NaN => return f.write_str("NaN"),
            Parts::Infinite { negative } => {
                return f.write_str(if negative { "-Infinity" } else { "Infinity" });
            }
            Parts::Finite {
                negative,
                coefficient,
                exponent,
            } => (negative, coefficient, exponent),
        };
        if negative {
            f.write_str("-")?;
        }
        let digits = coefficient.to_string();
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let digit_count = digits.len() as i32;
        let adjusted = exponent + digit_count - 1;

        if exponent <= 0 && adjusted >= -6 {
            if exponent == 0 {
                return f.write_str(&digits);
            }
            let point = digit_count + exponent;
            if point <= 0 {
                #[allow(clippy::cast_sign_loss)]
                let zeros = "0".repeat((-point) as usize);
                write!(f, "0.{zeros}{digits}")
            } else {
                #[allow(clippy::cast_sign_loss)]
                let (int, frac) = digits.split_at(point as usize);
                write!(f, "{int}.{frac}")
            }
        } else {
            let (first, rest) = digits.split_at(1);
            f.write_str(first)?;
            if !rest.is_empty() {
                write!(f, ".{rest}")?;
            }
            let sign = if adjusted < 0 { "-" } else { "+" };
            write!(f, "E{sign}{}", adjusted.unsigned_abs())
        }
    }
}

impl fmt::Debug for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal128({self})")
    }
}

impl FromStr for Decimal128 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("0")]
    #[case("-0")]
    #[case("1")]
    #[case("-1")]
    #[case("1234567890123456789012345678901234")]
    #[case("0.001234")]
    #[case("1.000000000000000000000000000000000E+6144")]
    #[case("1E-6176")]
    #[case("1.23E+3")]
    #[case("1E+3")]
    #[case("1E-7")]
    #[case("Infinity")]
    #[case("-Infinity")]
    #[case("NaN")]
    fn canonical_strings_round_trip(#[case] text: &str) {
        let d = Decimal128::parse_str(text).unwrap();
        assert_eq!(d.to_string(), text);
    }

    #[rstest]
    #[case("0.0000001", "1E-7")]
    #[case("1e3", "1E+3")]
    #[case("00012.50", "12.50")]
    #[case("inf", "Infinity")]
    #[case("+1", "1")]
    #[case("1E6112", "1.0E+6112")]
    #[case("0E-9999", "0E-6176")]
    fn non_canonical_input_normalises(#[case] input: &str, #[case] printed: &str) {
        assert_eq!(Decimal128::parse_str(input).unwrap().to_string(), printed);
    }

    #[rstest]
    #[case("")]
    #[case("-")]
    #[case("1.2.3")]
    #[case("1E")]
    #[case("abc")]
    #[case("1E+6145")]
    #[case("12345678901234567890123456789012345")]
    fn rejects_garbage(#[case] input: &str) {
        assert_eq!(Decimal128::parse_str(input), Err(Error::InvalidDecimal128));
    }

    #[test]
    fn known_bit_patterns() {
        let one = Decimal128::parse_str("1").unwrap();
        assert_eq!(
            one.bytes(),
            [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x40, 0x30]
        );
        let nan = Decimal128::parse_str("NaN").unwrap();
        assert_eq!(nan.bytes()[15], 0x7C);
    }
}
