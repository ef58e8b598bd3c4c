// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt::{self, Debug, Display, Formatter};
use core::str::FromStr;

use anyhow::{anyhow, bail, Result};
use serde::ser::Serializer;
use serde::Serialize;

/// A JavaScript number (IEEE-754 double).
///
/// Formatting follows `Number.prototype.toString`, which is also what
/// `JSON.stringify` emits for finite numbers.
#[derive(Clone, Copy)]
pub struct Number(f64);

impl Number {
    /// Parse the text of a numeric literal token (no sign, no BigInt suffix).
    pub fn from_literal(text: &str) -> Result<Number> {
        let text = text.replace('_', "");
        let radix = match text.get(0..2) {
            Some("0x" | "0X") => 16,
            Some("0o" | "0O") => 8,
            Some("0b" | "0B") => 2,
            _ => 10,
        };

        if radix != 10 {
            let digits = &text[2..];
            if digits.is_empty() {
                bail!("invalid number `{text}`");
            }
            // u128 covers every literal that a typical module contains and rounds
            // correctly when converted; longer literals accumulate in f64.
            let value = match u128::from_str_radix(digits, radix) {
                Ok(v) => v as f64,
                Err(_) => {
                    let mut v = 0f64;
                    for c in digits.chars() {
                        let d = c
                            .to_digit(radix)
                            .ok_or_else(|| anyhow!("invalid digit `{c}` in `{text}`"))?;
                        v = v * radix as f64 + d as f64;
                    }
                    v
                }
            };
            return Ok(Number(value));
        }

        // Normalize `.5`, `1.` and `1.e3` into forms every float parser accepts.
        let mut normalized = String::with_capacity(text.len() + 2);
        if text.starts_with('.') {
            normalized.push('0');
        }
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            normalized.push(c);
            if c == '.' && !chars.peek().is_some_and(|n| n.is_ascii_digit()) {
                normalized.push('0');
            }
        }

        match f64::from_str(&normalized) {
            Ok(v) => Ok(Number(v)),
            Err(_) => bail!("invalid number `{text}`"),
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.0
    }

    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }

    pub fn as_u64(&self) -> Option<u64> {
        if self.0 >= 0.0 && self.0.fract() == 0.0 && self.0 <= u64::MAX as f64 {
            Some(self.0 as u64)
        } else {
            None
        }
    }

    /// Format the number the way JavaScript's `Number.prototype.toString` does.
    pub fn format_js(&self) -> String {
        let v = self.0;
        if v.is_nan() {
            return "NaN".to_string();
        }
        if v == 0.0 {
            // Also covers -0.
            return "0".to_string();
        }
        if v.is_infinite() {
            return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
        }

        let sign = if v < 0.0 { "-" } else { "" };

        // `{:e}` yields the shortest round-tripping digits, e.g. "1.2345e3".
        let sci = format!("{:e}", v.abs());
        let (mantissa, exp) = match sci.split_once('e') {
            Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
            None => (sci.as_str(), 0),
        };
        let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
        let k = digits.len() as i32;
        let n = exp + 1;

        let body = if k <= n && n <= 21 {
            format!("{digits}{}", "0".repeat((n - k) as usize))
        } else if 0 < n && n <= 21 {
            format!("{}.{}", &digits[..n as usize], &digits[n as usize..])
        } else if -6 < n && n <= 0 {
            format!("0.{}{digits}", "0".repeat((-n) as usize))
        } else {
            let e = n - 1;
            let e_sign = if e >= 0 { "+" } else { "-" };
            if k == 1 {
                format!("{digits}e{e_sign}{}", e.abs())
            } else {
                format!("{}.{}e{e_sign}{}", &digits[..1], &digits[1..], e.abs())
            }
        };

        format!("{sign}{body}")
    }
}

impl Debug for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_js())
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_js())
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 || (self.0.is_nan() && other.0.is_nan())
    }
}

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if !self.is_finite() {
            // Matches JSON.stringify.
            return serializer.serialize_unit();
        }
        let s = self.format_js();
        let v = serde_json::Number::from_str(&s)
            .map_err(|_| serde::ser::Error::custom("could not serialize number"))?;
        v.serialize(serializer)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number(value)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number(value as f64)
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        Number(value as f64)
    }
}

impl From<usize> for Number {
    fn from(value: usize) -> Self {
        Number(value as f64)
    }
}

impl FromStr for Number {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix('-') {
            Some(rest) => Ok(Number(-Number::from_literal(rest)?.0)),
            None => Number::from_literal(s),
        }
    }
}
