// human
//! ⏱️ Go-style duration strings: "10s", "200ms", "1m30s", "1.5h".
//!
//! The same strings Loki and Promtail configs use, so existing values can be pasted in.

use std::time::Duration;

use crate::error::{PushError, Result};

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3600 * NANOS_PER_SEC),
        _ => None,
    }
}

/// Parses `[+]<number><unit>[<number><unit>...]`. A bare `"0"` is fine,
/// negative values and missing units are not.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = |why: &str| PushError::config(format!("invalid duration {input:?}: {why}"));

    let mut rest = input.trim();
    if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    } else if rest.starts_with('-') {
        return Err(invalid("negative durations are not allowed"));
    }
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid("empty"));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        // -- 🔢 whole part
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_digits, after_int) = rest.split_at(int_len);

        // -- 🔢 optional fraction
        let (frac_digits, after_number) = match after_int.strip_prefix('.') {
            Some(after_dot) => {
                let frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
                after_dot.split_at(frac_len)
            }
            None => ("", after_int),
        };
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(invalid("expected a number"));
        }

        let unit_len = after_number
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() || *c == '.')
            .map_or(after_number.len(), |(i, _)| i);
        let (unit, after_unit) = after_number.split_at(unit_len);
        if unit.is_empty() {
            return Err(invalid("missing unit"));
        }
        let scale = unit_nanos(unit).ok_or_else(|| invalid(&format!("unknown unit {unit:?}")))?;

        let whole: u128 = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().map_err(|_| invalid("number out of range"))?
        };
        let mut component = whole
            .checked_mul(scale)
            .ok_or_else(|| invalid("number out of range"))?;

        // -- anything past nanosecond precision is noise, 18 digits is plenty
        let frac_digits = &frac_digits[..frac_digits.len().min(18)];
        if !frac_digits.is_empty() {
            let numerator: u128 = frac_digits.parse().map_err(|_| invalid("bad fraction"))?;
            let denominator = 10u128.pow(frac_digits.len() as u32);
            component += numerator * scale / denominator;
        }

        total = total
            .checked_add(component)
            .ok_or_else(|| invalid("number out of range"))?;
        rest = after_unit;
    }

    let nanos = u64::try_from(total).map_err(|_| invalid("number out of range"))?;
    Ok(Duration::from_nanos(nanos))
}
