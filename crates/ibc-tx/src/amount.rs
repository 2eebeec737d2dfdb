//! Human amount parsing and formatting
//!
//! Amounts typed by the user are decimal strings that may carry `,` thousand
//! separators. On chain they are integers in base units.

use terpdash_core::RawAmount;

/// Errors from amount normalization
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("amount must be greater than zero")]
    NotPositive,

    #[error("amount is smaller than one base unit")]
    BelowPrecision,

    #[error("amount is too large")]
    Overflow,
}

/// Remove thousand separators and surrounding whitespace
pub fn strip_separators(input: &str) -> String {
    input.trim().replace(',', "")
}

const MAX_EXPONENT: u32 = 100;

/// Split a decimal literal into whole and fractional digit strings
///
/// Accepts a leading `+` and an `e`/`E` exponent within ±100 (`"1.5e3"` is
/// `1500`).
fn split_decimal(cleaned: &str) -> Option<(String, String)> {
    let unsigned = cleaned.strip_prefix('+').unwrap_or(cleaned);
    let (mantissa, exponent) = match unsigned.split_once(|c: char| c == 'e' || c == 'E') {
        Some((m, e)) => (m, e.parse::<i32>().ok()?),
        None => (unsigned, 0),
    };
    if exponent.unsigned_abs() > MAX_EXPONENT {
        return None;
    }

    let (whole, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !digits_only(whole) || !digits_only(frac) {
        return None;
    }
    if exponent == 0 {
        return Some((whole.to_string(), frac.to_string()));
    }

    // Move the decimal point `exponent` places over the joined digits.
    let digits = format!("{}{}", whole, frac);
    let point = whole.len() as i64 + i64::from(exponent);
    if point <= 0 {
        let zeros = "0".repeat(usize::try_from(-point).ok()?);
        Some((String::new(), format!("{}{}", zeros, digits)))
    } else {
        let point = usize::try_from(point).ok()?;
        if point >= digits.len() {
            let zeros = "0".repeat(point - digits.len());
            Some((format!("{}{}", digits, zeros), String::new()))
        } else {
            Some((digits[..point].to_string(), digits[point..].to_string()))
        }
    }
}

/// Convert a human amount into base units, truncating extra fractional digits
///
/// `"1,234.5"` with 6 decimals becomes `1_234_500_000`. A leading `+` and
/// exponent notation are accepted. Zero, negative and non-numeric input is
/// rejected.
pub fn normalize_amount(input: &str, decimals: u32) -> Result<RawAmount, AmountError> {
    let cleaned = strip_separators(input);
    if cleaned.is_empty() {
        return Err(AmountError::Empty);
    }
    if cleaned.starts_with('-') {
        return Err(AmountError::NotPositive);
    }

    let (whole, frac) =
        split_decimal(&cleaned).ok_or_else(|| AmountError::NotANumber(input.to_string()))?;
    let (whole, frac) = (whole.as_str(), frac.as_str());

    let is_zero = whole.chars().chain(frac.chars()).all(|c| c == '0');
    if is_zero {
        return Err(AmountError::NotPositive);
    }

    let scale = 10u128
        .checked_pow(decimals)
        .ok_or(AmountError::Overflow)?;
    let whole_units: RawAmount = if whole.is_empty() {
        0
    } else {
        whole.parse::<RawAmount>().map_err(|_| AmountError::Overflow)?
    };

    let kept: String = frac.chars().take(decimals as usize).collect();
    let frac_units: RawAmount = if kept.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", kept, width = decimals as usize);
        padded.parse().map_err(|_| AmountError::Overflow)?
    };

    let total = whole_units
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac_units))
        .ok_or(AmountError::Overflow)?;
    if total == 0 {
        return Err(AmountError::BelowPrecision);
    }
    Ok(total)
}

/// Insert `,` every three digits of an integer string
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Render base units as a human amount with separators, dropping trailing zeros
pub fn format_amount(raw: RawAmount, decimals: u32) -> String {
    let scale = 10u128.pow(decimals.min(38));
    let whole = group_thousands(&(raw / scale).to_string());
    if decimals == 0 {
        return whole;
    }
    let frac = format!("{:0>width$}", raw % scale, width = decimals as usize);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole
    } else {
        format!("{}.{}", whole, frac)
    }
}

/// Amount for the 25/50/75/100% buttons; `None` when the share is zero
pub fn amount_for_percentage(balance: RawAmount, decimals: u32, percent: u8) -> Option<String> {
    let percent = RawAmount::from(percent.min(100));
    let share = balance / 100 * percent + balance % 100 * percent / 100;
    (share > 0).then(|| format_amount(share, decimals))
}
