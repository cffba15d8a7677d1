//! Numeric parsing for table cells and printed totals.
//!
//! [`parse_amount`] and [`parse_percent`] are typed and report failure. The
//! `*_or_zero` / `*_or_none` helpers are the only place where a failure is turned
//! into a default and logged.

use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;

use crate::error::ExtractionError;

lazy_static! {
    static ref NUMBER_RUN: Regex = Regex::new(r"-?\d(?:[\d,.]*\d)?").unwrap();
    static ref PERCENT_RUN: Regex = Regex::new(r"(\d+(?:[.,]\d+)?)[ \t]*%").unwrap();
}

/// Parse the first number in `raw`, ignoring currency symbols and other text.
///
/// Thousands separators are removed; a lone comma followed by one or two digits is
/// read as a decimal comma ("10,00"), and when both separators appear the last one
/// is the decimal mark.
pub fn parse_amount(field: &str, raw: &str) -> Result<Decimal, ExtractionError> {
    let parse_error = || ExtractionError::Parse {
        field: field.to_string(),
        value: raw.to_string(),
    };

    let run = NUMBER_RUN.find(raw).ok_or_else(parse_error)?;
    let normalized = normalize_number(run.as_str()).ok_or_else(parse_error)?;
    Decimal::from_str(&normalized).map_err(|_| parse_error())
}

/// Parse a percentage: the number preceding `%`, or the first number if no `%` is present.
pub fn parse_percent(field: &str, raw: &str) -> Result<Decimal, ExtractionError> {
    match PERCENT_RUN.captures(raw) {
        Some(caps) => parse_amount(field, &caps[1]),
        None => parse_amount(field, raw),
    }
}

/// [`parse_amount`], defaulting to zero with a warning.
pub fn amount_or_zero(field: &str, raw: &str) -> Decimal {
    amount_or_none(field, raw).unwrap_or(Decimal::ZERO)
}

/// [`parse_percent`], defaulting to zero with a warning.
pub fn percent_or_zero(field: &str, raw: &str) -> Decimal {
    parse_percent(field, raw).unwrap_or_else(|e| {
        warn!("{}; defaulting to 0", e);
        Decimal::ZERO
    })
}

/// [`parse_amount`], logging and discarding failures.
pub fn amount_or_none(field: &str, raw: &str) -> Option<Decimal> {
    match parse_amount(field, raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{}; defaulting to 0", e);
            None
        }
    }
}

/// Round a money value to two decimal places, halves away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Whether two amounts agree within `tolerance`. Overflow counts as disagreement.
pub fn within_tolerance(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    a.checked_sub(b)
        .map(|diff| diff.abs() <= tolerance)
        .unwrap_or(false)
}

fn normalize_number(run: &str) -> Option<String> {
    let (sign, digits) = match run.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", run),
    };

    let commas = digits.matches(',').count();
    let dots = digits.matches('.').count();

    let body = match (commas, dots) {
        (0, 0) | (0, 1) => digits.to_string(),
        (_, 0) => {
            let decimals = digits.rsplit(',').next().map_or(0, str::len);
            if commas == 1 && decimals <= 2 {
                digits.replace(',', ".")
            } else {
                digits.replace(',', "")
            }
        }
        (0, _) => {
            // "1.234.567" style thousands grouping
            let groups: Vec<&str> = digits.split('.').collect();
            if groups[1..].iter().all(|g| g.len() == 3) {
                digits.replace('.', "")
            } else {
                return None;
            }
        }
        _ => {
            let last_comma = digits.rfind(',')?;
            let last_dot = digits.rfind('.')?;
            if last_comma > last_dot {
                digits.replace('.', "").replace(',', ".")
            } else {
                digits.replace(',', "")
            }
        }
    };

    Some(format!("{}{}", sign, body))
}
