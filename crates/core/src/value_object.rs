//! Value objects: equality by value, not identity.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects.
///
/// Value objects have no identity; two instances with the same attributes are
/// interchangeable. Entities embed them by value, so snapshots taken for
/// change tracking copy them along with the entity.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Monetary amount (budgets, box-office grosses).
///
/// The amount is kept as a normalized decimal string so it survives the
/// document store without float rounding: `{"amount": "1500000.50", "currency": "USD"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMoney", into = "RawMoney")]
pub struct Money {
    amount: String,
    currency: String,
}

#[derive(Serialize, Deserialize)]
struct RawMoney {
    amount: String,
    currency: String,
}

impl Money {
    pub fn new(amount: impl AsRef<str>, currency: impl AsRef<str>) -> DomainResult<Self> {
        let amount = normalize_decimal(amount.as_ref())?;
        let currency = currency.as_ref().trim().to_ascii_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::validation(format!(
                "currency must be a 3-letter code, got '{currency}'"
            )));
        }
        Ok(Self { amount, currency })
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

impl ValueObject for Money {}

impl TryFrom<RawMoney> for Money {
    type Error = DomainError;

    fn try_from(raw: RawMoney) -> Result<Self, Self::Error> {
        Money::new(raw.amount, raw.currency)
    }
}

impl From<Money> for RawMoney {
    fn from(value: Money) -> Self {
        Self {
            amount: value.amount,
            currency: value.currency,
        }
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// Strip redundant zeros so equal amounts compare equal ("010.50" == "10.5").
fn normalize_decimal(raw: &str) -> DomainResult<String> {
    let raw = raw.trim();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };

    let well_formed = !int_part.is_empty()
        && int_part.chars().all(|c| c.is_ascii_digit())
        && frac_part.chars().all(|c| c.is_ascii_digit())
        && !(digits.contains('.') && frac_part.is_empty());
    if !well_formed {
        return Err(DomainError::validation(format!("malformed decimal amount '{raw}'")));
    }

    let int_part = int_part.trim_start_matches('0');
    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::with_capacity(raw.len());
    if negative && (int_part != "0" || !frac_part.is_empty()) {
        out.push('-');
    }
    out.push_str(int_part);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    Ok(out)
}
