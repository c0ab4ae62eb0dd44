use serde::{Deserialize, Serialize};

use crate::{Symbol, ValidationError};

/// Contract parameters identifying one tradable instrument at the gateway.
///
/// Immutable once built; a fresh spec is constructed for every ticker in a
/// batch. Defaults cover the common case of US equities routed through the
/// gateway's smart router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    pub symbol: Symbol,
    pub security_type: String,
    pub currency: String,
    pub venue: String,
}

impl InstrumentSpec {
    pub const DEFAULT_SECURITY_TYPE: &'static str = "STK";
    pub const DEFAULT_CURRENCY: &'static str = "USD";
    pub const DEFAULT_VENUE: &'static str = "SMART";

    pub fn new(
        symbol: Symbol,
        security_type: impl AsRef<str>,
        currency: impl AsRef<str>,
        venue: impl AsRef<str>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            symbol,
            security_type: validate_non_empty("security_type", security_type.as_ref())?,
            currency: validate_currency_code(currency.as_ref())?,
            venue: validate_non_empty("venue", venue.as_ref())?,
        })
    }

    /// US stock on the default smart route.
    pub fn equity(symbol: Symbol) -> Self {
        Self {
            symbol,
            security_type: Self::DEFAULT_SECURITY_TYPE.to_owned(),
            currency: Self::DEFAULT_CURRENCY.to_owned(),
            venue: Self::DEFAULT_VENUE.to_owned(),
        }
    }
}

/// Validate and normalize currency to an uppercase 3-letter code.
pub fn validate_currency_code(input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    let is_valid = normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

    if !is_valid {
        return Err(ValidationError::InvalidCurrency {
            value: input.to_owned(),
        });
    }

    Ok(normalized)
}

fn validate_non_empty(field: &'static str, input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    if normalized.is_empty() {
        return Err(ValidationError::EmptyInstrumentField { field });
    }
    Ok(normalized)
}
