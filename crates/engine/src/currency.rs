use serde::{Deserialize, Serialize};

use crate::EngineError;

/// ISO currency code of an expedition price and of the bookings made on it.
///
/// Trekko is effectively a Brazilian marketplace (default `BRL`), but prices
/// carry their currency explicitly so that foreign guides can list in `USD` or
/// `EUR`.
///
/// ## Minor units
///
/// Every amount is stored as an `i64` number of **minor units** (see
/// `MoneyCents`). All supported currencies use 2 fraction digits, so
/// `150,00 BRL` ⇄ `15000`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Brl,
    Usd,
    Eur,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Brl => "BRL",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BRL" => Ok(Currency::Brl),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            other => Err(EngineError::Validation(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}
