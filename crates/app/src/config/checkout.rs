//! Checkout Config

use clap::Args;
use hearth::handoff::{HandoffError, WhatsAppHandoff};
use rusty_money::iso::{self, Currency};
use thiserror::Error;

/// Errors raised while turning configuration into runtime values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The currency code is not a known ISO 4217 code.
    #[error("unknown currency {0:?}")]
    UnknownCurrency(String),

    /// Checkout needs the store's WhatsApp number.
    #[error("no WhatsApp number configured; set WHATSAPP_PHONE")]
    MissingPhone,

    /// The WhatsApp number is unusable.
    #[error(transparent)]
    Handoff(#[from] HandoffError),
}

/// Checkout handoff settings.
#[derive(Debug, Args)]
pub struct CheckoutConfig {
    /// Store WhatsApp number, in international format
    #[arg(long, env = "WHATSAPP_PHONE")]
    pub whatsapp_phone: Option<String>,

    /// ISO 4217 currency prices are quoted in
    #[arg(long, env = "STORE_CURRENCY", default_value = "USD")]
    pub currency: String,
}

impl CheckoutConfig {
    /// Resolves the configured currency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCurrency`] for an unknown code.
    pub fn currency(&self) -> Result<&'static Currency, ConfigError> {
        let code = self.currency.trim().to_ascii_uppercase();

        iso::find(&code).ok_or(ConfigError::UnknownCurrency(code))
    }

    /// Builds the WhatsApp handoff for checkout.
    ///
    /// # Errors
    ///
    /// Returns an error if the phone number is missing or invalid, or the
    /// currency is unknown.
    pub fn handoff(&self) -> Result<WhatsAppHandoff, ConfigError> {
        let phone = self
            .whatsapp_phone
            .as_deref()
            .ok_or(ConfigError::MissingPhone)?;

        Ok(WhatsAppHandoff::new(phone, self.currency()?)?)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn config(phone: Option<&str>, currency: &str) -> CheckoutConfig {
        CheckoutConfig {
            whatsapp_phone: phone.map(str::to_string),
            currency: currency.to_string(),
        }
    }

    #[test]
    fn currency_codes_are_case_insensitive() -> TestResult {
        assert_eq!(config(None, " brl ").currency()?.iso_alpha_code, "BRL");

        Ok(())
    }

    #[test]
    fn unknown_currency_is_rejected() {
        let result = config(None, "XYZ1").currency();

        assert!(
            matches!(result, Err(ConfigError::UnknownCurrency(_))),
            "expected UnknownCurrency, got {result:?}"
        );
    }

    #[test]
    fn handoff_requires_a_phone() {
        let result = config(None, "USD").handoff();

        assert!(
            matches!(result, Err(ConfigError::MissingPhone)),
            "expected MissingPhone, got {result:?}"
        );
    }

    #[test]
    fn handoff_uses_configured_currency() -> TestResult {
        let handoff = config(Some("+55 11 98765 4321"), "BRL").handoff()?;

        assert_eq!(handoff.currency().iso_alpha_code, "BRL");
        assert_eq!(handoff.phone(), "5511987654321");

        Ok(())
    }
}
