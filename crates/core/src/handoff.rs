//! Checkout handoff
//!
//! Orders are placed by sending the store a WhatsApp message, so checking out
//! turns the cart into a `wa.me` link with the order pre-filled as text.

use std::fmt::Write as _;

use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use url::Url;

use crate::cart::CartState;

const WHATSAPP_BASE_URL: &str = "https://wa.me";

/// Errors raised while building the checkout link.
#[derive(Debug, Error, PartialEq)]
pub enum HandoffError {
    /// There is nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// The store phone number contains no digits.
    #[error("phone number {0:?} contains no digits")]
    InvalidPhone(String),

    /// An amount does not fit the money type.
    #[error("amount {0} is out of range")]
    AmountOutOfRange(u64),

    /// The assembled link is not a valid URL.
    #[error("invalid handoff url: {0}")]
    Url(#[from] url::ParseError),
}

/// Builds WhatsApp order messages for a store.
#[derive(Debug, Clone)]
pub struct WhatsAppHandoff {
    phone: String,
    currency: &'static Currency,
}

impl WhatsAppHandoff {
    /// Creates a handoff to the given store phone number.
    ///
    /// Formatting characters (`+`, spaces, dashes, brackets) are stripped;
    /// WhatsApp expects the bare international number.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::InvalidPhone`] if the number has no digits.
    pub fn new(phone: &str, currency: &'static Currency) -> Result<Self, HandoffError> {
        let digits: String = phone.chars().filter(char::is_ascii_digit).collect();

        if digits.is_empty() {
            return Err(HandoffError::InvalidPhone(phone.to_string()));
        }

        Ok(Self {
            phone: digits,
            currency,
        })
    }

    /// The normalised store phone number.
    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// The currency amounts are rendered in.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Formats an amount in minor units.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::AmountOutOfRange`] if the amount exceeds `i64::MAX`.
    pub fn format_amount(&self, minor: u64) -> Result<String, HandoffError> {
        let amount = i64::try_from(minor).map_err(|_err| HandoffError::AmountOutOfRange(minor))?;

        Ok(Money::from_minor(amount, self.currency).to_string())
    }

    /// Renders the order text for a cart.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::EmptyCart`] for an empty cart, or
    /// [`HandoffError::AmountOutOfRange`] if a price can't be formatted.
    pub fn message(&self, cart: &CartState) -> Result<String, HandoffError> {
        if cart.is_empty() {
            return Err(HandoffError::EmptyCart);
        }

        let mut message = String::from("Hello! I'd like to place an order:\n\n");

        for (position, item) in (1..).zip(cart.items()) {
            let line_total = self.format_amount(item.line_total())?;

            // Writing into a String is infallible.
            _ = writeln!(
                message,
                "{position}. {} x{} - {line_total}",
                item.name, item.quantity
            );
        }

        _ = write!(message, "\nTotal: {}", self.format_amount(cart.total())?);

        Ok(message)
    }

    /// Builds the `wa.me` deep link carrying the order text.
    ///
    /// # Errors
    ///
    /// Returns any error from [`WhatsAppHandoff::message`], or
    /// [`HandoffError::Url`] if the link can't be parsed.
    pub fn link(&self, cart: &CartState) -> Result<Url, HandoffError> {
        let message = self.message(cart)?;
        let link = format!(
            "{WHATSAPP_BASE_URL}/{}?text={}",
            self.phone,
            urlencoding::encode(&message)
        );

        Ok(Url::parse(&link)?)
    }
}
