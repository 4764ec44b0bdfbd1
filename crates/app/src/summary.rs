//! Cart summary table

use std::io;

use hearth::cart::CartState;
use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;

/// Errors raised while writing a cart summary.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// An amount doesn't fit the money type.
    #[error("amount {0} is out of range")]
    AmountOutOfRange(u64),

    /// The writer failed.
    #[error("failed to write cart summary")]
    Io(#[from] io::Error),
}

/// Writes the cart as a table followed by its total.
///
/// # Errors
///
/// Returns an error if an amount can't be formatted or the writer fails.
pub fn write_summary(
    mut out: impl io::Write,
    cart: &CartState,
    currency: &'static Currency,
) -> Result<(), SummaryError> {
    if cart.is_empty() {
        writeln!(out, "Your cart is empty.")?;
        return Ok(());
    }

    let mut builder = Builder::default();
    builder.push_record(["Product", "Name", "Price", "Qty", "Line Total"]);

    for item in cart.items() {
        builder.push_record([
            item.id.to_string(),
            item.name.clone(),
            money(item.price, currency)?,
            item.quantity.to_string(),
            money(item.line_total(), currency)?,
        ]);
    }

    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.modify(Columns::new(2..5), Alignment::right());

    writeln!(out, "{table}")?;
    writeln!(
        out,
        "{} items  Total: {}",
        cart.unit_count(),
        money(cart.total(), currency)?
    )?;

    Ok(())
}

fn money(minor: u64, currency: &'static Currency) -> Result<String, SummaryError> {
    let amount = i64::try_from(minor).map_err(|_err| SummaryError::AmountOutOfRange(minor))?;

    Ok(Money::from_minor(amount, currency).to_string())
}

#[cfg(test)]
mod tests {
    use hearth::cart::{CartAction, CartUuid, NewCartItem};
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn empty_cart_says_so() -> TestResult {
        let mut out = Vec::new();

        write_summary(&mut out, &CartState::new(CartUuid::new()), USD)?;

        assert_eq!(String::from_utf8(out)?, "Your cart is empty.\n");

        Ok(())
    }

    #[test]
    fn lines_and_total_are_listed() -> TestResult {
        let mut cart = CartState::new(CartUuid::new());
        cart.apply(CartAction::AddItem(NewCartItem::new("lamp", "Floor Lamp", 45_00)), 1);
        cart.apply(CartAction::AddItem(NewCartItem::new("lamp", "Floor Lamp", 45_00)), 2);
        cart.apply(CartAction::AddItem(NewCartItem::new("rug", "Wool Rug", 120_00)), 3);

        let mut out = Vec::new();
        write_summary(&mut out, &cart, USD)?;
        let text = String::from_utf8(out)?;

        assert!(text.contains("Floor Lamp"), "lamp row: {text}");
        assert!(text.contains("Wool Rug"), "rug row: {text}");
        assert!(
            text.contains(&format!("3 items  Total: {}", Money::from_minor(210_00, USD))),
            "summary line: {text}"
        );

        Ok(())
    }
}
