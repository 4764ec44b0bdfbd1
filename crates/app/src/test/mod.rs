//! Test fixtures shared by the app's unit tests.

use hearth::cart::{CartAction, CartState, CartUuid, NewCartItem};

/// A sofa at 499.00.
pub(crate) fn sofa() -> NewCartItem {
    NewCartItem::new("sofa", "Three Seat Sofa", 499_00)
}

/// A one-line cart last written at `last_updated`.
pub(crate) fn cart_at(last_updated: i64, product: &str, price: u64) -> CartState {
    let mut cart = CartState::new(CartUuid::new());

    cart.apply(
        CartAction::AddItem(NewCartItem::new(product, product, price)),
        last_updated,
    );

    cart
}
