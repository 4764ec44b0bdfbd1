//! Cart Actions

use crate::cart::{
    CartState,
    items::{NewCartItem, ProductId},
};

/// A local mutation of the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Add one unit of a product, appending a new line if it isn't in the cart yet.
    AddItem(NewCartItem),

    /// Remove the line for a product. Unknown products are ignored.
    RemoveItem(ProductId),

    /// Set the quantity of a line. Zero or negative quantities remove the line.
    UpdateQuantity {
        /// Product whose line is updated.
        id: ProductId,

        /// Requested quantity.
        quantity: i64,
    },

    /// Empty the cart.
    Clear,
}

/// Applies `action` to `state` at wall-clock time `now` (epoch milliseconds)
/// and returns the resulting state.
pub fn transition(mut state: CartState, action: CartAction, now: i64) -> CartState {
    state.apply(action, now);
    state
}

impl CartState {
    /// Applies an action in place.
    ///
    /// The total is recomputed and `last_updated` moves to `now`, or stays put
    /// if `now` is behind the current value.
    pub fn apply(&mut self, action: CartAction, now: i64) {
        match action {
            CartAction::AddItem(item) => self.add_unit(item),
            CartAction::RemoveItem(id) => self.remove_line(&id),
            CartAction::UpdateQuantity { id, quantity } => self.set_quantity(&id, quantity),
            CartAction::Clear => self.items.clear(),
        }

        self.recompute_total();
        self.touch(now);
    }

    fn add_unit(&mut self, item: NewCartItem) {
        match self.items.iter_mut().find(|line| line.id == item.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.items.push(item.into_cart_item()),
        }
    }

    fn remove_line(&mut self, id: &ProductId) {
        self.items.retain(|line| &line.id != id);
    }

    fn set_quantity(&mut self, id: &ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_line(id);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        if let Some(line) = self.items.iter_mut().find(|line| &line.id == id) {
            line.quantity = quantity;
        }
    }

    fn touch(&mut self, now: i64) {
        // Strictly later than the previous write so peers never see a tie.
        self.last_updated = now.max(self.last_updated.saturating_add(1));
    }
}

#[cfg(test)]
mod tests {
    use crate::cart::{CartItem, CartUuid};

    use super::*;

    fn sofa() -> NewCartItem {
        NewCartItem::new("sofa", "Three Seat Sofa", 499_00)
    }

    fn table() -> NewCartItem {
        NewCartItem::new("table", "Oak Dining Table", 350_00)
    }

    fn assert_total_matches_items(state: &CartState) {
        let expected: u64 = state.items().iter().map(CartItem::line_total).sum();

        assert_eq!(state.total(), expected, "total must track the items");
    }

    #[test]
    fn adding_a_new_product_appends_a_single_unit() {
        let state = transition(CartState::new(CartUuid::new()), CartAction::AddItem(sofa()), 10);

        assert_eq!(state.items().len(), 1, "expected one line");
        assert_eq!(state.items().first().map(|line| line.quantity), Some(1));
        assert_eq!(state.total(), 499_00);
        assert_eq!(state.last_updated(), 10);
    }

    #[test]
    fn adding_the_same_product_twice_increments_quantity() {
        let mut state = CartState::new(CartUuid::new());

        state.apply(CartAction::AddItem(sofa()), 1);
        state.apply(CartAction::AddItem(sofa()), 2);

        assert_eq!(state.items().len(), 1, "same product must share one line");
        assert_eq!(state.items().first().map(|line| line.quantity), Some(2));
        assert_eq!(state.total(), 998_00);
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut state = CartState::new(CartUuid::new());

        state.apply(CartAction::AddItem(table()), 1);
        state.apply(CartAction::AddItem(sofa()), 2);
        state.apply(CartAction::AddItem(table()), 3);

        let ids: Vec<&str> = state.items().iter().map(|line| line.id.as_str()).collect();

        assert_eq!(ids, ["table", "sofa"], "lines keep first-added order");
    }

    #[test]
    fn removing_an_unknown_product_leaves_items_untouched() {
        let mut state = CartState::new(CartUuid::new());
        state.apply(CartAction::AddItem(sofa()), 1);

        let before = state.clone();
        state.apply(CartAction::RemoveItem(ProductId::new("wardrobe")), 2);

        assert_eq!(state.items(), before.items(), "items should be unchanged");
        assert_eq!(state.total(), before.total(), "total should be unchanged");

        state.apply(CartAction::RemoveItem(ProductId::new("wardrobe")), 2);

        assert_eq!(state.items(), before.items(), "repeat removal is idempotent");
    }

    #[test]
    fn update_quantity_to_zero_removes_the_line() {
        let mut state = CartState::new(CartUuid::new());
        state.apply(CartAction::AddItem(sofa()), 1);
        state.apply(CartAction::AddItem(table()), 1);

        state.apply(
            CartAction::UpdateQuantity {
                id: ProductId::new("sofa"),
                quantity: 0,
            },
            2,
        );

        assert_eq!(state.items().len(), 1, "zero quantity removes the line");
        assert_eq!(state.total(), 350_00);
    }

    #[test]
    fn update_quantity_negative_removes_the_line() {
        let mut state = CartState::new(CartUuid::new());
        state.apply(CartAction::AddItem(sofa()), 1);

        state.apply(
            CartAction::UpdateQuantity {
                id: ProductId::new("sofa"),
                quantity: -3,
            },
            2,
        );

        assert!(state.is_empty(), "negative quantity removes the line");
        assert_eq!(state.total(), 0);
    }

    #[test]
    fn update_quantity_for_unknown_product_is_a_no_op() {
        let mut state = CartState::new(CartUuid::new());
        state.apply(CartAction::AddItem(sofa()), 1);

        state.apply(
            CartAction::UpdateQuantity {
                id: ProductId::new("bed"),
                quantity: 3,
            },
            2,
        );

        assert_eq!(state.items().len(), 1, "no line should be created");
        assert_eq!(state.total(), 499_00);
    }

    #[test]
    fn clear_empties_items_and_zeroes_total() {
        let mut state = CartState::new(CartUuid::new());
        state.apply(CartAction::AddItem(sofa()), 1);
        state.apply(CartAction::AddItem(table()), 2);

        state.apply(CartAction::Clear, 3);

        assert!(state.is_empty(), "clear should drop every line");
        assert_eq!(state.total(), 0);
        assert_eq!(state.last_updated(), 3);
    }

    #[test]
    fn last_updated_never_moves_backwards() {
        let mut state = CartState::new(CartUuid::new());

        state.apply(CartAction::AddItem(sofa()), 500);
        state.apply(CartAction::AddItem(sofa()), 300);

        assert_eq!(state.last_updated(), 501, "a lagging clock must not rewind");

        state.apply(CartAction::Clear, 700);

        assert_eq!(state.last_updated(), 700);
    }

    #[test]
    fn writes_in_the_same_millisecond_get_distinct_timestamps() {
        let mut writer = CartState::new(CartUuid::new());
        writer.apply(CartAction::AddItem(sofa()), 1_000);
        let mut peer = writer.clone();

        writer.apply(CartAction::AddItem(sofa()), 1_000);

        assert_eq!(writer.last_updated(), 1_001, "second write moves past the first");
        assert!(peer.merge(writer.clone()).is_replaced(), "peer accepts the second write");
        assert_eq!(peer, writer);
    }

    #[test]
    fn add_add_update_remove_scenario() {
        let id = ProductId::new("a");
        let mut state = CartState::new(CartUuid::new());

        assert_eq!(state.last_updated(), 0, "fresh carts start at the epoch");

        state.apply(CartAction::AddItem(NewCartItem::new("a", "A", 10)), 1);
        assert_eq!(state.items().first().map(|line| line.quantity), Some(1));
        assert_eq!(state.total(), 10);

        state.apply(CartAction::AddItem(NewCartItem::new("a", "A", 10)), 2);
        assert_eq!(state.items().len(), 1, "still a single line");
        assert_eq!(state.items().first().map(|line| line.quantity), Some(2));
        assert_eq!(state.total(), 20);

        state.apply(
            CartAction::UpdateQuantity {
                id: id.clone(),
                quantity: 5,
            },
            3,
        );
        assert_eq!(state.total(), 50);

        state.apply(CartAction::RemoveItem(id), 4);
        assert!(state.is_empty(), "cart should be empty after removal");
        assert_eq!(state.total(), 0);
    }

    #[test]
    fn total_tracks_items_across_mixed_sequences() {
        let actions = [
            CartAction::AddItem(sofa()),
            CartAction::AddItem(table()),
            CartAction::AddItem(sofa()),
            CartAction::UpdateQuantity {
                id: ProductId::new("table"),
                quantity: 6,
            },
            CartAction::RemoveItem(ProductId::new("sofa")),
            CartAction::AddItem(NewCartItem::new("rug", "Wool Rug", 120_00)),
            CartAction::UpdateQuantity {
                id: ProductId::new("rug"),
                quantity: 0,
            },
            CartAction::AddItem(sofa()),
        ];

        let mut state = CartState::new(CartUuid::new());

        for (now, action) in (1..).zip(actions) {
            state.apply(action, now);
            assert_total_matches_items(&state);
        }

        assert_eq!(state.total(), 6 * 350_00 + 499_00);
    }
}
