//! Last-writer-wins merge

use crate::cart::CartState;

/// Result of folding a remote copy into the local cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The remote copy was newer and replaced the local cart.
    Replaced,

    /// The remote copy was not newer and was dropped.
    Discarded,
}

impl MergeOutcome {
    /// Returns `true` if the local cart was replaced.
    pub fn is_replaced(self) -> bool {
        matches!(self, Self::Replaced)
    }
}

impl CartState {
    /// Replaces this cart with `remote` when it was written strictly later.
    ///
    /// The whole state is swapped, items are never merged line by line. Ties
    /// keep the local copy.
    pub fn merge(&mut self, remote: CartState) -> MergeOutcome {
        if remote.last_updated > self.last_updated {
            *self = remote;
            MergeOutcome::Replaced
        } else {
            MergeOutcome::Discarded
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::cart::{CartAction, CartUuid, NewCartItem};

    use super::*;

    fn cart_at(last_updated: i64, product: &str, price: u64) -> CartState {
        let mut state = CartState::new(CartUuid::new());
        state.apply(
            CartAction::AddItem(NewCartItem::new(product, product, price)),
            last_updated,
        );
        state
    }

    #[test]
    fn older_remote_is_discarded() -> TestResult {
        let mut local = cart_at(100, "sofa", 10);
        let before = local.to_json()?;

        let outcome = local.merge(cart_at(50, "bed", 20));

        assert_eq!(outcome, MergeOutcome::Discarded);
        assert_eq!(local.to_json()?, before, "local must be byte-for-byte unchanged");

        Ok(())
    }

    #[test]
    fn equal_timestamp_keeps_local() {
        let mut local = cart_at(100, "sofa", 10);
        let before = local.clone();

        let outcome = local.merge(cart_at(100, "bed", 20));

        assert!(!outcome.is_replaced(), "ties go to the local copy");
        assert_eq!(local, before);
    }

    #[test]
    fn newer_remote_replaces_everything() {
        let mut local = cart_at(100, "sofa", 10);
        let remote = cart_at(200, "bed", 20);

        let outcome = local.merge(remote.clone());

        assert!(outcome.is_replaced(), "newer copy should win");
        assert_eq!(local, remote, "local should now deep-equal the remote copy");
        assert_eq!(local.id(), remote.id(), "identifier comes from the remote too");
    }

    #[test]
    fn notification_sequence_scenario() {
        let mut local = cart_at(100, "sofa", 10);
        let original = local.clone();

        assert_eq!(local.merge(cart_at(50, "lamp", 5)), MergeOutcome::Discarded);
        assert_eq!(local, original, "stale notification has no effect");

        let newer = cart_at(200, "desk", 70);

        assert_eq!(local.merge(newer.clone()), MergeOutcome::Replaced);
        assert_eq!(local, newer, "fresh notification replaces the cart");
    }
}
