//! Checkout

use hearth::handoff::{HandoffError, WhatsAppHandoff};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::reconciler::{CartReconciler, ReconcilerError};

/// Errors raised while checking out.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart isn't loaded.
    #[error(transparent)]
    Reconciler(#[from] ReconcilerError),

    /// The cart can't be turned into an order link.
    #[error("failed to build checkout link")]
    Handoff(#[from] HandoffError),
}

/// Hands the order off to the store and empties the cart.
///
/// The link is built and the cart cleared under the same lock, so a failed
/// checkout leaves the cart untouched and a remote copy arriving meanwhile is
/// applied after the clear rather than wiped by it.
///
/// # Errors
///
/// Returns an error if the cart isn't loaded, is empty, or can't be rendered.
pub fn checkout(
    reconciler: &CartReconciler,
    handoff: &WhatsAppHandoff,
) -> Result<Url, CheckoutError> {
    reconciler.clear_with(|cart| {
        let link = handoff.link(cart)?;

        info!(
            cart = %cart.id(),
            items = cart.items().len(),
            total = cart.total(),
            "order handed off"
        );

        Ok(link)
    })
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use hearth::{
        cart::{CartState, CartUuid},
        clock::ManualClock,
    };
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use crate::{
        identity::{StaticIdentity, UserUuid},
        storage::{MockLocalCartStore, RemoteCart},
        test::{cart_at, sofa},
    };

    use super::*;

    async fn loaded(cart: CartState, user: Option<UserUuid>) -> CartReconciler {
        let mut local = MockLocalCartStore::new();
        local.expect_load().return_once(move || Ok(Some(cart)));
        local.expect_save().returning(|_| Ok(()));

        let (reconciler, worker) = CartReconciler::builder(Arc::new(local))
            .identity(Arc::new(StaticIdentity::new(user)))
            .clock(Arc::new(ManualClock::new(1_000)))
            .build();
        tokio::spawn(worker.run());
        reconciler.load().await;

        reconciler
    }

    #[tokio::test]
    async fn checkout_links_the_order_and_clears_the_cart() -> TestResult {
        let reconciler = loaded(CartState::new(CartUuid::new()), None).await;
        reconciler.add_item(sofa())?;
        reconciler.add_item(sofa())?;

        let handoff = WhatsAppHandoff::new("+1 555 010 0000", USD)?;
        let link = checkout(&reconciler, &handoff)?;

        assert_eq!(link.host_str(), Some("wa.me"));
        assert_eq!(link.path(), "/15550100000");

        let text = link
            .query_pairs()
            .find(|(key, _)| key == "text")
            .map(|(_, value)| value.into_owned())
            .ok_or("missing text parameter")?;

        assert!(text.contains("Three Seat Sofa x2"), "line in message: {text}");
        let total = handoff.format_amount(998_00)?;
        assert!(text.ends_with(&format!("Total: {total}")), "total in message: {text}");

        let cart = reconciler.cart().ok_or("cart not loaded")?;
        assert!(cart.is_empty(), "cart cleared after checkout");

        Ok(())
    }

    #[tokio::test]
    async fn empty_cart_cannot_check_out() -> TestResult {
        let reconciler = loaded(CartState::new(CartUuid::new()), None).await;
        let handoff = WhatsAppHandoff::new("15550100000", USD)?;

        let result = checkout(&reconciler, &handoff);

        assert!(
            matches!(result, Err(CheckoutError::Handoff(HandoffError::EmptyCart))),
            "expected EmptyCart, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn failed_checkout_keeps_the_cart() -> TestResult {
        let original = cart_at(100, "sofa", 10);
        let reconciler = loaded(original.clone(), None).await;

        let result = reconciler.clear_with(|_| {
            Err::<(), _>(CheckoutError::Handoff(HandoffError::EmptyCart))
        });

        assert!(result.is_err(), "render failure is returned");
        assert_eq!(reconciler.cart(), Some(original), "cart left untouched");

        Ok(())
    }

    #[tokio::test]
    async fn remote_copy_arriving_during_checkout_survives_the_clear() -> TestResult {
        let user = UserUuid::new();
        let reconciler = Arc::new(loaded(cart_at(100, "sofa", 10), Some(user)).await);
        let handoff = WhatsAppHandoff::new("15550100000", USD)?;

        let incoming = cart_at(5_000, "desk", 70);
        let mut merger = None;

        let link = reconciler.clear_with(|cart| {
            let racing = Arc::clone(&reconciler);
            let remote = RemoteCart::new(user, incoming.clone());
            merger = Some(thread::spawn(move || racing.merge_remote(remote)));

            Ok::<_, CheckoutError>(handoff.link(cart)?)
        })?;

        let outcome = merger
            .ok_or("merge never started")?
            .join()
            .map_err(|_err| "merge panicked")?;

        assert!(link.as_str().contains("sofa"), "order text holds the checked-out cart");
        assert!(outcome.is_replaced(), "copy is applied after the clear");
        assert_eq!(reconciler.cart(), Some(incoming), "merged copy is not wiped");

        Ok(())
    }

    #[test]
    fn unloaded_cart_is_not_ready() -> TestResult {
        let (reconciler, _worker) =
            CartReconciler::builder(Arc::new(MockLocalCartStore::new())).build();
        let handoff = WhatsAppHandoff::new("15550100000", USD)?;

        let result = checkout(&reconciler, &handoff);

        assert!(
            matches!(result, Err(CheckoutError::Reconciler(ReconcilerError::NotReady))),
            "expected NotReady, got {result:?}"
        );

        Ok(())
    }
}
