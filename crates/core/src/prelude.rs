//! Hearth prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{
        CartAction, CartCodecError, CartItem, CartState, CartUuid, MergeOutcome, NewCartItem,
        ProductId, transition,
    },
    clock::{Clock, ManualClock, SystemClock},
    handoff::{HandoffError, WhatsAppHandoff},
    uuids::TypedUuid,
};
