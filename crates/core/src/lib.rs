//! Hearth
//!
//! Cart state, last-writer-wins reconciliation and the WhatsApp checkout handoff
//! for the Hearth furniture storefront.

pub mod cart;
pub mod clock;
pub mod handoff;
pub mod prelude;
pub mod uuids;
