//! Cart persistence
//!
//! The local slot is this device's copy and always wins for the running
//! session. The remote row is a replica for picking the cart up on another
//! device.

pub mod local;
pub mod remote;

pub use local::{FileCartStore, LocalCartStore, LocalStoreError};
pub use remote::{PgRemoteCartStore, RemoteCart, RemoteCartStore, RemoteStoreError};

#[cfg(test)]
pub use local::MockLocalCartStore;
#[cfg(test)]
pub use remote::MockRemoteCartStore;
