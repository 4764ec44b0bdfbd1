//! Hearth application: cart session reconciliation, persistence and sync.

pub mod checkout;
pub mod config;
pub mod context;
pub mod database;
pub mod identity;
pub mod notifications;
pub mod observability;
pub mod realtime;
pub mod reconciler;
pub mod storage;
pub mod summary;

#[cfg(test)]
mod test;
