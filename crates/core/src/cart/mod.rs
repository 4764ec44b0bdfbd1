//! Cart
//!
//! The client-owned cart: an ordered list of product lines, a derived total and
//! the wall-clock time of the last local mutation. Local changes go through
//! [`CartAction`]s; copies written by other devices are folded in with
//! [`CartState::merge`], which keeps whichever side was written last.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::uuids::TypedUuid;

mod actions;
mod items;
mod merge;

pub use actions::{CartAction, transition};
pub use items::{CartItem, NewCartItem, ProductId};
pub use merge::MergeOutcome;

/// Cart UUID
pub type CartUuid = TypedUuid<CartState>;

/// Errors raised while reading or writing the persisted cart text.
#[derive(Debug, Error)]
pub enum CartCodecError {
    /// The text is not a valid cart document.
    #[error("invalid cart document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Cart State
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CartDocument", into = "CartDocument")]
pub struct CartState {
    id: CartUuid,
    items: Vec<CartItem>,
    total: u64,
    last_updated: i64,
}

impl CartState {
    /// Creates an empty cart that has never been modified.
    pub fn new(id: CartUuid) -> Self {
        Self::with_items(id, Vec::new(), 0)
    }

    /// Creates a cart from existing lines.
    ///
    /// Lines with a zero quantity are dropped, repeated lines for a product are
    /// folded into the first one and the total is derived from what remains.
    pub fn with_items(id: CartUuid, items: impl Into<Vec<CartItem>>, last_updated: i64) -> Self {
        let mut lines: Vec<CartItem> = Vec::new();

        for item in items.into().into_iter().filter(|item| item.quantity > 0) {
            match lines.iter_mut().find(|line| line.id == item.id) {
                Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
                None => lines.push(item),
            }
        }

        let mut state = Self {
            id,
            items: lines,
            total: 0,
            last_updated,
        };

        state.recompute_total();
        state
    }

    /// Returns the cart identifier.
    pub fn id(&self) -> CartUuid {
        self.id
    }

    /// Returns the cart lines in the order they were added.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Returns the line for a product, if present.
    pub fn item(&self, id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Sum of every line total, in minor currency units.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Milliseconds since the Unix epoch of the latest local mutation.
    pub fn last_updated(&self) -> i64 {
        self.last_updated
    }

    /// Total number of units across all lines.
    pub fn unit_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Returns `true` when the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Serializes the cart into its persisted text form.
    ///
    /// # Errors
    ///
    /// Returns a [`CartCodecError`] if serialization fails.
    pub fn to_json(&self) -> Result<String, CartCodecError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a cart from its persisted text form.
    ///
    /// # Errors
    ///
    /// Returns a [`CartCodecError`] if the text is not a valid cart document.
    pub fn from_json(json: &str) -> Result<Self, CartCodecError> {
        Ok(serde_json::from_str(json)?)
    }

    fn recompute_total(&mut self) {
        self.total = self
            .items
            .iter()
            .fold(0_u64, |total, item| total.saturating_add(item.line_total()));
    }
}

/// Persisted cart document.
///
/// `total` is written for readers that display it directly, but it is ignored
/// when reading back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartDocument {
    id: CartUuid,
    #[serde(default)]
    items: Vec<CartItem>,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    last_updated: i64,
}

impl From<CartDocument> for CartState {
    fn from(document: CartDocument) -> Self {
        Self::with_items(document.id, document.items, document.last_updated)
    }
}

impl From<CartState> for CartDocument {
    fn from(state: CartState) -> Self {
        Self {
            id: state.id,
            items: state.items,
            total: state.total,
            last_updated: state.last_updated,
        }
    }
}
