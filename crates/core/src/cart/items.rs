//! Cart Items

use std::fmt;

use serde::{Deserialize, Serialize};

/// Catalog product identifier.
///
/// Carts only hold a reference into the external catalog, so this is kept
/// opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a product identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A line in the cart.
///
/// Name, price and image are snapshots taken when the product was added and are
/// not refreshed from the catalog afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Catalog product this line refers to.
    pub id: ProductId,

    /// Display name.
    pub name: String,

    /// Unit price in minor currency units.
    pub price: u64,

    /// Number of units, at least one while the item is in a cart.
    pub quantity: u32,

    /// Product image, if any.
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CartItem {
    /// Unit price multiplied by quantity, saturating at `u64::MAX`.
    pub fn line_total(&self) -> u64 {
        self.price.saturating_mul(u64::from(self.quantity))
    }
}

/// Product details supplied when adding to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    /// Catalog product identifier.
    pub id: ProductId,

    /// Display name.
    pub name: String,

    /// Unit price in minor currency units.
    pub price: u64,

    /// Product image, if any.
    pub image_url: Option<String>,
}

impl NewCartItem {
    /// Creates a new item without an image.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            image_url: None,
        }
    }

    /// Attaches an image URL.
    #[must_use]
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub(crate) fn into_cart_item(self) -> CartItem {
        CartItem {
            id: self.id,
            name: self.name,
            price: self.price,
            quantity: 1,
            image_url: self.image_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_total_multiplies_price_by_quantity() {
        let item = CartItem {
            id: ProductId::new("chair"),
            name: "Chair".to_string(),
            price: 45_00,
            quantity: 4,
            image_url: None,
        };

        assert_eq!(item.line_total(), 180_00, "4 x 45.00 should be 180.00");
    }

    #[test]
    fn line_total_saturates() {
        let item = CartItem {
            id: ProductId::new("gold-throne"),
            name: "Gold Throne".to_string(),
            price: u64::MAX,
            quantity: 2,
            image_url: None,
        };

        assert_eq!(item.line_total(), u64::MAX, "overflow should saturate");
    }

    #[test]
    fn new_item_enters_cart_with_a_single_unit() {
        let item = NewCartItem::new("lamp", "Lamp", 19_99)
            .with_image_url("https://cdn.example.com/lamp.jpg")
            .into_cart_item();

        assert_eq!(item.quantity, 1, "new lines start at one unit");
        assert_eq!(
            item.image_url.as_deref(),
            Some("https://cdn.example.com/lamp.jpg")
        );
    }
}
