//! Catalog products.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::money::Money;

/// A product in the catalog.
///
/// Cart line items embed an owned copy of the product taken when it was
/// added, so later catalog edits do not change existing carts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Catalog identifier.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Category label (e.g. "Fashion").
    pub category: String,
    /// Star rating, 0 through 5.
    pub rating: u8,
    /// Unit cost.
    pub cost: Money,
    /// Image URL.
    pub image: String,
}

impl Product {
    /// Highest allowed rating.
    pub const MAX_RATING: u8 = 5;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_shape() {
        let product = Product {
            id: ProductId::new(7),
            name: "Tan Leatherette Weekender Duffle".to_owned(),
            category: "Fashion".to_owned(),
            rating: 4,
            cost: Money::whole(150),
            image: "https://example.com/duffle.png".to_owned(),
        };

        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["_id"], 7);
        assert_eq!(value["name"], "Tan Leatherette Weekender Duffle");
        assert_eq!(value["cost"], 150);

        let back: Product = serde_json::from_value(value).unwrap();
        assert_eq!(back, product);
    }
}
