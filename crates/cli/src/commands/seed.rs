//! Seed the product catalog from a YAML file.
//!
//! The file is a list of products:
//!
//! ```yaml
//! - name: Tan Leatherette Weekender Duffle
//!   category: Fashion
//!   rating: 4
//!   cost: 150
//!   image: https://images.example.com/products/duffle.png
//! ```
//!
//! Every entry is validated before the database is touched.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use qkart_core::{Money, Product};
use qkart_storefront::db::ProductRepository;
use qkart_storefront::db::products::NewProduct;

use super::{CommandError, connect};

/// One product in the seed file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProductEntry {
    name: String,
    category: String,
    rating: u8,
    cost: Money,
    image: String,
}

impl From<ProductEntry> for NewProduct {
    fn from(entry: ProductEntry) -> Self {
        Self {
            name: entry.name.trim().to_owned(),
            category: entry.category.trim().to_owned(),
            rating: entry.rating,
            cost: entry.cost,
            image: entry.image.trim().to_owned(),
        }
    }
}

/// Describe every problem in the entries; empty means valid.
fn validate_entries(entries: &[ProductEntry]) -> Vec<String> {
    let mut errors = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        let position = index + 1;
        if entry.name.trim().is_empty() {
            errors.push(format!("entry {position}: name is empty"));
        }
        if entry.category.trim().is_empty() {
            errors.push(format!("entry {position}: category is empty"));
        }
        if entry.rating > Product::MAX_RATING {
            errors.push(format!(
                "entry {position} ({}): rating {} is above {}",
                entry.name,
                entry.rating,
                Product::MAX_RATING
            ));
        }
        if entry.image.trim().is_empty() {
            errors.push(format!("entry {position} ({}): image is empty", entry.name));
        }
    }

    errors
}

fn parse_entries(content: &str) -> Result<Vec<ProductEntry>, CommandError> {
    let entries: Vec<ProductEntry> = serde_yaml::from_str(content)?;

    let errors = validate_entries(&entries);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(CommandError::InvalidSeed(errors.len()));
    }

    Ok(entries)
}

/// Insert the products listed in `file`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any entry is
/// invalid, or an insert fails.
pub async fn products(file: &Path) -> Result<(), CommandError> {
    info!(path = %file.display(), "Loading products from file");

    let content = tokio::fs::read_to_string(file)
        .await
        .map_err(|source| CommandError::Read {
            path: file.display().to_string(),
            source,
        })?;
    let entries = parse_entries(&content)?;
    info!(products = entries.len(), "Seed file validated");

    let repo = ProductRepository::new(connect().await?);

    for entry in entries {
        let product = repo.insert(&NewProduct::from(entry)).await?;
        info!(id = %product.id, name = %product.name, "Inserted product");
    }

    info!("Seeding complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_entries() {
        let yaml = r"
- name: YONEX Smash Badminton Racquet
  category: Sports
  rating: 5
  cost: 100
  image: https://example.com/racquet.png
- name: ' Tan Leatherette Weekender Duffle '
  category: Fashion
  rating: 4
  cost: '150.50'
  image: https://example.com/duffle.png
";
        let entries = parse_entries(yaml).unwrap();
        assert_eq!(entries.len(), 2);

        let product = NewProduct::from(entries.into_iter().nth(1).unwrap());
        assert_eq!(product.name, "Tan Leatherette Weekender Duffle");
        assert_eq!(product.cost, "150.50".parse::<Money>().unwrap());
    }

    #[test]
    fn test_reports_every_invalid_entry() {
        let yaml = r"
- name: ''
  category: Sports
  rating: 9
  cost: 10
  image: https://example.com/a.png
- name: Ok
  category: ''
  rating: 3
  cost: 10
  image: ''
";
        let entries: Vec<ProductEntry> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(validate_entries(&entries).len(), 4);
        assert!(matches!(
            parse_entries(yaml),
            Err(CommandError::InvalidSeed(4))
        ));
    }

    #[test]
    fn test_negative_cost_is_rejected() {
        let yaml = r"
- name: Refund
  category: Misc
  rating: 1
  cost: -5
  image: https://example.com/r.png
";
        assert!(matches!(parse_entries(yaml), Err(CommandError::Yaml(_))));
    }
}
