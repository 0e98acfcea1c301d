//! Load a demo catalog into the data service.
//!
//! The catalog is a YAML file of categories, each with its products:
//!
//! ```yaml
//! categories:
//!   - name: Robes
//!     products:
//!       - name: Robe Lin Ecru
//!         description: Robe mi-longue en lin lavé
//!         price: "89.90"
//!         image_url: https://images.example.com/robe-lin.jpg
//!         sizes: [S, M, L]
//!         colors: [Ecru, Noir]
//!         stock: 12
//!         featured: true
//! ```

use std::collections::HashSet;
use std::path::Path;

use fashion_store_core::{CategoryId, Price};
use fashion_store_data::ProductInput;
use serde::Deserialize;
use tracing::{error, info};

/// Top-level catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub categories: Vec<CategorySeed>,
}

/// A category and the products filed under it.
#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// One product to create.
#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub featured: bool,
}

impl ProductSeed {
    fn to_input(&self, category_id: Option<CategoryId>) -> ProductInput {
        ProductInput {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            image_url: self.image_url.clone(),
            sizes: self.sizes.clone(),
            colors: self.colors.clone(),
            stock: self.stock,
            featured: self.featured,
            category_id,
        }
    }
}

/// Check a catalog before anything is written.
///
/// Returns one message per problem found.
#[must_use]
pub fn validate_catalog(catalog: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for category in &catalog.categories {
        let name = category.name.trim();
        if name.is_empty() {
            errors.push("Category with an empty name".to_string());
        } else if !seen.insert(name.to_lowercase()) {
            errors.push(format!("Duplicate category: {name}"));
        }

        for product in &category.products {
            let label = format!("{name}/{}", product.name);
            if product.name.trim().is_empty() {
                errors.push(format!("Product with an empty name in {name}"));
            }
            if product.price.is_negative() {
                errors.push(format!("{label}: negative price"));
            } else if !product.price.is_listable() {
                errors.push(format!("{label}: price above {}", Price::MAX_UNIT));
            }
            if product.stock < 0 {
                errors.push(format!("{label}: negative stock"));
            }
        }
    }

    errors
}

/// Seed summary.
#[derive(Debug, Default)]
pub struct SeedResult {
    pub categories: usize,
    pub products: usize,
    pub errors: Vec<(String, String)>,
}

impl SeedResult {
    /// Fail the run when any product could not be inserted.
    ///
    /// # Errors
    ///
    /// Returns the number of failed products.
    pub fn check(&self) -> Result<(), String> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(format!("{} products failed", self.errors.len()))
        }
    }
}

/// Seed categories and products from a YAML file.
///
/// A product that fails to insert is reported and the run continues; the
/// run then ends in error.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, if validation
/// fails, if the connection settings are missing, or if any product failed
/// to insert.
pub async fn catalog(file_path: &str, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate before connecting
    let content = tokio::fs::read_to_string(path).await?;
    let catalog: CatalogFile = serde_yaml::from_str(&content)?;

    info!(categories = catalog.categories.len(), "Parsed catalog");

    let errors = validate_catalog(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    info!("Catalog validated successfully");

    if dry_run {
        let products: usize = catalog.categories.iter().map(|c| c.products.len()).sum();
        info!(products, "Dry run, nothing written");
        return Ok(());
    }

    let data = super::connect()?;
    let mut result = SeedResult::default();

    for category in &catalog.categories {
        let created = data.create_category(category.name.trim()).await?;
        result.categories += 1;
        info!(category = %created.name, "Created category");

        for product in &category.products {
            match data.create_product(&product.to_input(Some(created.id))).await {
                Ok(_) => result.products += 1,
                Err(e) => result.errors.push((product.name.clone(), e.to_string())),
            }
        }
    }

    info!("Seeding complete!");
    info!("  Categories created: {}", result.categories);
    info!("  Products created: {}", result.products);

    if !result.errors.is_empty() {
        error!("  Errors: {}", result.errors.len());
        for (product, err) in &result.errors {
            error!("    - {product}: {err}");
        }
    }

    result.check().map_err(Into::into)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
categories:
  - name: Robes
    products:
      - name: Robe Lin Ecru
        price: "89.90"
        sizes: [S, M, L]
        colors: [Ecru]
        stock: 12
        featured: true
  - name: Accessoires
    products:
      - name: Foulard Soie
        price: "35.00"
        stock: 3
"#;

    #[test]
    fn test_parse_catalog() {
        let catalog: CatalogFile = serde_yaml::from_str(CATALOG).unwrap();

        assert_eq!(catalog.categories.len(), 2);
        let robe = &catalog.categories[0].products[0];
        assert_eq!(robe.price, Price::from_cents(8990));
        assert_eq!(robe.sizes, ["S", "M", "L"]);
        assert!(robe.featured);

        let foulard = &catalog.categories[1].products[0];
        assert!(foulard.sizes.is_empty());
        assert!(!foulard.featured);
        assert!(validate_catalog(&catalog).is_empty());
    }

    #[test]
    fn test_validation_errors() {
        let yaml = r#"
categories:
  - name: Robes
    products:
      - name: ""
        price: "10.00"
      - name: Robe Courte
        price: "-1.00"
        stock: -2
  - name: robes
  - name: "  "
"#;
        let catalog: CatalogFile = serde_yaml::from_str(yaml).unwrap();
        let errors = validate_catalog(&catalog);

        assert_eq!(errors.len(), 5);
        assert!(errors.iter().any(|e| e.contains("empty name in Robes")));
        assert!(errors.iter().any(|e| e == "Robes/Robe Courte: negative price"));
        assert!(errors.iter().any(|e| e == "Robes/Robe Courte: negative stock"));
        assert!(errors.iter().any(|e| e == "Duplicate category: robes"));
        assert!(errors.iter().any(|e| e == "Category with an empty name"));
    }

    #[test]
    fn test_product_input_carries_category() {
        let catalog: CatalogFile = serde_yaml::from_str(CATALOG).unwrap();
        let id: CategoryId = "6f1c2a4e-8b3d-4e5f-9a0b-1c2d3e4f5a6b".parse().unwrap();
        let input = catalog.categories[0].products[0].to_input(Some(id));

        assert_eq!(input.category_id, Some(id));
        assert_eq!(input.stock, 12);
    }

    #[test]
    fn test_failed_products_fail_the_run() {
        let mut result = SeedResult {
            categories: 2,
            products: 4,
            errors: Vec::new(),
        };
        assert!(result.check().is_ok());

        result
            .errors
            .push(("Foulard Soie".to_string(), "HTTP 409".to_string()));
        assert_eq!(result.check().unwrap_err(), "1 products failed");
    }

    #[test]
    fn test_price_above_listing_cap() {
        let yaml = r#"
categories:
  - name: Bijoux
    products:
      - name: Collier
        price: "1000000.01"
"#;
        let catalog: CatalogFile = serde_yaml::from_str(yaml).unwrap();
        let errors = validate_catalog(&catalog);

        assert_eq!(errors, ["Bijoux/Collier: price above 1000000.00 €"]);
    }
}
