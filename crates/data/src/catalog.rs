//! Product and category operations.

use fashion_store_core::{CategoryId, ProductId};
use tracing::instrument;

use crate::query::{Direction, Table};
use crate::types::{Category, CategoryInput, Product, ProductInput};
use crate::{DataClient, DataError};

impl DataClient {
    /// All categories, by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, DataError> {
        self.table(Table::Categories)
            .order("name", Direction::Ascending)
            .fetch()
            .await
    }

    /// Products, newest first, optionally restricted to one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(category = ?category))]
    pub async fn list_products(
        &self,
        category: Option<CategoryId>,
    ) -> Result<Vec<Product>, DataError> {
        let mut query = self.table(Table::Products);
        if let Some(category) = category {
            query = query.eq("category_id", category);
        }
        query.order("created_at", Direction::Descending).fetch().await
    }

    /// A single product, if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, DataError> {
        self.table(Table::Products).eq("id", id).maybe_single().await
    }

    /// Number of products in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn count_products(&self) -> Result<u64, DataError> {
        self.table(Table::Products).count().await
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the row.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, DataError> {
        let rows: Vec<Product> = self.insert(Table::Products, input).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DataError::Parse("insert returned no product".to_string()))
    }

    /// Replace the writable fields of a product.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NotFound`] if no product has this ID.
    #[instrument(skip(self, input), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, DataError> {
        let rows: Vec<Product> = self
            .table(Table::Products)
            .eq("id", id)
            .update(input)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DataError::NotFound(format!("product {id}")))
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), DataError> {
        self.table(Table::Products).eq("id", id).delete().await
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the row.
    #[instrument(skip(self))]
    pub async fn create_category(&self, name: &str) -> Result<Category, DataError> {
        let input = CategoryInput {
            name: name.to_string(),
        };
        let rows: Vec<Category> = self.insert(Table::Categories, &input).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DataError::Parse("insert returned no category".to_string()))
    }
}
