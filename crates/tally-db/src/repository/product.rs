//! # Product Repository
//!
//! Database operations for a store's catalog.
//!
//! ## Storage
//! ```text
//! products
//! ├── price      TEXT  "4.50"
//! ├── modifiers  TEXT  [{"name":"Size","options":[{"name":"Large","price":1.5}]}]
//! └── discounts  TEXT  [{"name":"Happy Hour","type":"percentage","value":10.0}]
//! ```

use sqlx::SqlitePool;
use tally_core::{NewProduct, Product, ProductUpdate};
use tracing::debug;

use super::{format_timestamp, from_json, new_id, now, parse_money, parse_timestamp, to_json};
use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str =
    "id, store, name, price, category, modifiers, discounts, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    store: String,
    name: String,
    price: String,
    category: Option<String>,
    modifiers: String,
    discounts: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        Ok(Product {
            price: parse_money("price", &row.price)?,
            modifiers: from_json("modifiers", &row.modifiers)?,
            discounts: from_json("discounts", &row.discounts)?,
            created_at: parse_timestamp("created_at", &row.created_at)?,
            updated_at: parse_timestamp("updated_at", &row.updated_at)?,
            id: row.id,
            store: row.store,
            name: row.name,
            category: row.category,
        })
    }
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a product in a store.
    ///
    /// ## Errors
    /// `NotFound` if `category` is set but is not a category of this store.
    pub async fn create(&self, store_id: &str, new: &NewProduct) -> DbResult<Product> {
        if let Some(category) = &new.category {
            self.ensure_category_in_store(category, store_id).await?;
        }

        let at = now();
        let product = Product {
            id: new_id(),
            store: store_id.to_string(),
            name: new.name.trim().to_string(),
            price: new.price,
            category: new.category.clone(),
            modifiers: new.modifiers.clone(),
            discounts: new.discounts.clone(),
            created_at: at,
            updated_at: at,
        };

        debug!(id = %product.id, store = %store_id, "Creating product");
        self.insert(&product).await?;
        Ok(product)
    }

    async fn insert(&self, product: &Product) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, store, name, price, category,
                modifiers, discounts, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.store)
        .bind(&product.name)
        .bind(product.price.amount().to_string())
        .bind(&product.category)
        .bind(to_json("modifiers", &product.modifiers)?)
        .bind(to_json("discounts", &product.discounts)?)
        .bind(format_timestamp(product.created_at))
        .bind(format_timestamp(product.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists a store's products by name.
    pub async fn list_by_store(&self, store_id: &str) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE store = ?1 ORDER BY name COLLATE NOCASE, id"
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    pub async fn get(&self, id: &str) -> DbResult<Product> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.ok_or_else(|| DbError::not_found("Product", id))?
            .try_into()
    }

    /// Number of products in a store.
    pub async fn count(&self, store_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE store = ?1")
            .bind(store_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Applies a partial update and returns the stored product.
    pub async fn update(&self, id: &str, update: &ProductUpdate) -> DbResult<Product> {
        let mut product = self.get(id).await?;

        if let Some(name) = &update.name {
            product.name = name.trim().to_string();
        }
        if let Some(price) = update.price {
            product.price = price;
        }
        if update.clear_category {
            product.category = None;
        } else if let Some(category) = &update.category {
            self.ensure_category_in_store(category, &product.store)
                .await?;
            product.category = Some(category.clone());
        }
        if let Some(modifiers) = &update.modifiers {
            product.modifiers = modifiers.clone();
        }
        if let Some(discounts) = &update.discounts {
            product.discounts = discounts.clone();
        }
        product.updated_at = now();

        debug!(id = %id, "Updating product");

        sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                price = ?3,
                category = ?4,
                modifiers = ?5,
                discounts = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&product.name)
        .bind(product.price.amount().to_string())
        .bind(&product.category)
        .bind(to_json("modifiers", &product.modifiers)?)
        .bind(to_json("discounts", &product.discounts)?)
        .bind(format_timestamp(product.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    async fn ensure_category_in_store(&self, category: &str, store_id: &str) -> DbResult<()> {
        let owner: Option<String> = sqlx::query_scalar("SELECT store FROM categories WHERE id = ?1")
            .bind(category)
            .fetch_optional(&self.pool)
            .await?;

        match owner {
            Some(store) if store == store_id => Ok(()),
            _ => Err(DbError::not_found("Category", category)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::database_with_store;
    use tally_core::{Discount, ModifierGroup, ModifierOption, Money, NewCategory};

    fn latte() -> NewProduct {
        NewProduct {
            name: "Latte".to_string(),
            price: Money::from_cents(450),
            category: None,
            modifiers: vec![ModifierGroup {
                name: "Size".to_string(),
                options: vec![ModifierOption::new("Large", Money::from_cents(150))],
            }],
            discounts: vec![Discount::percentage("Happy Hour", 10)],
        }
    }

    #[tokio::test]
    async fn test_round_trip_keeps_modifiers_and_discounts() {
        let (db, store) = database_with_store().await;

        let created = db.products().create(&store.id, &latte()).await.unwrap();
        let fetched = db.products().get(&created.id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.modifiers[0].options[0].price, Money::from_cents(150));
        assert_eq!(db.products().count(&store.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_by_store_sorted_by_name() {
        let (db, store) = database_with_store().await;
        let products = db.products();

        products
            .create(&store.id, &NewProduct { name: "espresso".to_string(), ..latte() })
            .await
            .unwrap();
        products.create(&store.id, &latte()).await.unwrap();

        let names: Vec<String> = products
            .list_by_store(&store.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["espresso", "Latte"]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (db, store) = database_with_store().await;
        let created = db.products().create(&store.id, &latte()).await.unwrap();

        let updated = db
            .products()
            .update(
                &created.id,
                &ProductUpdate {
                    price: Some(Money::from_cents(500)),
                    discounts: Some(Vec::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, Money::from_cents(500));
        assert!(updated.discounts.is_empty());
        assert_eq!(updated.modifiers, created.modifiers);
        assert_eq!(db.products().get(&created.id).await.unwrap(), updated);

        db.products().delete(&created.id).await.unwrap();
        assert!(matches!(
            db.products().get(&created.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_category_must_belong_to_store() {
        let (db, store) = database_with_store().await;
        let other_store = db
            .stores()
            .create(
                &store.owner,
                &tally_core::NewStore {
                    name: "Second".to_string(),
                    address: String::new(),
                    phone: String::new(),
                },
            )
            .await
            .unwrap();
        let foreign = db
            .categories()
            .create(
                &other_store.id,
                &NewCategory {
                    name: "Drinks".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();

        let err = db
            .products()
            .create(
                &store.id,
                &NewProduct {
                    category: Some(foreign.id),
                    ..latte()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Category"));
    }
}
