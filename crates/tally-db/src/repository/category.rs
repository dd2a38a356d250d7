//! # Category Repository
//!
//! Deleting a category leaves its products in place, uncategorized
//! (`ON DELETE SET NULL`).

use sqlx::SqlitePool;
use tally_core::{Category, NewCategory};
use tracing::debug;

use super::{format_timestamp, new_id, now, parse_timestamp};
use crate::error::{DbError, DbResult};

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: String,
    store: String,
    name: String,
    description: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<CategoryRow> for Category {
    type Error = DbError;

    fn try_from(row: CategoryRow) -> DbResult<Self> {
        Ok(Category {
            created_at: parse_timestamp("created_at", &row.created_at)?,
            updated_at: parse_timestamp("updated_at", &row.updated_at)?,
            id: row.id,
            store: row.store,
            name: row.name,
            description: row.description,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    pub async fn create(&self, store_id: &str, new: &NewCategory) -> DbResult<Category> {
        let at = now();
        let category = Category {
            id: new_id(),
            store: store_id.to_string(),
            name: new.name.trim().to_string(),
            description: new
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            created_at: at,
            updated_at: at,
        };

        debug!(id = %category.id, store = %store_id, "Creating category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, store, name, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(&category.id)
        .bind(&category.store)
        .bind(&category.name)
        .bind(&category.description)
        .bind(format_timestamp(at))
        .execute(&self.pool)
        .await?;

        Ok(category)
    }

    /// Lists a store's categories by name.
    pub async fn list(&self, store_id: &str) -> DbResult<Vec<Category>> {
        let rows: Vec<CategoryRow> = sqlx::query_as(
            r#"
            SELECT id, store, name, description, created_at, updated_at
            FROM categories
            WHERE store = ?1
            ORDER BY name COLLATE NOCASE, id
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Category::try_from).collect()
    }

    pub async fn get(&self, id: &str) -> DbResult<Category> {
        let row: Option<CategoryRow> = sqlx::query_as(
            r#"
            SELECT id, store, name, description, created_at, updated_at
            FROM categories
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| DbError::not_found("Category", id))?
            .try_into()
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }
        Ok(())
    }
}
