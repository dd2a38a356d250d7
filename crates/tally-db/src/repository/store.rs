//! # Store Repository
//!
//! Stores belong to one owner. Every method that changes a store takes the
//! owner ID and treats another user's store as not found.

use sqlx::SqlitePool;
use tally_core::{NewStore, Store, StoreUpdate};
use tracing::debug;

use super::{format_timestamp, new_id, now, parse_timestamp};
use crate::error::{DbError, DbResult};

const STORE_COLUMNS: &str = "id, name, address, phone, owner, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct StoreRow {
    id: String,
    name: String,
    address: String,
    phone: String,
    owner: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<StoreRow> for Store {
    type Error = DbError;

    fn try_from(row: StoreRow) -> DbResult<Self> {
        Ok(Store {
            created_at: parse_timestamp("created_at", &row.created_at)?,
            updated_at: parse_timestamp("updated_at", &row.updated_at)?,
            id: row.id,
            name: row.name,
            address: row.address,
            phone: row.phone,
            owner: row.owner,
        })
    }
}

/// Repository for store database operations.
#[derive(Debug, Clone)]
pub struct StoreRepository {
    pool: SqlitePool,
}

impl StoreRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StoreRepository { pool }
    }

    pub async fn create(&self, owner: &str, new: &NewStore) -> DbResult<Store> {
        let at = now();
        let store = Store {
            id: new_id(),
            name: new.name.trim().to_string(),
            address: new.address.trim().to_string(),
            phone: new.phone.trim().to_string(),
            owner: owner.to_string(),
            created_at: at,
            updated_at: at,
        };

        debug!(id = %store.id, owner = %owner, "Creating store");

        sqlx::query(
            r#"
            INSERT INTO stores (id, name, address, phone, owner, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
        )
        .bind(&store.id)
        .bind(&store.name)
        .bind(&store.address)
        .bind(&store.phone)
        .bind(&store.owner)
        .bind(format_timestamp(at))
        .execute(&self.pool)
        .await?;

        Ok(store)
    }

    /// Lists the owner's stores, oldest first.
    pub async fn list_by_owner(&self, owner: &str) -> DbResult<Vec<Store>> {
        let rows: Vec<StoreRow> = sqlx::query_as(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE owner = ?1 ORDER BY created_at, id"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Store::try_from).collect()
    }

    /// Gets a store by ID regardless of owner.
    pub async fn get(&self, id: &str) -> DbResult<Store> {
        let row: Option<StoreRow> =
            sqlx::query_as(&format!("SELECT {STORE_COLUMNS} FROM stores WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.ok_or_else(|| DbError::not_found("Store", id))?
            .try_into()
    }

    /// Gets a store only if `owner` owns it.
    pub async fn get_owned(&self, id: &str, owner: &str) -> DbResult<Store> {
        let store = self.get(id).await?;
        if store.owner != owner {
            return Err(DbError::not_found("Store", id));
        }
        Ok(store)
    }

    /// Applies a partial update. `None` fields keep their current value.
    pub async fn update(&self, id: &str, owner: &str, update: &StoreUpdate) -> DbResult<Store> {
        let mut store = self.get_owned(id, owner).await?;

        if let Some(name) = &update.name {
            store.name = name.trim().to_string();
        }
        if let Some(address) = &update.address {
            store.address = address.trim().to_string();
        }
        if let Some(phone) = &update.phone {
            store.phone = phone.trim().to_string();
        }
        store.updated_at = now();

        debug!(id = %id, "Updating store");

        sqlx::query(
            r#"
            UPDATE stores SET name = ?2, address = ?3, phone = ?4, updated_at = ?5
            WHERE id = ?1 AND owner = ?6
            "#,
        )
        .bind(id)
        .bind(&store.name)
        .bind(&store.address)
        .bind(&store.phone)
        .bind(format_timestamp(store.updated_at))
        .bind(owner)
        .execute(&self.pool)
        .await?;

        Ok(store)
    }

    /// Deletes a store and, by cascade, its categories, products and sales.
    pub async fn delete(&self, id: &str, owner: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting store");

        let result = sqlx::query("DELETE FROM stores WHERE id = ?1 AND owner = ?2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Store", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::database_with_store;

    #[tokio::test]
    async fn test_create_and_list() {
        let (db, store) = database_with_store().await;

        let listed = db.stores().list_by_owner(&store.owner).await.unwrap();
        assert_eq!(listed, vec![store.clone()]);
        assert_eq!(db.stores().get(&store.id).await.unwrap(), store);
        assert!(db.stores().list_by_owner("someone-else").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_is_partial() {
        let (db, store) = database_with_store().await;

        let updated = db
            .stores()
            .update(
                &store.id,
                &store.owner,
                &StoreUpdate {
                    phone: Some("555-0199".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.phone, "555-0199");
        assert_eq!(updated.name, store.name);
        assert_eq!(db.stores().get(&store.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_other_owner_cannot_touch_store() {
        let (db, store) = database_with_store().await;

        assert!(matches!(
            db.stores().get_owned(&store.id, "intruder").await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            db.stores().delete(&store.id, "intruder").await,
            Err(DbError::NotFound { .. })
        ));

        db.stores().delete(&store.id, &store.owner).await.unwrap();
        assert!(db.stores().get(&store.id).await.is_err());
    }
}
