//! # Repository Module
//!
//! Database repository implementations for Tally POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │  db.products().list_by_store(&store_id)                        │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── SQL lives here, nowhere else                                      │
//! │  ├── *Row structs mirror columns (sqlx::FromRow)                       │
//! │  └── Row → domain type conversion decodes TEXT columns                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Column Encoding
//! | Domain value            | Column                                      |
//! |-------------------------|---------------------------------------------|
//! | `Money`, discount value | TEXT decimal, e.g. `"20.70"`                |
//! | `Vec<ModifierGroup>` …  | TEXT JSON array                             |
//! | `DateTime<Utc>`         | TEXT `2024-03-01T12:00:00.000000Z`          |
//!
//! ## Available Repositories
//!
//! - [`user::UserRepository`] - Accounts and password hashes
//! - [`store::StoreRepository`] - Stores scoped by owner
//! - [`category::CategoryRepository`] - Categories per store
//! - [`product::ProductRepository`] - Products per store
//! - [`sale::SaleRepository`] - Sales, items and metrics

pub mod category;
pub mod product;
pub mod sale;
pub mod store;
pub mod user;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tally_core::Money;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Generates a new entity ID.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// The current time at the precision timestamps are stored with.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(column: &str, raw: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| DbError::corrupt(column, e))
}

pub(crate) fn parse_money(column: &str, raw: &str) -> DbResult<Money> {
    raw.parse().map_err(|e| DbError::corrupt(column, e))
}

pub(crate) fn to_json<T: Serialize>(column: &str, value: &T) -> DbResult<String> {
    serde_json::to_string(value).map_err(|e| DbError::corrupt(column, e))
}

pub(crate) fn from_json<T: DeserializeOwned>(column: &str, raw: &str) -> DbResult<T> {
    serde_json::from_str(raw).map_err(|e| DbError::corrupt(column, e))
}

#[cfg(test)]
pub(crate) mod test_support {
    use tally_core::{NewStore, Store};

    use crate::pool::{Database, DbConfig};

    /// Fresh in-memory database with one user and one store owned by them.
    pub async fn database_with_store() -> (Database, Store) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = db
            .users()
            .create("Ada", "ada@example.com", "hash")
            .await
            .unwrap();
        let store = db
            .stores()
            .create(
                &owner.id,
                &NewStore {
                    name: "Corner Cafe".to_string(),
                    address: "12 Main Street".to_string(),
                    phone: "555-0100".to_string(),
                },
            )
            .await
            .unwrap();
        (db, store)
    }
}
