//! # User Repository
//!
//! Accounts for store owners. Emails are stored lowercased and are unique.

use sqlx::SqlitePool;
use tally_core::User;
use tracing::debug;

use super::{format_timestamp, new_id, now};
use crate::error::{DbError, DbResult};

/// A user together with their password hash. Never serialized.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    password_hash: String,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            user: User {
                id: row.id,
                name: row.name,
                email: row.email,
            },
            password_hash: row.password_hash,
        }
    }
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates a user.
    ///
    /// ## Errors
    /// `UniqueViolation` if the email is already registered.
    pub async fn create(&self, name: &str, email: &str, password_hash: &str) -> DbResult<User> {
        let id = new_id();
        let email = normalize_email(email);
        let at = format_timestamp(now());

        debug!(id = %id, "Creating user");

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(&id)
        .bind(name.trim())
        .bind(&email)
        .bind(password_hash)
        .bind(&at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", email.clone()),
            other => other,
        })?;

        Ok(User {
            id,
            name: name.trim().to_string(),
            email,
        })
    }

    /// Looks a user up by email, case-insensitively.
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRecord>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, name, email, password_hash FROM users WHERE email = ?1",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRecord::from))
    }

    pub async fn get(&self, id: &str) -> DbResult<User> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, name, email, password_hash FROM users WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| UserRecord::from(r).user)
            .ok_or_else(|| DbError::not_found("User", id))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_create_and_find() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        let user = users
            .create(" Ada ", "Ada@Example.com", "argon-hash")
            .await
            .unwrap();
        assert_eq!(user.name, "Ada");
        assert_eq!(user.email, "ada@example.com");

        let found = users.find_by_email("ADA@example.com").await.unwrap().unwrap();
        assert_eq!(found.user, user);
        assert_eq!(found.password_hash, "argon-hash");

        assert_eq!(users.get(&user.id).await.unwrap(), user);
        assert!(users.find_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users().create("Ada", "ada@example.com", "h").await.unwrap();

        let err = db
            .users()
            .create("Other", "ADA@example.com", "h")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "email"));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(matches!(
            db.users().get("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
