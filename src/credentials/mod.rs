//! Credential store: the `users` table and the cookie sessions bound to it.
//!
//! Every mutating operation runs in its own transaction so a registration or a
//! profile update is all-or-nothing.

pub mod models;
pub mod password;
pub mod sessions;

use anyhow::Context;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Row, SqlitePool,
};
use std::str::FromStr;
use tracing::{info, Instrument, Span};
use uuid::Uuid;

pub use self::models::{UserRecord, UserUpdate};

use crate::{
    error::{Error, Result},
    roles::Role,
};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

const USER_COLUMNS: &str = "id, name, role, email, password_hash";

/// Handle to the account database. Cheap to clone; clones share the pool.
#[derive(Clone, Debug)]
pub struct CredentialStore {
    pool: SqlitePool,
}

pub(crate) fn query_span(operation: &str, statement: &str) -> Span {
    tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = operation,
        db.statement = statement
    )
}

impl CredentialStore {
    /// Open (creating if needed) the database behind `dsn` and apply the schema.
    ///
    /// # Errors
    /// Returns `Storage` if the DSN is invalid or the database is unreachable.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(dsn)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Each in-memory connection is its own database, so pin it to one.
        let pool = if dsn.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
            sqlx::query(statement)
                .execute(&mut *conn)
                .await
                .with_context(|| format!("failed to execute schema statement {}", index + 1))
                .map_err(Error::Storage)?;
        }
        Ok(())
    }

    /// Create an account. The role is stored verbatim.
    ///
    /// # Errors
    /// `Duplicate` if the email is already registered (exact match).
    pub async fn register(
        &self,
        name: &str,
        role: Role,
        email: &str,
        password: &str,
    ) -> Result<Uuid> {
        let password_hash = password::hash_password(password).await?;
        let id = Uuid::new_v4();

        let mut tx = self.pool.begin().await?;

        let query = "SELECT 1 FROM users WHERE email = ?1";
        let taken = sqlx::query(query)
            .bind(email)
            .fetch_optional(&mut *tx)
            .instrument(query_span("SELECT", query))
            .await?
            .is_some();
        if taken {
            let _ = tx.rollback().await;
            return Err(Error::Duplicate(email.to_string()));
        }

        let query = "INSERT INTO users (id, name, role, email, password_hash) VALUES (?1, ?2, ?3, ?4, ?5)";
        let inserted = sqlx::query(query)
            .bind(id)
            .bind(name)
            .bind(role.as_str())
            .bind(email)
            .bind(&password_hash)
            .execute(&mut *tx)
            .instrument(query_span("INSERT", query))
            .await;
        if let Err(err) = inserted {
            let _ = tx.rollback().await;
            return Err(duplicate_or_storage(err, email));
        }

        tx.commit().await?;
        info!(user_id = %id, role = %role, "registered user");
        Ok(id)
    }

    /// Check an email/password pair.
    ///
    /// Unknown email and wrong password fail identically, after comparable work.
    ///
    /// # Errors
    /// `Authentication` on any mismatch.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<UserRecord> {
        let Some(user) = self.find_by_email(email).await? else {
            password::verify_against_dummy(password).await?;
            return Err(Error::invalid_credentials());
        };

        if password::verify_password(password, &user.password_hash).await? {
            Ok(user)
        } else {
            Err(Error::invalid_credentials())
        }
    }

    /// # Errors
    /// `NotFound` for an unknown id.
    pub async fn get(&self, id: Uuid) -> Result<UserRecord> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await?;
        row.as_ref()
            .map(user_from_row)
            .transpose()?
            .ok_or_else(|| user_not_found(id))
    }

    /// # Errors
    /// Returns `Storage` on database failure.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    /// All users in creation order.
    ///
    /// # Errors
    /// Returns `Storage` on database failure.
    pub async fn list_all(&self) -> Result<Vec<UserRecord>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, rowid");
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await?;
        rows.iter().map(user_from_row).collect()
    }

    /// # Errors
    /// Returns `Storage` on database failure.
    pub async fn count(&self) -> Result<i64> {
        let query = "SELECT COUNT(*) AS total FROM users";
        let row = sqlx::query(query)
            .fetch_one(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;
        Ok(row.try_get("total")?)
    }

    /// Apply the allow-listed fields of `update`.
    ///
    /// # Errors
    /// `NotFound` for an unknown id, `Duplicate` if the new email belongs to
    /// another account.
    pub async fn update(&self, id: Uuid, update: &UserUpdate) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .instrument(query_span("SELECT", &query))
            .await?;
        let Some(current) = row.as_ref().map(user_from_row).transpose()? else {
            let _ = tx.rollback().await;
            return Err(user_not_found(id));
        };

        let name = update.name.as_deref().unwrap_or(&current.name);
        let email = update.email.as_deref().unwrap_or(&current.email);
        let role = update.role.unwrap_or(current.role);

        let query = "UPDATE users SET name = ?1, email = ?2, role = ?3 WHERE id = ?4";
        let result = sqlx::query(query)
            .bind(name)
            .bind(email)
            .bind(role.as_str())
            .bind(id)
            .execute(&mut *tx)
            .instrument(query_span("UPDATE", query))
            .await;
        if let Err(err) = result {
            let _ = tx.rollback().await;
            return Err(duplicate_or_storage(err, email));
        }

        tx.commit().await?;
        info!(user_id = %id, "updated user");
        Ok(())
    }

    /// Remove an account and, through the foreign key, its sessions.
    ///
    /// # Errors
    /// `NotFound` for an unknown id.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let query = "DELETE FROM users WHERE id = ?1";
        let result = sqlx::query(query)
            .bind(id)
            .execute(&mut *tx)
            .instrument(query_span("DELETE", query))
            .await?;
        if result.rows_affected() == 0 {
            let _ = tx.rollback().await;
            return Err(user_not_found(id));
        }
        tx.commit().await?;
        info!(user_id = %id, "deleted user");
        Ok(())
    }

    /// # Errors
    /// `NotFound` for an unknown id, `WrongCurrentPassword` if `current` does
    /// not match.
    pub async fn change_password(&self, id: Uuid, current: &str, new: &str) -> Result<()> {
        let user = self.get(id).await?;
        if !password::verify_password(current, &user.password_hash).await? {
            return Err(Error::WrongCurrentPassword);
        }
        let password_hash = password::hash_password(new).await?;

        let mut tx = self.pool.begin().await?;
        let query = "UPDATE users SET password_hash = ?1 WHERE id = ?2";
        let result = sqlx::query(query)
            .bind(&password_hash)
            .bind(id)
            .execute(&mut *tx)
            .instrument(query_span("UPDATE", query))
            .await?;
        if result.rows_affected() == 0 {
            let _ = tx.rollback().await;
            return Err(user_not_found(id));
        }
        tx.commit().await?;
        info!(user_id = %id, "changed password");
        Ok(())
    }

    /// Advance the user's role one step along the cycle and return it.
    ///
    /// # Errors
    /// `NotFound` for an unknown id.
    pub async fn cycle_role(&self, id: Uuid) -> Result<Role> {
        let mut tx = self.pool.begin().await?;

        let query = "SELECT role FROM users WHERE id = ?1";
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .instrument(query_span("SELECT", query))
            .await?;
        let Some(row) = row else {
            let _ = tx.rollback().await;
            return Err(user_not_found(id));
        };
        let next = role_from_text(&row.try_get::<String, _>("role")?)?.next();

        let query = "UPDATE users SET role = ?1 WHERE id = ?2";
        sqlx::query(query)
            .bind(next.as_str())
            .bind(id)
            .execute(&mut *tx)
            .instrument(query_span("UPDATE", query))
            .await?;

        tx.commit().await?;
        info!(user_id = %id, role = %next, "cycled role");
        Ok(next)
    }
}

fn user_not_found(id: Uuid) -> Error {
    Error::NotFound(format!("User {id} not found"))
}

fn role_from_text(value: &str) -> Result<Role> {
    value
        .parse()
        .map_err(|_| Error::Storage(anyhow::anyhow!("unexpected role in database: {value}")))
}

pub(crate) fn user_from_row(row: &SqliteRow) -> Result<UserRecord> {
    Ok(UserRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        role: role_from_text(&row.try_get::<String, _>("role")?)?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
    })
}

fn duplicate_or_storage(err: sqlx::Error, email: &str) -> Error {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Error::Duplicate(email.to_string())
        }
        _ => err.into(),
    }
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}
