use crate::db::schema::SQLITE_INIT;
use crate::db::users::new_security_stamp;
use crate::error::KomikError;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, SqliteConnection};
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

/// Keys written to `system_config`.
pub const KEY_IS_INSTALLED: &str = "is_installed";
pub const KEY_RECOVERY_KEY_HASH: &str = "recovery_key_hash";

#[derive(Clone)]
pub struct KomikStorage {
    pub(crate) pool: SqlitePool,
}

impl KomikStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url` and apply the schema.
    pub async fn connect(database_url: &str) -> Result<Self, KomikError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), KomikError> {
        // execute multiple statements safely (SQLite supports multi-commands but sqlx::query doesn't)
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), KomikError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn get_config(&self, key: &str) -> Result<Option<String>, KomikError> {
        let value: Option<(String,)> =
            sqlx::query_as("SELECT value FROM system_config WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value.map(|v| v.0))
    }

    pub async fn is_installed(&self) -> Result<bool, KomikError> {
        Ok(self.get_config(KEY_IS_INSTALLED).await?.as_deref() == Some("true"))
    }

    /// Persist the recovery key hash and the installed flag together.
    /// Returns `false` without writing anything when already installed.
    pub async fn mark_installed(&self, recovery_key_hash: &str) -> Result<bool, KomikError> {
        let mut tx = self.pool.begin().await?;
        let installed: Option<(String,)> =
            sqlx::query_as("SELECT value FROM system_config WHERE key = ?")
                .bind(KEY_IS_INSTALLED)
                .fetch_optional(&mut *tx)
                .await?;
        if installed.is_some_and(|v| v.0 == "true") {
            return Ok(false);
        }
        put_config(&mut *tx, KEY_RECOVERY_KEY_HASH, recovery_key_hash, true).await?;
        put_config(&mut *tx, KEY_IS_INSTALLED, "true", false).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Set a new password hash for `user_id`, rotate its stamp and burn the
    /// stored recovery key, atomically.
    pub async fn redeem_recovery_key(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<(), KomikError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "UPDATE users SET password_hash = ?, security_stamp = ?, updated_at = ? WHERE id = ?",
        )
        .bind(password_hash)
        .bind(new_security_stamp())
        .bind(Utc::now())
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM system_config WHERE key = ?")
            .bind(KEY_RECOVERY_KEY_HASH)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

/// Upsert one `system_config` entry on an open connection or transaction.
pub(crate) async fn put_config(
    conn: &mut SqliteConnection,
    key: &str,
    value: &str,
    is_encrypted: bool,
) -> Result<(), KomikError> {
    sqlx::query(
        r#"
        INSERT INTO system_config (key, value, is_encrypted, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value=excluded.value,
            is_encrypted=excluded.is_encrypted,
            updated_at=excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(value)
    .bind(is_encrypted)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(())
}
