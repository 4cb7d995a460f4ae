use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Executor, Row, Sqlite, SqlitePool, Transaction};

use crate::domain::{Account, AccountId, Cents};

use super::MIGRATION_001_ACCOUNTS;

/// Pool size for file-backed databases.
const FILE_POOL_SIZE: u32 = 4;

/// Repository for persisting and querying accounts.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL, creating the file if needed.
    ///
    /// An in-memory database lives exactly as long as its connection, so it
    /// gets a single connection that the pool never retires.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true);

        let pool_options = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(FILE_POOL_SIZE)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_ACCOUNTS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Close every connection. Later calls fail with a storage error.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Start a transaction. Queries that must see and change the same row
    /// atomically go through [`Repository::fetch_account`] and
    /// [`Repository::update_balance`] on it.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .context("Failed to begin transaction")
    }

    // ========================
    // Account operations
    // ========================

    /// Save a new account.
    pub async fn save_account(&self, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, name, balance_cents, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id)
        .bind(&account.name)
        .bind(account.balance)
        .bind(account.created_at.to_rfc3339())
        .bind(account.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save account")?;
        Ok(())
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        Self::fetch_account(&self.pool, id).await
    }

    /// Overwrite an account's balance. Returns `false` when no account has that ID.
    pub async fn set_balance(&self, id: AccountId, balance: Cents) -> Result<bool> {
        Self::update_balance(&self.pool, id, balance, Utc::now()).await
    }

    /// Get an account by ID using any executor (pool, connection or transaction).
    pub async fn fetch_account<'e, E>(executor: E, id: AccountId) -> Result<Option<Account>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query(
            r#"
            SELECT id, name, balance_cents, created_at, updated_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("Failed to fetch account")?;

        row.as_ref().map(Self::row_to_account).transpose()
    }

    /// Overwrite a balance using any executor. Returns `false` when no row matched.
    pub async fn update_balance<'e, E>(
        executor: E,
        id: AccountId,
        balance: Cents,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE accounts SET balance_cents = ?, updated_at = ? WHERE id = ?")
            .bind(balance)
            .bind(updated_at.to_rfc3339())
            .bind(id)
            .execute(executor)
            .await
            .context("Failed to update balance")?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_account(row: &SqliteRow) -> Result<Account> {
        let created_at_str: String = row.get("created_at");
        let updated_at_str: String = row.get("updated_at");

        Ok(Account {
            id: row.get("id"),
            name: row.get("name"),
            balance: row.get("balance_cents"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
            updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
                .context("Invalid updated_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}
