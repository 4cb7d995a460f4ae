use anyhow::Context;
use chrono::Utc;
use tracing::debug;

use crate::domain::{Account, AccountId, Cents};
use crate::storage::Repository;

use super::AppError;

/// Database path that selects a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Application service providing the balance operations.
/// This is the primary interface for any client (menu session, one-shot commands).
pub struct LedgerService {
    repo: Repository,
}

/// Result of a successful top-up or withdrawal
#[derive(Debug, Clone)]
pub struct BalanceChange {
    /// The account as it is after the change
    pub account: Account,
    pub amount: Cents,
    pub previous_balance: Cents,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Open (and migrate) the database at the given path.
    /// `:memory:` gives a database that disappears with the service.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let repo = Repository::init(&database_url(database_path)).await?;
        Ok(Self::new(repo))
    }

    /// Release the storage handle.
    pub async fn close(&self) {
        self.repo.close().await;
    }

    // ========================
    // Account operations
    // ========================

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Account, AppError> {
        self.repo
            .get_account(id)
            .await?
            .ok_or(AppError::AccountNotFound(id))
    }

    /// Create a new account with an opening balance.
    pub async fn open_account(
        &self,
        id: AccountId,
        name: &str,
        opening_balance: Cents,
    ) -> Result<Account, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput(
                "Account name cannot be empty".to_string(),
            ));
        }
        if opening_balance < 0 {
            return Err(AppError::InvalidInput(
                "Opening balance cannot be negative".to_string(),
            ));
        }
        if self.repo.get_account(id).await?.is_some() {
            return Err(AppError::AccountAlreadyExists(id));
        }

        let account = Account::new(id, name, opening_balance);
        self.repo.save_account(&account).await?;
        debug!(account_id = id, balance = opening_balance, "opened account");
        Ok(account)
    }

    /// Return the account with this ID, opening it first if it does not exist.
    /// An existing account keeps its name and balance.
    pub async fn ensure_account(
        &self,
        id: AccountId,
        name: &str,
        opening_balance: Cents,
    ) -> Result<Account, AppError> {
        match self.repo.get_account(id).await? {
            Some(account) => {
                debug!(account_id = id, "reusing existing account");
                Ok(account)
            }
            None => self.open_account(id, name, opening_balance).await,
        }
    }

    // ========================
    // Balance operations
    // ========================

    /// Add `amount` cents to an account's balance.
    pub async fn top_up(&self, id: AccountId, amount: Cents) -> Result<BalanceChange, AppError> {
        validate_amount(amount)?;

        let mut tx = self.repo.begin().await?;
        let account = Repository::fetch_account(&mut *tx, id)
            .await?
            .ok_or(AppError::AccountNotFound(id))?;

        let new_balance = account.credited(amount).ok_or_else(|| {
            AppError::InvalidInput("Amount would overflow the balance".to_string())
        })?;

        let change = Self::commit_balance(tx, account, amount, new_balance).await?;
        debug!(account_id = id, amount, balance = new_balance, "topped up");
        Ok(change)
    }

    /// Take `amount` cents out of an account. Fails without touching the
    /// balance if the account cannot cover it.
    pub async fn withdraw(&self, id: AccountId, amount: Cents) -> Result<BalanceChange, AppError> {
        validate_amount(amount)?;

        let mut tx = self.repo.begin().await?;
        let account = Repository::fetch_account(&mut *tx, id)
            .await?
            .ok_or(AppError::AccountNotFound(id))?;

        let Some(new_balance) = account.debited(amount) else {
            return Err(AppError::InsufficientBalance {
                account_name: account.name,
                balance: account.balance,
                requested: amount,
            });
        };

        let change = Self::commit_balance(tx, account, amount, new_balance).await?;
        debug!(account_id = id, amount, balance = new_balance, "withdrew");
        Ok(change)
    }

    /// Write the new balance and commit. The transaction is the single commit
    /// point for an operation; dropping it on an error path rolls back.
    async fn commit_balance(
        mut tx: sqlx::Transaction<'static, sqlx::Sqlite>,
        mut account: Account,
        amount: Cents,
        new_balance: Cents,
    ) -> Result<BalanceChange, AppError> {
        let now = Utc::now();
        if !Repository::update_balance(&mut *tx, account.id, new_balance, now).await? {
            return Err(AppError::AccountNotFound(account.id));
        }
        tx.commit().await.context("Failed to commit balance change")?;

        let previous_balance = account.balance;
        account.balance = new_balance;
        account.updated_at = now;
        Ok(BalanceChange {
            account,
            amount,
            previous_balance,
        })
    }
}

fn validate_amount(amount: Cents) -> Result<(), AppError> {
    if amount <= 0 {
        return Err(AppError::InvalidInput(
            "Amount must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Turn a database path into a SQLite URL.
pub fn database_url(database_path: &str) -> String {
    if database_path == IN_MEMORY {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite:{}", database_path)
    }
}
