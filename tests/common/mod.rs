// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use pocketbank::application::LedgerService;
use pocketbank::domain::{Account, AccountId};
use tempfile::TempDir;

pub const SEED_ID: AccountId = 1;
pub const SEED_NAME: &str = "John Doe";
pub const SEED_BALANCE: i64 = 10000;

/// Helper to create a service on a private in-memory database
pub async fn memory_service() -> Result<LedgerService> {
    Ok(LedgerService::init(":memory:").await?)
}

/// Helper to create a test service with a temporary database file
pub async fn file_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let service = LedgerService::init(db_path(&temp_dir).as_str()).await?;
    Ok((service, temp_dir))
}

pub fn db_path(temp_dir: &TempDir) -> String {
    temp_dir.path().join("test.db").to_str().unwrap().to_string()
}

/// In-memory service with the default account (1, "John Doe", 100.00)
pub async fn seeded_service() -> Result<(LedgerService, Account)> {
    let service = memory_service().await?;
    let account = service.open_account(SEED_ID, SEED_NAME, SEED_BALANCE).await?;
    Ok((service, account))
}
