use thiserror::Error;

use crate::domain::{AccountId, Cents, format_cents};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("User not found: account {0}")]
    AccountNotFound(AccountId),

    #[error("Account already exists: {0}")]
    AccountAlreadyExists(AccountId),

    #[error(
        "Insufficient balance for user {account_name}: balance {}, requested {}",
        cents(.balance),
        cents(.requested)
    )]
    InsufficientBalance {
        account_name: String,
        balance: Cents,
        requested: Cents,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

fn cents(amount: &Cents) -> String {
    format_cents(*amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_balance_message_shows_amounts() {
        let err = AppError::InsufficientBalance {
            account_name: "John Doe".to_string(),
            balance: 15000,
            requested: 20000,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient balance for user John Doe: balance 150.00, requested 200.00"
        );
    }
}
