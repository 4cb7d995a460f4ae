use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Cents;

pub type AccountId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    /// Current balance in cents. Never negative.
    pub balance: Cents,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(id: AccountId, name: impl Into<String>, balance: Cents) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            balance,
            created_at: now,
            updated_at: now,
        }
    }

    /// Balance after depositing `amount`, or `None` on overflow.
    pub fn credited(&self, amount: Cents) -> Option<Cents> {
        self.balance.checked_add(amount)
    }

    /// Balance after taking out `amount`, or `None` if the account cannot cover it.
    pub fn debited(&self, amount: Cents) -> Option<Cents> {
        if self.balance < amount {
            return None;
        }
        self.balance.checked_sub(amount)
    }
}
