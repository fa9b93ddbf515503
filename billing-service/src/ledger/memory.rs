use async_trait::async_trait;
use shared::{Error, Result};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::TokenLedger;

/// In-process ledger for tests and local runs.
#[derive(Default)]
pub struct MemoryTokenLedger {
    balances: Mutex<HashMap<Uuid, i32>>,
}

impl MemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a user's balance.
    pub async fn open_account(&self, user_id: Uuid, balance: i32) {
        self.balances.lock().await.insert(user_id, balance);
    }

    pub async fn balance(&self, user_id: Uuid) -> Option<i32> {
        self.balances.lock().await.get(&user_id).copied()
    }
}

#[async_trait]
impl TokenLedger for MemoryTokenLedger {
    async fn debit(&self, user_id: Uuid) -> Result<i32> {
        let mut balances = self.balances.lock().await;
        match balances.get_mut(&user_id) {
            Some(balance) if *balance > 0 => {
                *balance -= 1;
                Ok(*balance)
            }
            _ => Err(Error::InsufficientFunds),
        }
    }

    async fn credit(&self, user_id: Uuid, amount: i32) -> Result<i32> {
        let mut balances = self.balances.lock().await;
        let balance = balances
            .get_mut(&user_id)
            .ok_or_else(|| Error::NotFound(format!("user {}", user_id)))?;
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| Error::Validation(format!("credit of {} overflows balance", amount)))?;
        Ok(*balance)
    }
}
