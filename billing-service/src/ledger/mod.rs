//! Token balances, one row per user.
//!
//! Debits are a single conditional decrement so concurrent debits can never take a
//! balance below zero.

mod memory;
mod postgres;

pub use memory::MemoryTokenLedger;
pub use postgres::PgTokenLedger;

use async_trait::async_trait;
use shared::Result;
use uuid::Uuid;

#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Take one token. [`shared::Error::InsufficientFunds`] when the balance is empty
    /// or the user has no row.
    async fn debit(&self, user_id: Uuid) -> Result<i32>;

    /// Add `amount` tokens. [`shared::Error::NotFound`] for an unknown user,
    /// [`shared::Error::Validation`] when the balance would overflow.
    async fn credit(&self, user_id: Uuid, amount: i32) -> Result<i32>;
}
