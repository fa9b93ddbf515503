//! Assistance token ledger behind the billing endpoints.

pub mod handlers;
pub mod ledger;

pub use ledger::{MemoryTokenLedger, PgTokenLedger, TokenLedger};
