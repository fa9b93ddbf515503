//! Assistance request lifecycle: creation, the expert queue, acceptance, resolution
//! and rating.

pub mod error;
pub mod handlers;
pub mod service;
pub mod store;

pub use error::{ErrorKind, RequestError, Result};
pub use service::RequestService;
pub use store::{MemoryRequestStore, PgRequestStore, RequestStore};
