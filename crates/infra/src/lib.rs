//! Infrastructure layer: storage adapters behind the domain's ports.

pub mod accounts;

pub use accounts::{InMemoryAccountRepository, PostgresAccountRepository};
