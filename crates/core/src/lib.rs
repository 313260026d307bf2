//! `onboard-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives: the error model, typed
//! identifiers, field validation, and the account persistence port. No HTTP,
//! no storage engine.

pub mod account;
pub mod error;
pub mod id;
pub mod validation;

pub use account::{
    AccountRepository, Address, CompanyRecord, CreatedAccount, NewCompany, NewUser,
    RepositoryError, UserRecord,
};
pub use error::{DomainError, DomainResult};
pub use id::{CompanyId, UserId};
