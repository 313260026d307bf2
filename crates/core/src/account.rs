//! Company/user account rows and the persistence port that owns them.
//!
//! The storage engine itself is outside the domain; this module only states
//! what the domain needs from it: create a company and its first user in one
//! atomic step, enforce email uniqueness, and read users back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::{CompanyId, UserId};
use crate::validation::build_address_line;

/// A structured postal address. Display fields are stored uppercased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub number: String,
    pub box_number: Option<String>,
    pub postal_code: String,
    pub city: String,
    pub country: String,
}

impl Address {
    /// Legacy flattened display line (structured fields remain authoritative).
    pub fn line(&self) -> String {
        let street = format!("{} {}", self.street.trim(), self.number.trim());
        build_address_line(
            &street,
            self.box_number.as_deref().unwrap_or_default(),
            &self.postal_code,
            &self.city,
            &self.country,
        )
    }
}

/// Company row to insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCompany {
    pub name: String,
    pub enterprise_number: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub contact_first_name: String,
    pub contact_last_name: String,
    pub registered: Address,
    pub billing_email: String,
    pub billing: Address,
    pub delivery: Address,
}

/// User row to insert alongside its company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

/// Persisted company row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub id: CompanyId,
    #[serde(flatten)]
    pub company: NewCompany,
    pub created_at: DateTime<Utc>,
}

/// Persisted user row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub company_id: CompanyId,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Ids of a freshly created company/user pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedAccount {
    pub company_id: CompanyId,
    pub user_id: UserId,
}

/// Persistence failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// A uniqueness constraint rejected the write (e.g. duplicate email).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found")]
    NotFound,

    /// Anything else the backend reported. Never shown to clients verbatim.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Transactional account storage.
///
/// Implementations must make `create_account` all-or-nothing: either both rows
/// become visible or neither does. Emails are compared in their normalized
/// (lowercase) form and are unique across all users.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn email_exists(&self, email: &str) -> Result<bool, RepositoryError>;

    /// Insert a company and its first user atomically.
    ///
    /// Re-checks email uniqueness inside the same transaction and fails with
    /// `RepositoryError::Conflict` if the email is taken.
    async fn create_account(
        &self,
        company: NewCompany,
        user: NewUser,
    ) -> Result<CreatedAccount, RepositoryError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError>;

    async fn find_user(&self, user_id: UserId) -> Result<Option<UserRecord>, RepositoryError>;

    async fn find_company(
        &self,
        company_id: CompanyId,
    ) -> Result<Option<CompanyRecord>, RepositoryError>;

    /// Activate or deactivate a user. Fails with `NotFound` for unknown ids.
    async fn set_user_active(&self, user_id: UserId, active: bool) -> Result<(), RepositoryError>;
}
