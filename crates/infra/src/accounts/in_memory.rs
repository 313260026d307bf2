use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use onboard_core::{
    AccountRepository, CompanyId, CompanyRecord, CreatedAccount, NewCompany, NewUser,
    RepositoryError, UserId, UserRecord,
};

#[derive(Debug, Default)]
struct Tables {
    companies: HashMap<CompanyId, CompanyRecord>,
    users: HashMap<UserId, UserRecord>,
    /// Unique index: normalized email → user id.
    users_by_email: HashMap<String, UserId>,
}

/// In-memory account repository.
///
/// Intended for tests/dev. Every write happens under one write lock, so a
/// company/user pair becomes visible together or not at all.
#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    tables: RwLock<Tables>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn company_count(&self) -> usize {
        self.tables.read().map(|t| t.companies.len()).unwrap_or(0)
    }

    pub fn user_count(&self) -> usize {
        self.tables.read().map(|t| t.users.len()).unwrap_or(0)
    }

    fn poisoned() -> RepositoryError {
        RepositoryError::Backend("lock poisoned".to_string())
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn email_exists(&self, email: &str) -> Result<bool, RepositoryError> {
        let tables = self.tables.read().map_err(|_| Self::poisoned())?;
        Ok(tables.users_by_email.contains_key(email))
    }

    async fn create_account(
        &self,
        company: NewCompany,
        user: NewUser,
    ) -> Result<CreatedAccount, RepositoryError> {
        let mut tables = self.tables.write().map_err(|_| Self::poisoned())?;

        if tables.users_by_email.contains_key(&user.email) {
            return Err(RepositoryError::Conflict(format!(
                "email already registered: {}",
                user.email
            )));
        }

        let now = Utc::now();
        let company_id = CompanyId::new();
        let user_id = UserId::new();

        tables.companies.insert(
            company_id,
            CompanyRecord {
                id: company_id,
                company,
                created_at: now,
            },
        );
        tables.users_by_email.insert(user.email.clone(), user_id);
        tables.users.insert(
            user_id,
            UserRecord {
                id: user_id,
                company_id,
                email: user.email,
                password_hash: user.password_hash,
                role: user.role,
                active: true,
                created_at: now,
            },
        );

        Ok(CreatedAccount {
            company_id,
            user_id,
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let tables = self.tables.read().map_err(|_| Self::poisoned())?;
        Ok(tables
            .users_by_email
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn find_user(&self, user_id: UserId) -> Result<Option<UserRecord>, RepositoryError> {
        let tables = self.tables.read().map_err(|_| Self::poisoned())?;
        Ok(tables.users.get(&user_id).cloned())
    }

    async fn find_company(
        &self,
        company_id: CompanyId,
    ) -> Result<Option<CompanyRecord>, RepositoryError> {
        let tables = self.tables.read().map_err(|_| Self::poisoned())?;
        Ok(tables.companies.get(&company_id).cloned())
    }

    async fn set_user_active(&self, user_id: UserId, active: bool) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().map_err(|_| Self::poisoned())?;
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or(RepositoryError::NotFound)?;
        user.active = active;
        Ok(())
    }
}
