//! Authentication gate: login, per-request authentication, logout.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::instrument;

use onboard_core::AccountRepository;
use onboard_core::validation::normalize_email;

use crate::password::verify_password_blocking;
use crate::session::{Session, SessionStore};
use crate::token::{generate_token, token_prefix};
use crate::{AuthError, Identity};

/// Resolves credentials and bearer tokens to active identities.
#[derive(Clone)]
pub struct AuthGate {
    accounts: Arc<dyn AccountRepository>,
    sessions: Arc<dyn SessionStore>,
    session_ttl: Duration,
}

impl AuthGate {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        sessions: Arc<dyn SessionStore>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            accounts,
            sessions,
            session_ttl,
        }
    }

    /// Verify email + password and open a new session.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let email = normalize_email("email", email).map_err(|_| AuthError::Unauthorized)?;

        let user = self
            .accounts
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !user.active {
            tracing::info!(user_id = %user.id, "login refused for inactive user");
            return Err(AuthError::Unauthorized);
        }
        if !verify_password_blocking(password.to_string(), user.password_hash.clone()).await {
            tracing::info!(user_id = %user.id, "login refused: bad password");
            return Err(AuthError::Unauthorized);
        }

        let token = generate_token();
        self.sessions.insert(Session::new(
            token.clone(),
            user.id,
            Utc::now(),
            self.session_ttl,
        ));

        tracing::info!(user_id = %user.id, session = token_prefix(&token), "session opened");
        Ok(token)
    }

    /// Resolve a session token to the identity of an existing, active user.
    ///
    /// The user row is re-read on every call. A session whose user has vanished
    /// or been deactivated is evicted before failing.
    pub async fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        let session = self
            .sessions
            .get(token, Utc::now())
            .ok_or(AuthError::Unauthorized)?;

        match self.accounts.find_user(session.user_id).await? {
            Some(user) if user.active => Ok(Identity::from(user)),
            _ => {
                self.sessions.remove(token);
                tracing::info!(
                    user_id = %session.user_id,
                    session = token_prefix(token),
                    "evicted session of missing or inactive user"
                );
                Err(AuthError::Unauthorized)
            }
        }
    }

    /// Close a session. Unknown tokens are ignored.
    pub fn logout(&self, token: &str) {
        if self.sessions.remove(token) {
            tracing::info!(session = token_prefix(token), "session closed");
        }
    }

    /// Drop expired sessions; returns how many were removed.
    pub fn purge_expired_sessions(&self) -> usize {
        self.sessions.purge_expired(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::hash_password;
    use crate::session::InMemorySessionStore;
    use onboard_core::{Address, CreatedAccount, NewCompany, NewUser};
    use onboard_infra::accounts::InMemoryAccountRepository;

    fn address() -> Address {
        Address {
            street: "MAIN ST".into(),
            number: "1".into(),
            box_number: None,
            postal_code: "1000".into(),
            city: "BRUSSELS".into(),
            country: "BE".into(),
        }
    }

    async fn seed_user(repo: &InMemoryAccountRepository, email: &str, password: &str) -> CreatedAccount {
        let company = NewCompany {
            name: "ACME".into(),
            enterprise_number: "BE0123456789".into(),
            website: None,
            phone: None,
            contact_first_name: "JANE".into(),
            contact_last_name: "DOE".into(),
            registered: address(),
            billing_email: email.into(),
            billing: address(),
            delivery: address(),
        };
        let user = NewUser {
            email: email.into(),
            password_hash: hash_password(password).unwrap(),
            role: "owner".into(),
        };
        repo.create_account(company, user).await.unwrap()
    }

    fn gate(repo: Arc<InMemoryAccountRepository>, sessions: Arc<InMemorySessionStore>) -> AuthGate {
        AuthGate::new(repo, sessions, Duration::hours(1))
    }

    #[tokio::test]
    async fn login_then_authenticate() {
        let repo = Arc::new(InMemoryAccountRepository::new());
        let created = seed_user(&repo, "a@x.com", "longpass1").await;
        let gate = gate(repo, Arc::new(InMemorySessionStore::new()));

        let token = gate.login(" A@X.com ", "longpass1").await.unwrap();
        let identity = gate.authenticate(&token).await.unwrap();

        assert_eq!(identity.user_id, created.user_id);
        assert_eq!(identity.company_id, created.company_id);
        assert_eq!(identity.email, "a@x.com");
        assert_eq!(identity.role, crate::Role::OWNER);
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let repo = Arc::new(InMemoryAccountRepository::new());
        seed_user(&repo, "a@x.com", "longpass1").await;
        let gate = gate(repo, Arc::new(InMemorySessionStore::new()));

        assert_eq!(gate.login("a@x.com", "wrongpass").await, Err(AuthError::Unauthorized));
        assert_eq!(gate.login("b@x.com", "longpass1").await, Err(AuthError::Unauthorized));
        assert_eq!(gate.login("not-an-email", "longpass1").await, Err(AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn inactive_user_cannot_login() {
        let repo = Arc::new(InMemoryAccountRepository::new());
        let created = seed_user(&repo, "a@x.com", "longpass1").await;
        repo.set_user_active(created.user_id, false).await.unwrap();
        let gate = gate(repo, Arc::new(InMemorySessionStore::new()));

        assert_eq!(gate.login("a@x.com", "longpass1").await, Err(AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn deactivation_invalidates_existing_sessions() {
        let repo = Arc::new(InMemoryAccountRepository::new());
        let created = seed_user(&repo, "a@x.com", "longpass1").await;
        let sessions = Arc::new(InMemorySessionStore::new());
        let gate = gate(repo.clone(), sessions.clone());

        let token = gate.login("a@x.com", "longpass1").await.unwrap();
        assert!(gate.authenticate(&token).await.is_ok());

        repo.set_user_active(created.user_id, false).await.unwrap();

        assert_eq!(gate.authenticate(&token).await, Err(AuthError::Unauthorized));
        assert!(sessions.is_empty(), "invalid session should be evicted");
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let repo = Arc::new(InMemoryAccountRepository::new());
        seed_user(&repo, "a@x.com", "longpass1").await;
        let gate = gate(repo, Arc::new(InMemorySessionStore::new()));

        let token = gate.login("a@x.com", "longpass1").await.unwrap();
        gate.logout(&token);
        gate.logout(&token);
        gate.logout("never-issued");

        assert_eq!(gate.authenticate(&token).await, Err(AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn expired_session_is_rejected() {
        let repo = Arc::new(InMemoryAccountRepository::new());
        seed_user(&repo, "a@x.com", "longpass1").await;
        let gate = AuthGate::new(repo, Arc::new(InMemorySessionStore::new()), Duration::zero());

        let token = gate.login("a@x.com", "longpass1").await.unwrap();
        assert_eq!(gate.authenticate(&token).await, Err(AuthError::Unauthorized));
    }
}
