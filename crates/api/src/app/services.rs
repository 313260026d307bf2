//! Service wiring: account storage, draft/session stores, and the workflows
//! built on top of them.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::task::JoinHandle;

use onboard_auth::{AuthGate, InMemorySessionStore};
use onboard_core::AccountRepository;
use onboard_infra::{InMemoryAccountRepository, PostgresAccountRepository};
use onboard_signup::{InMemoryDraftStore, SignupWorkflow};

use crate::config::AppConfig;

/// Everything a handler needs, shared behind one `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub signup: SignupWorkflow,
    pub auth: AuthGate,
    pub accounts: Arc<dyn AccountRepository>,
    pub signup_redirect_url: String,
    pub login_redirect_url: String,
}

impl AppServices {
    /// Wire process-local draft and session stores around `accounts`.
    pub fn new(config: &AppConfig, accounts: Arc<dyn AccountRepository>) -> Self {
        let drafts = Arc::new(InMemoryDraftStore::new(config.signup_draft_ttl));
        let sessions = Arc::new(InMemorySessionStore::new());

        Self {
            signup: SignupWorkflow::new(drafts, accounts.clone(), config.pricing),
            auth: AuthGate::new(accounts.clone(), sessions, config.session_ttl),
            accounts,
            signup_redirect_url: config.signup_redirect_url.clone(),
            login_redirect_url: config.login_redirect_url.clone(),
        }
    }
}

/// Build services, choosing Postgres or in-memory account storage from config.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let accounts: Arc<dyn AccountRepository> = match (&config.database_url, config.use_persistent_stores) {
        (Some(url), true) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .context("failed to connect to DATABASE_URL")?;
            let repo = PostgresAccountRepository::new(pool);
            repo.migrate().await.context("failed to apply account schema")?;
            tracing::info!("using postgres account repository");
            Arc::new(repo)
        }
        _ => {
            tracing::warn!("using in-memory account repository; accounts are lost on restart");
            Arc::new(InMemoryAccountRepository::new())
        }
    };

    Ok(AppServices::new(config, accounts))
}

/// Periodically drop expired drafts and sessions.
pub fn spawn_sweeper(services: Arc<AppServices>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let drafts = services.signup.purge_expired_drafts();
            let sessions = services.auth.purge_expired_sessions();
            if drafts + sessions > 0 {
                tracing::debug!(drafts, sessions, "swept expired entries");
            }
        }
    })
}
