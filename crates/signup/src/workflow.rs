//! The signup workflow: three steps over a `DraftStore` and an `AccountRepository`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use onboard_auth::token::token_prefix;
use onboard_auth::{Role, hash_password_blocking};
use onboard_core::validation::{normalize_email, validate_new_password};
use onboard_core::{AccountRepository, CreatedAccount, DomainError, NewUser};

use crate::draft::{CompanyFields, DraftStatus, SignupDraft};
use crate::error::SignupError;
use crate::pricing::{OrderSummary, PricingConfig};
use crate::store::DraftStore;

#[derive(Debug, Clone)]
pub struct Step1Request {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Clone)]
pub struct Step2Request {
    pub token: String,
    pub email: String,
    pub password: String,
    pub company: CompanyFields,
}

#[derive(Debug, Clone)]
pub struct Step3Request {
    pub token: String,
    pub email: String,
    pub password: String,
    /// Raw quantity as submitted; parsed leniently and clamped.
    pub extra_plates: String,
    pub accepted_terms: bool,
}

/// Result of a committed signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupCompleted {
    pub created: CreatedAccount,
    pub order: OrderSummary,
}

/// Orchestrates `PENDING_STEP2 → PENDING_STEP3 → committed`.
#[derive(Clone)]
pub struct SignupWorkflow {
    drafts: Arc<dyn DraftStore>,
    accounts: Arc<dyn AccountRepository>,
    pricing: PricingConfig,
}

impl SignupWorkflow {
    pub fn new(
        drafts: Arc<dyn DraftStore>,
        accounts: Arc<dyn AccountRepository>,
        pricing: PricingConfig,
    ) -> Self {
        Self {
            drafts,
            accounts,
            pricing,
        }
    }

    /// Step 1: choose credentials. Returns the signup token.
    #[instrument(skip_all)]
    pub async fn step1(&self, req: Step1Request) -> Result<String, SignupError> {
        let email = normalize_email("email", &req.email)?;
        validate_new_password(&req.password, &req.password_confirm)?;

        if self.accounts.email_exists(&email).await? {
            tracing::info!("signup step1 refused: email already registered");
            return Err(DomainError::conflict("email already registered").into());
        }

        let password_hash = hash_password_blocking(req.password).await?;
        let token = self.drafts.begin(email, password_hash, Utc::now());

        tracing::info!(signup = token_prefix(&token), "signup step1 accepted");
        Ok(token)
    }

    /// Step 2: capture the company profile.
    #[instrument(skip_all, fields(signup = token_prefix(&req.token)))]
    pub async fn step2(&self, req: Step2Request) -> Result<(), SignupError> {
        let now = Utc::now();
        let snapshot = self
            .authenticated_snapshot(&req.token, req.email, req.password, now)
            .await?;
        snapshot.ensure_status(DraftStatus::PendingStep2)?;
        let company = req.company.validate()?;

        self.drafts
            .advance_to_step3(&req.token, &snapshot, company, now)?;

        tracing::info!("signup step2 accepted");
        Ok(())
    }

    /// Step 3: confirm the order and create the company and its owner.
    ///
    /// The draft is taken out of the store before anything is written, so
    /// concurrent confirmations of one token produce at most one account.
    #[instrument(skip_all, fields(signup = token_prefix(&req.token)))]
    pub async fn step3(&self, req: Step3Request) -> Result<SignupCompleted, SignupError> {
        let now = Utc::now();
        let snapshot = self
            .authenticated_snapshot(&req.token, req.email, req.password, now)
            .await?;

        if !req.accepted_terms {
            return Err(DomainError::validation("sales_terms", "the sales terms must be accepted").into());
        }
        snapshot.ensure_committable()?;

        let order = self.pricing.quote(&req.extra_plates);

        let draft = self.drafts.commit_and_remove(&req.token, &snapshot, now)?;
        let company = draft
            .company()
            .ok_or_else(|| DomainError::invalid_state("company profile missing"))?
            .to_new_company();
        let user = NewUser {
            email: draft.email().to_string(),
            password_hash: draft.password_hash().to_string(),
            role: Role::OWNER.as_str().to_string(),
        };

        let created = self.accounts.create_account(company, user).await.map_err(|e| {
            tracing::warn!(error = %e, "signup commit failed");
            SignupError::from(e)
        })?;

        tracing::info!(
            company_id = %created.company_id,
            user_id = %created.user_id,
            extra_plates = order.extra_plates_qty,
            draft_age_secs = (now - draft.created_at()).num_seconds(),
            "signup committed"
        );
        Ok(SignupCompleted { created, order })
    }

    /// Resolve the draft and check the caller's credentials against it.
    ///
    /// Verification runs on the blocking pool, outside the store's critical
    /// section. The returned snapshot is what the store later compares with.
    async fn authenticated_snapshot(
        &self,
        token: &str,
        email: String,
        password: String,
        now: DateTime<Utc>,
    ) -> Result<SignupDraft, SignupError> {
        let snapshot = self.drafts.get(token, now)?;
        let (snapshot, verdict) = tokio::task::spawn_blocking(move || {
            let verdict = snapshot.reauthenticate(&email, &password);
            (snapshot, verdict)
        })
        .await
        .map_err(|e| SignupError::Internal(format!("password verification task failed: {e}")))?;
        verdict?;
        Ok(snapshot)
    }

    /// Drop expired drafts; returns how many were removed.
    pub fn purge_expired_drafts(&self) -> usize {
        self.drafts.purge_expired(Utc::now())
    }
}
