//! Signup draft storage.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

use onboard_auth::generate_token;
use onboard_core::{DomainError, DomainResult};

use crate::draft::{CompanyDraft, SignupDraft};

/// Keyed store of in-progress signups.
///
/// Every method is one indivisible operation: lookup, checks and mutation
/// happen under a single critical section. In particular `commit_and_remove`
/// hands a live draft to at most one caller per token.
///
/// Credentials are never checked here. Callers re-authenticate against a
/// snapshot from `get` and pass it back as `expected`; the mutating methods
/// only proceed while the stored draft still matches it.
///
/// Unknown and expired tokens are both `NotFound`; expired drafts are evicted
/// when seen.
pub trait DraftStore: Send + Sync {
    /// Create a `PENDING_STEP2` draft and return its token.
    ///
    /// Email uniqueness against existing accounts is the caller's check; the
    /// store only deals with drafts.
    fn begin(&self, email: String, password_hash: String, now: DateTime<Utc>) -> String;

    fn get(&self, token: &str, now: DateTime<Utc>) -> DomainResult<SignupDraft>;

    /// Attach `company` and move the draft to `PENDING_STEP3`.
    ///
    /// Fails with `NotFound`, `Unauthorized` (credential changed) or
    /// `InvalidState` (status moved) and then leaves the draft untouched.
    fn advance_to_step3(
        &self,
        token: &str,
        expected: &SignupDraft,
        company: CompanyDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<()>;

    /// If the draft is unchanged and complete, remove and return it.
    fn commit_and_remove(
        &self,
        token: &str,
        expected: &SignupDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<SignupDraft>;

    /// Drop every expired draft, returning how many were removed.
    fn purge_expired(&self, now: DateTime<Utc>) -> usize;
}

impl<S> DraftStore for Arc<S>
where
    S: DraftStore + ?Sized,
{
    fn begin(&self, email: String, password_hash: String, now: DateTime<Utc>) -> String {
        (**self).begin(email, password_hash, now)
    }

    fn get(&self, token: &str, now: DateTime<Utc>) -> DomainResult<SignupDraft> {
        (**self).get(token, now)
    }

    fn advance_to_step3(
        &self,
        token: &str,
        expected: &SignupDraft,
        company: CompanyDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        (**self).advance_to_step3(token, expected, company, now)
    }

    fn commit_and_remove(
        &self,
        token: &str,
        expected: &SignupDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<SignupDraft> {
        (**self).commit_and_remove(token, expected, now)
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        (**self).purge_expired(now)
    }
}

/// Process-local draft store guarded by one mutex.
#[derive(Debug)]
pub struct InMemoryDraftStore {
    drafts: Mutex<HashMap<String, SignupDraft>>,
    ttl: Duration,
}

impl InMemoryDraftStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            drafts: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SignupDraft>> {
        // A panic while holding the lock cannot leave a draft half-updated:
        // every mutation is a single assignment after all checks pass.
        self.drafts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Resolve a live draft, evicting it if it has expired.
fn live<'a>(
    drafts: &'a mut HashMap<String, SignupDraft>,
    token: &str,
    now: DateTime<Utc>,
) -> DomainResult<&'a mut SignupDraft> {
    if drafts.get(token).is_some_and(|d| d.is_expired(now)) {
        drafts.remove(token);
        tracing::debug!("evicted expired signup draft");
    }
    drafts.get_mut(token).ok_or(DomainError::NotFound)
}

impl DraftStore for InMemoryDraftStore {
    fn begin(&self, email: String, password_hash: String, now: DateTime<Utc>) -> String {
        let mut drafts = self.lock();
        let token = loop {
            let candidate = generate_token();
            if !drafts.contains_key(&candidate) {
                break candidate;
            }
        };
        drafts.insert(
            token.clone(),
            SignupDraft::new(token.clone(), email, password_hash, now, self.ttl),
        );
        token
    }

    fn get(&self, token: &str, now: DateTime<Utc>) -> DomainResult<SignupDraft> {
        let mut drafts = self.lock();
        live(&mut drafts, token, now).map(|d| d.clone())
    }

    fn advance_to_step3(
        &self,
        token: &str,
        expected: &SignupDraft,
        company: CompanyDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let mut drafts = self.lock();
        let draft = live(&mut drafts, token, now)?;

        draft.ensure_unchanged_since(expected)?;
        draft.attach_company(company)
    }

    fn commit_and_remove(
        &self,
        token: &str,
        expected: &SignupDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<SignupDraft> {
        let mut drafts = self.lock();
        let draft = live(&mut drafts, token, now)?;

        draft.ensure_unchanged_since(expected)?;
        draft.ensure_committable()?;

        drafts.remove(token).ok_or(DomainError::NotFound)
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut drafts = self.lock();
        let before = drafts.len();
        drafts.retain(|_, d| !d.is_expired(now));
        before - drafts.len()
    }
}
