//! `onboard-signup`: the three-step signup state machine.
//!
//! `PENDING_STEP2 → PENDING_STEP3 → (committed and removed)`. Drafts live in a
//! `DraftStore`; the final step hands the draft to an `AccountRepository`,
//! which creates the company and its first user in one transaction.

pub mod draft;
pub mod error;
pub mod pricing;
pub mod store;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use draft::{
    AddressFields, BillingInfo, CompanyDraft, CompanyFields, DraftStatus, SignupDraft,
};
pub use error::SignupError;
pub use pricing::{OrderSummary, PricingConfig};
pub use store::{DraftStore, InMemoryDraftStore};
pub use workflow::{SignupCompleted, SignupWorkflow, Step1Request, Step2Request, Step3Request};
