//! Signup draft: the in-progress, uncommitted signup record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use onboard_auth::verify_password;
use onboard_core::validation::{
    normalize_country, normalize_email, normalize_website, optional_display, required_display,
};
use onboard_core::{Address, DomainError, DomainResult, NewCompany};

/// Position of a draft in the signup state machine.
///
/// There is no committed state: a committed draft is removed from the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftStatus {
    PendingStep2,
    PendingStep3,
}

/// Raw address input, as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFields {
    pub street: Option<String>,
    pub number: Option<String>,
    pub box_number: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl AddressFields {
    /// Validate every part together. Field names in errors are `{prefix}_{part}`.
    pub fn validate(&self, prefix: &str) -> DomainResult<Address> {
        let field = |part: &str| format!("{prefix}_{part}");
        Ok(Address {
            street: required_display(&field("street"), self.street.as_deref())?,
            number: required_display(&field("number"), self.number.as_deref())?,
            box_number: optional_display(&field("box"), self.box_number.as_deref())?,
            postal_code: required_display(&field("postal_code"), self.postal_code.as_deref())?,
            city: required_display(&field("city"), self.city.as_deref())?,
            country: normalize_country(
                &field("country"),
                self.country.as_deref().unwrap_or_default(),
            )?,
        })
    }
}

/// Raw company input for step 2, as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyFields {
    pub company_name: Option<String>,
    pub enterprise_number: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub contact_first_name: Option<String>,
    pub contact_last_name: Option<String>,
    pub registered: AddressFields,
    pub billing_email: Option<String>,
    pub billing_is_different: bool,
    pub billing: AddressFields,
    pub delivery_is_different: bool,
    pub delivery: AddressFields,
}

impl CompanyFields {
    /// Validate and normalize into a `CompanyDraft`.
    ///
    /// Display fields are uppercased here, once. An override address is only
    /// looked at when its `*_is_different` flag is set, and then every one of
    /// its required parts must be present.
    pub fn validate(&self) -> DomainResult<CompanyDraft> {
        let name = required_display("company_name", self.company_name.as_deref())?;
        let enterprise_number =
            required_display("enterprise_number", self.enterprise_number.as_deref())?;
        let contact_first_name =
            required_display("contact_first_name", self.contact_first_name.as_deref())?;
        let contact_last_name =
            required_display("contact_last_name", self.contact_last_name.as_deref())?;
        let registered_address = self.registered.validate("registered")?;
        let billing_email = normalize_email(
            "billing_email",
            self.billing_email.as_deref().unwrap_or_default(),
        )?;

        let billing_address = self
            .billing_is_different
            .then(|| self.billing.validate("billing"))
            .transpose()?;
        let delivery_address = self
            .delivery_is_different
            .then(|| self.delivery.validate("delivery"))
            .transpose()?;

        Ok(CompanyDraft {
            name,
            enterprise_number,
            website: normalize_website("website", self.website.as_deref())?,
            phone: optional_display("phone", self.phone.as_deref())?,
            contact_first_name,
            contact_last_name,
            registered_address,
            billing: BillingInfo {
                email: billing_email,
                address: billing_address,
            },
            delivery_address,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingInfo {
    /// Lowercase.
    pub email: String,
    /// `None` mirrors the registered address.
    pub address: Option<Address>,
}

/// Normalized company profile captured at step 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyDraft {
    pub name: String,
    pub enterprise_number: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub contact_first_name: String,
    pub contact_last_name: String,
    pub registered_address: Address,
    pub billing: BillingInfo,
    /// `None` mirrors the registered address.
    pub delivery_address: Option<Address>,
}

impl CompanyDraft {
    /// Company row to persist, with billing/delivery defaulted to the registered address.
    pub fn to_new_company(&self) -> NewCompany {
        let registered = self.registered_address.clone();
        NewCompany {
            name: self.name.clone(),
            enterprise_number: self.enterprise_number.clone(),
            website: self.website.clone(),
            phone: self.phone.clone(),
            contact_first_name: self.contact_first_name.clone(),
            contact_last_name: self.contact_last_name.clone(),
            billing_email: self.billing.email.clone(),
            billing: self.billing.address.clone().unwrap_or_else(|| registered.clone()),
            delivery: self.delivery_address.clone().unwrap_or_else(|| registered.clone()),
            registered,
        }
    }
}

/// An in-progress signup.
///
/// # Invariants
/// - `email` is normalized and never changes after creation.
/// - `status` only moves forward.
/// - `company` is `None` iff `status == PendingStep2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupDraft {
    token: String,
    email: String,
    password_hash: String,
    status: DraftStatus,
    company: Option<CompanyDraft>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SignupDraft {
    pub fn new(
        token: String,
        email: String,
        password_hash: String,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            token,
            email,
            password_hash,
            status: DraftStatus::PendingStep2,
            company: None,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn status(&self) -> DraftStatus {
        self.status
    }

    pub fn company(&self) -> Option<&CompanyDraft> {
        self.company.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Prove continued possession of the credential chosen at step 1.
    ///
    /// Any mismatch (malformed email, other email, wrong password) is reported
    /// as `Unauthorized` without saying which part failed.
    pub fn reauthenticate(&self, email: &str, password: &str) -> DomainResult<()> {
        let matches = normalize_email("email", email).is_ok_and(|e| e == self.email)
            && verify_password(password, &self.password_hash);
        if matches {
            Ok(())
        } else {
            Err(DomainError::Unauthorized)
        }
    }

    /// `PENDING_STEP2 → PENDING_STEP3`, attaching the validated company profile.
    pub fn attach_company(&mut self, company: CompanyDraft) -> DomainResult<()> {
        self.ensure_status(DraftStatus::PendingStep2)?;
        self.company = Some(company);
        self.status = DraftStatus::PendingStep3;
        Ok(())
    }

    /// Check that the draft is complete and may be committed.
    pub fn ensure_committable(&self) -> DomainResult<()> {
        self.ensure_status(DraftStatus::PendingStep3)?;
        if self.company.is_none() {
            return Err(DomainError::invalid_state("company profile missing"));
        }
        Ok(())
    }

    /// Check that this (stored) draft is still the one `snapshot` was taken
    /// from: same identity and same status.
    pub fn ensure_unchanged_since(&self, snapshot: &SignupDraft) -> DomainResult<()> {
        if self.email != snapshot.email || self.password_hash != snapshot.password_hash {
            return Err(DomainError::Unauthorized);
        }
        self.ensure_status(snapshot.status)
    }

    pub fn ensure_status(&self, expected: DraftStatus) -> DomainResult<()> {
        if self.status != expected {
            return Err(DomainError::invalid_state(format!(
                "expected {expected:?}, found {:?}",
                self.status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::valid_fields;
    use onboard_auth::hash_password;

    fn draft() -> SignupDraft {
        SignupDraft::new(
            "tok".into(),
            "a@x.com".into(),
            hash_password("longpass1").unwrap(),
            Utc::now(),
            Duration::hours(1),
        )
    }

    #[test]
    fn fields_are_normalized_once() {
        let company = valid_fields().validate().unwrap();
        assert_eq!(company.name, "ACME BV");
        assert_eq!(company.enterprise_number, "BE0123456789");
        assert_eq!(company.contact_first_name, "JANE");
        assert_eq!(company.registered_address.city, "BRUSSELS");
        assert_eq!(company.registered_address.country, "BE");
        assert_eq!(company.billing.email, "billing@acme.be");
        assert_eq!(company.website.as_deref(), Some("https://acme.be/"));
        assert_eq!(company.delivery_address, None);
    }

    #[test]
    fn missing_required_field_is_reported_by_name() {
        let mut fields = valid_fields();
        fields.registered.postal_code = Some("   ".into());
        let err = fields.validate().unwrap_err();
        assert!(
            matches!(err, DomainError::Validation { ref field, .. } if field == "registered_postal_code")
        );
    }

    #[test]
    fn delivery_override_is_all_or_nothing() {
        let mut fields = valid_fields();
        fields.delivery_is_different = true;
        fields.delivery.street = Some("Other St".into());
        let err = fields.validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field.starts_with("delivery_")));

        fields.delivery = AddressFields {
            street: Some("Other St".into()),
            number: Some("3".into()),
            box_number: Some("b".into()),
            postal_code: Some("2000".into()),
            city: Some("Antwerpen".into()),
            country: Some("BE".into()),
        };
        let company = fields.validate().unwrap();
        assert_eq!(company.delivery_address.unwrap().line(), "OTHER ST 3, B, 2000 ANTWERPEN, BE");
    }

    #[test]
    fn delivery_fields_ignored_unless_flagged() {
        let mut fields = valid_fields();
        fields.delivery.street = Some("ignored".into());
        assert_eq!(fields.validate().unwrap().delivery_address, None);
    }

    #[test]
    fn billing_override_is_all_or_nothing() {
        let mut fields = valid_fields();
        fields.billing_is_different = true;
        fields.billing.city = Some("Gent".into());
        let err = fields.validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field.starts_with("billing_")));

        fields.billing = AddressFields {
            street: Some("Invoice Lane".into()),
            number: Some("7".into()),
            box_number: None,
            postal_code: Some("9000".into()),
            city: Some("Gent".into()),
            country: Some("be".into()),
        };
        let company = fields.validate().unwrap();
        let billing = company.billing.address.clone().unwrap();
        assert_eq!(billing.line(), "INVOICE LANE 7, 9000 GENT, BE");

        let row = company.to_new_company();
        assert_eq!(row.billing, billing);
        assert_eq!(row.delivery, row.registered);
    }

    #[test]
    fn billing_fields_ignored_unless_flagged() {
        let mut fields = valid_fields();
        fields.billing.street = Some("ignored".into());
        let company = fields.validate().unwrap();
        assert_eq!(company.billing.address, None);
        assert_eq!(company.to_new_company().billing, company.registered_address);
    }

    #[test]
    fn new_company_mirrors_registered_address() {
        let company = valid_fields().validate().unwrap();
        let row = company.to_new_company();
        assert_eq!(row.billing, row.registered);
        assert_eq!(row.delivery, row.registered);
        assert_eq!(row.billing_email, "billing@acme.be");
    }

    #[test]
    fn reauthenticate_requires_matching_credentials() {
        let d = draft();
        assert!(d.reauthenticate(" A@X.COM ", "longpass1").is_ok());
        assert_eq!(d.reauthenticate("a@x.com", "wrongpass"), Err(DomainError::Unauthorized));
        assert_eq!(d.reauthenticate("b@x.com", "longpass1"), Err(DomainError::Unauthorized));
        assert_eq!(d.reauthenticate("", "longpass1"), Err(DomainError::Unauthorized));
    }

    #[test]
    fn status_only_moves_forward() {
        let mut d = draft();
        assert!(d.ensure_committable().is_err());

        let company = valid_fields().validate().unwrap();
        d.attach_company(company.clone()).unwrap();
        assert_eq!(d.status(), DraftStatus::PendingStep3);
        assert!(d.company().is_some());
        assert!(d.ensure_committable().is_ok());

        let again = d.attach_company(company).unwrap_err();
        assert!(matches!(again, DomainError::InvalidState(_)));
        assert_eq!(d.status(), DraftStatus::PendingStep3);
    }

    #[test]
    fn snapshot_check_detects_progress() {
        let mut stored = draft();
        let snapshot = stored.clone();
        assert!(stored.ensure_unchanged_since(&snapshot).is_ok());

        stored.attach_company(valid_fields().validate().unwrap()).unwrap();
        assert!(matches!(
            stored.ensure_unchanged_since(&snapshot),
            Err(DomainError::InvalidState(_))
        ));

        let other = SignupDraft::new(
            "tok".into(),
            "a@x.com".into(),
            hash_password("longpass1").unwrap(),
            Utc::now(),
            Duration::hours(1),
        );
        assert_eq!(
            stored.ensure_unchanged_since(&other),
            Err(DomainError::Unauthorized)
        );
    }
}
