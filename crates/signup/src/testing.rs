//! Shared test inputs.

use crate::draft::{AddressFields, CompanyFields};

pub(crate) fn valid_fields() -> CompanyFields {
    CompanyFields {
        company_name: Some("Acme bv".into()),
        enterprise_number: Some("be0123456789".into()),
        website: Some("Acme.BE".into()),
        phone: None,
        contact_first_name: Some("Jane".into()),
        contact_last_name: Some("Doe".into()),
        registered: AddressFields {
            street: Some("Main St".into()),
            number: Some("12".into()),
            box_number: None,
            postal_code: Some("1000".into()),
            city: Some("Brussels".into()),
            country: Some("be".into()),
        },
        billing_email: Some("Billing@Acme.BE".into()),
        ..Default::default()
    }
}
