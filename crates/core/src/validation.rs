//! Field validation and normalization.
//!
//! Every function here is pure: it either returns the normalized value or a
//! `DomainError::Validation` naming the offending field. Normalization happens
//! once, when input is accepted; callers store the returned value and never
//! re-derive it from the raw input.

use core::ops::RangeInclusive;

use url::Url;

use crate::error::{DomainError, DomainResult};

/// Minimum accepted password length (in characters).
pub const MIN_PASSWORD_LEN: usize = 8;

/// Maximum length of free-text fields after trimming.
pub const MAX_TEXT_LEN: usize = 200;

/// ISO 3166-1 alpha-2 codes of the 27 EU member states.
pub const EU_COUNTRY_CODES: [&str; 27] = [
    "AT", "BE", "BG", "CY", "CZ", "DE", "DK", "EE", "ES", "FI", "FR", "GR", "HR", "HU",
    "IE", "IT", "LT", "LU", "LV", "MT", "NL", "PL", "PT", "RO", "SE", "SI", "SK",
];

/// Validate an email address and normalize it to lowercase.
///
/// Accepts the `local@domain.tld` shape: exactly one `@`, a non-empty local
/// part, a dotted domain with non-empty labels and an alphabetic TLD of at
/// least two characters. No whitespace anywhere.
pub fn normalize_email(field: &str, raw: &str) -> DomainResult<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(DomainError::validation(field, "email is required"));
    }
    if !is_email_shaped(&email) {
        return Err(DomainError::validation(field, "invalid email address"));
    }
    Ok(email)
}

fn is_email_shaped(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return false;
    }

    labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
}

/// Validate a new password and its confirmation.
pub fn validate_new_password(password: &str, confirm: &str) -> DomainResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(
            "password",
            format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if password != confirm {
        return Err(DomainError::validation(
            "password_confirm",
            "passwords do not match",
        ));
    }
    Ok(())
}

/// Validate an EU member-state country code (case-insensitive), returning it uppercased.
pub fn normalize_country(field: &str, raw: &str) -> DomainResult<String> {
    let code = raw.trim().to_uppercase();
    if code.is_empty() {
        return Err(DomainError::validation(field, "country is required"));
    }
    if !EU_COUNTRY_CODES.contains(&code.as_str()) {
        return Err(DomainError::validation(
            field,
            "country must be an EU member state code",
        ));
    }
    Ok(code)
}

/// Validate an optional website.
///
/// Blank input yields `None`. A missing scheme is prefixed with `https://`; the
/// result must parse as an `http`/`https` URL with a host. Returned lowercase.
pub fn normalize_website(field: &str, raw: Option<&str>) -> DomainResult<Option<String>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let lower = raw.to_lowercase();
    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        lower
    } else if lower.contains("://") {
        return Err(DomainError::validation(field, "website must use http or https"));
    } else {
        format!("https://{lower}")
    };

    let url = Url::parse(&candidate)
        .map_err(|_| DomainError::validation(field, "invalid website address"))?;

    let host_ok = url
        .host_str()
        .is_some_and(|h| h.contains('.') && !h.starts_with('.') && !h.ends_with('.'));
    if !matches!(url.scheme(), "http" | "https") || !host_ok {
        return Err(DomainError::validation(field, "invalid website address"));
    }

    Ok(Some(url.as_str().to_lowercase()))
}

/// Lenient integer parsing with clamping.
///
/// Keeps the ASCII digits (and a leading `-`), falls back to `default` when
/// no digit remains, then clamps into `range`. Digit strings too long for an
/// `i64` saturate toward their sign.
pub fn parse_clamped_int(raw: &str, default: i64, range: RangeInclusive<i64>) -> i64 {
    let trimmed = raw.trim();
    let negative = trimmed.starts_with('-');
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        return default.clamp(*range.start(), *range.end());
    }
    // Only overflow can fail here: every remaining char is an ASCII digit.
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    let value = if negative { -magnitude } else { magnitude };

    value.clamp(*range.start(), *range.end())
}

/// Require a non-empty text field, returning it trimmed.
pub fn required_text(field: &str, raw: Option<&str>) -> DomainResult<String> {
    let value = raw.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(DomainError::validation(field, format!("{field} is required")));
    }
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(DomainError::validation(
            field,
            format!("{field} must be at most {MAX_TEXT_LEN} characters"),
        ));
    }
    Ok(value.to_string())
}

/// Required display field: trimmed, non-empty, uppercased.
pub fn required_display(field: &str, raw: Option<&str>) -> DomainResult<String> {
    required_text(field, raw).map(|v| v.to_uppercase())
}

/// Optional display field: blank becomes `None`, otherwise trimmed and uppercased.
pub fn optional_display(field: &str, raw: Option<&str>) -> DomainResult<Option<String>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(v) => required_display(field, Some(v)).map(Some),
    }
}

/// Interpret a checkbox-style flag (`true`, `on`, `1`, `yes`).
pub fn is_affirmative(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "on" | "1" | "yes"
    )
}

/// Flatten an address into the legacy single-line display form.
///
/// Parts are trimmed, empty parts are dropped, and the remainder is joined with
/// `", "`. Postal code and city share one part.
pub fn build_address_line(
    street: &str,
    box_number: &str,
    postal_code: &str,
    city: &str,
    country: &str,
) -> String {
    let locality = [postal_code.trim(), city.trim()]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    [street.trim(), box_number.trim(), locality.as_str(), country.trim()]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn email_is_lowercased() {
        assert_eq!(
            normalize_email("email", "  Alice@Example.COM ").unwrap(),
            "alice@example.com"
        );
    }

    #[test]
    fn email_shape_is_enforced() {
        for bad in ["", "alice", "alice@", "@example.com", "a@b", "a@b.c", "a b@x.com", "a@@x.com", "a@x..com"] {
            assert!(normalize_email("email", bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn password_rules() {
        assert!(validate_new_password("longpass1", "longpass1").is_ok());

        let short = validate_new_password("short", "short").unwrap_err();
        assert!(matches!(short, DomainError::Validation { ref field, .. } if field == "password"));

        let mismatch = validate_new_password("longpass1", "longpass2").unwrap_err();
        assert!(matches!(mismatch, DomainError::Validation { ref field, .. } if field == "password_confirm"));
    }

    #[test]
    fn country_is_case_insensitive_and_eu_only() {
        assert_eq!(normalize_country("country", "be").unwrap(), "BE");
        assert_eq!(normalize_country("country", " Nl ").unwrap(), "NL");
        assert!(normalize_country("country", "US").is_err());
        assert!(normalize_country("country", "GB").is_err());
        assert!(normalize_country("country", "").is_err());
        assert_eq!(EU_COUNTRY_CODES.len(), 27);
    }

    #[test]
    fn website_gets_scheme_and_is_lowercased() {
        assert_eq!(
            normalize_website("website", Some("Example.COM/Path")).unwrap(),
            Some("https://example.com/path".to_string())
        );
        assert_eq!(
            normalize_website("website", Some("http://shop.example.be")).unwrap(),
            Some("http://shop.example.be/".to_string())
        );
        assert_eq!(normalize_website("website", Some("   ")).unwrap(), None);
        assert_eq!(normalize_website("website", None).unwrap(), None);
    }

    #[test]
    fn website_rejects_other_schemes_and_hostless_input() {
        assert!(normalize_website("website", Some("ftp://example.com")).is_err());
        assert!(normalize_website("website", Some("localhost")).is_err());
        assert!(normalize_website("website", Some("https://")).is_err());
    }

    #[test]
    fn quantity_clamp_examples() {
        assert_eq!(parse_clamped_int("150", 0, 0..=99), 99);
        assert_eq!(parse_clamped_int("-5", 0, 0..=99), 0);
        assert_eq!(parse_clamped_int("abc", 0, 0..=99), 0);
        assert_eq!(parse_clamped_int("", 0, 0..=99), 0);
        assert_eq!(parse_clamped_int("2 plates", 0, 0..=99), 2);
        assert_eq!(parse_clamped_int("99999999999999999999999", 0, 0..=99), 99);
        assert_eq!(parse_clamped_int("-99999999999999999999999", 0, 0..=99), 0);
        assert_eq!(parse_clamped_int("99999999999999999999999", 0, -10..=10), 10);
        assert_eq!(parse_clamped_int("-99999999999999999999999", 0, -10..=10), -10);
    }

    #[test]
    fn address_line_drops_empty_parts() {
        assert_eq!(
            build_address_line("Main St", "", "1000", "Brussels", "BE"),
            "Main St, 1000 Brussels, BE"
        );
        assert_eq!(
            build_address_line(" Main St 1 ", " B2 ", "", " Brussels", "BE "),
            "Main St 1, B2, Brussels, BE"
        );
        assert_eq!(build_address_line("", "", "", "", ""), "");
    }

    #[test]
    fn display_fields_are_uppercased() {
        assert_eq!(required_display("company_name", Some(" Acme bv ")).unwrap(), "ACME BV");
        assert!(required_display("company_name", Some("  ")).is_err());
        assert!(required_display("company_name", None).is_err());
        assert_eq!(optional_display("phone", Some("")).unwrap(), None);
    }

    #[test]
    fn affirmative_flags() {
        for yes in ["true", "on", "1", "YES"] {
            assert!(is_affirmative(yes));
        }
        for no in ["", "false", "off", "0", "nope"] {
            assert!(!is_affirmative(no));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: whatever the input, the clamped value stays inside the range.
        #[test]
        fn clamped_int_always_in_range(raw in ".{0,24}") {
            let v = parse_clamped_int(&raw, 0, 0..=99);
            prop_assert!((0..=99).contains(&v));
        }

        /// Property: plain in-range numbers are preserved.
        #[test]
        fn clamped_int_preserves_in_range_numbers(n in 0i64..=99) {
            prop_assert_eq!(parse_clamped_int(&n.to_string(), 0, 0..=99), n);
        }

        /// Property: accepted countries are always uppercase members of the EU set.
        #[test]
        fn country_normalization_is_closed(code in "[a-zA-Z]{2}") {
            if let Ok(c) = normalize_country("country", &code) {
                prop_assert!(EU_COUNTRY_CODES.contains(&c.as_str()));
                prop_assert_eq!(c, code.to_uppercase());
            }
        }
    }
}
