use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use onboard_auth::Identity;
use onboard_core::CreatedAccount;
use onboard_core::validation::is_affirmative;
use onboard_signup::{
    AddressFields, CompanyFields, OrderSummary, Step1Request, Step2Request, Step3Request,
};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------
//
// Missing fields default to empty so that they surface as field-level
// validation errors rather than body rejections.

#[derive(Debug, Deserialize)]
pub struct SignupStep1Body {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

impl From<SignupStep1Body> for Step1Request {
    fn from(body: SignupStep1Body) -> Self {
        Self {
            email: body.email,
            password: body.password,
            password_confirm: body.password_confirm,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupStep2Body {
    pub signup_token: String,
    pub email: String,
    pub password: String,

    pub company_name: Option<String>,
    pub enterprise_number: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub contact_first_name: Option<String>,
    pub contact_last_name: Option<String>,

    pub registered_street: Option<String>,
    pub registered_number: Option<String>,
    pub registered_box: Option<String>,
    pub registered_postal_code: Option<String>,
    pub registered_city: Option<String>,
    pub registered_country: Option<String>,

    pub billing_email: Option<String>,
    #[serde(deserialize_with = "flexible_bool")]
    pub billing_is_different: bool,
    pub billing_street: Option<String>,
    pub billing_number: Option<String>,
    pub billing_box: Option<String>,
    pub billing_postal_code: Option<String>,
    pub billing_city: Option<String>,
    pub billing_country: Option<String>,

    #[serde(deserialize_with = "flexible_bool")]
    pub delivery_is_different: bool,
    pub delivery_street: Option<String>,
    pub delivery_number: Option<String>,
    pub delivery_box: Option<String>,
    pub delivery_postal_code: Option<String>,
    pub delivery_city: Option<String>,
    pub delivery_country: Option<String>,
}

impl From<SignupStep2Body> for Step2Request {
    fn from(b: SignupStep2Body) -> Self {
        Self {
            token: b.signup_token,
            email: b.email,
            password: b.password,
            company: CompanyFields {
                company_name: b.company_name,
                enterprise_number: b.enterprise_number,
                website: b.website,
                phone: b.phone,
                contact_first_name: b.contact_first_name,
                contact_last_name: b.contact_last_name,
                registered: AddressFields {
                    street: b.registered_street,
                    number: b.registered_number,
                    box_number: b.registered_box,
                    postal_code: b.registered_postal_code,
                    city: b.registered_city,
                    country: b.registered_country,
                },
                billing_email: b.billing_email,
                billing_is_different: b.billing_is_different,
                billing: AddressFields {
                    street: b.billing_street,
                    number: b.billing_number,
                    box_number: b.billing_box,
                    postal_code: b.billing_postal_code,
                    city: b.billing_city,
                    country: b.billing_country,
                },
                delivery_is_different: b.delivery_is_different,
                delivery: AddressFields {
                    street: b.delivery_street,
                    number: b.delivery_number,
                    box_number: b.delivery_box,
                    postal_code: b.delivery_postal_code,
                    city: b.delivery_city,
                    country: b.delivery_country,
                },
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupStep3Body {
    pub signup_token: String,
    pub email: String,
    pub password: String,
    /// Number or string; parsed leniently downstream.
    #[serde(deserialize_with = "flexible_string")]
    pub extra_plates: String,
    #[serde(deserialize_with = "flexible_bool")]
    pub sales_terms: bool,
}

impl From<SignupStep3Body> for Step3Request {
    fn from(b: SignupStep3Body) -> Self {
        Self {
            token: b.signup_token,
            email: b.email,
            password: b.password,
            extra_plates: b.extra_plates,
            accepted_terms: b.sales_terms,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

/// Checkbox-style booleans: JSON `true`, `1`, or one of "true"/"on"/"1"/"yes".
fn flexible_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_i64() == Some(1),
        Value::String(s) => is_affirmative(&s),
        _ => false,
    })
}

fn flexible_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Unwrap a JSON body, answering malformed input in the API's error shape.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| errors::json_error(StatusCode::BAD_REQUEST, rejection.body_text()))
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupStartedResponse {
    pub ok: bool,
    pub signup_token: String,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

/// Order amounts in euros, excluding VAT.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderJson {
    pub startup_fee_excl_vat: f64,
    pub extra_plates_qty: u32,
    pub extra_plate_price_excl_vat: f64,
    pub total_today_excl_vat: f64,
    pub monthly_excl_vat: f64,
}

impl From<OrderSummary> for OrderJson {
    fn from(o: OrderSummary) -> Self {
        Self {
            startup_fee_excl_vat: euros(o.startup_fee_cents),
            extra_plates_qty: o.extra_plates_qty,
            extra_plate_price_excl_vat: euros(o.extra_plate_price_cents),
            total_today_excl_vat: euros(o.total_today_cents),
            monthly_excl_vat: euros(o.monthly_cents),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedJson {
    pub user_id: String,
    pub company_id: String,
}

impl From<CreatedAccount> for CreatedJson {
    fn from(c: CreatedAccount) -> Self {
        Self {
            user_id: c.user_id.to_string(),
            company_id: c.company_id.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupCompletedResponse {
    pub ok: bool,
    pub redirect_url: String,
    pub order: OrderJson,
    pub created: CreatedJson,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub ok: bool,
    pub token: String,
    pub redirect_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserJson {
    pub id: String,
    pub email: String,
    pub role: String,
    pub company_id: String,
}

impl From<&Identity> for UserJson {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.user_id.to_string(),
            email: identity.email.clone(),
            role: identity.role.as_str().to_string(),
            company_id: identity.company_id.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub ok: bool,
    pub user: UserJson,
}

fn euros(cents: u64) -> f64 {
    cents as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn step2_flags_accept_form_style_values() {
        let body: SignupStep2Body = serde_json::from_value(json!({
            "signup_token": "t",
            "delivery_is_different": "on",
            "billing_is_different": 0,
        }))
        .unwrap();
        assert!(body.delivery_is_different);
        assert!(!body.billing_is_different);

        let req = Step2Request::from(body);
        assert_eq!(req.token, "t");
        assert!(req.company.delivery_is_different);
        assert_eq!(req.company.company_name, None);
    }

    #[test]
    fn step3_quantity_accepts_numbers_and_strings() {
        let body: SignupStep3Body =
            serde_json::from_value(json!({ "extra_plates": 3, "sales_terms": true })).unwrap();
        assert_eq!(body.extra_plates, "3");
        assert!(body.sales_terms);

        let body: SignupStep3Body =
            serde_json::from_value(json!({ "extra_plates": "2 plates", "sales_terms": "yes" })).unwrap();
        assert_eq!(body.extra_plates, "2 plates");
        assert!(body.sales_terms);
    }

    #[test]
    fn order_amounts_are_rendered_in_euros() {
        let order = OrderSummary {
            startup_fee_cents: 14_900,
            extra_plates_qty: 2,
            extra_plate_price_cents: 2_500,
            total_today_cents: 19_900,
            monthly_cents: 3_900,
        };
        let value = serde_json::to_value(OrderJson::from(order)).unwrap();
        assert_eq!(value["startupFeeExclVat"], json!(149.0));
        assert_eq!(value["extraPlatesQty"], json!(2));
        assert_eq!(value["totalTodayExclVat"], json!(199.0));
        assert_eq!(value["monthlyExclVat"], json!(39.0));
    }
}
