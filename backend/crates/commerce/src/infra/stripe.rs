//! Stripe Checkout Sessions gateway
//!
//! - Create: `POST /v1/checkout/sessions` (form-encoded)
//! - Status: `GET /v1/checkout/sessions/{id}`
//!
//! The session id is the payment reference. `payment_status = paid` is the
//! only success state; an `expired` session is failed; anything else is
//! pending.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::domain::port::{
    CheckoutSession, CheckoutSessionRequest, PaymentGateway, PaymentStatus, PaymentStatusReport,
};
use crate::domain::value_object::{Currency, PaymentReference};
use crate::error::{CommerceError, CommerceResult};

const DEFAULT_API_BASE: &str = "https://api.stripe.com";

#[derive(Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub api_base: String,
    /// `{CHECKOUT_SESSION_ID}` is substituted by Stripe
    pub success_url: String,
    pub cancel_url: String,
    pub timeout: Duration,
}

impl fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("success_url", &self.success_url)
            .field("cancel_url", &self.cancel_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl StripeConfig {
    pub fn new(secret_key: impl Into<String>, success_url: impl Into<String>, cancel_url: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Clone)]
pub struct StripeGateway {
    inner: Arc<StripeGatewayInner>,
}

struct StripeGatewayInner {
    client: reqwest::Client,
    config: StripeConfig,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> CommerceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CommerceError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner: Arc::new(StripeGatewayInner { client, config }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.config.api_base.trim_end_matches('/'), path)
    }

    /// Status lookup URL; anything but a plain session id is refused before
    /// the secret key leaves the process
    fn session_url(&self, reference: &PaymentReference) -> CommerceResult<String> {
        if !reference.is_well_formed() {
            return Err(CommerceError::Validation("Invalid payment reference".into()));
        }
        Ok(self.url(&format!("/v1/checkout/sessions/{reference}")))
    }

    /// Flatten a session request into Stripe's bracketed form keys
    fn session_form(&self, request: &CheckoutSessionRequest) -> Vec<(String, String)> {
        let config = &self.inner.config;
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), config.success_url.clone()),
            ("cancel_url".to_string(), config.cancel_url.clone()),
            ("customer_email".to_string(), request.customer_email.clone()),
        ];

        for (i, item) in request.line_items.iter().enumerate() {
            let key = |field: &str| format!("line_items[{i}][{field}]");
            form.push((key("quantity"), "1".to_string()));
            form.push((key("price_data][currency"), request.currency.as_str().to_string()));
            form.push((key("price_data][unit_amount"), item.amount.to_string()));
            form.push((key("price_data][product_data][name"), item.name.clone()));
        }

        let mut metadata: Vec<_> = request.metadata.iter().collect();
        metadata.sort();
        for (k, v) in metadata {
            form.push((format!("metadata[{k}]"), v.clone()));
        }
        form
    }

    async fn api_error(response: reqwest::Response) -> CommerceError {
        let status = response.status();
        let message = response
            .json::<StripeErrorEnvelope>()
            .await
            .map(|e| e.error.message.unwrap_or_default())
            .unwrap_or_default();
        CommerceError::Upstream(format!("Stripe returned {status}: {message}"))
    }
}

fn transport_error(e: reqwest::Error) -> CommerceError {
    if e.is_timeout() {
        CommerceError::Upstream("Stripe request timed out".into())
    } else {
        CommerceError::Upstream(format!("Stripe request failed: {e}"))
    }
}

impl PaymentGateway for StripeGateway {
    async fn create_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> CommerceResult<CheckoutSession> {
        let response = self
            .inner
            .client
            .post(self.url("/v1/checkout/sessions"))
            .bearer_auth(&self.inner.config.secret_key)
            .form(&self.session_form(request))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let session: StripeSession = response
            .json()
            .await
            .map_err(|e| CommerceError::Upstream(format!("Unreadable Stripe response: {e}")))?;

        let redirect_handle = session
            .url
            .ok_or_else(|| CommerceError::Upstream("Stripe session has no URL".into()))?;

        Ok(CheckoutSession {
            redirect_handle,
            reference: PaymentReference::from_db(session.id),
        })
    }

    async fn get_status(&self, reference: &PaymentReference) -> CommerceResult<PaymentStatusReport> {
        let response = self
            .inner
            .client
            .get(self.session_url(reference)?)
            .bearer_auth(&self.inner.config.secret_key)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(PaymentStatusReport {
                status: PaymentStatus::Failed,
                amount_total: 0,
                currency: Currency::default(),
                metadata: HashMap::new(),
            });
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let session: StripeSession = response
            .json()
            .await
            .map_err(|e| CommerceError::Upstream(format!("Unreadable Stripe response: {e}")))?;

        Ok(session.into_report())
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
    status: Option<String>,
    payment_status: Option<String>,
    amount_total: Option<i64>,
    currency: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl StripeSession {
    fn status(&self) -> PaymentStatus {
        match (self.payment_status.as_deref(), self.status.as_deref()) {
            (Some("paid"), _) => PaymentStatus::Succeeded,
            (_, Some("expired")) => PaymentStatus::Failed,
            _ => PaymentStatus::Pending,
        }
    }

    fn into_report(self) -> PaymentStatusReport {
        PaymentStatusReport {
            status: self.status(),
            amount_total: self.amount_total.unwrap_or(0),
            currency: self
                .currency
                .as_deref()
                .and_then(|c| Currency::new(c).ok())
                .unwrap_or_default(),
            metadata: self.metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::port::LineItem;
    use crate::domain::value_object::ProfileId;

    fn session(json: &str) -> StripeSession {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        let paid = session(r#"{"id":"cs_1","status":"complete","payment_status":"paid","amount_total":800,"currency":"usd","metadata":{"profileIds":"1,2"}}"#);
        let report = paid.into_report();
        assert_eq!(report.status, PaymentStatus::Succeeded);
        assert_eq!(report.amount_total, 800);
        assert_eq!(report.metadata["profileIds"], "1,2");

        let expired = session(r#"{"id":"cs_2","status":"expired","payment_status":"unpaid"}"#);
        assert_eq!(expired.status(), PaymentStatus::Failed);

        let open = session(r#"{"id":"cs_3","status":"open","payment_status":"unpaid"}"#);
        assert_eq!(open.status(), PaymentStatus::Pending);
    }

    #[test]
    fn test_session_url_stays_under_checkout_sessions() {
        let gateway = StripeGateway::new(StripeConfig::new(
            "sk_test_x",
            "https://shop.example/success",
            "https://shop.example/cart",
        ))
        .unwrap();

        let url = gateway
            .session_url(&PaymentReference::new("cs_test_a1").unwrap())
            .unwrap();
        assert_eq!(url, "https://api.stripe.com/v1/checkout/sessions/cs_test_a1");

        let crafted = PaymentReference::from_db("../../v1/customers?limit=1#");
        assert!(matches!(
            gateway.session_url(&crafted),
            Err(CommerceError::Validation(_))
        ));
    }

    #[test]
    fn test_session_form_keys() {
        let gateway = StripeGateway::new(StripeConfig::new(
            "sk_test_x",
            "https://shop.example/success?ref={CHECKOUT_SESSION_ID}",
            "https://shop.example/cart",
        ))
        .unwrap();

        let request = CheckoutSessionRequest {
            amount: 800,
            currency: Currency::default(),
            line_items: vec![LineItem {
                profile_id: ProfileId::new(1),
                name: "One".into(),
                amount: 500,
            }],
            metadata: HashMap::from([("profileIds".to_string(), "1".to_string())]),
            customer_email: "a@x.com".into(),
        };
        let form = gateway.session_form(&request);
        let get = |k: &str| form.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());

        assert_eq!(get("mode"), Some("payment"));
        assert_eq!(get("line_items[0][price_data][unit_amount]"), Some("500"));
        assert_eq!(get("line_items[0][price_data][currency]"), Some("usd"));
        assert_eq!(get("line_items[0][price_data][product_data][name]"), Some("One"));
        assert_eq!(get("metadata[profileIds]"), Some("1"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = StripeConfig::new("sk_live_secret", "a", "b");
        assert!(!format!("{config:?}").contains("sk_live_secret"));
    }
}
