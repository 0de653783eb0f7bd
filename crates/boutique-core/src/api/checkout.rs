//! Checkout endpoints: payment-session creation and post-redirect
//! verification. The backend owns order creation, price re-checks, and the
//! processor session; this side only ships ids and quantities.

use serde::Deserialize;
use serde_json::json;

use super::{ApiClient, ApiError};
use crate::types::{CheckoutLineItem, VerificationPayload};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutSessionResponse {
    #[serde(default)]
    checkout_url: Option<String>,
}

impl ApiClient {
    /// `POST /checkout/create-session` — cart line items to a processor
    /// redirect URL. `Ok(None)` means the backend answered without one.
    pub async fn create_checkout_session(
        &self,
        items: &[CheckoutLineItem],
    ) -> Result<Option<String>, ApiError> {
        let body = json!({ "items": items });
        let value = self
            .request(reqwest::Method::POST, "/checkout/create-session", Some(body))
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        let response: CheckoutSessionResponse =
            serde_json::from_value(value).map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        Ok(response.checkout_url)
    }

    /// `GET /checkout/verify-session?session_id=` — resolve the processor
    /// session into an order record or a pending message.
    pub async fn verify_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<VerificationPayload, ApiError> {
        let endpoint = format!(
            "/checkout/verify-session?session_id={}",
            urlencoding::encode(session_id)
        );
        self.get_json(&endpoint).await
    }
}
