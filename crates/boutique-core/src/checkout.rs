//! ============================================================================
//! Checkout Flow - Payment handoff state machine
//! ============================================================================
//! Submission: `Idle -> Submitting -> Redirecting` (terminal for this run).
//! Any failure drops back to Idle with the cart intact. Verification after the
//! processor redirect: `Verifying -> Confirmed | Pending | Failed`; only a
//! confirmed order (paid or processing) clears the cart. No automatic retries;
//! a retry is a fresh user action.
//! ============================================================================

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::cart::CartStore;
use crate::session::SessionStore;
use crate::types::{Order, VerificationPayload};

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutState {
    Idle,
    Submitting,
    /// The processor URL the caller must navigate to.
    Redirecting { url: String },
    Verifying,
    Confirmed { order: Order },
    Pending { message: String },
    Failed { message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("You must be signed in to check out")]
    NotAuthenticated,
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("The payment service did not return a redirect URL")]
    MissingRedirect,
    #[error(transparent)]
    Api(#[from] ApiError),
}

pub struct CheckoutFlow {
    api: Arc<ApiClient>,
    state: CheckoutState,
}

impl CheckoutFlow {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            state: CheckoutState::Idle,
        }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Hand the cart to the payment processor. The guards run before any
    /// network call; every failure path lands back in `Idle` with the cart
    /// untouched, and success yields the redirect URL the caller navigates to.
    pub async fn submit(
        &mut self,
        cart: &CartStore,
        session: &SessionStore,
    ) -> Result<String, CheckoutError> {
        if !session.is_authenticated() {
            self.state = CheckoutState::Idle;
            return Err(CheckoutError::NotAuthenticated);
        }
        if cart.is_empty() {
            self.state = CheckoutState::Idle;
            return Err(CheckoutError::EmptyCart);
        }

        self.state = CheckoutState::Submitting;
        let result = self.api.create_checkout_session(&cart.line_items()).await;
        match result {
            Ok(Some(url)) => {
                info!("Checkout session created, redirecting");
                self.state = CheckoutState::Redirecting { url: url.clone() };
                Ok(url)
            }
            Ok(None) => {
                warn!("Checkout session created without a redirect URL");
                self.state = CheckoutState::Idle;
                Err(CheckoutError::MissingRedirect)
            }
            Err(e) => {
                warn!("Checkout submission failed: {}", e);
                self.state = CheckoutState::Idle;
                Err(e.into())
            }
        }
    }

    /// Resolve a processor session after the redirect back. The missing-id
    /// case is decided before any call. The cart is cleared exactly once,
    /// on a confirmed order; every other outcome leaves it intact.
    pub async fn verify(
        &mut self,
        session_id: Option<&str>,
        cart: &mut CartStore,
    ) -> &CheckoutState {
        let Some(session_id) = session_id else {
            self.state = CheckoutState::Failed {
                message: "No payment session to verify".to_string(),
            };
            return &self.state;
        };

        self.state = CheckoutState::Verifying;
        match self.api.verify_checkout_session(session_id).await {
            Ok(VerificationPayload::Order(order)) => {
                if order.statut.is_confirmed() {
                    info!("Order {} confirmed with status {}", order.id, order.statut);
                    cart.clear();
                    self.state = CheckoutState::Confirmed { order };
                } else {
                    warn!("Order {} came back with status {}", order.id, order.statut);
                    self.state = CheckoutState::Failed {
                        message: format!("Payment not completed (status: {})", order.statut),
                    };
                }
            }
            Ok(VerificationPayload::Pending { message, .. }) => {
                info!("Payment still pending: {}", message);
                self.state = CheckoutState::Pending { message };
            }
            Err(e) => {
                warn!("Checkout verification failed: {}", e);
                self.state = CheckoutState::Failed {
                    message: "Could not verify the payment session".to_string(),
                };
            }
        }
        &self.state
    }
}
