//! ============================================================================
//! BOUTIQUE-CORE: Storefront Client Logic
//! ============================================================================
//! This crate handles all client-side logic for the boutique storefront:
//! - REST API client for catalog, auth, and checkout endpoints
//! - Local persistence for the cart and auth token via redb
//! - Cart store with stock-ceiling enforcement
//! - Session store with token restore and route guarding
//! - Checkout flow state machine for the payment handoff
//! ============================================================================

pub mod api;
pub mod cart;
pub mod checkout;
pub mod db;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export main types for convenience
pub use api::{ApiClient, ApiError};
pub use cart::CartStore;
pub use checkout::{CheckoutError, CheckoutFlow, CheckoutState};
pub use db::LocalStore;
pub use session::{RouteAccess, SessionStore};
pub use types::*;
