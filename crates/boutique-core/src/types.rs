//! ============================================================================
//! Core Types for the Boutique Storefront
//! ============================================================================
//! Defines the domain structures exchanged with the REST backend. Field names
//! mirror the backend's JSON contract (camelCase, French nouns: `nom`, `prix`,
//! `quantiteStock`), so every struct here doubles as a wire DTO.
//! ============================================================================

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role string carried by customer accounts.
pub const ROLE_CLIENT: &str = "CLIENT";
/// Role string required for the admin surface.
pub const ROLE_ADMIN: &str = "ADMIN";

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,
    pub nom: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A catalog product as served by the backend.
///
/// Stock is advisory only: it is the ceiling for cart quantities at the time
/// of the call, and the backend re-checks it at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub nom: String,
    pub description: String,
    pub prix: f64,
    pub quantite_stock: u32,
    pub image_url: String,
    /// Average rating, 0-5
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub featured: bool,
    pub categorie: Category,
}

/// One cart entry: a product snapshot plus the requested quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Line total at the snapshotted price (display only; the backend
    /// re-prices at checkout)
    pub fn line_total(&self) -> f64 {
        self.product.prix * self.quantity as f64
    }
}

/// Identity resolved from the bearer token via `GET /users/profile`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl User {
    /// Exact role match against the user's role list. Substring checks are
    /// deliberately not supported.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Order lifecycle status as reported by the backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PendingPayment,
    Paid,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Failed,
}

impl OrderStatus {
    /// Statuses that count as a confirmed payment. Only these allow the
    /// client to clear the cart after checkout.
    pub fn is_confirmed(self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Processing)
    }

    /// The backend's wire spelling, used when echoing a status verbatim.
    pub fn as_wire(self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "PENDING_PAYMENT",
            OrderStatus::Paid => "PAID",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// One line of a confirmed order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: i64,
    pub quantity: u32,
    /// Unit price as re-checked by the backend
    #[serde(default)]
    pub prix_unitaire: Option<f64>,
}

/// Payment metadata attached to a verified order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub montant: Option<f64>,
}

/// An order record returned by the verification endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub statut: OrderStatus,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub paiement: Option<PaymentInfo>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Line item sent to `POST /checkout/create-session`. Carries only the
/// product id and quantity; prices are authoritative on the backend and are
/// never sent from the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLineItem {
    pub product_id: i64,
    pub quantity: u32,
}

/// Payload of `GET /checkout/verify-session`: either the updated order, or a
/// message-only body when the payment is still pending on the processor side.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum VerificationPayload {
    Order(Order),
    Pending {
        message: String,
        #[serde(default)]
        status: Option<String>,
    },
}

/// Cart mutation rejections. Handled locally and surfaced as notices; they
/// never leave the calling component.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("Could not add item to cart: product has no identifier")]
    InvalidProduct,

    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Stock limit reached: only {available} of {nom} available")]
    StockExceeded { nom: String, available: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_parses_backend_json() {
        let json = r#"{
            "id": 7,
            "nom": "Cafetière",
            "description": "Une cafetière italienne",
            "prix": 20.0,
            "quantiteStock": 5,
            "imageUrl": "https://cdn.example/cafetiere.jpg",
            "rating": 4.5,
            "featured": true,
            "categorie": { "id": 2, "nom": "Cuisine" }
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, 7);
        assert_eq!(product.quantite_stock, 5);
        assert_eq!(product.categorie.nom, "Cuisine");
        assert_eq!(product.rating, Some(4.5));
    }

    #[test]
    fn test_order_status_wire_format() {
        let status: OrderStatus = serde_json::from_str("\"PAID\"").unwrap();
        assert_eq!(status, OrderStatus::Paid);
        assert!(status.is_confirmed());

        let status: OrderStatus = serde_json::from_str("\"PENDING_PAYMENT\"").unwrap();
        assert_eq!(status, OrderStatus::PendingPayment);
        assert!(!status.is_confirmed());

        assert_eq!(OrderStatus::Cancelled.to_string(), "CANCELLED");
    }

    #[test]
    fn test_verification_payload_order_shape() {
        let json = r#"{ "id": 42, "statut": "PAID", "total": 100.0 }"#;
        let payload: VerificationPayload = serde_json::from_str(json).unwrap();
        match payload {
            VerificationPayload::Order(order) => {
                assert_eq!(order.id, 42);
                assert_eq!(order.statut, OrderStatus::Paid);
            }
            other => panic!("expected order payload, got {:?}", other),
        }
    }

    #[test]
    fn test_verification_payload_message_shape() {
        let json = r#"{ "message": "Payment still pending", "status": "open" }"#;
        let payload: VerificationPayload = serde_json::from_str(json).unwrap();
        match payload {
            VerificationPayload::Pending { message, status } => {
                assert_eq!(message, "Payment still pending");
                assert_eq!(status.as_deref(), Some("open"));
            }
            other => panic!("expected pending payload, got {:?}", other),
        }
    }

    #[test]
    fn test_role_match_is_exact() {
        let user = User {
            email: "admin@example.com".into(),
            name: None,
            roles: vec!["ADMINISTRATOR".into()],
        };
        // "ADMIN" is a substring of "ADMINISTRATOR" but must not match.
        assert!(!user.has_role(ROLE_ADMIN));

        let user = User {
            email: "admin@example.com".into(),
            name: None,
            roles: vec![ROLE_ADMIN.into(), ROLE_CLIENT.into()],
        };
        assert!(user.has_role(ROLE_ADMIN));
        assert!(user.has_role(ROLE_CLIENT));
    }

    #[test]
    fn test_line_total() {
        let item = CartItem {
            product: Product {
                id: 1,
                nom: "Tasse".into(),
                description: String::new(),
                prix: 12.5,
                quantite_stock: 10,
                image_url: String::new(),
                rating: None,
                featured: false,
                categorie: Category {
                    id: 1,
                    nom: "Cuisine".into(),
                    description: None,
                },
            },
            quantity: 4,
        };
        assert_eq!(item.line_total(), 50.0);
    }
}
