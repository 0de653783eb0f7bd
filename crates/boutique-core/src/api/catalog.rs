//! Catalog endpoints: public product/category reads plus the bearer-gated
//! admin CRUD used by the management screens.

use serde::Serialize;
use serde_json::json;

use super::{ApiClient, ApiError};
use crate::types::{Category, Product};

/// Reference to an existing category, sent inside product payloads.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryRef {
    pub id: i64,
}

/// Product fields for create/update (everything but the id).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub nom: String,
    pub description: String,
    pub prix: f64,
    pub quantite_stock: u32,
    pub image_url: String,
    pub featured: bool,
    pub categorie: CategoryRef,
}

/// Category fields for create/update.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryPayload {
    pub nom: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ApiClient {
    // ========================================================================
    // Public reads
    // ========================================================================

    /// `GET /produits`
    pub async fn fetch_products(&self) -> Result<Vec<Product>, ApiError> {
        self.get_json("/produits").await
    }

    /// `GET /produits/featured`
    pub async fn fetch_featured_products(&self) -> Result<Vec<Product>, ApiError> {
        self.get_json("/produits/featured").await
    }

    /// `GET /produits/{id}`
    pub async fn fetch_product(&self, id: i64) -> Result<Product, ApiError> {
        self.get_json(&format!("/produits/{}", id)).await
    }

    /// `GET /produits?categoryId=&limit=`
    pub async fn fetch_products_by_category(
        &self,
        category_id: i64,
        limit: Option<u32>,
    ) -> Result<Vec<Product>, ApiError> {
        let mut endpoint = format!("/produits?categoryId={}", category_id);
        if let Some(limit) = limit {
            endpoint.push_str(&format!("&limit={}", limit));
        }
        self.get_json(&endpoint).await
    }

    /// `GET /categories`
    pub async fn fetch_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get_json("/categories").await
    }

    // ========================================================================
    // Admin CRUD (bearer-token gated on the backend)
    // ========================================================================

    /// `POST /produits`
    pub async fn create_product(&self, payload: &ProductPayload) -> Result<Product, ApiError> {
        self.post_json("/produits", json!(payload)).await
    }

    /// `PUT /produits/{id}`
    pub async fn update_product(
        &self,
        id: i64,
        payload: &ProductPayload,
    ) -> Result<Product, ApiError> {
        self.put_json(&format!("/produits/{}", id), json!(payload)).await
    }

    /// `DELETE /produits/{id}`
    pub async fn delete_product(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/produits/{}", id)).await
    }

    /// `POST /categories`
    pub async fn create_category(&self, payload: &CategoryPayload) -> Result<Category, ApiError> {
        self.post_json("/categories", json!(payload)).await
    }

    /// `PUT /categories/{id}`
    pub async fn update_category(
        &self,
        id: i64,
        payload: &CategoryPayload,
    ) -> Result<Category, ApiError> {
        self.put_json(&format!("/categories/{}", id), json!(payload)).await
    }

    /// `DELETE /categories/{id}`
    pub async fn delete_category(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/categories/{}", id)).await
    }
}
