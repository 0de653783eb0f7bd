//! ============================================================================
//! Cart Store - Owned cart state with durable persistence
//! ============================================================================
//! Insertion-ordered (product, quantity) entries keyed by product id. Stock
//! ceilings are enforced against the product snapshot passed by the caller;
//! the backend re-checks stock at checkout, so the ceiling here is advisory.
//! Every mutation persists the full entry list; construction restores from
//! storage and resets to empty on malformed data.
//! ============================================================================

use std::sync::Arc;

use tracing::{debug, warn};

use crate::db::LocalStore;
use crate::types::{CartError, CartItem, CheckoutLineItem, Product};

pub struct CartStore {
    items: Vec<CartItem>,
    store: Arc<LocalStore>,
}

impl CartStore {
    /// Restore the cart from persisted storage. A missing value starts
    /// empty; a malformed value is discarded and reset, never a crash.
    pub fn load(store: Arc<LocalStore>) -> Self {
        let items = match store.load_cart() {
            Ok(Some(items)) => items,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Stored cart is malformed, resetting: {}", e);
                if let Err(e) = store.clear_cart() {
                    warn!("Failed to clear malformed cart: {}", e);
                }
                Vec::new()
            }
        };
        Self { items, store }
    }

    /// Insert a new entry or increment an existing one. Rejects a product
    /// without an identifier, a zero quantity, and any quantity that would
    /// push the entry past the product's stock ceiling; rejection leaves the
    /// cart untouched.
    pub fn add_item(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        if product.id <= 0 {
            return Err(CartError::InvalidProduct);
        }
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        if let Some(existing) = self.items.iter_mut().find(|i| i.product.id == product.id) {
            // An overflowing sum can never fit under a u32 stock ceiling.
            let new_quantity = existing.quantity.checked_add(quantity);
            let Some(new_quantity) = new_quantity.filter(|q| *q <= product.quantite_stock) else {
                return Err(CartError::StockExceeded {
                    nom: product.nom.clone(),
                    available: product.quantite_stock,
                });
            };
            existing.quantity = new_quantity;
            debug!("Increased quantity of {} to {}", product.nom, new_quantity);
        } else {
            if quantity > product.quantite_stock {
                return Err(CartError::StockExceeded {
                    nom: product.nom.clone(),
                    available: product.quantite_stock,
                });
            }
            self.items.push(CartItem {
                product: product.clone(),
                quantity,
            });
            debug!("Added {} to cart", product.nom);
        }

        self.persist();
        Ok(())
    }

    /// Delete the entry for `product_id` if present; no-op otherwise.
    pub fn remove_item(&mut self, product_id: i64) {
        let before = self.items.len();
        self.items.retain(|i| i.product.id != product_id);
        if self.items.len() != before {
            debug!("Removed product {} from cart", product_id);
            self.persist();
        }
    }

    /// Replace an entry's quantity. Below 1 this is a removal; above the
    /// entry's stock ceiling it is rejected without clamping. Unknown ids
    /// are a no-op.
    pub fn update_quantity(&mut self, product_id: i64, quantity: u32) -> Result<(), CartError> {
        if quantity < 1 {
            self.remove_item(product_id);
            return Ok(());
        }

        let Some(item) = self.items.iter_mut().find(|i| i.product.id == product_id) else {
            return Ok(());
        };
        if quantity > item.product.quantite_stock {
            return Err(CartError::StockExceeded {
                nom: item.product.nom.clone(),
                available: item.product.quantite_stock,
            });
        }

        item.quantity = quantity;
        debug!("Set quantity of product {} to {}", product_id, quantity);
        self.persist();
        Ok(())
    }

    /// Empty the cart unconditionally.
    pub fn clear(&mut self) {
        self.items.clear();
        debug!("Cart cleared");
        self.persist();
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Derived on every read, never stored.
    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Total unit count across all entries, derived on every read.
    pub fn count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// The id/quantity pairs sent to checkout. Prices are deliberately
    /// omitted; they are authoritative only on the backend.
    pub fn line_items(&self) -> Vec<CheckoutLineItem> {
        self.items
            .iter()
            .map(|i| CheckoutLineItem {
                product_id: i.product.id,
                quantity: i.quantity,
            })
            .collect()
    }

    /// Persistence failure is non-fatal: the in-memory cart stays
    /// authoritative for the session.
    fn persist(&self) {
        if let Err(e) = self.store.save_cart(&self.items) {
            warn!("Failed to persist cart, continuing in memory: {}", e);
        }
    }
}
