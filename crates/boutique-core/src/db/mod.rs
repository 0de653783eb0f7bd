// ============================================================================
// LocalStore — Embedded Database (redb)
// ============================================================================
// Durable local storage for the cart entries and the auth token, standing in
// for the browser's localStorage. Each key is written by exactly one owning
// store; the API client only ever reads the token key.
// Default path: ~/.boutique/boutique.redb (override via BOUTIQUE_DB_PATH)
// ============================================================================

use anyhow::{anyhow, Result};
use redb::{Database, TableDefinition};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::CartItem;

// Table definitions
const CART: TableDefinition<&str, &[u8]> = TableDefinition::new("cart");
const AUTH: TableDefinition<&str, &[u8]> = TableDefinition::new("auth");

// Fixed keys, one owner each
const CART_KEY: &str = "cart:items";
const TOKEN_KEY: &str = "auth:token";

/// Embedded database for the storefront's persisted state
pub struct LocalStore {
    db: Database,
    path: PathBuf,
}

impl LocalStore {
    /// Open (or create) the database at the given path.
    /// If `path` is None, uses BOUTIQUE_DB_PATH env var or ~/.boutique/boutique.redb
    pub fn open(path: Option<&str>) -> Result<Self> {
        let db_path = if let Some(p) = path {
            PathBuf::from(p)
        } else if let Ok(env_path) = std::env::var("BOUTIQUE_DB_PATH") {
            PathBuf::from(env_path)
        } else {
            let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))?;
            let boutique_dir = home.join(".boutique");
            std::fs::create_dir_all(&boutique_dir)
                .map_err(|e| anyhow!("Failed to create .boutique directory: {}", e))?;
            boutique_dir.join("boutique.redb")
        };

        info!("Opening local store at: {}", db_path.display());

        let db = Database::create(&db_path)
            .map_err(|e| anyhow!("Failed to open local store: {}", e))?;

        // Ensure tables exist by doing a write transaction
        let write_txn = db
            .begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let _ = write_txn.open_table(CART).map_err(|e| anyhow!("Failed to create cart table: {}", e))?;
            let _ = write_txn.open_table(AUTH).map_err(|e| anyhow!("Failed to create auth table: {}", e))?;
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit init: {}", e))?;

        Ok(Self { db, path: db_path })
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ========================================================================
    // Cart Entries (owned by CartStore)
    // ========================================================================

    pub fn save_cart(&self, items: &[CartItem]) -> Result<()> {
        let value = bincode::serialize(items)
            .map_err(|e| anyhow!("Failed to serialize cart: {}", e))?;

        let write_txn = self.db.begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let mut table = write_txn.open_table(CART)
                .map_err(|e| anyhow!("Failed to open cart table: {}", e))?;
            table.insert(CART_KEY, value.as_slice())
                .map_err(|e| anyhow!("Failed to insert cart: {}", e))?;
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit: {}", e))?;

        debug!("Persisted cart ({} entries)", items.len());
        Ok(())
    }

    /// Load the persisted cart entries. `Ok(None)` means nothing was stored;
    /// a stored value that does not decode to a well-formed entry list is an
    /// error (the caller resets to an empty cart, never crashes).
    pub fn load_cart(&self) -> Result<Option<Vec<CartItem>>> {
        let read_txn = self.db.begin_read()
            .map_err(|e| anyhow!("Failed to begin read: {}", e))?;
        let table = read_txn.open_table(CART)
            .map_err(|e| anyhow!("Failed to open cart table: {}", e))?;

        match table.get(CART_KEY).map_err(|e| anyhow!("Failed to get cart: {}", e))? {
            Some(value) => {
                let items: Vec<CartItem> = bincode::deserialize(value.value())
                    .map_err(|e| anyhow!("Stored cart is not a well-formed entry list: {}", e))?;
                Ok(Some(items))
            }
            None => Ok(None),
        }
    }

    pub fn clear_cart(&self) -> Result<()> {
        let write_txn = self.db.begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let mut table = write_txn.open_table(CART)
                .map_err(|e| anyhow!("Failed to open cart table: {}", e))?;
            table.remove(CART_KEY)
                .map_err(|e| anyhow!("Failed to remove cart: {}", e))?;
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit delete: {}", e))?;

        debug!("Cleared persisted cart");
        Ok(())
    }

    /// Test hook: write raw bytes into the cart slot to simulate corruption.
    #[cfg(test)]
    pub(crate) fn save_cart_bytes(&self, bytes: &[u8]) -> Result<()> {
        let write_txn = self.db.begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let mut table = write_txn.open_table(CART)
                .map_err(|e| anyhow!("Failed to open cart table: {}", e))?;
            table.insert(CART_KEY, bytes)
                .map_err(|e| anyhow!("Failed to insert cart: {}", e))?;
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit: {}", e))?;
        Ok(())
    }

    // ========================================================================
    // Auth Token (owned by SessionStore; read by ApiClient)
    // ========================================================================

    pub fn save_token(&self, token: &str) -> Result<()> {
        let write_txn = self.db.begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let mut table = write_txn.open_table(AUTH)
                .map_err(|e| anyhow!("Failed to open auth table: {}", e))?;
            table.insert(TOKEN_KEY, token.as_bytes())
                .map_err(|e| anyhow!("Failed to insert token: {}", e))?;
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit: {}", e))?;

        debug!("Persisted auth token");
        Ok(())
    }

    pub fn load_token(&self) -> Result<Option<String>> {
        let read_txn = self.db.begin_read()
            .map_err(|e| anyhow!("Failed to begin read: {}", e))?;
        let table = read_txn.open_table(AUTH)
            .map_err(|e| anyhow!("Failed to open auth table: {}", e))?;

        match table.get(TOKEN_KEY).map_err(|e| anyhow!("Failed to get token: {}", e))? {
            Some(value) => {
                let token = String::from_utf8(value.value().to_vec())
                    .map_err(|e| anyhow!("Stored token is not valid UTF-8: {}", e))?;
                Ok(Some(token))
            }
            None => Ok(None),
        }
    }

    pub fn clear_token(&self) -> Result<()> {
        let write_txn = self.db.begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let mut table = write_txn.open_table(AUTH)
                .map_err(|e| anyhow!("Failed to open auth table: {}", e))?;
            table.remove(TOKEN_KEY)
                .map_err(|e| anyhow!("Failed to remove token: {}", e))?;
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit delete: {}", e))?;

        debug!("Cleared persisted auth token");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Product};

    fn temp_store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boutique.redb");
        let store = LocalStore::open(path.to_str()).unwrap();
        (dir, store)
    }

    fn sample_item(id: i64, quantity: u32) -> CartItem {
        CartItem {
            product: Product {
                id,
                nom: format!("Produit {}", id),
                description: String::new(),
                prix: 9.99,
                quantite_stock: 10,
                image_url: String::new(),
                rating: None,
                featured: false,
                categorie: Category {
                    id: 1,
                    nom: "Divers".into(),
                    description: None,
                },
            },
            quantity,
        }
    }

    #[test]
    fn test_cart_roundtrip() {
        let (_dir, store) = temp_store();
        assert!(store.load_cart().unwrap().is_none());

        let items = vec![sample_item(1, 2), sample_item(2, 1)];
        store.save_cart(&items).unwrap();

        let restored = store.load_cart().unwrap().unwrap();
        assert_eq!(restored, items);

        store.clear_cart().unwrap();
        assert!(store.load_cart().unwrap().is_none());
    }

    #[test]
    fn test_corrupted_cart_is_an_error_not_a_panic() {
        let (_dir, store) = temp_store();
        store.save_cart_bytes(&[0xff, 0x00, 0x13, 0x37]).unwrap();
        assert!(store.load_cart().is_err());
    }

    #[test]
    fn test_token_roundtrip() {
        let (_dir, store) = temp_store();
        assert!(store.load_token().unwrap().is_none());

        store.save_token("jwt-abc123").unwrap();
        assert_eq!(store.load_token().unwrap().as_deref(), Some("jwt-abc123"));

        store.clear_token().unwrap();
        assert!(store.load_token().unwrap().is_none());
    }

    #[test]
    fn test_reopen_preserves_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boutique.redb");

        {
            let store = LocalStore::open(path.to_str()).unwrap();
            store.save_token("persisted").unwrap();
            store.save_cart(&[sample_item(3, 4)]).unwrap();
        }

        let store = LocalStore::open(path.to_str()).unwrap();
        assert_eq!(store.load_token().unwrap().as_deref(), Some("persisted"));
        assert_eq!(store.load_cart().unwrap().unwrap()[0].quantity, 4);
    }
}
