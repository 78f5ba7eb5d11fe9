//! Persistence seam between the HTTP handlers and the database.
//!
//! Every mesken write is conditional on the version the caller last saw, so
//! concurrent lifecycle changes cannot silently overwrite each other. User
//! uniqueness is enforced by the store, not by a read-then-write in handlers.

mod memory;
mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{Mesken, User};

#[async_trait]
pub trait Store: Send + Sync {
    async fn user_exists_by_tckn(&self, tckn: &str) -> Result<bool, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when the TCKN is already registered.
    async fn insert_user(&self, user: User) -> Result<User, StoreError>;

    async fn find_user_by_tckn(&self, tckn: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_address(&self, address: &str) -> Result<Option<User>, StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Overwrites the bound address. Returns `false` when no such user exists
    /// and [`StoreError::Duplicate`] when another user already holds `address`.
    async fn set_public_address(&self, tckn: &str, address: &str) -> Result<bool, StoreError>;

    /// Replaces the nonce only if it still equals `expected`.
    async fn set_nonce(&self, tckn: &str, expected: i64, nonce: i64) -> Result<bool, StoreError>;

    /// Inserts the mesken and appends its id to the owner's list.
    async fn insert_mesken(&self, mesken: Mesken) -> Result<Mesken, StoreError>;

    async fn find_mesken(&self, mesken_id: &str) -> Result<Option<Mesken>, StoreError>;

    async fn list_meskens_by_owner(&self, tckn: &str) -> Result<Vec<Mesken>, StoreError>;

    async fn list_meskens_on_sale(&self) -> Result<Vec<Mesken>, StoreError>;

    /// Writes `mesken` if the stored version equals `mesken.version`; the
    /// returned record carries the incremented version.
    async fn save_mesken(&self, mesken: Mesken) -> Result<Mesken, StoreError>;

    /// Like [`Store::save_mesken`], and moves the id from `seller`'s list to
    /// the new owner's list in the same unit of work.
    async fn transfer_mesken(&self, mesken: Mesken, seller: &str) -> Result<Mesken, StoreError>;
}
