use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::Store;
use crate::error::StoreError;
use crate::models::{Mesken, MeskenStatus, User};

#[derive(Debug, Default)]
struct Collections {
    users: BTreeMap<String, User>,
    meskens: BTreeMap<String, Mesken>,
}

/// Process-local store with the same guarantees as [`super::PgStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Internal("memory store lock poisoned".to_string()))
    }
}

impl Collections {
    fn check_version(&self, mesken: &Mesken) -> Result<(), StoreError> {
        let stored = self.meskens.get(&mesken.mesken_id).ok_or(StoreError::NotFound)?;
        if stored.version != mesken.version {
            return Err(StoreError::VersionConflict {
                expected: mesken.version,
                actual: stored.version,
            });
        }
        Ok(())
    }

    fn write_next_version(&mut self, mut mesken: Mesken) -> Mesken {
        mesken.version += 1;
        self.meskens
            .insert(mesken.mesken_id.clone(), mesken.clone());
        mesken
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn user_exists_by_tckn(&self, tckn: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.users.contains_key(tckn))
    }

    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let mut data = self.lock()?;
        if data.users.contains_key(&user.tckn) {
            return Err(StoreError::Duplicate("User".to_string()));
        }
        data.users.insert(user.tckn.clone(), user.clone());
        Ok(user)
    }

    async fn find_user_by_tckn(&self, tckn: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.get(tckn).cloned())
    }

    async fn find_user_by_address(&self, address: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.public_address.as_deref() == Some(address))
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.lock()?.users.values().cloned().collect())
    }

    async fn set_public_address(&self, tckn: &str, address: &str) -> Result<bool, StoreError> {
        let mut data = self.lock()?;
        let taken = data
            .users
            .values()
            .any(|u| u.tckn != tckn && u.public_address.as_deref() == Some(address));
        if taken {
            return Err(StoreError::Duplicate("Public address".to_string()));
        }
        match data.users.get_mut(tckn) {
            Some(user) => {
                user.public_address = Some(address.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_nonce(&self, tckn: &str, expected: i64, nonce: i64) -> Result<bool, StoreError> {
        match self.lock()?.users.get_mut(tckn) {
            Some(user) if user.nonce == expected => {
                user.nonce = nonce;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_mesken(&self, mesken: Mesken) -> Result<Mesken, StoreError> {
        let mut data = self.lock()?;
        if data.meskens.contains_key(&mesken.mesken_id) {
            return Err(StoreError::Duplicate("Mesken".to_string()));
        }
        let owner = data
            .users
            .get_mut(&mesken.owner_tckn)
            .ok_or(StoreError::NotFound)?;
        owner.meskens.push(mesken.mesken_id.clone());
        data.meskens.insert(mesken.mesken_id.clone(), mesken.clone());
        Ok(mesken)
    }

    async fn find_mesken(&self, mesken_id: &str) -> Result<Option<Mesken>, StoreError> {
        Ok(self.lock()?.meskens.get(mesken_id).cloned())
    }

    async fn list_meskens_by_owner(&self, tckn: &str) -> Result<Vec<Mesken>, StoreError> {
        Ok(self
            .lock()?
            .meskens
            .values()
            .filter(|m| m.owner_tckn == tckn)
            .cloned()
            .collect())
    }

    async fn list_meskens_on_sale(&self) -> Result<Vec<Mesken>, StoreError> {
        Ok(self
            .lock()?
            .meskens
            .values()
            .filter(|m| m.status == MeskenStatus::OnSale.as_str())
            .cloned()
            .collect())
    }

    async fn save_mesken(&self, mesken: Mesken) -> Result<Mesken, StoreError> {
        let mut data = self.lock()?;
        data.check_version(&mesken)?;
        Ok(data.write_next_version(mesken))
    }

    async fn transfer_mesken(&self, mesken: Mesken, seller: &str) -> Result<Mesken, StoreError> {
        let mut data = self.lock()?;
        data.check_version(&mesken)?;
        if !data.users.contains_key(&mesken.owner_tckn) {
            return Err(StoreError::NotFound);
        }

        if let Some(previous) = data.users.get_mut(seller) {
            previous.meskens.retain(|id| id != &mesken.mesken_id);
        }
        if let Some(buyer) = data.users.get_mut(&mesken.owner_tckn) {
            buyer.meskens.push(mesken.mesken_id.clone());
        }
        Ok(data.write_next_version(mesken))
    }
}
