//! Thread-safe in-memory [`TokenStore`] and [`StorageMedium`] implementations.

// self
use crate::{
	_prelude::*,
	store::{StorageMedium, StoreError, TokenStore},
	token::BearerToken,
};

/// Token store that keeps the token in-process for tests, CLIs, and storage fallbacks.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<Option<BearerToken>>>);
impl TokenStore for MemoryStore {
	fn get(&self) -> Option<BearerToken> {
		self.0.read().clone()
	}

	fn set(&self, token: &BearerToken) -> Result<(), StoreError> {
		*self.0.write() = Some(token.clone());

		Ok(())
	}

	fn remove(&self) -> Result<(), StoreError> {
		self.0.write().take();

		Ok(())
	}
}

/// Key/value medium held in process memory; always available.
#[derive(Clone, Debug, Default)]
pub struct MemoryMedium(Arc<RwLock<HashMap<String, String>>>);
impl StorageMedium for MemoryMedium {
	fn probe(&self) -> Result<(), StoreError> {
		Ok(())
	}

	fn read_item(&self, key: &str) -> Result<Option<String>, StoreError> {
		Ok(self.0.read().get(key).cloned())
	}

	fn write_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
		self.0.write().insert(key.to_owned(), value.to_owned());

		Ok(())
	}

	fn delete_item(&self, key: &str) -> Result<(), StoreError> {
		self.0.write().remove(key);

		Ok(())
	}
}
