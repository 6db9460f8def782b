//! [`TokenStore`] adapter that survives an unavailable storage medium.
//!
//! The medium is probed once on first use and the verdict cached. While the medium is
//! unavailable, or whenever a single operation on it fails, the token lives in a process-memory
//! fallback so the session keeps working for the lifetime of the process. A stored value that is
//! not a valid bearer token is purged on read and reported as absent. A removal the medium
//! refuses leaves a tombstone in the fallback that masks the stale medium value until the next
//! successful write.

// self
use crate::{
	_prelude::*,
	store::{ACCESS_TOKEN_KEY, MemoryMedium, StorageMedium, StoreError, TokenStore},
	token::BearerToken,
};

const TOMBSTONE: &str = "";

/// Token store backed by a [`StorageMedium`] with an in-memory fallback.
#[derive(Debug)]
pub struct SafeStore<M> {
	medium: M,
	fallback: MemoryMedium,
	available: Mutex<Option<bool>>,
	key: String,
}
impl<M> SafeStore<M>
where
	M: StorageMedium,
{
	/// Wraps `medium`, storing the token under [`ACCESS_TOKEN_KEY`].
	pub fn new(medium: M) -> Self {
		Self::with_key(medium, ACCESS_TOKEN_KEY)
	}

	/// Wraps `medium`, storing the token under a custom key.
	pub fn with_key(medium: M, key: impl Into<String>) -> Self {
		Self {
			medium,
			fallback: MemoryMedium::default(),
			available: Mutex::new(None),
			key: key.into(),
		}
	}

	/// Whether the medium passed its availability probe.
	pub fn is_medium_available(&self) -> bool {
		let mut cached = self.available.lock();

		*cached.get_or_insert_with(|| match self.medium.probe() {
			Ok(()) => true,
			Err(e) => {
				tracing::warn!(
					error = %e,
					"Storage medium is unavailable; using the memory fallback."
				);

				false
			},
		})
	}

	fn read_raw(&self) -> Option<String> {
		// Successful medium writes clear the fallback, so a fallback value is always the newest.
		if let Ok(Some(value)) = self.fallback.read_item(&self.key) {
			return (value != TOMBSTONE).then_some(value);
		}
		if !self.is_medium_available() {
			return None;
		}

		match self.medium.read_item(&self.key) {
			Ok(value) => value,
			Err(e) => {
				tracing::warn!(error = %e, "Storage read was blocked.");

				None
			},
		}
	}

	fn forget(&self) -> Result<(), StoreError> {
		if self.is_medium_available() {
			if let Err(e) = self.medium.delete_item(&self.key) {
				tracing::warn!(error = %e, "Storage removal was blocked; masking the stored token.");

				return self.fallback.write_item(&self.key, TOMBSTONE);
			}
		}

		self.fallback.delete_item(&self.key)
	}
}
impl<M> TokenStore for SafeStore<M>
where
	M: StorageMedium,
{
	fn get(&self) -> Option<BearerToken> {
		let raw = self.read_raw()?;

		match BearerToken::new(raw) {
			Ok(token) => Some(token),
			Err(e) => {
				tracing::warn!(error = %e, "Stored token is unreadable; discarding it.");

				if let Err(e) = self.forget() {
					tracing::warn!(error = %e, "Failed to discard the unreadable token.");
				}

				None
			},
		}
	}

	fn set(&self, token: &BearerToken) -> Result<(), StoreError> {
		if !self.is_medium_available() {
			return self.fallback.write_item(&self.key, token.expose());
		}

		match self.medium.write_item(&self.key, token.expose()) {
			Ok(()) => {
				let _ = self.fallback.delete_item(&self.key);

				Ok(())
			},
			Err(e) => {
				tracing::warn!(error = %e, "Storage write failed; using the memory fallback.");

				self.fallback.write_item(&self.key, token.expose())
			},
		}
	}

	fn remove(&self) -> Result<(), StoreError> {
		self.forget()
	}
}
