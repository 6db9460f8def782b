//! Token storage contracts and built-in implementations.
//!
//! [`TokenStore`] is the synchronous get/set/remove surface the pipeline reads on every request.
//! [`StorageMedium`] is the lower-level key/value medium (a file, a browser-like storage area)
//! that may be unavailable; [`SafeStore`] adapts a medium into a [`TokenStore`] that falls back
//! to process memory instead of failing.

pub mod file;
pub mod memory;
pub mod safe;

pub use file::FileMedium;
pub use memory::{MemoryMedium, MemoryStore};
pub use safe::SafeStore;

// self
use crate::{_prelude::*, token::BearerToken};

/// Storage key under which the access token is kept.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Synchronous holder of the current bearer token.
///
/// Implementations must never panic when their backing medium is unavailable; `get` reports an
/// unreadable value as absent.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the current token, if one is held.
	fn get(&self) -> Option<BearerToken>;

	/// Replaces the current token.
	fn set(&self, token: &BearerToken) -> Result<(), StoreError>;

	/// Forgets the current token.
	fn remove(&self) -> Result<(), StoreError>;
}

/// Key/value medium that may be unavailable at runtime.
pub trait StorageMedium
where
	Self: Send + Sync,
{
	/// Checks that the medium accepts writes.
	fn probe(&self) -> Result<(), StoreError>;

	/// Reads the value stored under `key`.
	fn read_item(&self, key: &str) -> Result<Option<String>, StoreError>;

	/// Writes `value` under `key`.
	fn write_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

	/// Deletes the value stored under `key`.
	fn delete_item(&self, key: &str) -> Result<(), StoreError>;
}

/// Error type produced by [`TokenStore`] and [`StorageMedium`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage medium.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
