//! Credential state and token storage.
//!
//! Groups the bearer credential value type with the two-scope store that
//! persists it between runs.

pub mod credential;
pub mod store;

pub use credential::{Credential, DEFAULT_EXPIRY_BUFFER_MS, now_ms};
pub use store::{MemoryScope, RedbScope, StoreError, TokenScope, TokenStore};
