// Persistence port for mirroring alert state
use crate::domain::error::StorageError;

/// Durable byte slots addressed by key.
///
/// Calls are synchronous; adapters must not block on the network.
pub trait KeyValueStore: Send + Sync {
    /// Read a slot, `Ok(None)` if it was never written
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replace the contents of a slot
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;
}
