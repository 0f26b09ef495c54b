//! Key-value settings storage.
//!
//! The player persists a single preference (the UI theme), so the surface is
//! limited to string values.

use async_trait::async_trait;

use crate::error::Result;

/// Settings store trait
///
/// Backed by `UserDefaults`, `SharedPreferences`, `localStorage` or a local
/// SQLite file depending on the host.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn save_theme(store: &dyn SettingsStore) -> Result<()> {
///     store.set_string("theme", "dark").await
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_string(key).await?.is_some())
    }
}
