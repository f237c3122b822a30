//! Configuration for neighbour providers and the SQLite edge store.
//!
//! Both structures are plain data with documented defaults, so callers can start from
//! `Default::default()` and override individual fields.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::NeighbourError;

/// Default number of edges read from storage per batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Options fixed at provider construction.
///
/// # Default Configuration
///
/// ```rust
/// use neighbourcache::ProviderConfig;
/// let config = ProviderConfig::default();
/// assert!(config.use_cache);
/// assert_eq!(config.batch_size, 1000);
/// assert!(!config.has_depth_filters);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Request per-vertex caching of neighbour batches
    ///
    /// **Default:** `true`
    ///
    /// The request is only honoured when `has_depth_filters` is `false`.
    pub use_cache: bool,

    /// Number of edges requested from the storage cursor per `next()` call
    ///
    /// **Default:** [`DEFAULT_BATCH_SIZE`]
    ///
    /// Also used as the capacity of every freshly allocated batch. Must be positive.
    pub batch_size: usize,

    /// Whether the traversal applies edge filters that differ by depth
    ///
    /// **Default:** `false`
    ///
    /// When set, the neighbours of a vertex depend on the depth it is reached at, so a
    /// single cached sequence per vertex would be wrong. The provider is then built
    /// without a cache for its whole lifetime, regardless of `use_cache`. A cursor whose
    /// prepared expressions are already depth-dependent disables the cache the same way;
    /// this flag is for filters the cursor will only receive after construction.
    pub has_depth_filters: bool,
}

impl ProviderConfig {
    pub fn cached() -> Self {
        Self::default()
    }

    pub fn uncached() -> Self {
        Self {
            use_cache: false,
            ..Self::default()
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_depth_filters(mut self, has_depth_filters: bool) -> Self {
        self.has_depth_filters = has_depth_filters;
        self
    }

    /// True when this configuration asks for a cache; the cursor can still veto it.
    pub fn caching_enabled(&self) -> bool {
        self.use_cache && !self.has_depth_filters
    }

    pub fn validate(&self) -> Result<(), NeighbourError> {
        if self.batch_size == 0 {
            return Err(NeighbourError::invalid_input("batch size must be positive"));
        }
        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            batch_size: DEFAULT_BATCH_SIZE,
            has_depth_filters: false,
        }
    }
}

/// Options applied when opening an [`EdgeStore`](crate::store::EdgeStore).
///
/// ```rust
/// use neighbourcache::StoreConfig;
/// let config = StoreConfig::default();
/// assert!(config.cache_size.is_none());
/// assert!(config.pragma_settings.is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Capacity of the prepared statement cache
    ///
    /// **Default:** `None` (rusqlite's default)
    pub cache_size: Option<usize>,

    /// Additional SQLite PRAGMA settings applied right after opening
    ///
    /// **Default:** empty
    ///
    /// ```rust
    /// use neighbourcache::StoreConfig;
    ///
    /// let mut cfg = StoreConfig::default();
    /// cfg.pragma_settings.insert("journal_mode".to_string(), "WAL".to_string());
    /// cfg.pragma_settings.insert("synchronous".to_string(), "NORMAL".to_string());
    /// ```
    pub pragma_settings: HashMap<String, String>,
}
