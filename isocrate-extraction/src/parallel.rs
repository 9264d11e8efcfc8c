//! Thread pool configuration for chunk extraction
//!
//! Chunks run on a process-wide rayon pool. The pool is built lazily with
//! defaults, or once up front through [`init_thread_pool`]. Parallelism can be
//! switched off, in which case chunks are extracted one after another on the
//! calling thread.
//!
//! ```rust
//! use isocrate_extraction::parallel::{init_thread_pool, ThreadPoolConfig};
//!
//! // Configure thread pool with 4 threads and larger stack
//! let config = ThreadPoolConfig::default()
//!     .with_threads(4)
//!     .with_stack_size(16 * 1024 * 1024);
//!
//! init_thread_pool(config).expect("Failed to initialize thread pool");
//! ```

use isocrate_core::{Error, Result};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::warn;

/// Global thread pool for chunk extraction, with the settings it was built from
static GLOBAL_THREAD_POOL: OnceLock<(Arc<ThreadPool>, ThreadPoolConfig)> = OnceLock::new();
/// Effective configuration; `None` until [`init_thread_pool`] runs
static THREAD_POOL_CONFIG: Mutex<Option<ThreadPoolConfig>> = Mutex::new(None);

/// Thread pool configuration for parallel processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadPoolConfig {
    /// Number of threads to use (None = automatic)
    pub num_threads: Option<usize>,
    /// Thread stack size in bytes
    pub stack_size: Option<usize>,
    /// Thread name prefix
    pub thread_name_prefix: String,
    /// Enable parallel processing (can be disabled for debugging)
    pub enabled: bool,
}

impl ThreadPoolConfig {
    /// Set number of threads
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Set stack size
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }

    /// Set thread name prefix
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Enable or disable parallel processing
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Whether two configurations would build the same pool
    pub fn same_pool_settings(&self, other: &ThreadPoolConfig) -> bool {
        self.num_threads == other.num_threads
            && self.stack_size == other.stack_size
            && self.thread_name_prefix == other.thread_name_prefix
    }

    fn build_pool(&self) -> Result<ThreadPool> {
        let mut builder = ThreadPoolBuilder::new();

        if let Some(num_threads) = self.num_threads {
            builder = builder.num_threads(num_threads);
        }

        if let Some(stack_size) = self.stack_size {
            builder = builder.stack_size(stack_size);
        }

        if !self.thread_name_prefix.is_empty() {
            let prefix = self.thread_name_prefix.clone();
            builder = builder.thread_name(move |index| format!("{}-{}", prefix, index));
        }

        builder
            .build()
            .map_err(|e| Error::Algorithm(format!("Failed to create thread pool: {}", e)))
    }
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            stack_size: None,
            thread_name_prefix: "isocrate-extract".to_string(),
            enabled: true,
        }
    }
}

/// Initialize the global thread pool with custom configuration
///
/// The pool can only be built once per process. Once it exists, later calls
/// only update the `enabled` switch; differing thread count, stack size or
/// name prefix are ignored with a warning.
pub fn init_thread_pool(config: ThreadPoolConfig) -> Result<()> {
    let built_with = match GLOBAL_THREAD_POOL.get() {
        Some((_, built_with)) => built_with,
        None => {
            let pool = Arc::new(config.build_pool()?);
            let (_, built_with) = GLOBAL_THREAD_POOL.get_or_init(|| (pool, config.clone()));
            built_with
        }
    };

    if !built_with.same_pool_settings(&config) {
        warn!(
            requested_threads = ?config.num_threads,
            requested_stack_size = ?config.stack_size,
            active_threads = ?built_with.num_threads,
            "thread pool already built; keeping existing pool settings"
        );
    }

    let effective = ThreadPoolConfig {
        enabled: config.enabled,
        ..built_with.clone()
    };
    if let Ok(mut global_config) = THREAD_POOL_CONFIG.lock() {
        *global_config = Some(effective);
    }

    Ok(())
}

/// Get the global thread pool, initializing with defaults if needed
pub fn get_thread_pool() -> Result<Arc<ThreadPool>> {
    if let Some((pool, _)) = GLOBAL_THREAD_POOL.get() {
        return Ok(Arc::clone(pool));
    }

    let config = get_config();
    let pool = Arc::new(config.build_pool()?);
    let (pool, _) = GLOBAL_THREAD_POOL.get_or_init(|| (pool, config));
    Ok(Arc::clone(pool))
}

/// Get current thread pool configuration
pub fn get_config() -> ThreadPoolConfig {
    THREAD_POOL_CONFIG
        .lock()
        .ok()
        .and_then(|config| config.clone())
        .unwrap_or_default()
}

/// Check if parallel processing is enabled
pub fn is_parallel_enabled() -> bool {
    get_config().enabled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_pool_config() {
        let config = ThreadPoolConfig::default()
            .with_threads(4)
            .with_stack_size(16 * 1024 * 1024)
            .with_thread_name_prefix("mc")
            .with_enabled(true);

        assert_eq!(config.num_threads, Some(4));
        assert_eq!(config.stack_size, Some(16 * 1024 * 1024));
        assert_eq!(config.thread_name_prefix, "mc");
        assert!(config.enabled);
    }

    #[test]
    fn test_config_before_init_matches_default() {
        assert_eq!(get_config(), ThreadPoolConfig::default());
        assert!(is_parallel_enabled());
    }

    #[test]
    fn test_same_pool_settings() {
        let base = ThreadPoolConfig::default();
        assert!(base.same_pool_settings(&base.clone().with_enabled(false)));
        assert!(!base.same_pool_settings(&base.clone().with_threads(3)));
        assert!(!base.same_pool_settings(&base.clone().with_stack_size(1 << 20)));
        assert!(!base.same_pool_settings(&base.clone().with_thread_name_prefix("other")));
    }

    #[test]
    fn test_default_pool_is_available() {
        let pool = get_thread_pool().unwrap();
        assert!(pool.current_num_threads() >= 1);
        assert!(Arc::ptr_eq(&pool, &get_thread_pool().unwrap()));
    }

    #[test]
    fn test_custom_pool_runs_work() {
        let pool = ThreadPoolConfig::default().with_threads(2).build_pool().unwrap();
        assert_eq!(pool.current_num_threads(), 2);
        assert_eq!(pool.install(|| 21 * 2), 42);
    }
}
