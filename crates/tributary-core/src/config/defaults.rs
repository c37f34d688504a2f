//! Default values for Tributary configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Server Defaults
// ============================================================================

/// Default address the HTTP API binds to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default HTTP API port.
pub const DEFAULT_PORT: u16 = 5000;

// ============================================================================
// Store Defaults
// ============================================================================

/// Default on-disk location of the SurrealDB graph store.
pub const DEFAULT_STORE_PATH: &str = ".tributary/graph";

/// Default SurrealDB namespace.
pub const DEFAULT_NAMESPACE: &str = "tributary";

/// Default SurrealDB database.
pub const DEFAULT_DATABASE: &str = "graph";

// ============================================================================
// Story Defaults
// ============================================================================

/// Default deadline for one request, store calls included (10 s).
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Default number of parent nodes expanded concurrently per walk step.
pub const DEFAULT_FAN_OUT_CONCURRENCY: usize = 8;

// ============================================================================
// Logging Defaults
// ============================================================================

/// Default `tracing` filter directive.
pub const DEFAULT_LOG_FILTER: &str = "tributary=info,tributary_core=info,tower_http=info";

// ============================================================================
// Config File Locations
// ============================================================================

/// Project-local config file name.
pub const LOCAL_CONFIG_FILE: &str = "tributary.toml";

/// Directory under the user config dir.
pub const USER_CONFIG_DIR: &str = "tributary";

/// File name inside the user config directory.
pub const USER_CONFIG_FILE: &str = "config.toml";
