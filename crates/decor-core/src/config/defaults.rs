//! Default values for Decor configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Execution Defaults
// ============================================================================

/// Timeout for service start/stop when none is declared (5 s).
pub const DEFAULT_SERVICE_TIMEOUT_MS: u64 = 5_000;

/// Timeout for process runs when none is declared. 0 means "do not wait".
pub const DEFAULT_PROCESS_TIMEOUT_MS: u64 = 0;

/// Interval between service status polls.
pub const DEFAULT_SERVICE_POLL_INTERVAL_MS: u64 = 250;

// ============================================================================
// Service Control Defaults
// ============================================================================

#[cfg(not(windows))]
pub const DEFAULT_SERVICE_START: &[&str] = &["systemctl", "start", "{service}"];
#[cfg(not(windows))]
pub const DEFAULT_SERVICE_STOP: &[&str] = &["systemctl", "stop", "{service}"];
#[cfg(not(windows))]
pub const DEFAULT_SERVICE_STATUS: &[&str] = &["systemctl", "is-active", "--quiet", "{service}"];
/// Text the status output must contain for the service to count as running.
/// Empty means "exit code 0 is enough".
#[cfg(not(windows))]
pub const DEFAULT_SERVICE_RUNNING_MARKER: &str = "";

#[cfg(windows)]
pub const DEFAULT_SERVICE_START: &[&str] = &["sc", "start", "{service}"];
#[cfg(windows)]
pub const DEFAULT_SERVICE_STOP: &[&str] = &["sc", "stop", "{service}"];
#[cfg(windows)]
pub const DEFAULT_SERVICE_STATUS: &[&str] = &["sc", "query", "{service}"];
#[cfg(windows)]
pub const DEFAULT_SERVICE_RUNNING_MARKER: &str = "RUNNING";

// ============================================================================
// Logging Defaults
// ============================================================================

/// Default log filter directive.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ============================================================================
// File Locations
// ============================================================================

/// Project-local config file name.
pub const DEFAULT_CONFIG_FILE: &str = "decor.toml";

/// Directory name under the user config directory.
pub const DEFAULT_CONFIG_DIR: &str = "decor";
