//! Environment variable helpers
//!
//! Startup settings come from `VMS_*` variables; a missing variable falls back
//! to a default and says so in the log.

use tracing::info;

/// Resolve `key` through `lookup` (normally `std::env::var`), falling back to `default`.
///
/// An unset or empty variable counts as absent.
pub fn lookup_or_default<F>(key: &str, default: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).filter(|v| !v.is_empty()) {
        Some(v) => v,
        None => {
            info!(
                event = "env_default",
                key,
                value = default,
                "No {key} environment variable detected, defaulting to {default}"
            );
            default.to_string()
        }
    }
}
