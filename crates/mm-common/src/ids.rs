//! Record and process identifiers.
//!
//! Records get `<prefix>-<ULID>` ids, which sort by creation time. The process
//! also gets one run id at first access so log lines from the same instance can
//! be correlated.

use once_cell::sync::Lazy;
use ulid::Ulid;

static RUN_ID: Lazy<String> = Lazy::new(|| Ulid::new().to_string());

/// Returns the process-level run id.
#[inline]
pub fn run_id() -> &'static str {
    &RUN_ID
}

/// Generates a fresh record id such as `team-01HV...`.
pub fn generate(prefix: &str) -> String {
    format!("{prefix}-{}", Ulid::new())
}
