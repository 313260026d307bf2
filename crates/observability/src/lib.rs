//! Process-wide logging setup shared by the binary and tests.

pub mod tracing;

/// Install the global subscriber. Later calls are no-ops.
pub fn init() {
    tracing::init(tracing::DEFAULT_FILTER);
}
