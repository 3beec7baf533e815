//! Tracing setup and request correlation.

/// Initialize process-wide tracing.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init();
}

pub mod correlation;
pub mod tracing;

pub use correlation::CorrelationId;
