//! Process-wide tracing setup shared by the binaries.

pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize tracing using `LOG_FORMAT` and `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    crate::tracing::init(LogFormat::from_env());
}
