//! Process-wide tracing setup shared by the binaries and tests.

pub mod subscriber;

pub use subscriber::LogFormat;

/// Initialize tracing with the format selected by `LOG_FORMAT` (JSON unless set to `pretty`).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    subscriber::init(LogFormat::from_env());
}

/// Compact output captured by the test harness. Filtered by `RUST_LOG`, default `warn`.
pub fn init_for_tests() {
    subscriber::init_test();
}
