//! Optional default logger for binaries and tests.
//!
//! The library itself never installs a logger: it only calls
//! `log::{warn,debug,trace}!` and lets the host application decide what to
//! do with those records. [`init`] is a convenience for callers (and our
//! own integration tests) that just want output on stderr.
use std::sync::Once;

static INIT: Once = Once::new();

/// Install a default `env_logger` subscriber, once per process.
///
/// Safe to call multiple times; only the first call has any effect.
pub fn init() {
    INIT.call_once(|| {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
            .is_test(false)
            .try_init();
    });
}
