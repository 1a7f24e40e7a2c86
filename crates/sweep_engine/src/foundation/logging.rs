//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from `RUST_LOG`, falling back to `default_level`
pub fn init(default_level: &str) {
    let env = env_logger::Env::default().default_filter_or(default_level);
    // A second init (e.g. from tests) is not an error worth surfacing
    let _ = env_logger::Builder::from_env(env).try_init();
}
