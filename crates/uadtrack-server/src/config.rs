/// Re-export `Config` from `uadtrack-core` for use within this crate.
///
/// All environment-variable parsing lives in `uadtrack-core` so it can be
/// shared with integration tests without depending on the full server.
pub use uadtrack_core::config::{Config, CookieConfig};
