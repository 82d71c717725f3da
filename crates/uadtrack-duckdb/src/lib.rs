pub mod admin;
pub mod backend;
pub mod device;
pub mod names;
pub mod requests;
pub mod schema;
pub mod store_impl;

mod sql;

pub use backend::DuckDbBackend;

/// Re-export the `duckdb` crate so consumers (especially tests) can use
/// `uadtrack_duckdb::duckdb::params!` without an extra dependency.
pub use duckdb;
