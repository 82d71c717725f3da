pub mod config;
pub mod device;
pub mod display;
pub mod error;
pub mod fingerprint;
pub mod request;
pub mod status;
pub mod store;
