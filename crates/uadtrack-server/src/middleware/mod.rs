pub mod admin_auth;
pub mod tracking;

pub use tracking::track_device;
