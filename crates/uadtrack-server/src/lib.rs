pub mod app;
pub mod config;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod user_agent;
