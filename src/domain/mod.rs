pub mod auth;
pub mod cache;
pub mod cors;
pub mod dashboard_service;
pub mod gateway;
pub mod rate_limiter;
pub mod runner;
pub mod types;
pub mod validate;

#[cfg(test)]
pub mod testing;
