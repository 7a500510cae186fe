pub mod config;
pub mod log;
pub mod rate_limit;
