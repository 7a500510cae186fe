pub mod config;
pub mod etherscan;
pub mod fetcher;
