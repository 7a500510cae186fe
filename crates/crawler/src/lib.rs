pub mod cache;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod frontier;
pub mod graph;
pub mod payload;
pub mod prober;
pub mod proxy;
pub mod resolver;

#[cfg(test)]
mod testing;

pub use crawler::{CrawlReport, Crawler};
