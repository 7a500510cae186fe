pub mod adapters;
pub mod error;
pub mod graph;
pub mod types;
