pub mod config;
pub mod entities;
pub mod repository;
pub mod schema;
