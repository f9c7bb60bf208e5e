//! # Repositories
//!
//! Database access layer encapsulating SeaORM operations per entity.

pub mod configuration;

pub use configuration::ConfigurationRepository;
