//! # SSP Connector Library
//!
//! This library provides the core functionality for the SSP Connector
//! service: the per-company platform configuration lifecycle (registration,
//! connection testing, entry-point resolution) and the HTTP surface around it.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod manager;
pub mod models;
pub mod platform;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub mod token;
pub use migration;
