//! Shared building blocks for the binwatch services: configuration, the
//! Postgres pool, the application error type and the notification task model.

pub mod config;
pub mod db;
pub mod error;
pub mod types;
