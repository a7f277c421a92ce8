//! Database module for SQLite operations.
//!
//! This module provides:
//! - Database initialization and migrations
//! - SQLite pragma configuration
//! - Repository layer: connection-scoped queries grouped by table, so the
//!   auction service can compose them inside one transaction

pub mod migrations;
pub mod repo;

pub use migrations::{init_db, MigrationError};
pub use repo::Repository;
