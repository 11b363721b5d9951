//! Infrastructure layer - database connection and schema migrations.

mod db;
pub mod migrations;

pub use db::{Database, MigrationStatus};
pub use migrations::Migrator;
