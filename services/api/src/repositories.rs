//! Repositories for database operations

use sqlx::migrate::Migrator;

pub mod video;

/// Schema migrations for the API service
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");
