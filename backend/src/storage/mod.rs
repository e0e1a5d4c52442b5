//! # Storage Layer
//!
//! Defines the storage abstraction traits the domain layer depends on and
//! the sqlite implementation used in production and tests.

pub mod sqlite;
pub mod traits;

pub use sqlite::connection::DbConnection;
pub use traits::*;
