//! Database module: connection pool, schema and row-level queries for the live database.
//!
//! Layout:
//! - `pool.rs`: pool construction for the live SQLite file
//! - `schema.rs`: SQL DDL for initializing the application tables
//! - `models.rs`: Rust structs mirroring DB rows
//! - `habits.rs` / `repetitions.rs`: queries used by the REST handlers

pub mod habits;
pub mod models;
pub mod pool;
pub mod repetitions;
pub mod schema;

pub use models::{Habit, HabitFields, Repetition};
pub use pool::connect;
pub use schema::SQLITE_INIT;
