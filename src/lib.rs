//! Library Management System application
//!
//! Application modules and the bootstrap that wires them to the database and
//! the HTTP server.

pub mod app;
pub mod modules;

pub use app::{build_registry, init_database, serve};
