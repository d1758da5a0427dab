//! commandd library - exposes modules for testing.

pub mod error;
pub mod extract;
pub mod middleware;
pub mod repo;
pub mod routes;
pub mod server;
