//! Infrastructure layer: I/O implementations and DI container
//!
//! This layer implements the filesystem boundary trait and wires up services.

pub mod di;
pub mod error;
pub mod traits;

pub use error::InfraError;
