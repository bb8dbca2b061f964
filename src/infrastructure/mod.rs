//! Infrastructure layer: I/O implementations and DI container
//!
//! HTTP clients for the Fastly API and GitHub releases, archive handling,
//! executable replacement, the error log, and service wiring.

pub mod api;
pub mod archive;
pub mod di;
pub mod errlog;
pub mod error;
pub mod github;
pub mod replace;
pub mod traits;

pub use error::{InfraError, InfraResult};
