//! Application layer: services and use cases
//!
//! Orchestrates domain logic over the API and filesystem boundaries.

pub mod error;
pub mod error_ext;
pub mod services;

pub use error::{ApplicationError, ApplicationResult, SERVICE_ID_REMEDIATION, TOKEN_REMEDIATION};
pub use error_ext::IoResultExt;
