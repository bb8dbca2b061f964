//! Domain layer: entities and business rules
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entities;
pub mod error;
pub mod release;
pub mod version;

pub use entities::*;
pub use error::{DomainError, AUTO_CLONE_REMEDIATION};
pub use release::{asset_name, is_newer, parse_version, Platform};
pub use version::{plan_edit, select_version, EditPlan, VersionSelector};
