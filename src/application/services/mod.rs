//! Application services
//!
//! Concrete structs over the `FastlyApi`, `Versioner` and `FileSystem`
//! boundaries. Commands call these; they never talk to HTTP directly.

mod profile;
mod resolver;
mod update;

pub use profile::{ProfileService, ProfileSummary};
pub use resolver::{EditableVersion, ResolvedService, ServiceResolver};
pub use update::{should_check, BackgroundCheck, SkipReason, UpdateCheck, UpdateService, CHECK_TIMEOUT};
