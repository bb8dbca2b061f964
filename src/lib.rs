//! Command line client for the Fastly platform API.
//!
//! Layers, innermost first: `domain` (entities and version rules),
//! `application` (service resolution, profiles, self-update),
//! `infrastructure` (HTTP client, GitHub releases, filesystem, error log)
//! and `cli` (arguments, handlers, output).

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
