//! split-core: Shared infrastructure for the utility-split workspace.
pub mod config;
pub mod error;
pub mod observability;

pub use tracing;
