//! Monthly utility bill splitting.
//!
//! Sums the dollar amounts found in last month's labelled Gmail messages and
//! requests an equal share from every tenant on Venmo.

pub mod config;
pub mod models;
pub mod services;
pub mod startup;

pub use startup::Application;
