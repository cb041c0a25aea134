//! Command implementations for the batchbench CLI
//!
//! Each command is organized into its own module.

pub mod profile;
pub mod run;
pub mod worker;
