//! CLI command implementations.

pub mod backends;
pub mod common;
pub mod draw;
pub mod result;
pub mod run;
pub mod status;
