//! Library half of the `qrun` binary: commands, configuration and
//! histogram rendering.

pub mod commands;
pub mod config;
pub mod histogram;
