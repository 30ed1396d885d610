//! CLI library components for radio-studio.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
