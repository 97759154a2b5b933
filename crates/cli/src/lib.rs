//! Pulse CLI - operator commands over the compliance engine
//!
//! This crate provides the `pulse` binary and command orchestration.

pub mod commands;
pub mod context;

pub use context::AppContext;
