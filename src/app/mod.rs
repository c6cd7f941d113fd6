//! Application Layer
//!
//! CLI parsing, configuration loading and the staged startup sequence
//! that wires the engine together.

pub mod cli;
pub mod config;
pub mod startup;
