//! CLI support for the Palisade information-flow compiler.
//!
//! The binary itself (`src/bin/palisade.rs`) is a thin wrapper: parse
//! arguments, initialize logging, run [`driver::compile`], and translate its
//! result into a process exit code.

pub mod args;
pub mod driver;
pub mod printer;
pub mod tracing_config;
