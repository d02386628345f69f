//! Static environment registry
//!
//! Loaded once at startup from a TOML file and owned for the process
//! lifetime. Everything downstream (planner, executor, reporter) works
//! from the immutable records defined here.

mod registry;

pub use registry::{Environment, Registry, RegistryError, Settings};

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
