//! Configuration module for the assistant.
//!
//! Provides CLI argument parsing, environment loading and the persona
//! handed to the remote model.

#[allow(clippy::module_inception)]
mod config;
mod persona;

pub use config::AppConfig;
pub use persona::{GenerationSettings, Persona};
