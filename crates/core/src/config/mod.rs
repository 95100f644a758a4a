//! Configuration loading and management.
//!
//! This module provides functionality to load and validate the settings file
//! from the `.mentions-monitor/` directory.

pub mod error;
pub mod loader;
pub mod models;
