//! # mm-protocol
//!
//! Core protocol definitions and data models for mentions-monitor.
//!
//! This crate defines all shared data structures used for:
//! - The fixed pipeline stage table reported by the backend
//! - Client-side process records for tracked companies
//! - Request/response bodies of the backend HTTP API
//! - Runtime settings from `config.toml`
//! - Communication between a view and its monitor session
//!
//! ## Modules
//!
//! - [`stage_models`]: Pipeline stages and their progress percentages
//! - [`process_models`]: Tracked process records and poll health
//! - [`api_models`]: Backend request and response bodies
//! - [`config_models`]: Settings from config.toml
//! - [`ipc`]: Operations and Events for view-session communication
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, ts-rs, and chrono
//! - TypeScript generation: Wire types derive `TS` for client compatibility
//! - Independent compilation: No dependencies on other mentions-monitor crates

pub mod api_models;
pub mod config_models;
pub mod ipc;
pub mod process_models;
pub mod stage_models;

// Re-export all public types for convenience
pub use api_models::*;
pub use config_models::*;
pub use ipc::*;
pub use process_models::*;
pub use stage_models::*;
