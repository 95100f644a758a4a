//! # mm-core
//!
//! Status tracking and backend access for mentions-monitor.
//!
//! This crate provides:
//! - Configuration loading from the `.mentions-monitor/` directory
//! - The backend client (`MonitorApi`) with an HTTP and a mock implementation
//! - Stage resolution and progress derivation
//! - The process tracker, log buffer and polling timers
//! - The per-view monitor session
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and management
//! - [`api`]: Backend client trait and implementations
//! - [`stages`]: Stage table lookups and classification
//! - [`state`]: Tracked records and the displayed log
//! - [`polling`]: Fixed-period background tasks
//! - [`session`]: Timer ownership and view operations
//! - [`logs`]: Log filtering and line levels
//! - [`insights`]: Dashboard aggregates
//! - [`chat`]: Question-answering sessions

pub mod api;
pub mod chat;
pub mod config;
pub mod insights;
pub mod logs;
pub mod polling;
pub mod session;
pub mod stages;
pub mod state;
