//! State management for tracked company processes.
//!
//! This module provides:
//! - Record transitions applied on every poll
//! - ProcessTracker for coordinating the active set
//! - LogBuffer for the displayed log of the selected company

pub mod error;
pub mod log_buffer;
pub mod record;
pub mod tracker;
