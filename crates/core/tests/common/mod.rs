//! Common test utilities shared by the integration tests.
//!
//! This module provides:
//! - Fixtures (snapshot entries, configs, a session wired to a mock backend)
//! - Assertions over emitted event sequences

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
