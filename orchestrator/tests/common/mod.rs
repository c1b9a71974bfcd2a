//! Common test utilities and infrastructure
//!
//! Shared fixtures and mock builders used across the supervisor test suites.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items for convenience; each test binary uses a subset
#[allow(unused_imports)]
pub use fixtures::TestFixtures;
#[allow(unused_imports)]
pub use helpers::{DirectoryBuilder, RegistryBuilder, TestHelpers, TransferBuilder};
