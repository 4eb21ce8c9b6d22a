//! Test utilities for integration testing.
//!
//! This module provides:
//! - Test data factories for creating valid test fixtures
//! - In-memory repository implementations and a recording provisioner
//! - `TestAppStateBuilder` for route tests

mod app_state_builder;
mod factories;
mod subscription_mocks;

pub use app_state_builder::*;
pub use factories::*;
pub use subscription_mocks::*;
