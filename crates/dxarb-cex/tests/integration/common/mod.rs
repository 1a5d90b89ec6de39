//! Shared fixtures for CEX adapter integration tests.

pub mod mock_xt;
