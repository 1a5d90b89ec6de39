//! Shared fixtures for bot integration tests.

pub mod mock_telegram;
