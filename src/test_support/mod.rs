//! Test utilities shared across crate-level unit tests.

pub mod http;

pub use http::{asset_server, start_mock_server};
