//! # Integration Tests
//!
//! End-to-end signing flows across the key service, the KMS gateway, the
//! signature codec and the telemetry crate.

pub mod signing_flow;
