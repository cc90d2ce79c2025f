//! # Offer-Signer Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/  # Service + KMS + codec + telemetry flows
//! └── benches/          # Codec and signing benchmarks
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p offer-tests
//! cargo bench -p offer-tests
//! ```

pub mod integration;
