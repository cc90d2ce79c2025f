//! # Domain Layer
//!
//! Pure conversion logic with no I/O dependencies.
//! This is the inner layer of the hexagonal architecture.

pub mod codec;
pub mod curve;
pub mod entities;
pub mod errors;
pub mod public_key;
