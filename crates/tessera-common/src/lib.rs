//! Common utilities for tessera
//!
//! This crate provides the error taxonomy shared by all tessera crates.

pub mod error;

pub use error::{Result, TesseraError};
