//! # dayflow-core
//!
//! Foundation types for the dayflow task/time-tracking engine.
//!
//! This crate provides the shared vocabulary the other dayflow crates
//! depend on:
//!
//! - **Errors**: [`EngineError`] hierarchy via `thiserror`, with the three
//!   caller-facing kinds (not-found, bad-request, permission) plus
//!   storage-layer passthrough variants
//! - **Principal**: the verified caller identity every engine method
//!   receives
//! - **Logging**: `tracing` subscriber initialization
//!
//! [`EngineError`]: errors::EngineError

#![deny(unsafe_code)]

pub mod errors;
pub mod logging;
pub mod principal;

pub use errors::EngineError;
pub use principal::{Principal, Role};
