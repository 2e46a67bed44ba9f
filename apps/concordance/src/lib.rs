//! # concordance
//!
//! HTTP API and CLI over the concordance resolution engine.
//!
//! The engine itself lives in `concordance-core` and is synchronous; this
//! crate owns configuration, logging and the network surface.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;

pub use error::AppError;
