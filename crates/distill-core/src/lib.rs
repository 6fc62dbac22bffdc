//! Distill Core - Domain models, error taxonomy, extraction and structural analysis
//!
//! This crate contains the core domain logic and port definitions for the Distill
//! summarization engine.

pub mod classify;
pub mod clock;
pub mod config;
pub mod error;
pub mod formats;
pub mod models;
pub mod processing;

pub use error::{AppError, Result};
