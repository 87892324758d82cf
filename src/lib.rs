//! # Bert Classify
#![forbid(unsafe_code)]

/// Experiment configuration
pub mod config;

/// Experiment bookkeeping
pub mod experiment;

/// Datasets
pub mod datasets;

/// Models
pub mod models;

/// The text classification pipeline
pub mod pipeline;

/// Utilities
pub mod utils;

/// Error macros
#[macro_use]
extern crate anyhow;
