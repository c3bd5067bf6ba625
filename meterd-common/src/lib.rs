//! # meterd Common Library
//!
//! Shared code for the meterd service:
//! - Measurement model and measure type
//! - Error taxonomy
//! - Configuration loading

pub mod config;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{MeasureType, Measurement};
