//! # trackmap Common Library
//!
//! Shared code for the trackmap binaries including:
//! - Error types
//! - Atomic file replacement
//! - Configuration loading and root folder resolution
//! - CSV dataset model
//! - Audio feature catalogue
//! - Feature standardization

pub mod atomic;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod scaling;

pub use dataset::{Dataset, MissingValues};
pub use error::{Error, Result};
pub use features::AudioFeature;
pub use scaling::StandardScaler;
