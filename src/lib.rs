//! Detector-record loading and vertex-resolution analysis.
//!
//! * [`data`] reads per-event record files into per-field chunks.
//! * [`metadata`] resolves detector, horn and flux from a path or filename.
//! * [`prediction`] and [`resolution`] compare the model's vertex prediction
//!   with the elastic-arms reconstruction against the true vertex.

pub mod config;
pub mod data;
pub mod error;
pub mod metadata;
pub mod mode;
pub mod prediction;
pub mod resolution;

pub use config::LoadOptions;
pub use data::loader::load_dataset;
pub use error::{AnalysisError, ClassificationError, LoadError};
pub use metadata::{resolve, Identification};
