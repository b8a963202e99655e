//! Core domain types and logic.

pub mod record;
pub mod source;
pub mod resampler;
pub mod stream_queue;
pub mod aligner;
pub mod pipeline;
pub mod config_validation;
pub mod error;
