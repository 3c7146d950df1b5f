//! Error types
//!
//! Only level data can be malformed at runtime. Everything the physics layer
//! accepts is a closed enum, so there is no "unsupported shape" failure mode.

use thiserror::Error;

/// Level data failed to load or validate
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("guide id `{0}` is declared more than once")]
    DuplicateGuide(String),

    #[error("guide `{guide}` depends on unknown guide `{dependency}`")]
    UnknownDependency { guide: String, dependency: String },

    #[error("guide `{guide}` has accept type {accept_type}, expected an even type below 12 or 12")]
    InvalidAcceptType { guide: String, accept_type: u8 },

    #[error("initial block {index} has type {block_type}, expected 0..6")]
    InvalidBlockType { index: usize, block_type: u8 },

    #[error("cannon frequency range {min}..{max} seconds is empty or negative")]
    InvalidCannonFrequency { min: f32, max: f32 },

    #[error("no level with index {0}")]
    NoSuchLevel(usize),
}
