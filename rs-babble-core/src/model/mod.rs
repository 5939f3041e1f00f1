//! Word-level n-gram sentence generation.
//!
//! This module provides:
//! - Tokens and contexts (`Token`, `Context`)
//! - The corpus tokenizer and its matching renderer
//! - Fixed-order n-gram models (`NGramModel`)
//! - Generation parameters (`GenerationInput`)
//! - A high-level generation interface (`Generator`)

/// Token and context value types.
pub mod token;

/// Whitespace/punctuation tokenizer and the renderer mirroring it.
pub mod tokenizer;

/// Observed next-token counts for a single context.
///
/// Supports weighted random sampling and merging.
pub mod follow_set;

/// Fixed-order n-gram model (`n >= 2`).
///
/// Handles sequence ingestion, parallel training over documents,
/// next-token sampling, merging and persistence.
pub mod ngram_model;

/// Generation parameters: length bounds, seed strategy, retries and
/// random seed.
pub mod generation_input;

/// Sentence generation over a trained model.
pub mod generator;
