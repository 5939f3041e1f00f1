use thiserror::Error;

use crate::model::token::Context;

/// Errors surfaced by training, generation and model persistence.
///
/// None of these are retried internally: running the same request again
/// with the same inputs reproduces the same failure.
#[derive(Error, Debug)]
pub enum GenError {
	/// Training recorded no context (corpus shorter than `n` tokens).
	#[error("model is empty: the corpus was shorter than the model order")]
	ModelEmpty,

	/// Generation was asked to start from a context the model never saw.
	#[error("unknown context {0}")]
	UnknownContext(Context),

	/// No context starting a sentence was recorded during training.
	#[error("no sentence-start context available to seed generation")]
	NoValidSeed,

	/// A parameter is out of range or inconsistent with the model.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("model serialization error: {0}")]
	Serialization(#[from] postcard::Error),
}

pub type Result<T> = std::result::Result<T, GenError>;
