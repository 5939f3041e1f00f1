use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::{GenError, Result};

/// Default cap on the number of tokens in a generated sequence.
pub const DEFAULT_MAX_LENGTH: usize = 40;

/// Default number of tokens before a sentence end may stop generation.
pub const DEFAULT_MIN_LENGTH: usize = 8;

/// Strategy used to select the starting context of a generation.
///
/// # Variants
/// - `SentenceStart`: a context that opened a sentence in the corpus,
///   weighted by how often it did.
/// - `Random`: any context of the model, uniformly.
/// - `Custom(String)`: the last `n - 1` tokens of the given text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StartSeed {
	#[default]
	SentenceStart,
	Random,
	Custom(String),
}

/// Parameters of one generation request.
///
/// # Invariants
/// - `max_length >= 1`
/// - `min_length <= max_length`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationInput {
	/// Maximum number of tokens in the output, seed included.
	max_length: usize,

	/// Minimum number of tokens before a sentence end stops the output.
	min_length: usize,

	/// Number of extra attempts when the output copies a training sentence.
	pub nb_try: usize,

	/// How the first context is chosen.
	pub start_seed: StartSeed,

	/// Fixed seed for the random source; OS entropy when `None`.
	pub seed: Option<u64>,
}

impl Default for GenerationInput {
	fn default() -> Self {
		Self {
			max_length: DEFAULT_MAX_LENGTH,
			min_length: DEFAULT_MIN_LENGTH,
			nb_try: 0,
			start_seed: StartSeed::SentenceStart,
			seed: None,
		}
	}
}

impl GenerationInput {
	/// Creates an input with the given bounds and default everything else.
	///
	/// # Errors
	/// Returns `InvalidConfig` if the bounds break the invariants.
	pub fn new(max_length: usize, min_length: usize) -> Result<Self> {
		let input = Self {
			max_length,
			min_length,
			..Self::default()
		};
		input.validate()?;
		Ok(input)
	}

	/// Creates an input from optional bounds, as given on a command line or
	/// in a query string.
	///
	/// A missing `max_length` is [`DEFAULT_MAX_LENGTH`]. A missing
	/// `min_length` is [`DEFAULT_MIN_LENGTH`], capped at `max_length`, so
	/// lowering the cap alone is always accepted.
	///
	/// # Errors
	/// Returns `InvalidConfig` if the resulting bounds break the invariants.
	pub fn bounded(max_length: Option<usize>, min_length: Option<usize>) -> Result<Self> {
		let max_length = max_length.unwrap_or(DEFAULT_MAX_LENGTH);
		let min_length = min_length.unwrap_or(DEFAULT_MIN_LENGTH.min(max_length));
		Self::new(max_length, min_length)
	}

	pub fn with_start_seed(mut self, start_seed: StartSeed) -> Self {
		self.start_seed = start_seed;
		self
	}

	pub fn with_seed(mut self, seed: u64) -> Self {
		self.seed = Some(seed);
		self
	}

	pub fn with_nb_try(mut self, nb_try: usize) -> Self {
		self.nb_try = nb_try;
		self
	}

	pub fn max_length(&self) -> usize {
		self.max_length
	}

	pub fn min_length(&self) -> usize {
		self.min_length
	}

	/// Sets the length cap.
	///
	/// # Errors
	/// Returns `InvalidConfig` if it is 0 or below the current minimum.
	pub fn set_max_length(&mut self, max_length: usize) -> Result<()> {
		Self::check(max_length, self.min_length)?;
		self.max_length = max_length;
		Ok(())
	}

	/// Sets the minimum length.
	///
	/// # Errors
	/// Returns `InvalidConfig` if it exceeds the current cap.
	pub fn set_min_length(&mut self, min_length: usize) -> Result<()> {
		Self::check(self.max_length, min_length)?;
		self.min_length = min_length;
		Ok(())
	}

	/// Sets both bounds at once, so a new range can be applied regardless
	/// of the current one.
	pub fn set_lengths(&mut self, max_length: usize, min_length: usize) -> Result<()> {
		Self::check(max_length, min_length)?;
		self.max_length = max_length;
		self.min_length = min_length;
		Ok(())
	}

	pub fn validate(&self) -> Result<()> {
		Self::check(self.max_length, self.min_length)
	}

	fn check(max_length: usize, min_length: usize) -> Result<()> {
		if max_length == 0 {
			return Err(GenError::InvalidConfig("max_length must be >= 1".to_owned()));
		}
		if min_length > max_length {
			return Err(GenError::InvalidConfig(format!(
				"min_length ({min_length}) must not exceed max_length ({max_length})"
			)));
		}
		Ok(())
	}

	/// Random source for this request: seeded if `seed` is set.
	pub fn make_rng(&self) -> StdRng {
		match self.seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_os_rng(),
		}
	}
}
