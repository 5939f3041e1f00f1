use std::fmt;

use log::{debug, warn};
use rand::Rng;

use crate::error::{GenError, Result};
use crate::model::generation_input::{GenerationInput, StartSeed};
use crate::model::ngram_model::NGramModel;
use crate::model::token::{Context, Token};
use crate::model::tokenizer::{render, tokenize};

/// Why a generation run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
	/// The sequence reached `max_length`.
	MaxLength,
	/// A sentence end was sampled after `min_length` tokens.
	SentenceEnd,
	/// The current context has no follow-set in the model.
	DeadEnd,
}

/// Tokens produced by one generation run, seed included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
	tokens: Vec<Token>,
	stop_reason: StopReason,
}

impl Generation {
	pub fn tokens(&self) -> &[Token] {
		&self.tokens
	}

	pub fn into_tokens(self) -> Vec<Token> {
		self.tokens
	}

	pub fn stop_reason(&self) -> StopReason {
		self.stop_reason
	}

	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	/// Renders the tokens to text.
	pub fn text(&self) -> String {
		render(&self.tokens)
	}
}

impl fmt::Display for Generation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.text())
	}
}

/// Sentence generator over a trained model.
///
/// # Responsibilities
/// - Select the starting context according to `StartSeed`
/// - Extend it token by token with weighted sampling
/// - Apply the stopping policy (length cap, sentence end, dead end)
/// - Retry when the output copies a training sentence
///
/// The generator only borrows the model, so any number of generators can
/// share one model across threads.
#[derive(Debug, Clone, Copy)]
pub struct Generator<'m> {
	model: &'m NGramModel,
}

impl<'m> Generator<'m> {
	pub fn new(model: &'m NGramModel) -> Self {
		Self { model }
	}

	pub fn model(&self) -> &'m NGramModel {
		self.model
	}

	/// Generates a sequence, avoiding training sentences if possible.
	///
	/// # Behavior
	/// - Calls `internal_generate`.
	/// - While the output is a sentence of the corpus, tries again, up to
	///   `input.nb_try` times.
	/// - Returns the first novel output, or the last attempt.
	///
	/// # Errors
	/// - `ModelEmpty` if the model recorded no context.
	/// - `NoValidSeed` if a sentence start is required but none exists.
	/// - `UnknownContext` if a custom seed is not a context of the model.
	/// - `InvalidConfig` if the input or the seed length is invalid.
	pub fn generate<R: Rng>(&self, input: &GenerationInput, rng: &mut R) -> Result<Generation> {
		let mut generation = self.internal_generate(input, rng)?;
		let mut nb_try = input.nb_try;

		while nb_try > 0 && self.model.contains_sentence(generation.tokens()) {
			generation = self.internal_generate(input, rng)?;
			nb_try -= 1;
		}
		if input.nb_try > 0 && self.model.contains_sentence(generation.tokens()) {
			warn!("Still copying a training sentence after {} retries", input.nb_try);
		}

		Ok(generation)
	}

	/// Generates and renders one sentence with the random source described
	/// by `input.seed`.
	pub fn generate_text(&self, input: &GenerationInput) -> Result<String> {
		let mut rng = input.make_rng();
		Ok(self.generate(input, &mut rng)?.text())
	}

	/// One run of the `SeedSelection -> Extending -> Terminated` machine.
	fn internal_generate<R: Rng>(&self, input: &GenerationInput, rng: &mut R) -> Result<Generation> {
		input.validate()?;
		if self.model.is_empty() {
			return Err(GenError::ModelEmpty);
		}

		// SeedSelection
		let (mut tokens, mut context) = self.select_seed(&input.start_seed, rng)?;
		if tokens.len() > input.max_length() {
			return Err(GenError::InvalidConfig(format!(
				"seed holds {} tokens but max_length is {}",
				tokens.len(),
				input.max_length()
			)));
		}

		// Extending
		let stop_reason = loop {
			if tokens.len() >= input.max_length() {
				break StopReason::MaxLength;
			}
			let Some(next) = self.model.follow_set(&context).and_then(|set| set.sample(&mut *rng)) else {
				break StopReason::DeadEnd;
			};

			tokens.push(next.clone());
			context.slide(next.clone());

			if next.is_sentence_end() && tokens.len() >= input.min_length() {
				break StopReason::SentenceEnd;
			}
		};

		// Terminated
		debug!("Generated {} tokens, stopped on {:?}", tokens.len(), stop_reason);
		Ok(Generation { tokens, stop_reason })
	}

	/// Returns the seed tokens that open the output and the context they
	/// end with.
	fn select_seed<R: Rng>(&self, start_seed: &StartSeed, rng: &mut R) -> Result<(Vec<Token>, Context)> {
		match start_seed {
			StartSeed::SentenceStart => {
				let context = self.model.random_sentence_start(rng).ok_or(GenError::NoValidSeed)?;
				Ok((context.tokens().to_vec(), context.clone()))
			}
			StartSeed::Random => {
				let context = self.model.random_context(rng).ok_or(GenError::ModelEmpty)?;
				Ok((context.tokens().to_vec(), context.clone()))
			}
			StartSeed::Custom(text) => {
				let tokens: Vec<Token> = tokenize(text).collect();
				let width = self.model.order() - 1;
				if tokens.len() < width {
					return Err(GenError::InvalidConfig(format!(
						"custom seed {text:?} holds {} tokens, a {}-gram model needs at least {width}",
						tokens.len(),
						self.model.order()
					)));
				}
				let context = Context::new(tokens[tokens.len() - width..].to_vec());
				if !self.model.contains(&context) {
					return Err(GenError::UnknownContext(context));
				}
				Ok((tokens, context))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn model(text: &str, n: usize) -> NGramModel {
		let mut model = NGramModel::new(n).unwrap();
		model.train_text(text);
		model
	}

	fn words(generation: &Generation) -> Vec<&str> {
		generation.tokens().iter().map(Token::as_str).collect()
	}

	#[test]
	fn empty_model_fails() {
		let model = NGramModel::from_tokens(Vec::new(), 3).unwrap();
		let mut rng = StdRng::seed_from_u64(0);
		for start_seed in [StartSeed::SentenceStart, StartSeed::Random, StartSeed::Custom("a b".into())] {
			let input = GenerationInput::default().with_start_seed(start_seed);
			assert!(matches!(
				Generator::new(&model).generate(&input, &mut rng),
				Err(GenError::ModelEmpty)
			));
		}
	}

	#[test]
	fn dead_end_stops_gracefully() {
		let model = model("a b c", 2);
		let mut rng = StdRng::seed_from_u64(0);
		let generation = Generator::new(&model).generate(&GenerationInput::default(), &mut rng).unwrap();

		assert_eq!(words(&generation), vec!["a", "b", "c"]);
		assert_eq!(generation.stop_reason(), StopReason::DeadEnd);
		assert_eq!(generation.text(), "A b c");
	}

	#[test]
	fn no_sentence_start_fails() {
		let model = model(", ; :", 2);
		let mut rng = StdRng::seed_from_u64(0);
		let result = Generator::new(&model).generate(&GenerationInput::default(), &mut rng);
		assert!(matches!(result, Err(GenError::NoValidSeed)));
	}

	#[test]
	fn random_start_works_without_sentence_start() {
		let model = model(", ; :", 2);
		let mut rng = StdRng::seed_from_u64(0);
		let input = GenerationInput::default().with_start_seed(StartSeed::Random);
		let generation = Generator::new(&model).generate(&input, &mut rng).unwrap();
		assert_eq!(generation.stop_reason(), StopReason::DeadEnd);
		assert_eq!(generation.tokens().last(), Some(&Token::from(":")));
	}

	#[test]
	fn custom_seed_must_be_known() {
		let model = model("the cat sat on the mat.", 3);
		let mut rng = StdRng::seed_from_u64(0);
		let generator = Generator::new(&model);

		let unknown = GenerationInput::default().with_start_seed(StartSeed::Custom("the dog".into()));
		match generator.generate(&unknown, &mut rng) {
			Err(GenError::UnknownContext(context)) => {
				assert_eq!(context, ["the", "dog"].into_iter().collect::<Context>())
			}
			other => panic!("expected UnknownContext, got {other:?}"),
		}

		let too_short = GenerationInput::default().with_start_seed(StartSeed::Custom("the".into()));
		assert!(matches!(generator.generate(&too_short, &mut rng), Err(GenError::InvalidConfig(_))));
	}

	#[test]
	fn custom_seed_opens_the_output() {
		let model = model("the cat sat on the mat.", 3);
		let mut rng = StdRng::seed_from_u64(0);
		let input = GenerationInput::default().with_start_seed(StartSeed::Custom("Look, the cat".into()));
		let generation = Generator::new(&model).generate(&input, &mut rng).unwrap();
		assert_eq!(generation.text(), "Look, the cat sat on the mat.");
		assert_eq!(generation.stop_reason(), StopReason::SentenceEnd);
	}

	#[test]
	fn quoted_dialogue_seeds_generation() {
		let model = model("‘Go home now.’ He left the room. ‘Why is it so?’ she asked him.", 2);
		let input = GenerationInput::new(40, 0).unwrap().with_seed(3);
		let text = Generator::new(&model).generate_text(&input).unwrap();
		assert!(text.starts_with(char::is_uppercase), "{text}");
	}

	#[test]
	fn max_length_bounds_output() {
		let model = model("a a a a a a a a a a a a a a a a a a a a a a a a a a.", 2);
		let generator = Generator::new(&model);
		for max_length in 1..10 {
			let input = GenerationInput::new(max_length, 0).unwrap();
			for seed in 0..20 {
				let mut rng = StdRng::seed_from_u64(seed);
				let generation = generator.generate(&input, &mut rng).unwrap();
				assert!(generation.len() <= max_length);
			}
		}
	}

	#[test]
	fn seed_longer_than_max_length_is_rejected() {
		let model = model("one two three four.", 3);
		let mut rng = StdRng::seed_from_u64(0);
		let input = GenerationInput::new(1, 0).unwrap();
		assert!(matches!(
			Generator::new(&model).generate(&input, &mut rng),
			Err(GenError::InvalidConfig(_))
		));
	}

	#[test]
	fn short_sentence_end_is_ignored_before_min_length() {
		let model = model("go. go. go. go. go. go. go. go.", 2);
		let generator = Generator::new(&model);

		let input = GenerationInput::new(20, 5).unwrap();
		let mut rng = StdRng::seed_from_u64(1);
		let generation = generator.generate(&input, &mut rng).unwrap();
		assert_eq!(words(&generation), vec!["go", ".", "go", ".", "go", "."]);
		assert_eq!(generation.stop_reason(), StopReason::SentenceEnd);
		assert_eq!(generation.text(), "Go. Go. Go.");

		let input = GenerationInput::new(20, 0).unwrap();
		let generation = generator.generate(&input, &mut rng).unwrap();
		assert_eq!(words(&generation), vec!["go", "."]);
	}

	#[test]
	fn same_seed_same_output() {
		let model = model(
			"The cat sat on the mat. The dog sat on the cat. The mat sat on the dog. A cat ran.",
			2,
		);
		let generator = Generator::new(&model);
		let input = GenerationInput::default().with_seed(1234);
		assert_eq!(generator.generate_text(&input).unwrap(), generator.generate_text(&input).unwrap());
	}

	#[test]
	fn retries_avoid_training_sentences() {
		// Half of the reachable sentences are copies of the corpus.
		let model = model("a b c. a d b e.", 2);
		let generator = Generator::new(&model);
		let input = GenerationInput::new(40, 0).unwrap().with_nb_try(200);
		for seed in 0..10 {
			let mut rng = StdRng::seed_from_u64(seed);
			let generation = generator.generate(&input, &mut rng).unwrap();
			assert!(!model.contains_sentence(generation.tokens()), "{generation}");
		}
	}
}
