use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{debug, info};
use rand::Rng;
use rand::seq::IteratorRandom;
use serde::{Deserialize, Serialize};

use super::follow_set::{FollowSet, weighted_pick};
use super::token::{Context, Token};
use super::tokenizer::tokenize;
use crate::error::{GenError, Result};

/// Number of chunks per CPU when training documents in parallel.
const CHUNK_FACTOR: usize = 8;

/// Word-level n-gram model.
///
/// Maps every context of `n - 1` tokens seen in the corpus to the
/// distribution of tokens that followed it.
///
/// # Responsibilities
/// - Count (context, next token) pairs over token sequences
/// - Remember which contexts opened a sentence, to seed generation
/// - Remember complete training sentences, to detect verbatim copies
/// - Sample the next token for a known context
/// - Merge with another model of the same order, save and load
///
/// # Invariants
/// - `n` is always >= 2
/// - Every context key has a non-empty follow-set
/// - Every sentence-start context is also a context key
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NGramModel {
	/// The order of the model (number of tokens in an n-gram)
	n: usize, // must be >= 2

	/// Mapping from a context (length n-1) to its follow-set
	contexts: BTreeMap<Context, FollowSet>,

	/// Contexts observed at the beginning of a sentence, with their count
	starts: BTreeMap<Context, u64>,
	starts_total: u64,

	/// Training sentences, tokens joined by a single space
	sentences: HashSet<String>,
}

/// Messages sent by the training threads of [`NGramModel::from_documents`].
enum TrainingEvent {
	Document,
	Done(NGramModel),
}

impl NGramModel {
	/// Creates an empty model of order `n`.
	///
	/// # Errors
	/// Returns `InvalidConfig` if `n < 2`.
	pub fn new(n: usize) -> Result<Self> {
		if n < 2 {
			return Err(GenError::InvalidConfig(format!("model order must be >= 2, got {n}")));
		}
		Ok(Self {
			n,
			contexts: BTreeMap::new(),
			starts: BTreeMap::new(),
			starts_total: 0,
			sentences: HashSet::new(),
		})
	}

	/// Builds a model of order `n` from a single token sequence.
	pub fn from_tokens<I>(tokens: I, n: usize) -> Result<Self>
	where
		I: IntoIterator<Item = Token>,
	{
		let mut model = Self::new(n)?;
		model.train(tokens);
		Ok(model)
	}

	/// Builds a model of order `n` from independent documents, in parallel.
	///
	/// # Behavior
	/// - Splits the documents into chunks (based on CPU cores * factor).
	/// - Spawns one scoped thread per chunk, each training a partial model.
	/// - Merges the partial models as they arrive over the channel.
	/// - Calls `progress(1)` once per trained document.
	///
	/// N-grams never span two documents. The result is equal to training
	/// every document in turn into one model.
	pub fn from_documents<S, F>(n: usize, documents: &[S], mut progress: F) -> Result<Self>
	where
		S: AsRef<str> + Sync,
		F: FnMut(usize),
	{
		let mut model = Self::new(n)?;
		if documents.is_empty() {
			return Ok(model);
		}

		let chunks = num_cpus::get() * CHUNK_FACTOR;
		let chunk_size = documents.len().div_ceil(chunks);

		thread::scope(|scope| -> Result<()> {
			let (tx, rx) = mpsc::channel();
			for chunk in documents.chunks(chunk_size) {
				let tx = tx.clone();
				scope.spawn(move || {
					let mut partial = NGramModel::empty(n);
					for document in chunk {
						partial.train_text(document.as_ref());
						if tx.send(TrainingEvent::Document).is_err() {
							return;
						}
					}
					let _ = tx.send(TrainingEvent::Done(partial));
				});
			}
			drop(tx);

			for event in rx {
				match event {
					TrainingEvent::Document => progress(1),
					TrainingEvent::Done(partial) => {
						debug!("Merging partial model with {} contexts", partial.len());
						model.merge(&partial)?;
					}
				}
			}
			Ok(())
		})?;

		info!(
			"Trained {}-gram model on {} documents: {} contexts, {} sentence starts, {} sentences",
			model.n,
			documents.len(),
			model.len(),
			model.starts.len(),
			model.sentences.len()
		);
		Ok(model)
	}

	/// Empty model for an order already known to be valid.
	fn empty(n: usize) -> Self {
		Self {
			n,
			contexts: BTreeMap::new(),
			starts: BTreeMap::new(),
			starts_total: 0,
			sentences: HashSet::new(),
		}
	}

	/// Tokenizes `text` and trains on the resulting sequence.
	pub fn train_text(&mut self, text: &str) {
		self.train(tokenize(text));
	}

	/// Counts every n-gram of one token sequence.
	///
	/// For each window `tokens[i..i + n]`, the first `n - 1` tokens form the
	/// context and the last one is added to its follow-set. A window whose
	/// first token opens a sentence is also recorded as a sentence start: the
	/// first word of the sequence, or the first word after `.`, `!` or `?`.
	/// Punctuation in between (closing quotes, brackets, an opening quote)
	/// is skipped, so in `‘Go.’ He left.` both `go` and `he` open a sentence.
	///
	/// # Notes
	/// - Sequences shorter than `n` record no context.
	/// - A stored sentence runs from its opening word to its terminator;
	///   stray terminators (`?!`, `...`) are not sentences of their own.
	/// - Pure fold: training twice on the same input gives equal models.
	pub fn train<I>(&mut self, tokens: I)
	where
		I: IntoIterator<Item = Token>,
	{
		let mut window: VecDeque<(Token, bool)> = VecDeque::with_capacity(self.n);
		let mut at_boundary = true;
		let mut sentence: Vec<Token> = Vec::new();

		for token in tokens {
			let opens_sentence = at_boundary && token.is_word();
			if token.is_sentence_end() {
				at_boundary = true;
			} else if token.is_word() {
				at_boundary = false;
			}

			if opens_sentence || !sentence.is_empty() {
				sentence.push(token.clone());
			}
			if token.is_sentence_end() && !sentence.is_empty() {
				self.sentences.insert(Self::sentence_key(&sentence));
				sentence.clear();
			}

			window.push_back((token, opens_sentence));
			if window.len() < self.n {
				continue;
			}

			let context: Context = window.iter().take(self.n - 1).map(|(token, _)| token.clone()).collect();
			let next = window[self.n - 1].0.clone();

			if window[0].1 {
				*self.starts.entry(context.clone()).or_insert(0) += 1;
				self.starts_total += 1;
			}
			self.contexts.entry(context).or_default().add(next);
			window.pop_front();
		}
	}

	/// Key under which a sentence is stored in `sentences`.
	fn sentence_key(tokens: &[Token]) -> String {
		tokens.iter().map(Token::as_str).collect::<Vec<_>>().join(" ")
	}

	pub fn order(&self) -> usize {
		self.n
	}

	/// Number of distinct contexts.
	pub fn len(&self) -> usize {
		self.contexts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.contexts.is_empty()
	}

	pub fn contains(&self, context: &Context) -> bool {
		self.contexts.contains_key(context)
	}

	pub fn follow_set(&self, context: &Context) -> Option<&FollowSet> {
		self.contexts.get(context)
	}

	pub fn contexts(&self) -> impl Iterator<Item = (&Context, &FollowSet)> {
		self.contexts.iter()
	}

	/// Contexts that opened a sentence in the corpus, with their count.
	pub fn sentence_starts(&self) -> impl Iterator<Item = (&Context, u64)> {
		self.starts.iter().map(|(context, count)| (context, *count))
	}

	/// Number of distinct training sentences.
	pub fn sentence_count(&self) -> usize {
		self.sentences.len()
	}

	/// `true` if `tokens` is exactly one sentence of the corpus.
	pub fn contains_sentence(&self, tokens: &[Token]) -> bool {
		self.sentences.contains(&Self::sentence_key(tokens))
	}

	/// Draws the token following `context`.
	///
	/// # Errors
	/// Returns `UnknownContext` if the context was never observed.
	pub fn sample_next<R: Rng>(&self, context: &Context, rng: &mut R) -> Result<&Token> {
		self.contexts
			.get(context)
			.and_then(|follow_set| follow_set.sample(rng))
			.ok_or_else(|| GenError::UnknownContext(context.clone()))
	}

	/// Picks a sentence-start context, weighted by how often it opened a
	/// sentence. Returns `None` if no sentence start was recorded.
	pub fn random_sentence_start<R: Rng>(&self, rng: &mut R) -> Option<&Context> {
		weighted_pick(self.sentence_starts(), self.starts_total, rng)
	}

	/// Picks any context, uniformly. Returns `None` if the model is empty.
	pub fn random_context<R: Rng>(&self, rng: &mut R) -> Option<&Context> {
		self.contexts.keys().choose(rng)
	}

	/// Merges another n-gram model into this one.
	///
	/// # Notes
	/// - Both models must have the same order `n`.
	/// - Counts of matching contexts, transitions and starts are summed.
	///
	/// # Errors
	/// Returns `InvalidConfig` if the model orders do not match.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.n != other.n {
			return Err(GenError::InvalidConfig(format!(
				"cannot merge a {}-gram model into a {}-gram model",
				other.n, self.n
			)));
		}

		for (context, follow_set) in &other.contexts {
			if let Some(existing) = self.contexts.get_mut(context) {
				existing.merge(follow_set);
			} else {
				self.contexts.insert(context.clone(), follow_set.clone());
			}
		}
		for (context, count) in &other.starts {
			*self.starts.entry(context.clone()).or_insert(0) += *count;
		}
		self.starts_total += other.starts_total;
		self.sentences.extend(other.sentences.iter().cloned());

		Ok(())
	}

	/// Serializes the model with `postcard`.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(&path, bytes)?;
		info!("Saved {}-gram model to {}", self.n, path.as_ref().display());
		Ok(())
	}

	/// Loads a model written by [`save`](Self::save).
	///
	/// # Errors
	/// Returns an error if the file cannot be read or decoded, or if the
	/// stored order is below 2.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let bytes = std::fs::read(&path)?;
		let model: Self = postcard::from_bytes(&bytes)?;
		if model.n < 2 {
			return Err(GenError::InvalidConfig(format!(
				"stored model has order {}, expected >= 2",
				model.n
			)));
		}
		info!(
			"Loaded {}-gram model from {} ({} contexts)",
			model.n,
			path.as_ref().display(),
			model.len()
		);
		Ok(model)
	}
}
