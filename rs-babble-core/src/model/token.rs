use std::fmt;

use serde::{Deserialize, Serialize};

/// Characters ending a sentence. Each one is always a standalone token.
pub const SENTENCE_END_CHARS: [char; 3] = ['.', '!', '?'];

/// Token of a quote opening a word, as opposed to `'` which closes one.
pub const OPENING_QUOTE: char = '‘';

/// Punctuation tokens rendered glued to the word that follows them.
const OPENING_CHARS: [char; 4] = ['(', '[', '{', OPENING_QUOTE];

/// An atomic unit of text: a lowercase word or a single punctuation mark.
///
/// Tokens are produced by [`tokenize`](crate::model::tokenizer::tokenize);
/// building them by hand (tests, custom seeds) skips normalisation, so the
/// caller is responsible for matching the tokenizer's conventions.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// `true` for `.`, `!` and `?`.
	pub fn is_sentence_end(&self) -> bool {
		let mut chars = self.0.chars();
		matches!((chars.next(), chars.next()), (Some(c), None) if SENTENCE_END_CHARS.contains(&c))
	}

	/// `true` when the token holds no alphanumeric character.
	pub fn is_punctuation(&self) -> bool {
		!self.0.is_empty() && !self.0.chars().any(char::is_alphanumeric)
	}

	/// `true` for words, i.e. anything that is not punctuation.
	pub fn is_word(&self) -> bool {
		self.0.chars().any(char::is_alphanumeric)
	}

	/// `true` for opening brackets, which attach to the next token when rendered.
	pub fn is_opening(&self) -> bool {
		let mut chars = self.0.chars();
		matches!((chars.next(), chars.next()), (Some(c), None) if OPENING_CHARS.contains(&c))
	}
}

impl From<&str> for Token {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}

impl From<String> for Token {
	fn from(value: String) -> Self {
		Self(value)
	}
}

impl From<char> for Token {
	fn from(value: char) -> Self {
		Self(value.to_string())
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// The conditioning key of the model: `n - 1` consecutive tokens.
///
/// Two contexts are equal iff their tokens are equal, in order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Context(Vec<Token>);

impl Context {
	pub fn new(tokens: Vec<Token>) -> Self {
		Self(tokens)
	}

	pub fn tokens(&self) -> &[Token] {
		&self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Moves the window one token forward: drops the oldest token and
	/// appends `next`, keeping the length unchanged.
	pub fn slide(&mut self, next: Token) {
		if !self.0.is_empty() {
			self.0.remove(0);
		}
		self.0.push(next);
	}
}

impl<T: Into<Token>> FromIterator<T> for Context {
	fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
		Self(iter.into_iter().map(Into::into).collect())
	}
}

impl fmt::Display for Context {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("(")?;
		for (i, token) in self.0.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{:?}", token.as_str())?;
		}
		f.write_str(")")
	}
}
