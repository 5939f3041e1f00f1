use std::collections::VecDeque;
use std::str::SplitWhitespace;

use super::token::{OPENING_QUOTE, Token};

/// Characters removed from the text before tokenization.
const DISCARDED_CHARS: [char; 4] = ['"', '“', '”', '_'];

/// Words whose leading apostrophe marks a dropped letter, not a quote.
const ELISIONS: [&str; 11] = [
	"tis", "twas", "twere", "twill", "twould", "em", "til", "cause", "neath", "gainst", "bout",
];

/// Splits raw text into word-level tokens.
///
/// # Policy
/// - Words are separated by whitespace.
/// - `"`, `“`, `”` and `_` are dropped; `’` and `‘` become `'`.
/// - Everything is lowercased.
/// - Non-alphanumeric characters at the start or the end of a word are
///   peeled off into single-character tokens, in order. Inner punctuation
///   (`don't`, `well-known`) stays in the word.
/// - A peeled quote at the start of a word is an opening quote and becomes
///   the `‘` token; one at the end stays `'`. Elisions such as `'tis` or
///   `'em` keep their apostrophe.
///
/// The returned iterator is lazy and `Clone`, so a stream can be replayed
/// without re-reading the text. Empty input yields no token.
pub fn tokenize(text: &str) -> Tokens<'_> {
	Tokens {
		words: text.split_whitespace(),
		pending: VecDeque::new(),
	}
}

/// Lazy token stream returned by [`tokenize`].
#[derive(Clone, Debug)]
pub struct Tokens<'a> {
	words: SplitWhitespace<'a>,
	pending: VecDeque<Token>,
}

impl Tokens<'_> {
	/// Normalises one whitespace-delimited word and queues its tokens.
	fn split_word(&mut self, word: &str) {
		let chars: Vec<char> = word
			.chars()
			.filter(|c| !DISCARDED_CHARS.contains(c))
			.map(|c| match c {
				'’' | '‘' => '\'',
				c => c,
			})
			.flat_map(char::to_lowercase)
			.collect();

		let mut start = chars.iter().position(|c| c.is_alphanumeric()).unwrap_or(chars.len());
		let end = chars.iter().rposition(|c| c.is_alphanumeric()).map_or(start, |i| i + 1);

		if start > 0 && start < end && chars[start - 1] == '\'' {
			let core: String = chars[start..end].iter().collect();
			if ELISIONS.contains(&core.as_str()) {
				start -= 1;
			}
		}

		self.pending.extend(
			chars[..start]
				.iter()
				.map(|&c| Token::from(if c == '\'' { OPENING_QUOTE } else { c })),
		);
		if start < end {
			self.pending.push_back(Token::from(chars[start..end].iter().collect::<String>()));
		}
		self.pending.extend(chars[end..].iter().copied().map(Token::from));
	}
}

impl Iterator for Tokens<'_> {
	type Item = Token;

	fn next(&mut self) -> Option<Token> {
		loop {
			if let Some(token) = self.pending.pop_front() {
				return Some(token);
			}
			let word = self.words.next()?;
			self.split_word(word);
		}
	}
}

/// Joins tokens back into readable text.
///
/// Mirrors [`tokenize`]: punctuation sticks to the previous word except
/// opening brackets and quotes, which stick to the next one. The first word,
/// every word after a sentence terminator, and the pronoun `i` are
/// capitalised. Opening quotes are written as `'`.
pub fn render(tokens: &[Token]) -> String {
	let mut text = String::new();
	let mut capitalize = true;
	let mut glue_next = false;

	for token in tokens {
		if token.is_punctuation() {
			if token.is_opening() && !text.is_empty() && !glue_next {
				text.push(' ');
			}
			if token.as_str().starts_with(OPENING_QUOTE) {
				text.push('\'');
			} else {
				text.push_str(token.as_str());
			}
			glue_next = token.is_opening();
			if token.is_sentence_end() {
				capitalize = true;
			}
			continue;
		}

		if !text.is_empty() && !glue_next {
			text.push(' ');
		}
		glue_next = false;

		let word = token.as_str();
		if capitalize || word == "i" {
			push_capitalized(&mut text, word);
		} else {
			text.push_str(word);
		}
		capitalize = false;
	}

	text
}

/// Appends `word` with its first letter uppercased (`'tis` -> `'Tis`).
fn push_capitalized(text: &mut String, word: &str) {
	match word.char_indices().find(|(_, c)| c.is_alphabetic()) {
		Some((i, first)) => {
			text.push_str(&word[..i]);
			text.extend(first.to_uppercase());
			text.push_str(&word[i + first.len_utf8()..]);
		}
		None => text.push_str(word),
	}
}
