use std::collections::BTreeMap;

use rand::Rng;

use serde::{Deserialize, Serialize};

use super::token::Token;

/// Distribution of the tokens observed right after one context.
///
/// Conceptually, this is the set of outgoing edges of a node in a Markov
/// chain, weighted by their number of observations.
///
/// ## Responsibilities:
/// - Accumulate next-token occurrences during training
/// - Draw the next token using weighted random sampling
/// - Merge with the follow-set of the same context from another model
///
/// ## Invariants
/// - Each occurrence count is strictly positive
/// - `total` is the sum of all counts
///
/// Transitions are kept in a `BTreeMap` so that a seeded random source
/// always walks them in the same order.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct FollowSet {
	/// Next token => number of times it followed the context.
	/// Example: { "cat" => 42, "dog" => 3 }
	transitions: BTreeMap<Token, u64>,
	total: u64,
}

impl FollowSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one occurrence of `next` after the context.
	pub fn add(&mut self, next: Token) {
		*self.transitions.entry(next).or_insert(0) += 1;
		self.total += 1;
	}

	/// Number of times `token` was observed, `0` when never seen.
	pub fn count(&self, token: &Token) -> u64 {
		self.transitions.get(token).copied().unwrap_or(0)
	}

	pub fn total(&self) -> u64 {
		self.total
	}

	/// Number of distinct next tokens.
	pub fn len(&self) -> usize {
		self.transitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.transitions.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&Token, u64)> {
		self.transitions.iter().map(|(token, count)| (token, *count))
	}

	/// Draws a token with probability `count / total`.
	///
	/// Returns `None` only when the set is empty.
	pub fn sample<R: Rng>(&self, rng: &mut R) -> Option<&Token> {
		weighted_pick(self.iter(), self.total, rng)
	}

	/// Adds the counts of `other` into this set.
	pub fn merge(&mut self, other: &Self) {
		for (token, count) in &other.transitions {
			*self.transitions.entry(token.clone()).or_insert(0) += *count;
		}
		self.total += other.total;
	}
}

/// Weighted draw over `(item, weight)` pairs whose weights sum to `total`.
///
/// Performs an O(n) cumulative subtraction over the pairs.
pub(crate) fn weighted_pick<'a, T, I, R>(items: I, total: u64, rng: &mut R) -> Option<&'a T>
where
	T: 'a,
	I: IntoIterator<Item = (&'a T, u64)>,
	R: Rng,
{
	if total == 0 {
		return None;
	}

	let mut r = rng.random_range(0..total);
	let mut fallback = None;
	for (item, weight) in items {
		if r < weight {
			return Some(item);
		}
		r -= weight;
		fallback = Some(item);
	}

	// Only reachable if `total` overstates the weights.
	fallback
}
