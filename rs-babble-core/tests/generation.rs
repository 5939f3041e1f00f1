//! End-to-end tests: train on text, generate, check the properties every
//! generated sentence must have.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use rand::SeedableRng;
use rand::rngs::StdRng;

use rs_babble_core::error::GenError;
use rs_babble_core::model::generation_input::{GenerationInput, StartSeed};
use rs_babble_core::model::generator::{Generator, StopReason};
use rs_babble_core::model::ngram_model::NGramModel;
use rs_babble_core::model::token::{Context, Token};
use rs_babble_core::model::tokenizer::tokenize;

const CORPUS: &str = "\
It was the best of times, it was the worst of times. It was the age of wisdom, \
it was the age of foolishness! It was the epoch of belief, it was the epoch of \
incredulity. Was it the season of light? It was the season of darkness. We had \
everything before us, we had nothing before us. We were all going direct to \
heaven, we were all going direct the other way.";

fn tokens(words: &[&str]) -> Vec<Token> {
	words.iter().map(|w| Token::from(*w)).collect()
}

#[test]
fn the_cat_scenario() {
	let model = NGramModel::from_tokens(tokens(&["the", "cat", "sat", "the", "cat", "ran"]), 2).unwrap();
	let the: Context = ["the"].into_iter().collect();
	let cat: Context = ["cat"].into_iter().collect();
	let sat: Context = ["sat"].into_iter().collect();

	let pairs = |context: &Context| -> Vec<(String, u64)> {
		model
			.follow_set(context)
			.unwrap()
			.iter()
			.map(|(token, count)| (token.to_string(), count))
			.collect()
	};
	assert_eq!(pairs(&the), vec![("cat".to_owned(), 2)]);
	assert_eq!(pairs(&cat), vec![("ran".to_owned(), 1), ("sat".to_owned(), 1)]);
	assert_eq!(pairs(&sat), vec![("the".to_owned(), 1)]);

	let mut rng = StdRng::seed_from_u64(99);
	for _ in 0..100 {
		assert_eq!(model.sample_next(&the, &mut rng).unwrap().as_str(), "cat");
	}
}

#[test]
fn empty_corpus_cannot_generate() {
	let model = NGramModel::from_tokens(tokenize(""), 3).unwrap();
	assert!(model.is_empty());
	let result = Generator::new(&model).generate_text(&GenerationInput::default());
	assert!(matches!(result, Err(GenError::ModelEmpty)));
}

#[test]
fn dead_end_returns_partial_sequence() {
	let model = NGramModel::from_tokens(tokens(&["a", "b", "c"]), 2).unwrap();
	let mut rng = StdRng::seed_from_u64(0);
	let generation = Generator::new(&model).generate(&GenerationInput::default(), &mut rng).unwrap();
	assert!(!generation.is_empty());
	assert_eq!(generation.stop_reason(), StopReason::DeadEnd);
	assert_eq!(generation.tokens().last().map(Token::as_str), Some("c"));
}

#[test]
fn generated_tokens_come_from_the_corpus() {
	let vocabulary: HashSet<Token> = tokenize(CORPUS).collect();
	for n in 2..=4 {
		let mut model = NGramModel::new(n).unwrap();
		model.train_text(CORPUS);
		let generator = Generator::new(&model);

		for seed in 0..50 {
			let mut rng = StdRng::seed_from_u64(seed);
			let generation = generator.generate(&GenerationInput::default(), &mut rng).unwrap();
			for token in generation.tokens() {
				assert!(vocabulary.contains(token), "invented token {token}");
			}
		}
	}
}

#[test]
fn generation_respects_max_length() {
	let mut model = NGramModel::new(2).unwrap();
	model.train_text(CORPUS);
	let generator = Generator::new(&model);

	for max_length in [1, 2, 5, 13, 40] {
		let input = GenerationInput::new(max_length, max_length).unwrap();
		for seed in 0..30 {
			let mut rng = StdRng::seed_from_u64(seed);
			let generation = generator.generate(&input, &mut rng).unwrap();
			assert!(generation.len() <= max_length);
		}
	}
}

#[test]
fn sentences_start_like_corpus_sentences() {
	let mut model = NGramModel::new(3).unwrap();
	model.train_text(CORPUS);
	let generator = Generator::new(&model);
	let openings: HashSet<Context> = model.sentence_starts().map(|(c, _)| c.clone()).collect();

	for seed in 0..30 {
		let mut rng = StdRng::seed_from_u64(seed);
		let generation = generator.generate(&GenerationInput::default(), &mut rng).unwrap();
		let opening: Context = generation.tokens()[..2].iter().cloned().collect();
		assert!(openings.contains(&opening));
		assert!(generation.text().starts_with(char::is_uppercase));
	}
}

#[test]
fn model_is_shared_read_only_across_threads() {
	let mut model = NGramModel::new(3).unwrap();
	model.train_text(CORPUS);
	let model = Arc::new(model);

	let handles: Vec<_> = (0..4)
		.map(|seed| {
			let model = Arc::clone(&model);
			thread::spawn(move || {
				let input = GenerationInput::default().with_seed(seed);
				Generator::new(&model).generate_text(&input)
			})
		})
		.collect();

	for (seed, handle) in handles.into_iter().enumerate() {
		let text = handle.join().unwrap().unwrap();
		let input = GenerationInput::default().with_seed(seed as u64);
		assert_eq!(text, Generator::new(&model).generate_text(&input).unwrap());
	}
}

#[test]
fn custom_seed_continues_the_text() {
	let mut model = NGramModel::new(3).unwrap();
	model.train_text(CORPUS);
	let input = GenerationInput::default()
		.with_start_seed(StartSeed::Custom("We had".into()))
		.with_seed(5);
	let text = Generator::new(&model).generate_text(&input).unwrap();
	assert!(text.starts_with("We had "), "{text}");
}
