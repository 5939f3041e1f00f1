//! Word-level n-gram text generation library.
//!
//! This crate trains an n-gram model over plain-text documents and samples
//! new sentences from it:
//! - Tokenization of raw text into words and punctuation
//! - N-gram counting, optionally in parallel over many documents
//! - Weighted next-token sampling with an injectable random source
//! - Sentence generation with an explicit stopping policy
//! - Model persistence and I/O helpers
//!
//! ```no_run
//! use rs_babble_core::model::generation_input::GenerationInput;
//! use rs_babble_core::model::generator::Generator;
//! use rs_babble_core::model::ngram_model::NGramModel;
//!
//! let mut model = NGramModel::new(3)?;
//! model.train_text("The cat sat on the mat. The dog sat on the cat.");
//! let text = Generator::new(&model).generate_text(&GenerationInput::default())?;
//! println!("{text}");
//! # Ok::<(), rs_babble_core::error::GenError>(())
//! ```

/// Tokenizer, n-gram model and generator.
pub mod model;

/// Error type shared by the whole crate.
pub mod error;

/// I/O utilities (corpus listing, path helpers).
pub mod io;
