//! Command-line entry point.
//!
//! ```bash
//! babble train --corpus ./data --order 4          # writes ./data.bin
//! babble generate --model ./data.bin --count 20
//! ```

mod gutenberg;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use rs_babble_core::io;
use rs_babble_core::model::generation_input::{DEFAULT_MAX_LENGTH, GenerationInput, StartSeed};
use rs_babble_core::model::generator::Generator;
use rs_babble_core::model::ngram_model::NGramModel;

#[derive(Parser)]
#[command(name = "babble")]
#[command(author, version, about = "Train a word-level n-gram model on books and generate sentences")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model on every corpus file of a folder
    Train {
        /// Folder containing the books
        #[arg(short, long)]
        corpus: String,

        /// Order of the model (N-1 tokens of context predict the Nth)
        #[arg(short = 'n', long)]
        order: usize,

        /// Extension of the corpus files
        #[arg(short, long, default_value = "txt")]
        extension: String,

        /// Output file (defaults to `<corpus>.bin`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the Project Gutenberg cleanup
        #[arg(long)]
        raw: bool,
    },

    /// Generate sentences from a trained model
    Generate {
        /// Model file written by `train`
        #[arg(short, long)]
        model: PathBuf,

        /// Number of sentences to print
        #[arg(short, long, default_value_t = 20)]
        count: usize,

        /// Maximum number of tokens per sentence
        #[arg(long, default_value_t = DEFAULT_MAX_LENGTH)]
        max_length: usize,

        /// Minimum number of tokens before a sentence end is honoured
        /// (defaults to 8, capped at the maximum length)
        #[arg(long)]
        min_length: Option<usize>,

        /// Fixed random seed (sentence k uses seed + k)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Start every sentence with this text
        #[arg(long, conflicts_with = "random_start")]
        start: Option<String>,

        /// Start from any context instead of a sentence start
        #[arg(long)]
        random_start: bool,

        /// Retries when a sentence copies the corpus
        #[arg(long, default_value_t = 10)]
        nb_try: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Commands::Train { corpus, order, extension, output, raw } => {
            let folder = io::normalize_folder(&corpus);
            let output = match output {
                Some(output) => output,
                None => io::build_output_path(&folder, "bin")?,
            };
            let model = train(&folder, order, &extension, raw)?;
            model.save(&output)?;
            println!("Model written to {}", output.display());
        }
        Commands::Generate {
            model,
            count,
            max_length,
            min_length,
            seed,
            start,
            random_start,
            nb_try,
        } => {
            let model = NGramModel::load(&model)?;
            let generator = Generator::new(&model);

            let mut input = GenerationInput::bounded(Some(max_length), min_length)?;
            input.nb_try = nb_try;
            input.start_seed = match (start, random_start) {
                (Some(text), _) => StartSeed::Custom(text),
                (None, true) => StartSeed::Random,
                (None, false) => StartSeed::SentenceStart,
            };

            for i in 0..count {
                input.seed = seed.map(|seed| seed.wrapping_add(i as u64));
                println!("{}", generator.generate_text(&input)?);
            }
        }
    }

    Ok(())
}

/// Reads, cleans and trains on every corpus file of `folder`.
fn train(
    folder: &Path,
    order: usize,
    extension: &str,
    raw: bool,
) -> Result<NGramModel, Box<dyn std::error::Error>> {
    if !folder.is_dir() {
        return Err(format!("Expected a directory, got: {}", folder.display()).into());
    }

    let mut documents = Vec::new();
    for file in io::list_files(folder, extension)? {
        let text = io::read_file(&file)?;
        let before = documents.len();
        if raw {
            documents.extend(gutenberg::raw_paragraphs(&text));
        } else {
            documents.extend(gutenberg::paragraphs(&text));
        }
        info!("{}: {} paragraphs", file.display(), documents.len() - before);
    }
    if documents.is_empty() {
        return Err(format!("No .{extension} file with text found in {}", folder.display()).into());
    }

    let progress = ProgressBar::new(documents.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );
    progress.set_message("Training");

    let model = NGramModel::from_documents(order, &documents, |done| progress.inc(done as u64))?;
    progress.finish_with_message("Trained");

    Ok(model)
}
