use std::path::PathBuf;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};

use clap::Parser;
use env_logger::Env;
use log::info;
use serde::{Deserialize, Serialize};

use rs_babble_core::error::GenError;
use rs_babble_core::model::generation_input::{GenerationInput, StartSeed};
use rs_babble_core::model::generator::Generator;
use rs_babble_core::model::ngram_model::NGramModel;

/// Command-line options of the server.
#[derive(Parser)]
#[command(name = "babble-server", about = "Serve sentences generated from a trained n-gram model")]
struct Args {
	/// Model file written by `babble train`
	#[arg(short, long, default_value = "./data.bin")]
	model: PathBuf,

	#[arg(long, default_value = "127.0.0.1")]
	host: String,

	#[arg(short, long, default_value_t = 5000)]
	port: u16,
}

/// Struct representing query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	max_length: Option<usize>,
	min_length: Option<usize>,
	nb_try: Option<usize>,
	seed: Option<u64>,
	start: Option<String>,
	random_start: Option<bool>,
}

/// Summary returned by `/v1/model`
#[derive(Serialize)]
struct ModelInfo {
	order: usize,
	contexts: usize,
	sentence_starts: usize,
	sentences: usize,
}

impl GenerateParams {
	/// Builds the generation input, falling back to defaults for missing values.
	fn generation_input(&self) -> Result<GenerationInput, GenError> {
		let mut input = GenerationInput::bounded(self.max_length, self.min_length)?;
		input.nb_try = self.nb_try.unwrap_or(5);
		input.seed = self.seed;
		input.start_seed = match (&self.start, self.random_start.unwrap_or(false)) {
			(Some(s), _) if !s.trim().is_empty() => StartSeed::Custom(s.clone()),
			(_, true) => StartSeed::Random,
			_ => StartSeed::SentenceStart,
		};
		Ok(input)
	}
}

/// Maps a generation failure onto an HTTP response.
fn error_response(error: GenError) -> HttpResponse {
	match error {
		GenError::InvalidConfig(_) | GenError::UnknownContext(_) => HttpResponse::BadRequest().body(error.to_string()),
		GenError::ModelEmpty | GenError::NoValidSeed => HttpResponse::UnprocessableEntity().body(error.to_string()),
		_ => HttpResponse::InternalServerError().body(error.to_string()),
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates a sentence from the shared model based on query parameters.
/// Returns the generated sentence as the response body.
#[get("/v1/generate")]
async fn get_generated(model: web::Data<NGramModel>, query: web::Query<GenerateParams>) -> impl Responder {
	let input = match query.generation_input() {
		Ok(input) => input,
		Err(e) => return error_response(e),
	};

	match Generator::new(&model).generate_text(&input) {
		Ok(result) => HttpResponse::Ok().body(result),
		Err(e) => error_response(e),
	}
}

#[get("/v1/model")]
async fn get_model(model: web::Data<NGramModel>) -> impl Responder {
	HttpResponse::Ok().json(ModelInfo {
		order: model.order(),
		contexts: model.len(),
		sentence_starts: model.sentence_starts().count(),
		sentences: model.sentence_count(),
	})
}

/// Main entry point for the server.
///
/// Loads the n-gram model once and shares it read-only between workers:
/// generation never mutates the model, so no lock is needed.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	let model = NGramModel::load(&args.model)
		.map_err(|e| std::io::Error::other(format!("Failed to load model {}: {e}", args.model.display())))?;
	let shared_model = web::Data::new(model);

	info!("Listening on {}:{}", args.host, args.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::default().allow_any_origin().allowed_methods(vec!["GET"]))
			.app_data(shared_model.clone())
			.service(get_generated)
			.service(get_model)
	})
		.bind((args.host.as_str(), args.port))?
		.run()
		.await
}
