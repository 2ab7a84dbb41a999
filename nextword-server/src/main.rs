use std::env;
use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, delete, get, put, web};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use nextword_core::config::PipelineConfig;
use nextword_core::engine::ngram::NgramAdapter;
use nextword_core::engine::{EngineState, EngineType, PredictionEngine};
use nextword_core::model::LocalNgramBackend;
use nextword_core::pipeline::compose;
use nextword_core::session::{ContextWindow, PredictionSession};

/// Query parameters of `PUT /v1/context`
#[derive(Deserialize)]
struct WordQuery {
	word: Option<String>,
}

/// Query parameters of `GET /v1/predict`
#[derive(Deserialize)]
struct PredictQuery {
	count: Option<usize>,
	limit: Option<usize>,
}

#[derive(Serialize)]
struct EngineInfo {
	engine: EngineType,
	state: EngineState,
	last_error: Option<String>,
}

/// Everything the handlers share. Built once in `main`.
struct AppState {
	config: PipelineConfig,
	engines: Vec<Arc<dyn PredictionEngine>>,
	session: Mutex<ContextWindow>,
}

impl AppState {
	fn engine_infos(&self) -> Vec<EngineInfo> {
		self.engines
			.iter()
			.map(|e| EngineInfo {
				engine: e.engine_type(),
				state: e.state(),
				last_error: e.last_error(),
			})
			.collect()
	}
}

/// HTTP PUT endpoint `/v1/context?word=`
///
/// Records a committed word in the session.
#[put("/v1/context")]
async fn put_context(data: web::Data<AppState>, query: web::Query<WordQuery>) -> impl Responder {
	let word = match &query.word {
		Some(w) if !w.trim().is_empty() => w.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty word"),
	};

	let mut session = match data.session.lock() {
		Ok(s) => s,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	session.record_token(word);
	HttpResponse::Ok().json(session.context_tokens())
}

#[delete("/v1/context")]
async fn delete_context(data: web::Data<AppState>) -> impl Responder {
	match data.session.lock() {
		Ok(mut session) => {
			session.reset();
			HttpResponse::NoContent().finish()
		}
		Err(_) => HttpResponse::InternalServerError().body("Session lock failed"),
	}
}

#[get("/v1/context")]
async fn get_context(data: web::Data<AppState>) -> impl Responder {
	match data.session.lock() {
		Ok(session) => HttpResponse::Ok().json(session.context_tokens()),
		Err(_) => HttpResponse::InternalServerError().body("Session lock failed"),
	}
}

/// HTTP GET endpoint `/v1/predict`
///
/// Runs every engine in priority order on the current context and returns
/// the merged candidate list as JSON. `count` and `limit` default to the
/// configured values.
#[get("/v1/predict")]
async fn get_predict(data: web::Data<AppState>, query: web::Query<PredictQuery>) -> impl Responder {
	let desired_count = query.count.unwrap_or(data.config.desired_count);
	let limit = query.limit.unwrap_or(data.config.suggestion_limit);

	// Snapshot, so that engines run without holding the session
	let context = match data.session.lock() {
		Ok(session) => session.context_tokens(),
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};

	let app = data.clone();
	match web::block(move || compose(&app.engines, &context, desired_count, limit)).await {
		Ok(suggestions) => HttpResponse::Ok().json(suggestions),
		Err(e) => HttpResponse::InternalServerError().body(format!("Prediction failed: {e}")),
	}
}

#[get("/v1/engines")]
async fn get_engines(data: web::Data<AppState>) -> impl Responder {
	HttpResponse::Ok().json(data.engine_infos())
}

#[put("/v1/engines/activate")]
async fn put_activate(data: web::Data<AppState>) -> impl Responder {
	let app = data.clone();
	let activated = web::block(move || {
		for engine in &app.engines {
			if !engine.activate() {
				warn!("Engine {} did not activate: {:?}", engine.engine_type(), engine.last_error());
			}
		}
	})
	.await;

	match activated {
		Ok(()) => HttpResponse::Ok().json(data.engine_infos()),
		Err(e) => HttpResponse::InternalServerError().body(format!("Activation failed: {e}")),
	}
}

#[put("/v1/engines/deactivate")]
async fn put_deactivate(data: web::Data<AppState>) -> impl Responder {
	let app = data.clone();
	let deactivated = web::block(move || {
		for engine in &app.engines {
			engine.deactivate();
		}
	})
	.await;

	match deactivated {
		Ok(()) => HttpResponse::Ok().json(data.engine_infos()),
		Err(e) => HttpResponse::InternalServerError().body(format!("Deactivation failed: {e}")),
	}
}

/// Main entry point for the server.
///
/// Environment:
/// - `NEXTWORD_CONFIG`: pipeline configuration JSON (defaults otherwise)
/// - `NEXTWORD_NGRAM_MODEL`: corpus of the word n-gram engine (`./data/corpus.txt`)
/// - `NEXTWORD_BIND`: listen address (`127.0.0.1:5000`)
/// - `RUST_LOG`: log filter
#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init();

	let config = match env::var("NEXTWORD_CONFIG") {
		Ok(path) => PipelineConfig::load(&path)?,
		Err(_) => PipelineConfig::default(),
	};
	let ngram_model = env::var("NEXTWORD_NGRAM_MODEL").unwrap_or_else(|_| "./data/corpus.txt".to_owned());
	let bind = env::var("NEXTWORD_BIND").unwrap_or_else(|_| "127.0.0.1:5000".to_owned());

	let ngram = NgramAdapter::new(Box::new(LocalNgramBackend::new(config.ngram.max_order)), ngram_model);
	if !ngram.activate() {
		warn!("N-gram engine unavailable at startup: {:?}", ngram.last_error());
	}

	let state = web::Data::new(AppState {
		session: Mutex::new(ContextWindow::new(config.max_context_words)),
		engines: vec![Arc::new(ngram)],
		config,
	});

	info!("Listening on {bind}");
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(state.clone())
			.service(put_context)
			.service(delete_context)
			.service(get_context)
			.service(get_predict)
			.service(get_engines)
			.service(put_activate)
			.service(put_deactivate)
	})
		.bind(bind)?
		.run()
		.await?;
	Ok(())
}
