#![warn(clippy::all)]

use clap::Parser;
use handle_errors::return_error;
use tracing_subscriber::fmt::format::FmtSpan;
use warp::{Filter, http::Method};

mod config;
mod llm;
mod routes;
mod store;
mod tts;
mod types;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = config::Args::parse();

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        format!(
            "handle_errors={},classtalk={},warp={}",
            args.log_level, args.log_level, args.log_level
        )
    });

    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let store = store::Store::new(config::KvConfig::from_env());
    let store_filter = warp::any().map(move || store.clone());

    let llm_config = config::LlmConfig::from_env();
    let llm_filter = warp::any().map(move || llm_config.clone());

    let speech_config = config::SpeechConfig::from_env();
    let speech_filter = warp::any().map(move || speech_config.clone());

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("Content-Type")
        .allow_methods(&[Method::PUT, Method::DELETE, Method::POST, Method::GET]);

    let generate_questions = warp::post()
        .and(warp::path("api"))
        .and(warp::path("generate-questions"))
        .and(warp::path::end())
        .and(llm_filter)
        .and(warp::body::json())
        .and_then(routes::generate::generate_questions)
        .with(warp::trace(|info| {
            tracing::info_span!(
                "generate_questions request",
                method = %info.method(),
                path = %info.path(),
                id = %uuid::Uuid::new_v4(),
            )
        }));

    let create_session = warp::post()
        .and(warp::path("api"))
        .and(warp::path("session"))
        .and(warp::path::end())
        .and(store_filter.clone())
        .and(warp::body::json())
        .and_then(routes::session::create_session);

    let get_session = warp::get()
        .and(warp::path("api"))
        .and(warp::path("session"))
        .and(warp::path::end())
        .and(warp::query())
        .and(store_filter.clone())
        .and_then(routes::session::get_session);

    let update_session = warp::put()
        .and(warp::path("api"))
        .and(warp::path("session"))
        .and(warp::path::end())
        .and(warp::query())
        .and(store_filter.clone())
        .and(warp::body::json())
        .and_then(routes::session::update_session);

    let student_question = warp::get()
        .and(warp::path("api"))
        .and(warp::path("session"))
        .and(warp::path("question"))
        .and(warp::path::end())
        .and(warp::query())
        .and(store_filter.clone())
        .and_then(routes::session::student_question);

    let speak = warp::post()
        .and(warp::path("api"))
        .and(warp::path("tts"))
        .and(warp::path::end())
        .and(speech_filter)
        .and(warp::body::json())
        .and_then(routes::tts::speak);

    let routes = generate_questions
        .or(student_question)
        .or(get_session)
        .or(create_session)
        .or(update_session)
        .or(speak)
        .with(cors)
        .with(warp::trace::request())
        .recover(return_error);

    warp::serve(routes).run(([127, 0, 0, 1], args.port)).await;
}
