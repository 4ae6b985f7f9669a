use serde::Serialize;
use tracing::{Level, event, instrument};

use crate::config::LlmConfig;
use crate::llm;
use crate::types::question::{GenerateRequest, QuestionItem};

use handle_errors::Error;

#[derive(Serialize, Debug)]
struct GenerateReply {
    ok: bool,
    items: Vec<QuestionItem>,
}

#[instrument(skip(config))]
pub async fn generate_questions(
    config: Option<LlmConfig>,
    request: GenerateRequest,
) -> Result<impl warp::Reply, warp::Rejection> {
    event!(target: "classtalk", Level::INFO, topic = %request.topic, level = %request.level, "generating questions");

    let config = match config {
        Some(config) => config,
        None => return Err(warp::reject::custom(Error::MissingConfig("OPENAI_API_KEY"))),
    };

    match llm::draft_questions(&config, &request).await {
        Ok(items) => Ok(warp::reply::json(&GenerateReply { ok: true, items })),
        Err(e) => Err(warp::reject::custom(e)),
    }
}
