use serde::Deserialize;
use tracing::{Level, event, instrument};
use warp::http::Response;

use crate::config::SpeechConfig;
use crate::tts;

use handle_errors::Error;

#[derive(Deserialize, Debug, Clone)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub rate: Option<String>,
}

#[instrument(skip(config))]
pub async fn speak(
    config: Option<SpeechConfig>,
    request: TtsRequest,
) -> Result<impl warp::Reply, warp::Rejection> {
    let config = match config {
        Some(config) => config,
        None => {
            return Err(warp::reject::custom(Error::MissingConfig(
                "SPEECH_API_KEY / SPEECH_REGION",
            )));
        }
    };

    if request.text.trim().is_empty() {
        return Err(warp::reject::custom(Error::MissingParameters("text")));
    }

    let voice = request.voice.as_deref().unwrap_or(tts::DEFAULT_VOICE);
    event!(target: "classtalk", Level::INFO, voice = %voice, "synthesizing speech");

    match tts::synthesize(&config, &request.text, voice, request.rate.as_deref()).await {
        Ok(audio) => match Response::builder()
            .header("Content-Type", "audio/mpeg")
            .body(audio)
        {
            Ok(response) => Ok(response),
            Err(_) => Err(warp::reject::reject()),
        },
        Err(e) => Err(warp::reject::custom(e)),
    }
}
