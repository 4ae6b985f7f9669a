use serde::Serialize;
use warp::{
    Rejection, Reply,
    filters::{body::BodyDeserializeError, cors::CorsForbidden},
    http::StatusCode,
    reject::Reject,
};

use reqwest::Error as ReqwestError;
use tracing::{Level, event, instrument};

#[derive(Debug)]
pub enum Error {
    ParseError(std::num::ParseIntError),
    MissingParameters(&'static str),
    MissingConfig(&'static str),
    SessionNotFound,
    NoQuestions,
    KvError(String),
    InvalidModelResponse { raw: String },
    EmptyGeneration { raw: String },
    ReqwestAPIError(ReqwestError),
    ClientError(UpstreamError),
    ServerError(UpstreamError),
}

/// A non-success reply from one of the external providers, kept around so the
/// provider's status and body can be echoed back to the caller.
#[derive(Debug, Clone)]
pub struct UpstreamError {
    pub status: u16,
    pub message: String,
}

impl UpstreamError {
    pub async fn from_response(res: reqwest::Response) -> Self {
        UpstreamError {
            status: res.status().as_u16(),
            message: res.text().await.unwrap_or_default(),
        }
    }
}

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Status: {}, Message: {}", self.status, self.message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &*self {
            Error::ParseError(err) => {
                write!(f, "Cannot parse parameter: {}", err)
            }
            Error::MissingParameters(name) => {
                write!(f, "Missing {}", name)
            }
            Error::MissingConfig(vars) => {
                write!(f, "Missing configuration: {}", vars)
            }
            Error::SessionNotFound => {
                write!(f, "Not found")
            }
            Error::NoQuestions => {
                write!(f, "Session has no questions")
            }
            Error::KvError(err) => {
                write!(f, "Key-value store error: {}", err)
            }
            Error::InvalidModelResponse { .. } => {
                write!(f, "AI returned invalid JSON")
            }
            Error::EmptyGeneration { .. } => {
                write!(f, "AI returned no usable questions")
            }
            Error::ReqwestAPIError(err) => {
                write!(f, "External API error: {}", err)
            }
            Error::ClientError(err) => {
                write!(f, "External Client error: {}", err)
            }
            Error::ServerError(err) => {
                write!(f, "External Server error: {}", err)
            }
        }
    }
}

impl Reject for Error {}
impl Reject for UpstreamError {}

/// Every error leaves the service in the same JSON shape. `raw` carries the
/// unparsed model output when a generation request failed on it.
#[derive(Serialize, Debug)]
struct ErrorBody {
    ok: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw: Option<String>,
}

fn error_body(status: StatusCode, error: String, raw: Option<String>) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody {
            ok: false,
            error,
            raw,
        }),
        status,
    ))
}

#[instrument]
pub async fn return_error(r: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(error) = r.find::<Error>() {
        event!(Level::ERROR, "{}", error);
        let status = match error {
            Error::ParseError(_) | Error::MissingParameters(_) => StatusCode::BAD_REQUEST,
            Error::SessionNotFound | Error::NoQuestions => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let raw = match error {
            Error::InvalidModelResponse { raw } | Error::EmptyGeneration { raw } => {
                Some(raw.clone())
            }
            _ => None,
        };
        error_body(status, error.to_string(), raw)
    } else if let Some(error) = r.find::<CorsForbidden>() {
        event!(Level::ERROR, "CORS forbidden error: {}", error);
        error_body(StatusCode::FORBIDDEN, error.to_string(), None)
    } else if let Some(error) = r.find::<BodyDeserializeError>() {
        event!(Level::ERROR, "Cannot deserialize request body: {}", error);
        error_body(StatusCode::BAD_REQUEST, error.to_string(), None)
    } else {
        event!(Level::WARN, "Requested route was not found");
        error_body(StatusCode::NOT_FOUND, "Route not found".to_string(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn status_for(error: Error) -> StatusCode {
        let rejection = warp::reject::custom(error);
        let reply = return_error(rejection).await.expect("recovery always replies");
        reply.into_response().status()
    }

    #[tokio::test]
    async fn missing_parameters_is_bad_request() {
        assert_eq!(
            status_for(Error::MissingParameters("classId")).await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        assert_eq!(status_for(Error::SessionNotFound).await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_config_is_internal_error() {
        assert_eq!(
            status_for(Error::MissingConfig("OPENAI_API_KEY")).await,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn parse_failure_echoes_raw_model_output() {
        let rejection = warp::reject::custom(Error::InvalidModelResponse {
            raw: "not json".to_string(),
        });
        let reply = return_error(rejection).await.expect("recovery always replies");
        let response = reply.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = warp::hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["ok"], false);
        assert_eq!(body["raw"], "not json");
    }
}
