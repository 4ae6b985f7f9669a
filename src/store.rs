use rand::Rng;
use serde::Deserialize;
use serde_json::json;

use crate::config::KvConfig;
use crate::types::session::{ClassId, NewSession, Session};

use handle_errors::{Error, UpstreamError};

const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Sessions live in an external key-value store behind a REST endpoint.
/// Commands are posted as JSON arrays and authorized with a bearer token;
/// the store either answers `{"result": ...}` or `{"error": "..."}`.
#[derive(Debug, Clone)]
pub struct Store {
    client: reqwest::Client,
    config: Option<KvConfig>,
}

#[derive(Deserialize, Debug)]
struct KvReply {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

impl Store {
    pub fn new(config: Option<KvConfig>) -> Self {
        Store {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn generate_class_code() -> ClassId {
        let mut rng = rand::thread_rng();
        let mut group = || -> String {
            (0..4)
                .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
                .collect()
        };
        let code = format!("{}-{}", group(), group());
        ClassId(code)
    }

    fn key(class_id: &ClassId) -> String {
        format!("session:{}", class_id.0)
    }

    async fn command(&self, command: serde_json::Value) -> Result<serde_json::Value, Error> {
        let config = self
            .config
            .as_ref()
            .ok_or(Error::MissingConfig("KV_REST_URL / KV_REST_TOKEN"))?;

        let res = self
            .client
            .post(&config.url)
            .bearer_auth(&config.token)
            .json(&command)
            .send()
            .await
            .map_err(Error::ReqwestAPIError)?;

        if !res.status().is_success() {
            let err = UpstreamError::from_response(res).await;
            tracing::event!(tracing::Level::ERROR, "{}", err);
            if err.status < 500 {
                return Err(Error::ClientError(err));
            }
            return Err(Error::ServerError(err));
        }

        match res.json::<KvReply>().await {
            Ok(KvReply {
                error: Some(error), ..
            }) => {
                tracing::event!(tracing::Level::ERROR, "{}", error);
                Err(Error::KvError(error))
            }
            Ok(KvReply { result, .. }) => Ok(result.unwrap_or(serde_json::Value::Null)),
            Err(e) => {
                tracing::event!(tracing::Level::ERROR, "{:?}", e);
                Err(Error::ReqwestAPIError(e))
            }
        }
    }

    pub async fn create_session(&self, new_session: NewSession) -> Result<Session, Error> {
        let session = Session::open(Self::generate_class_code(), new_session);
        self.put_session(&session).await?;
        Ok(session)
    }

    pub async fn get_session(&self, class_id: &ClassId) -> Result<Session, Error> {
        let result = self.command(json!(["GET", Self::key(class_id)])).await?;
        let raw = match result.as_str() {
            Some(raw) => raw,
            None => return Err(Error::SessionNotFound),
        };
        serde_json::from_str(raw).map_err(|e| {
            tracing::event!(tracing::Level::ERROR, "{:?}", e);
            Error::KvError(format!("stored session is not valid JSON: {}", e))
        })
    }

    pub async fn put_session(&self, session: &Session) -> Result<(), Error> {
        let payload =
            serde_json::to_string(session).map_err(|e| Error::KvError(e.to_string()))?;
        self.command(json!(["SET", Self::key(&session.class_id), payload]))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_codes_are_two_uppercase_alphanumeric_groups() {
        for _ in 0..100 {
            let ClassId(code) = Store::generate_class_code();
            let parts: Vec<&str> = code.split('-').collect();
            assert_eq!(parts.len(), 2, "bad code: {}", code);
            for part in parts {
                assert_eq!(part.len(), 4, "bad code: {}", code);
                assert!(
                    part.chars()
                        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
                    "bad code: {}",
                    code
                );
            }
        }
    }

    #[test]
    fn session_keys_are_namespaced() {
        let class_id = ClassId("AAAA-BBBB".to_string());
        assert_eq!(Store::key(&class_id), "session:AAAA-BBBB");
    }

    #[tokio::test]
    async fn missing_kv_config_fails_the_request() {
        let store = Store::new(None);
        let class_id = ClassId("AAAA-BBBB".to_string());
        match store.get_session(&class_id).await {
            Err(Error::MissingConfig(_)) => {}
            other => panic!("expected MissingConfig, got {:?}", other),
        }
    }
}
