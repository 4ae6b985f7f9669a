use clap::Parser;

/// Server settings taken from the command line. Provider credentials come
/// from the environment instead, so a handler whose provider is not
/// configured fails that request rather than preventing startup.
#[derive(Parser, Debug, Clone)]
#[clap(about = "Classroom discussion question service")]
pub struct Args {
    /// Which errors we want to log (info, warn or error)
    #[clap(short, long, default_value = "warn")]
    pub log_level: String,
    /// Port the server is listening on
    #[clap(short, long, default_value = "3030")]
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
}

impl LlmConfig {
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok()?;
        Some(LlmConfig {
            api_key,
            api_base: std::env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct KvConfig {
    pub url: String,
    pub token: String,
}

impl KvConfig {
    pub fn from_env() -> Option<Self> {
        Some(KvConfig {
            url: std::env::var("KV_REST_URL").ok()?,
            token: std::env::var("KV_REST_TOKEN").ok()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub api_key: String,
    pub region: String,
}

impl SpeechConfig {
    pub fn from_env() -> Option<Self> {
        Some(SpeechConfig {
            api_key: std::env::var("SPEECH_API_KEY").ok()?,
            region: std::env::var("SPEECH_REGION").ok()?,
        })
    }
}
