use crate::config::SpeechConfig;

use handle_errors::{Error, UpstreamError};

pub const DEFAULT_VOICE: &str = "en-US-JennyNeural";

const OUTPUT_FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";

/// Sends the text to the regional speech-synthesis endpoint and returns the
/// MP3 bytes as-is. No caching and no voice validation; a bad voice id is
/// the provider's error to report.
pub async fn synthesize(
    config: &SpeechConfig,
    text: &str,
    voice: &str,
    rate: Option<&str>,
) -> Result<Vec<u8>, Error> {
    let ssml = build_ssml(text, voice, rate);

    let client = reqwest::Client::new();
    let res = client
        .post(format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            config.region
        ))
        .header("Ocp-Apim-Subscription-Key", &config.api_key)
        .header("Content-Type", "application/ssml+xml")
        .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
        .body(ssml)
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

    res.bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(Error::ReqwestAPIError)
}

fn build_ssml(text: &str, voice: &str, rate: Option<&str>) -> String {
    let escaped = escape_xml(text);
    let inner = match rate {
        Some(rate) => format!(
            "<prosody rate=\"{}\">{}</prosody>",
            escape_xml(rate),
            escaped
        ),
        None => escaped,
    };
    format!(
        "<speak version=\"1.0\" xml:lang=\"en-US\"><voice name=\"{}\">{}</voice></speak>",
        escape_xml(voice),
        inner
    )
}

/// The five characters that would break out of the markup payload.
fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_xml(r#"Tom & Jerry say "1 < 2" & '3 > 2'"#),
            "Tom &amp; Jerry say &quot;1 &lt; 2&quot; &amp; &apos;3 &gt; 2&apos;"
        );
        assert_eq!(escape_xml("plain text"), "plain text");
    }

    #[test]
    fn ssml_embeds_voice_and_escaped_text() {
        let ssml = build_ssml("Do you like <tags>?", DEFAULT_VOICE, None);
        assert!(ssml.contains("<voice name=\"en-US-JennyNeural\">"));
        assert!(ssml.contains("Do you like &lt;tags&gt;?"));
        assert!(!ssml.contains("<tags>"));
        assert!(!ssml.contains("prosody"));
    }

    #[test]
    fn rate_wraps_the_text_in_prosody() {
        let ssml = build_ssml("Hello there?", DEFAULT_VOICE, Some("-20%"));
        assert!(ssml.contains("<prosody rate=\"-20%\">Hello there?</prosody>"));
    }
}
