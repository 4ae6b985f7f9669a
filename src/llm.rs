use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::types::question::{GenerateRequest, QuestionItem};

use handle_errors::{Error, UpstreamError};

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// What the model is asked to return as JSON.
#[derive(Deserialize, Debug)]
struct ItemsPayload {
    #[serde(default)]
    items: Vec<QuestionItem>,
}

/// Asks the language model for a batch of discussion questions and
/// post-filters the result. One attempt only; a failure is the caller's
/// problem to report, not ours to retry.
pub async fn draft_questions(
    config: &LlmConfig,
    request: &GenerateRequest,
) -> Result<Vec<QuestionItem>, Error> {
    let count = request.clamped_count();
    let prompt = build_prompt(request, count);

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/v1/chat/completions", config.api_base))
        .bearer_auth(&config.api_key)
        .json(&ChatRequest {
            model: &config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            temperature: 0.7,
        })
        .send()
        .await
        .map_err(Error::ReqwestAPIError)?;

    if !res.status().is_success() {
        if res.status().is_client_error() {
            let err = UpstreamError::from_response(res).await;
            return Err(Error::ClientError(err));
        } else {
            let err = UpstreamError::from_response(res).await;
            return Err(Error::ServerError(err));
        }
    }

    let body = res
        .json::<ChatResponse>()
        .await
        .map_err(Error::ReqwestAPIError)?;
    let raw = body
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();

    let parsed: ItemsPayload = match serde_json::from_str(&raw) {
        Ok(parsed) => parsed,
        Err(_) => return Err(Error::InvalidModelResponse { raw }),
    };

    let items = usable_items(parsed.items, count);
    if items.is_empty() {
        return Err(Error::EmptyGeneration { raw });
    }
    Ok(items)
}

fn usable_items(items: Vec<QuestionItem>, count: usize) -> Vec<QuestionItem> {
    items
        .into_iter()
        .filter(QuestionItem::is_well_formed)
        .take(count)
        .collect()
}

fn build_prompt(request: &GenerateRequest, count: usize) -> String {
    let mut prompt = format!(
        "You are an English teacher.\n\
         Generate {} discussion questions for ESL students.\n\
         \n\
         Topic: {}\n\
         Level: {}\n\
         \n\
         {}\n",
        count,
        request.topic,
        request.level,
        hint_policy(&request.level),
    );

    if let Some(instruction) = non_empty(&request.teacher_instruction) {
        prompt.push_str(&format!("Teacher instruction: {}\n", instruction));
    }
    if let Some(avoid) = non_empty(&request.avoid) {
        prompt.push_str(&format!("Avoid these topics entirely: {}\n", avoid));
    }
    if let Some(pattern) = non_empty(&request.rule_pattern) {
        prompt.push_str(&format!(
            "Every question must follow the pattern \"{}\"",
            pattern
        ));
        if let Some(items) = non_empty(&request.rule_items) {
            prompt.push_str(&format!(", filling the blank with one of: {}", items));
        }
        prompt.push_str(".\n");
    }

    prompt.push_str(
        "\nReturn JSON only in this format:\n\
         {\n  \"items\": [\n    { \"text\": \"...\", \"hint\": \"...\", \"grammarTag\": \"...\" }\n  ]\n}\n",
    );
    prompt
}

/// Beginner classes get a hint their students can decode without help;
/// intermediate classes get material to keep the conversation going.
fn hint_policy(level: &str) -> &'static str {
    let level = level.trim().to_ascii_uppercase();
    if level.starts_with("A1") || level.starts_with("A2") {
        "For each question, write a three-line hint: a translation of the \
         question into the students' native language, a short English \
         definition of the key phrase, and the translation again. Keep the \
         English line short and easy to read aloud."
    } else if level.starts_with("B1") || level.starts_with("B2") {
        "For each question, write a hint that paraphrases the question in \
         simpler English and adds one or two related follow-up questions."
    } else {
        "For each question, write a short hint that helps a student start \
         their answer."
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(level: &str) -> GenerateRequest {
        GenerateRequest {
            topic: "travel".to_string(),
            level: level.to_string(),
            count: None,
            teacher_instruction: None,
            avoid: None,
            rule_pattern: None,
            rule_items: None,
        }
    }

    fn item(text: &str) -> QuestionItem {
        QuestionItem {
            text: text.to_string(),
            hint: None,
            grammar_tag: None,
        }
    }

    #[test]
    fn filter_drops_malformed_items_and_truncates() {
        let items = vec![
            item("Do you like apples?"),
            item("not a question"),
            item("Why?"),
            item("Where do you live?"),
            item("What did you eat today?"),
        ];
        let usable = usable_items(items, 2);
        assert_eq!(usable.len(), 2);
        assert_eq!(usable[0].text, "Do you like apples?");
        assert_eq!(usable[1].text, "Where do you live?");
    }

    #[test]
    fn filter_can_come_up_empty() {
        let items = vec![item("nope"), item("")];
        assert!(usable_items(items, 5).is_empty());
    }

    #[test]
    fn beginner_levels_ask_for_three_line_hints() {
        let prompt = build_prompt(&request("A2"), 5);
        assert!(prompt.contains("three-line hint"));
        assert!(prompt.contains("Topic: travel"));
        assert!(prompt.contains("Generate 5 discussion questions"));
    }

    #[test]
    fn intermediate_levels_ask_for_paraphrase_and_follow_ups() {
        let prompt = build_prompt(&request("b1"), 3);
        assert!(prompt.contains("paraphrases the question"));
        assert!(prompt.contains("follow-up questions"));
    }

    #[test]
    fn unknown_levels_get_the_generic_hint_instruction() {
        let prompt = build_prompt(&request("C2"), 3);
        assert!(prompt.contains("helps a student start"));
    }

    #[test]
    fn optional_fields_appear_only_when_given() {
        let mut req = request("A1");
        let bare = build_prompt(&req, 5);
        assert!(!bare.contains("Teacher instruction"));
        assert!(!bare.contains("Avoid these topics"));
        assert!(!bare.contains("pattern"));

        req.teacher_instruction = Some("Use food vocabulary".to_string());
        req.avoid = Some("politics, religion".to_string());
        req.rule_pattern = Some("Do you like ___?".to_string());
        req.rule_items = Some("apples, soccer, rain".to_string());
        let full = build_prompt(&req, 5);
        assert!(full.contains("Teacher instruction: Use food vocabulary"));
        assert!(full.contains("Avoid these topics entirely: politics, religion"));
        assert!(full.contains("follow the pattern \"Do you like ___?\""));
        assert!(full.contains("filling the blank with one of: apples, soccer, rain"));
    }

    #[test]
    fn model_payload_parses_the_documented_shape() {
        let raw = r#"{"items":[{"text":"Do you like apples?","hint":"h","grammarTag":"present simple"}]}"#;
        let parsed: ItemsPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].grammar_tag.as_deref(), Some("present simple"));
    }
}
