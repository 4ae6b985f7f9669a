use serde::{Deserialize, Serialize};

/// One discussion question as it is generated, edited, and stored. The hint
/// may be a single free-text line or the three-line form (translation,
/// English definition, translation) used for beginner levels.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QuestionItem {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(rename = "grammarTag", default)]
    pub grammar_tag: Option<String>,
}

impl QuestionItem {
    /// A usable question is non-empty, ends with a question mark, and has at
    /// least two words. Anything else from the model is discarded.
    pub fn is_well_formed(&self) -> bool {
        let text = self.text.trim();
        text.ends_with('?') && text.split_whitespace().count() >= 2
    }

    /// The line of the hint that should be read aloud to the student.
    pub fn hint_speech(&self) -> Option<String> {
        self.hint.as_deref().and_then(spoken_hint)
    }
}

/// Picks the English line out of a hint. Multi-line hints follow the
/// translation / definition / translation convention, so the second line is
/// the spoken one. Single-line hints may still use the older
/// "English / translation" form, in which case the segment before the slash
/// is spoken.
pub fn spoken_hint(hint: &str) -> Option<String> {
    let lines: Vec<&str> = hint
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let line = match lines.len() {
        0 => return None,
        1 => {
            let only = lines[0];
            match only.split_once('/') {
                Some((english, _)) => english,
                None => only,
            }
        }
        _ => lines[1],
    };

    let line = line.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct GenerateRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(rename = "teacherInstruction", default)]
    pub teacher_instruction: Option<String>,
    #[serde(default)]
    pub avoid: Option<String>,
    #[serde(rename = "rulePattern", default)]
    pub rule_pattern: Option<String>,
    #[serde(rename = "ruleItems", default)]
    pub rule_items: Option<String>,
}

impl GenerateRequest {
    /// Requested question count, clamped to what a class period can use.
    pub fn clamped_count(&self) -> usize {
        self.count.unwrap_or(5).clamp(1, 10) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(text: &str) -> QuestionItem {
        QuestionItem {
            text: text.to_string(),
            hint: None,
            grammar_tag: None,
        }
    }

    #[test]
    fn well_formed_needs_question_mark_and_two_words() {
        assert!(item("Do you like apples?").is_well_formed());
        assert!(!item("").is_well_formed());
        assert!(!item("Why?").is_well_formed());
        assert!(!item("Tell me about your hobbies").is_well_formed());
    }

    #[test]
    fn count_is_clamped_between_one_and_ten() {
        let mut request = GenerateRequest {
            topic: String::new(),
            level: String::new(),
            count: None,
            teacher_instruction: None,
            avoid: None,
            rule_pattern: None,
            rule_items: None,
        };
        assert_eq!(request.clamped_count(), 5);
        request.count = Some(0);
        assert_eq!(request.clamped_count(), 1);
        request.count = Some(99);
        assert_eq!(request.clamped_count(), 10);
        request.count = Some(7);
        assert_eq!(request.clamped_count(), 7);
    }

    #[test]
    fn three_line_hint_speaks_the_second_line() {
        let hint = "りんごは好きですか\nThis asks about liking apples.\nりんごは好きですか";
        assert_eq!(
            spoken_hint(hint).as_deref(),
            Some("This asks about liking apples.")
        );
    }

    #[test]
    fn legacy_slash_hint_speaks_the_part_before_the_slash() {
        assert_eq!(
            spoken_hint("Do you enjoy it? / 楽しいですか").as_deref(),
            Some("Do you enjoy it?")
        );
    }

    #[test]
    fn plain_hint_is_spoken_as_is() {
        assert_eq!(
            spoken_hint("Think about your last holiday.").as_deref(),
            Some("Think about your last holiday.")
        );
        assert_eq!(spoken_hint("   "), None);
    }
}
