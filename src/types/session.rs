use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::question::QuestionItem;

/// The short code a teacher hands out so students can find the session,
/// e.g. `Q7KM-30XA`.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, Hash, PartialEq)]
pub struct ClassId(pub String);

/// The persisted record of one class: its settings, how many students have
/// joined, and the current question set. Stored as a single JSON blob in the
/// key-value store, so every update rewrites the whole session.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub class_id: ClassId,
    pub topic: String,
    pub class_size: u32,
    pub count: u32,
    pub created_at: i64,
    pub students_joined: u32,
    pub questions: Vec<QuestionItem>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default)]
    pub class_size: u32,
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_topic() -> String {
    "general".to_string()
}

fn default_count() -> u32 {
    5
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    #[serde(default)]
    pub questions: Option<Vec<QuestionItem>>,
    #[serde(default)]
    pub increment_joined: bool,
}

impl Session {
    pub fn open(class_id: ClassId, new_session: NewSession) -> Self {
        Session {
            class_id,
            topic: new_session.topic,
            class_size: new_session.class_size,
            count: new_session.count,
            created_at: Utc::now().timestamp_millis(),
            students_joined: 0,
            questions: Vec::new(),
        }
    }

    /// Applies a teacher edit or a student join. Replacing the question list
    /// and incrementing the join counter are the only mutations a session
    /// ever sees; topic, size, and count are fixed at creation.
    pub fn apply(&mut self, update: SessionUpdate) {
        if let Some(questions) = update.questions {
            self.questions = questions;
        }
        if update.increment_joined {
            self.students_joined += 1;
        }
    }

    /// Student n is assigned question (n - 1) mod k, so numbers past the end
    /// of the list wrap around and every student gets a question.
    pub fn question_for_student(&self, student: u32) -> Option<&QuestionItem> {
        if self.questions.is_empty() {
            return None;
        }
        let index = (student.saturating_sub(1) as usize) % self.questions.len();
        self.questions.get(index)
    }
}
