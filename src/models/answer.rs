use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Sentinel for "not yet answered"; never scores as correct.
pub const UNANSWERED: i32 = -1;

/// A single answer entry. On the wire each entry is the independent JSON
/// triple `[question_index, selected_option, marked_for_review]`, so a
/// malformed entry can be skipped without invalidating the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AnswerWire", into = "AnswerWire")]
pub struct Answer {
    pub question_index: u32,
    pub selected_option: i32,
    pub marked_for_review: bool,
}

type AnswerWire = (u32, i32, bool);

impl From<AnswerWire> for Answer {
    fn from((question_index, selected_option, marked_for_review): AnswerWire) -> Self {
        Self {
            question_index,
            selected_option,
            marked_for_review,
        }
    }
}

impl From<Answer> for AnswerWire {
    fn from(a: Answer) -> Self {
        (a.question_index, a.selected_option, a.marked_for_review)
    }
}

impl Answer {
    pub fn is_answered(&self) -> bool {
        self.selected_option >= 0
    }
}

/// Decodes a stored answer payload, skipping entries that fail to decode.
/// Stored data may predate or postdate schema changes; a bad entry is
/// logged and dropped, never an error. The result is sorted by index.
pub fn decode_answers(payload: &JsonValue) -> Vec<Answer> {
    let entries = match payload.as_array() {
        Some(entries) => entries,
        None => {
            if !payload.is_null() {
                tracing::warn!("answer payload is not an array, treating as empty");
            }
            return Vec::new();
        }
    };

    let mut answers: Vec<Answer> = entries
        .iter()
        .filter_map(|entry| match serde_json::from_value(entry.clone()) {
            Ok(answer) => Some(answer),
            Err(err) => {
                tracing::warn!(error = %err, "skipping undecodable answer entry");
                None
            }
        })
        .collect();

    answers.sort_by_key(|a| a.question_index);
    answers.dedup_by_key(|a| a.question_index);
    answers
}

/// Encodes answers as a JSON array of triples, sorted by question index
/// for deterministic persistence.
pub fn encode_answers(answers: &[Answer]) -> JsonValue {
    let mut sorted = answers.to_vec();
    sorted.sort_by_key(|a| a.question_index);
    serde_json::to_value(sorted).unwrap_or_else(|_| JsonValue::Array(Vec::new()))
}

/// Replace-by-index upsert: at most one entry per question index survives,
/// with later submissions winning. The result is re-sorted by index.
pub fn merge_answers(existing: Vec<Answer>, incoming: &[Answer]) -> Vec<Answer> {
    let mut merged = existing;
    for answer in incoming {
        match merged
            .iter_mut()
            .find(|a| a.question_index == answer.question_index)
        {
            Some(slot) => *slot = *answer,
            None => merged.push(*answer),
        }
    }
    merged.sort_by_key(|a| a.question_index);
    merged
}
