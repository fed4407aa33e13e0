use std::collections::HashMap;

use serde::Serialize;
use serde_json::json;

/// A single stored response. The wire payload is untyped on the backend side,
/// so each variant serializes to the exact shape the Quiz Service expects.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// multipleChoice: selected option indices.
    Selections(Vec<usize>),
    /// singleAnswer: the selected option index. `0` is a valid answer.
    Choice(usize),
    /// shortAnswer / longAnswer.
    Text(String),
    /// matchTheFollowing: stored under `{questionId}_{leftIndex}`, the value
    /// is the matched right-column index.
    MatchPair(usize),
    /// codeSolve.
    Code { code: String, language: String },
}

/// Per-attempt response store, keyed by question id (or
/// `{questionId}_{leftIndex}` for match pairs). An entry is absent until the
/// user interacts with the question; absence is distinct from an empty value.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct AnswerStore {
    entries: HashMap<String, AnswerValue>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key under which a match pairing for `left_index` is stored.
    pub fn match_key(question_id: &str, left_index: usize) -> String {
        format!("{question_id}_{left_index}")
    }

    pub fn get(&self, key: &str) -> Option<&AnswerValue> {
        self.entries.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Toggle one option of a multiple-choice question. The entry stays
    /// present (as an empty selection) when the last option is deselected.
    pub fn toggle_selection(&mut self, question_id: &str, option_index: usize) {
        let entry = self
            .entries
            .entry(question_id.to_string())
            .or_insert_with(|| AnswerValue::Selections(Vec::new()));
        match entry {
            AnswerValue::Selections(selected) => {
                if let Some(pos) = selected.iter().position(|&i| i == option_index) {
                    selected.remove(pos);
                } else {
                    selected.push(option_index);
                }
            }
            // A different shape under this id means the question type changed
            // on retake; start over.
            other => *other = AnswerValue::Selections(vec![option_index]),
        }
    }

    pub fn set_choice(&mut self, question_id: &str, option_index: usize) {
        self.entries
            .insert(question_id.to_string(), AnswerValue::Choice(option_index));
    }

    pub fn set_text(&mut self, question_id: &str, text: impl Into<String>) {
        self.entries
            .insert(question_id.to_string(), AnswerValue::Text(text.into()));
    }

    pub fn set_code(
        &mut self,
        question_id: &str,
        code: impl Into<String>,
        language: impl Into<String>,
    ) {
        self.entries.insert(
            question_id.to_string(),
            AnswerValue::Code {
                code: code.into(),
                language: language.into(),
            },
        );
    }

    /// Create the pairing `left_index → right_index`, or remove it when that
    /// exact pairing already exists. Returns whether the pairing is present
    /// afterwards.
    pub fn toggle_match(
        &mut self,
        question_id: &str,
        left_index: usize,
        right_index: usize,
    ) -> bool {
        let key = Self::match_key(question_id, left_index);
        if self.entries.get(&key) == Some(&AnswerValue::MatchPair(right_index)) {
            self.entries.remove(&key);
            false
        } else {
            self.entries.insert(key, AnswerValue::MatchPair(right_index));
            true
        }
    }

    pub fn matched_right(&self, question_id: &str, left_index: usize) -> Option<usize> {
        match self.entries.get(&Self::match_key(question_id, left_index)) {
            Some(AnswerValue::MatchPair(right)) => Some(*right),
            _ => None,
        }
    }

    /// Wire payload for `POST /quiz/submit`.
    pub fn to_payload(&self) -> serde_json::Map<String, serde_json::Value> {
        self.entries
            .iter()
            .map(|(key, value)| {
                let json = match value {
                    AnswerValue::Selections(selected) => json!(selected),
                    AnswerValue::Choice(index) => json!(index),
                    AnswerValue::Text(text) => json!(text),
                    AnswerValue::MatchPair(right) => json!(right),
                    AnswerValue::Code { code, language } => json!({
                        "code": code,
                        "language": language,
                    }),
                };
                (key.clone(), json)
            })
            .collect()
    }
}
