use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Attempts at or above this percentage pass the quiz.
pub const PASSING_PERCENT: f64 = 60.0;

/// Fallback attempt length when a quiz carries no time limit.
pub const DEFAULT_TIME_LIMIT_S: u64 = 600;

pub const SHORT_ANSWER_MAX_LEN: usize = 200;
pub const LONG_ANSWER_MAX_LEN: usize = 1000;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<Question>,
    /// Attempt length in seconds. `0`/absent means "use the default".
    #[serde(default)]
    pub time_limit: u64,
}

impl Quiz {
    pub fn effective_time_limit(&self) -> u64 {
        if self.time_limit == 0 {
            DEFAULT_TIME_LIMIT_S
        } else {
            self.time_limit
        }
    }

    /// Validate Quiz:
    /// - every question has non-empty text
    /// - `marks` is a positive integer
    /// - choice questions carry at least one option
    /// - match questions have equally long left and right columns
    pub fn validate(&self) -> Result<(), Error> {
        for question in &self.questions {
            if question.text.trim().is_empty() {
                return Err(Error::InvalidQuiz(format!(
                    "Question {} has empty text",
                    question.id
                )));
            }
            if question.marks == 0 {
                return Err(Error::InvalidQuiz(format!(
                    "Question {} has zero marks",
                    question.id
                )));
            }
            match question.question_type {
                QuestionType::MultipleChoice | QuestionType::SingleAnswer => {
                    if question.options.is_empty() {
                        return Err(Error::InvalidQuiz(format!(
                            "Choice question {} has no options",
                            question.id
                        )));
                    }
                }
                QuestionType::MatchTheFollowing => {
                    if question.options.len() != question.answers.len() {
                        return Err(Error::InvalidQuiz(format!(
                            "Match question {} has {} left items but {} right items",
                            question.id,
                            question.options.len(),
                            question.answers.len()
                        )));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub marks: u32,
    #[serde(default)]
    pub required: bool,
    /// Choice options, or the left column of a match question.
    #[serde(default)]
    pub options: Vec<String>,
    /// Right column of a match question.
    #[serde(default)]
    pub answers: Vec<String>,
    /// Programming language for code questions; `"open"` allows any.
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub starter_code: Option<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionType {
    MultipleChoice,
    SingleAnswer,
    ShortAnswer,
    LongAnswer,
    MatchTheFollowing,
    CodeSolve,
}

impl QuestionType {
    /// Maximum accepted length for free-text answers, where applicable.
    pub fn max_text_len(&self) -> Option<usize> {
        match self {
            QuestionType::ShortAnswer => Some(SHORT_ANSWER_MAX_LEN),
            QuestionType::LongAnswer => Some(LONG_ANSWER_MAX_LEN),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStatus {
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub passed: bool,
    #[serde(default)]
    pub last_attempt: Option<AttemptResult>,
}

#[serde_with::serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResult {
    pub score: f64,
    pub total_marks: f64,
    /// The backend is inconsistent here and sends either a number or a
    /// stringified number.
    #[serde_as(as = "serde_with::PickFirst<(_, serde_with::DisplayFromStr)>")]
    pub percentage: f64,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub results: Vec<QuestionResult>,
}

impl AttemptResult {
    pub fn is_pass(&self) -> bool {
        self.percentage >= PASSING_PERCENT
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_id: String,
    #[serde(default)]
    pub correct: bool,
    #[serde(default)]
    pub marks_awarded: f64,
}
