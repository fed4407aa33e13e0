use quiz_utils::quiz::{AttemptResult, Quiz, QuizStatus};
use serde::Serialize;

#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Backend(String),
}

/// Body of `POST /quiz/submit`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub quiz_id: String,
    // The backend spells this one differently from every other field.
    #[serde(rename = "courseID")]
    pub course_id: String,
    pub subsection_id: String,
    pub answers: serde_json::Map<String, serde_json::Value>,
    pub timer_expired: bool,
}

/// Seam to the external Quiz Service, so sessions can run against an
/// in-memory backend in tests.
#[allow(async_fn_in_trait)]
pub trait QuizBackend {
    async fn fetch_quiz(&self, quiz_id: &str) -> Result<Quiz, BackendError>;
    async fn fetch_status(&self, quiz_id: &str) -> Result<QuizStatus, BackendError>;
    async fn submit(&self, submission: &Submission) -> Result<AttemptResult, BackendError>;
}

/// Bearer-token authenticated REST client for the Quiz Service.
#[derive(Clone, Debug)]
pub struct HttpQuizService {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpQuizService {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            token: token.into(),
        }
    }
}

impl QuizBackend for HttpQuizService {
    #[tracing::instrument(skip(self), err(Debug))]
    async fn fetch_quiz(&self, quiz_id: &str) -> Result<Quiz, BackendError> {
        let quiz = self
            .http
            .get(format!("{}/quiz/{quiz_id}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(quiz)
    }

    #[tracing::instrument(skip(self), err(Debug))]
    async fn fetch_status(&self, quiz_id: &str) -> Result<QuizStatus, BackendError> {
        let status = self
            .http
            .get(format!("{}/quiz/{quiz_id}/status", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(status)
    }

    #[tracing::instrument(skip_all, fields(quiz_id = %submission.quiz_id), err(Debug))]
    async fn submit(&self, submission: &Submission) -> Result<AttemptResult, BackendError> {
        let result = self
            .http
            .post(format!("{}/quiz/submit", self.base_url))
            .bearer_auth(&self.token)
            .json(submission)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(result)
    }
}
