use std::collections::HashMap;

use quiz_utils::answers::AnswerStore;
use quiz_utils::countdown::{Countdown, TimerEvent};
use quiz_utils::quiz::{AttemptResult, Quiz, QuizStatus, QuestionType};
use quiz_utils::shuffle::{ShuffledAnswer, shuffle_answers};
use quiz_utils::validator::unanswered_questions;

use crate::client::{QuizBackend, Submission};

/// Identifies the attempt being made; sent with every submission.
#[derive(Clone, Debug)]
pub struct SessionParams {
    pub quiz_id: String,
    pub course_id: String,
    pub subsection_id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    NotLoaded,
    /// Terminal: the quiz or its status could not be loaded.
    NotFound,
    Instructions,
    InProgress,
    Submitting,
    /// A result is stored and displayed; retake may leave this phase.
    Completed,
}

/// Emitted by [`QuizSession::tick`] for the presentation layer to render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    ThresholdCrossed { minutes: u64 },
    TimeExpired,
    AutoSubmitted,
    AutoSubmitFailed { message: String },
}

/// One user interaction with a question.
#[derive(Clone, Debug)]
pub enum AnswerInput {
    /// Toggle one option of a multiple-choice question.
    ToggleOption(usize),
    /// Select the option of a single-answer question. `0` is valid.
    Choice(usize),
    Text(String),
    Code { code: String, language: String },
}

#[derive(Debug)]
pub enum StartOutcome {
    Started,
    /// The quiz is already passed; the stored last attempt is surfaced.
    AlreadyPassed(Option<AttemptResult>),
    /// Not on the instructions screen.
    Rejected,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Completed(AttemptResult),
    /// Manual submission blocked: 1-based numbers of unanswered questions.
    Incomplete(Vec<usize>),
    /// Backend failure; the session stays in progress with answers retained.
    Failed(String),
    /// Not in progress.
    Rejected,
}

#[derive(Debug)]
pub enum RetakeOutcome {
    Restarted,
    AlreadyPassed,
    /// No finished attempt to retake, or a submit is in flight.
    Rejected,
    /// The re-fetch failed; the session is now `NotFound`.
    Failed(String),
}

/// Owns one quiz attempt end to end: loading, the countdown, the answer
/// store, submission and retake. The rendering layer drives it with discrete
/// calls and reads snapshots back; all mutation goes through one owner, so
/// there is no shared state to lock.
pub struct QuizSession<B> {
    backend: B,
    params: SessionParams,
    phase: Phase,
    quiz: Option<Quiz>,
    status: QuizStatus,
    result: Option<AttemptResult>,
    answers: AnswerStore,
    countdown: Countdown,
    /// Display order of the right column, per match question id.
    shuffles: HashMap<String, Vec<ShuffledAnswer>>,
    /// Left item armed by the first click of a match interaction.
    armed_left: Option<(String, usize)>,
}

impl<B: QuizBackend> QuizSession<B> {
    pub fn new(backend: B, params: SessionParams) -> Self {
        Self {
            backend,
            params,
            phase: Phase::NotLoaded,
            quiz: None,
            status: QuizStatus::default(),
            result: None,
            answers: AnswerStore::new(),
            countdown: Countdown::new(0),
            shuffles: HashMap::new(),
            armed_left: None,
        }
    }

    /// Fetch quiz and status concurrently and move to the instructions
    /// screen. Load failures are terminal for the session, not for the
    /// caller: they are logged and leave the phase at `NotFound`.
    #[tracing::instrument(skip_all, fields(quiz_id = %self.params.quiz_id))]
    pub async fn load(&mut self) {
        let (quiz, status) = tokio::join!(
            self.backend.fetch_quiz(&self.params.quiz_id),
            self.backend.fetch_status(&self.params.quiz_id),
        );
        let (quiz, status) = match (quiz, status) {
            (Ok(quiz), Ok(status)) => (quiz, status),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(error = %e, "unable to load quiz");
                self.phase = Phase::NotFound;
                return;
            }
        };
        if let Err(e) = quiz.validate() {
            tracing::error!(error = %e, "quiz failed validation");
            self.phase = Phase::NotFound;
            return;
        }

        tracing::debug!(
            questions = quiz.questions.len(),
            time_limit = quiz.effective_time_limit(),
            "quiz loaded"
        );
        self.install_attempt(quiz, status);
        self.phase = Phase::Instructions;
    }

    /// Begin the attempt. Valid only from the instructions screen; a passed
    /// quiz cannot be started again and surfaces its stored result instead.
    pub fn start(&mut self) -> StartOutcome {
        if self.phase != Phase::Instructions {
            return StartOutcome::Rejected;
        }
        if self.status.passed {
            tracing::info!("quiz already passed; start ignored");
            return StartOutcome::AlreadyPassed(self.status.last_attempt.clone());
        }
        let limit = self.quiz.as_ref().map(|q| q.time_limit).unwrap_or(0);
        self.countdown = Countdown::new(limit);
        self.phase = Phase::InProgress;
        StartOutcome::Started
    }

    /// Record one interaction with a question. Toggle semantics for
    /// multiple-choice, overwrite for everything else; free text is clipped
    /// to the type's maximum length. Never touches the timer.
    pub fn answer(&mut self, question_id: &str, input: AnswerInput) {
        if self.phase != Phase::InProgress {
            return;
        }
        let Some(question_type) = self.question_type(question_id) else {
            tracing::warn!(question_id, "answer for unknown question");
            return;
        };
        match (question_type, input) {
            (QuestionType::MultipleChoice, AnswerInput::ToggleOption(index)) => {
                self.answers.toggle_selection(question_id, index);
            }
            (QuestionType::SingleAnswer, AnswerInput::Choice(index)) => {
                self.answers.set_choice(question_id, index);
            }
            (QuestionType::ShortAnswer | QuestionType::LongAnswer, AnswerInput::Text(text)) => {
                let text = clip_text(text, question_type.max_text_len());
                self.answers.set_text(question_id, text);
            }
            (QuestionType::CodeSolve, AnswerInput::Code { code, language }) => {
                self.answers.set_code(question_id, code, language);
            }
            (question_type, input) => {
                tracing::warn!(?question_type, ?input, "mismatched answer input");
            }
        }
    }

    /// First half of the match interaction: arm a left item.
    pub fn select_match_left(&mut self, question_id: &str, left_index: usize) {
        if self.phase != Phase::InProgress {
            return;
        }
        self.armed_left = Some((question_id.to_string(), left_index));
    }

    /// Second half: pair the armed left item with `right_index`, or remove
    /// the pairing when it already exists. Arming is cleared whatever
    /// happens. Returns whether the pairing is present afterwards, or `None`
    /// when nothing was armed for this question.
    pub fn select_match_right(&mut self, question_id: &str, right_index: usize) -> Option<bool> {
        if self.phase != Phase::InProgress {
            return None;
        }
        let (armed_question, left_index) = self.armed_left.take()?;
        if armed_question != question_id {
            tracing::debug!(
                armed = armed_question,
                clicked = question_id,
                "right click on a different question; arming dropped"
            );
            return None;
        }
        Some(self.answers.toggle_match(question_id, left_index, right_index))
    }

    pub fn armed_left(&self) -> Option<(&str, usize)> {
        self.armed_left
            .as_ref()
            .map(|(question_id, left)| (question_id.as_str(), *left))
    }

    /// Advance the countdown by one second. Only ticks while in progress, so
    /// a driver can run an unconditional interval loop. Expiry submits the
    /// current answers exactly once, unvalidated.
    pub async fn tick(&mut self) -> Vec<SessionEvent> {
        if self.phase != Phase::InProgress {
            return Vec::new();
        }
        let mut events = Vec::new();
        for event in self.countdown.tick() {
            match event {
                TimerEvent::ThresholdCrossed { minutes } => {
                    tracing::debug!(minutes, "threshold crossed");
                    events.push(SessionEvent::ThresholdCrossed { minutes });
                }
                TimerEvent::Expired => {
                    events.push(SessionEvent::TimeExpired);
                    match self.submit(false).await {
                        SubmitOutcome::Completed(_) => events.push(SessionEvent::AutoSubmitted),
                        SubmitOutcome::Failed(message) => {
                            events.push(SessionEvent::AutoSubmitFailed { message });
                        }
                        outcome => {
                            tracing::warn!(?outcome, "unexpected auto-submit outcome");
                        }
                    }
                }
            }
        }
        events
    }

    /// Submit the attempt. Manual submissions are validated first and
    /// blocked (no state change) while questions are unanswered;
    /// timer-expiry submissions send whatever is stored. A backend failure
    /// is recoverable: the phase returns to `InProgress` with answers
    /// retained.
    #[tracing::instrument(skip_all, fields(quiz_id = %self.params.quiz_id, manual = manual))]
    pub async fn submit(&mut self, manual: bool) -> SubmitOutcome {
        if self.phase != Phase::InProgress {
            return SubmitOutcome::Rejected;
        }
        let Some(quiz) = self.quiz.as_ref() else {
            return SubmitOutcome::Rejected;
        };

        if manual {
            let missing = unanswered_questions(&quiz.questions, &self.answers);
            if !missing.is_empty() {
                tracing::debug!(?missing, "submission blocked by validation");
                return SubmitOutcome::Incomplete(missing);
            }
        }

        self.phase = Phase::Submitting;
        let submission = Submission {
            quiz_id: self.params.quiz_id.clone(),
            course_id: self.params.course_id.clone(),
            subsection_id: self.params.subsection_id.clone(),
            answers: self.answers.to_payload(),
            timer_expired: !manual,
        };

        match self.backend.submit(&submission).await {
            Ok(result) => {
                tracing::info!(
                    score = result.score,
                    percentage = result.percentage,
                    "attempt submitted"
                );
                self.phase = Phase::Completed;
                // Best effort: the submit already succeeded and the stored
                // result is authoritative for display.
                match self.backend.fetch_status(&self.params.quiz_id).await {
                    Ok(status) => self.status = status,
                    Err(e) => {
                        tracing::warn!(error = %e, "unable to refresh status after submit");
                    }
                }
                self.result = Some(result.clone());
                SubmitOutcome::Completed(result)
            }
            Err(e) => {
                tracing::error!(error = %e, "submit failed");
                self.phase = Phase::InProgress;
                SubmitOutcome::Failed(e.to_string())
            }
        }
    }

    /// Start over after a finished attempt. Re-fetches quiz and status (the
    /// limit may have changed), clears every per-attempt piece of state and
    /// goes straight to `InProgress` — the instructions screen is shown only
    /// before the first attempt.
    #[tracing::instrument(skip_all, fields(quiz_id = %self.params.quiz_id))]
    pub async fn retake(&mut self) -> RetakeOutcome {
        if self.status.passed {
            tracing::info!("quiz already passed; retake ignored");
            return RetakeOutcome::AlreadyPassed;
        }
        if self.phase != Phase::Completed {
            return RetakeOutcome::Rejected;
        }

        let (quiz, status) = tokio::join!(
            self.backend.fetch_quiz(&self.params.quiz_id),
            self.backend.fetch_status(&self.params.quiz_id),
        );
        let (quiz, status) = match (quiz, status) {
            (Ok(quiz), Ok(status)) => (quiz, status),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(error = %e, "unable to reload quiz for retake");
                self.phase = Phase::NotFound;
                return RetakeOutcome::Failed(e.to_string());
            }
        };
        if let Err(e) = quiz.validate() {
            tracing::error!(error = %e, "quiz failed validation on retake");
            self.phase = Phase::NotFound;
            return RetakeOutcome::Failed(e.to_string());
        }

        self.install_attempt(quiz, status);
        self.phase = Phase::InProgress;
        RetakeOutcome::Restarted
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    pub fn status(&self) -> &QuizStatus {
        &self.status
    }

    pub fn result(&self) -> Option<&AttemptResult> {
        self.result.as_ref()
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    /// Display order for one match question's right column.
    pub fn shuffle_for(&self, question_id: &str) -> Option<&[ShuffledAnswer]> {
        self.shuffles.get(question_id).map(Vec::as_slice)
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.countdown.remaining()
    }

    /// Remaining time as `MM:SS` for the shell to render.
    pub fn time_display(&self) -> String {
        self.countdown.display()
    }

    /// Install freshly fetched quiz data as the current attempt: fresh
    /// countdown (fired thresholds reset), fresh shuffles, empty answers.
    fn install_attempt(&mut self, quiz: Quiz, status: QuizStatus) {
        self.countdown = Countdown::new(quiz.time_limit);
        self.shuffles = quiz
            .questions
            .iter()
            .filter(|q| q.question_type == QuestionType::MatchTheFollowing)
            .map(|q| (q.id.clone(), shuffle_answers(&q.answers)))
            .collect();
        self.answers.clear();
        self.result = None;
        self.armed_left = None;
        self.quiz = Some(quiz);
        self.status = status;
    }

    fn question_type(&self, question_id: &str) -> Option<QuestionType> {
        self.quiz
            .as_ref()?
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .map(|q| q.question_type)
    }
}

fn clip_text(text: String, max_len: Option<usize>) -> String {
    match max_len {
        Some(max) if text.chars().count() > max => text.chars().take(max).collect(),
        _ => text,
    }
}
