use std::sync::Mutex;

use quiz_session::client::{BackendError, QuizBackend, Submission};
use quiz_session::session::{
    AnswerInput, Phase, QuizSession, RetakeOutcome, SessionEvent, SessionParams, StartOutcome,
    SubmitOutcome,
};
use quiz_utils::answers::AnswerValue;
use quiz_utils::quiz::{AttemptResult, Question, QuestionType, Quiz, QuizStatus};

/// In-memory Quiz Service double: serves a fixed quiz, records submissions
/// and grades every attempt with a canned result.
struct FakeBackend {
    quiz: Quiz,
    status: Mutex<QuizStatus>,
    grade: AttemptResult,
    fail_loads: bool,
    /// Fail this many submits before succeeding.
    failing_submits: Mutex<u32>,
    quiz_fetches: Mutex<u32>,
    submissions: Mutex<Vec<Submission>>,
}

impl FakeBackend {
    fn new(quiz: Quiz, grade: AttemptResult) -> Self {
        Self {
            quiz,
            status: Mutex::new(QuizStatus::default()),
            grade,
            fail_loads: false,
            failing_submits: Mutex::new(0),
            quiz_fetches: Mutex::new(0),
            submissions: Mutex::new(Vec::new()),
        }
    }
}

impl QuizBackend for &FakeBackend {
    async fn fetch_quiz(&self, _quiz_id: &str) -> Result<Quiz, BackendError> {
        *self.quiz_fetches.lock().unwrap() += 1;
        if self.fail_loads {
            return Err(BackendError::Backend("quiz not found".to_string()));
        }
        Ok(self.quiz.clone())
    }

    async fn fetch_status(&self, _quiz_id: &str) -> Result<QuizStatus, BackendError> {
        if self.fail_loads {
            return Err(BackendError::Backend("status not found".to_string()));
        }
        Ok(self.status.lock().unwrap().clone())
    }

    async fn submit(&self, submission: &Submission) -> Result<AttemptResult, BackendError> {
        let mut failing = self.failing_submits.lock().unwrap();
        if *failing > 0 {
            *failing -= 1;
            return Err(BackendError::Backend("gateway timeout".to_string()));
        }
        self.submissions.lock().unwrap().push(submission.clone());

        let mut status = self.status.lock().unwrap();
        status.attempts += 1;
        status.passed = status.passed || self.grade.is_pass();
        status.last_attempt = Some(self.grade.clone());
        Ok(self.grade.clone())
    }
}

fn question(id: &str, question_type: QuestionType) -> Question {
    Question {
        id: id.to_string(),
        text: format!("question {id}"),
        question_type,
        marks: 5,
        required: true,
        options: vec!["left 0".into(), "left 1".into(), "left 2".into(), "left 3".into()],
        answers: vec!["right 0".into(), "right 1".into(), "right 2".into(), "right 3".into()],
        language: Some("open".to_string()),
        starter_code: None,
        test_cases: vec![],
    }
}

fn quiz(time_limit: u64, questions: Vec<Question>) -> Quiz {
    Quiz {
        id: "quiz-1".to_string(),
        title: "Ownership basics".to_string(),
        description: String::new(),
        questions,
        time_limit,
    }
}

fn grade(percentage: f64) -> AttemptResult {
    AttemptResult {
        score: percentage / 10.0,
        total_marks: 10.0,
        percentage,
        completed_at: None,
        results: vec![],
    }
}

fn params() -> SessionParams {
    SessionParams {
        quiz_id: "quiz-1".to_string(),
        course_id: "course-1".to_string(),
        subsection_id: "sub-1".to_string(),
    }
}

async fn loaded_session(backend: &FakeBackend) -> QuizSession<&FakeBackend> {
    let mut session = QuizSession::new(backend, params());
    session.load().await;
    session
}

#[tokio::test]
async fn load_applies_default_time_limit_and_shuffles() {
    let backend = FakeBackend::new(
        quiz(0, vec![question("pairs", QuestionType::MatchTheFollowing)]),
        grade(80.0),
    );
    let session = loaded_session(&backend).await;

    assert_eq!(session.phase(), Phase::Instructions);
    assert_eq!(session.remaining_seconds(), 600);
    assert_eq!(session.time_display(), "10:00");

    let shuffled = session.shuffle_for("pairs").unwrap();
    assert_eq!(shuffled.len(), 4);
    assert!(
        shuffled
            .iter()
            .enumerate()
            .any(|(position, a)| position != a.original_index)
    );
}

#[tokio::test]
async fn load_failure_is_terminal() {
    let mut backend = FakeBackend::new(quiz(60, vec![]), grade(0.0));
    backend.fail_loads = true;
    let mut session = loaded_session(&backend).await;

    assert_eq!(session.phase(), Phase::NotFound);
    assert!(matches!(session.start(), StartOutcome::Rejected));
    assert!(matches!(session.submit(true).await, SubmitOutcome::Rejected));
}

#[tokio::test]
async fn passed_quiz_cannot_be_started() {
    let backend = FakeBackend::new(
        quiz(60, vec![question("single", QuestionType::SingleAnswer)]),
        grade(80.0),
    );
    {
        let mut status = backend.status.lock().unwrap();
        status.attempts = 1;
        status.passed = true;
        status.last_attempt = Some(grade(80.0));
    }
    let mut session = loaded_session(&backend).await;

    let outcome = session.start();
    assert!(matches!(outcome, StartOutcome::AlreadyPassed(Some(_))));
    assert_eq!(session.phase(), Phase::Instructions);
}

#[tokio::test]
async fn expiry_submits_once_with_empty_answers() {
    let backend = FakeBackend::new(
        quiz(60, vec![question("single", QuestionType::SingleAnswer)]),
        grade(0.0),
    );
    let mut session = loaded_session(&backend).await;
    assert!(matches!(session.start(), StartOutcome::Started));

    let mut events = Vec::new();
    for _ in 0..60 {
        events.extend(session.tick().await);
    }

    // The 1-minute threshold equals the limit, so expiry is the only event.
    assert_eq!(
        events,
        vec![SessionEvent::TimeExpired, SessionEvent::AutoSubmitted]
    );
    assert_eq!(session.phase(), Phase::Completed);

    let submissions = backend.submissions.lock().unwrap();
    assert_eq!(submissions.len(), 1);
    assert!(submissions[0].timer_expired);
    assert!(submissions[0].answers.is_empty());
    assert_eq!(submissions[0].course_id, "course-1");
    drop(submissions);

    // A dead session produces no further ticks or submits.
    assert!(session.tick().await.is_empty());
    assert_eq!(backend.submissions.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn threshold_events_surface_through_the_session() {
    let backend = FakeBackend::new(
        quiz(62, vec![question("single", QuestionType::SingleAnswer)]),
        grade(0.0),
    );
    let mut session = loaded_session(&backend).await;
    session.start();

    assert!(session.tick().await.is_empty());
    assert_eq!(
        session.tick().await,
        vec![SessionEvent::ThresholdCrossed { minutes: 1 }]
    );
    // Fires at most once per attempt.
    assert!(session.tick().await.is_empty());
}

#[tokio::test]
async fn manual_submit_is_blocked_until_complete() {
    let backend = FakeBackend::new(
        quiz(
            600,
            vec![
                question("multi", QuestionType::MultipleChoice),
                question("single", QuestionType::SingleAnswer),
                question("short", QuestionType::ShortAnswer),
            ],
        ),
        grade(100.0),
    );
    let mut session = loaded_session(&backend).await;
    session.start();

    session.answer("single", AnswerInput::Choice(0));
    let outcome = session.submit(true).await;
    assert!(matches!(outcome, SubmitOutcome::Incomplete(ref missing) if *missing == vec![1, 3]));
    assert_eq!(session.phase(), Phase::InProgress);
    assert!(backend.submissions.lock().unwrap().is_empty());

    session.answer("multi", AnswerInput::ToggleOption(2));
    session.answer("short", AnswerInput::Text("the borrow checker".to_string()));
    let outcome = session.submit(true).await;
    assert!(matches!(outcome, SubmitOutcome::Completed(_)));
    assert_eq!(session.phase(), Phase::Completed);

    let submissions = backend.submissions.lock().unwrap();
    assert!(!submissions[0].timer_expired);
    assert_eq!(submissions[0].answers["single"], serde_json::json!(0));
    assert_eq!(submissions[0].answers["multi"], serde_json::json!([2]));
    drop(submissions);

    // Status was refreshed after the submit.
    assert_eq!(session.status().attempts, 1);
    assert!(session.status().passed);
}

#[tokio::test]
async fn failed_submit_keeps_answers_and_allows_retry() {
    let backend = FakeBackend::new(
        quiz(600, vec![question("single", QuestionType::SingleAnswer)]),
        grade(100.0),
    );
    *backend.failing_submits.lock().unwrap() = 1;
    let mut session = loaded_session(&backend).await;
    session.start();
    session.answer("single", AnswerInput::Choice(3));

    let outcome = session.submit(true).await;
    assert!(matches!(outcome, SubmitOutcome::Failed(_)));
    assert_eq!(session.phase(), Phase::InProgress);
    assert_eq!(
        session.answers().get("single"),
        Some(&AnswerValue::Choice(3))
    );

    let outcome = session.submit(true).await;
    assert!(matches!(outcome, SubmitOutcome::Completed(_)));
    assert_eq!(session.phase(), Phase::Completed);
}

#[tokio::test]
async fn retake_skips_instructions_and_resets_attempt_state() {
    let backend = FakeBackend::new(
        quiz(120, vec![question("single", QuestionType::SingleAnswer)]),
        grade(40.0),
    );
    let mut session = loaded_session(&backend).await;
    session.start();
    session.answer("single", AnswerInput::Choice(1));
    session.tick().await;
    assert!(matches!(session.submit(true).await, SubmitOutcome::Completed(_)));
    assert!(session.result().is_some());

    let outcome = session.retake().await;
    assert!(matches!(outcome, RetakeOutcome::Restarted));
    assert_eq!(session.phase(), Phase::InProgress);
    assert!(session.answers().is_empty());
    assert!(session.result().is_none());
    assert_eq!(session.remaining_seconds(), 120);
    // The quiz is re-fetched for the new attempt.
    assert_eq!(*backend.quiz_fetches.lock().unwrap(), 2);
}

#[tokio::test]
async fn retake_after_pass_is_a_guarded_noop() {
    let backend = FakeBackend::new(
        quiz(600, vec![question("single", QuestionType::SingleAnswer)]),
        grade(80.0),
    );
    let mut session = loaded_session(&backend).await;
    session.start();
    session.answer("single", AnswerInput::Choice(0));
    assert!(matches!(session.submit(true).await, SubmitOutcome::Completed(_)));

    let outcome = session.retake().await;
    assert!(matches!(outcome, RetakeOutcome::AlreadyPassed));
    assert_eq!(session.phase(), Phase::Completed);
    assert!(session.result().is_some());
    assert_eq!(*backend.quiz_fetches.lock().unwrap(), 1);
}

#[tokio::test]
async fn match_pairing_is_two_phase_and_toggles() {
    let backend = FakeBackend::new(
        quiz(600, vec![question("pairs", QuestionType::MatchTheFollowing)]),
        grade(100.0),
    );
    let mut session = loaded_session(&backend).await;
    session.start();

    // Right click without an armed left item does nothing.
    assert_eq!(session.select_match_right("pairs", 2), None);

    session.select_match_left("pairs", 0);
    assert_eq!(session.armed_left(), Some(("pairs", 0)));
    assert_eq!(session.select_match_right("pairs", 2), Some(true));
    assert_eq!(session.answers().matched_right("pairs", 0), Some(2));
    // Arming is cleared after every right click.
    assert_eq!(session.armed_left(), None);

    // The same pairing again removes it.
    session.select_match_left("pairs", 0);
    assert_eq!(session.select_match_right("pairs", 2), Some(false));
    assert!(session.answers().get("pairs_0").is_none());
}

#[tokio::test]
async fn free_text_answers_are_clipped_to_the_type_limit() {
    let backend = FakeBackend::new(
        quiz(600, vec![question("short", QuestionType::ShortAnswer)]),
        grade(100.0),
    );
    let mut session = loaded_session(&backend).await;
    session.start();

    session.answer("short", AnswerInput::Text("x".repeat(250)));
    match session.answers().get("short") {
        Some(AnswerValue::Text(text)) => assert_eq!(text.len(), 200),
        other => panic!("unexpected answer entry: {other:?}"),
    }
}
