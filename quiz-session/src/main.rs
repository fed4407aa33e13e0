use quiz_session::client::HttpQuizService;
use quiz_session::config::EnvVars;
use quiz_session::session::{Phase, QuizSession, SessionEvent, SessionParams, StartOutcome};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Headless session runner: loads the configured quiz, starts an attempt and
/// lets the countdown run it to completion. Useful as a smoke check against a
/// real Quiz Service deployment.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().pretty())
        .with(sentry::integrations::tracing::layer())
        .with(EnvFilter::from_default_env())
        .init();
    tracing::info!("Starting quiz session runner...");
    dotenvy::dotenv().ok();

    let env_vars = EnvVars::new();

    let _guard = if let Some(sentry_dsn) = env_vars.sentry_dsn.clone() {
        tracing::info!("initializing Sentry");
        // NOTE: Events are only emitted, once the guard goes out of scope.
        Some(sentry::init((
            sentry_dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                traces_sample_rate: 1.0,
                ..Default::default()
            },
        )))
    } else {
        None
    };

    let backend = HttpQuizService::new(&env_vars.quiz_service_url, &env_vars.quiz_service_token);
    let params = SessionParams {
        quiz_id: env_vars.quiz_id.clone(),
        course_id: env_vars.course_id.clone(),
        subsection_id: env_vars.subsection_id.clone(),
    };
    let mut session = QuizSession::new(backend, params);

    session.load().await;
    if session.phase() == Phase::NotFound {
        anyhow::bail!("quiz {} could not be loaded", env_vars.quiz_id);
    }

    match session.start() {
        StartOutcome::Started => {
            tracing::info!(time = %session.time_display(), "attempt started");
        }
        StartOutcome::AlreadyPassed(last_attempt) => {
            tracing::info!(?last_attempt, "quiz already passed; nothing to do");
            return Ok(());
        }
        StartOutcome::Rejected => anyhow::bail!("unable to start the attempt"),
    }

    // The session owns all attempt state; this loop is the timer's only
    // driver, so dropping out of it stops the countdown with it.
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
    while session.phase() == Phase::InProgress {
        interval.tick().await;
        for event in session.tick().await {
            match event {
                SessionEvent::ThresholdCrossed { minutes } => {
                    tracing::info!(minutes, "time remaining");
                }
                SessionEvent::TimeExpired => tracing::info!("time expired"),
                SessionEvent::AutoSubmitted => tracing::info!("attempt auto-submitted"),
                SessionEvent::AutoSubmitFailed { message } => {
                    anyhow::bail!("auto-submit failed: {message}");
                }
            }
        }
    }

    if let Some(result) = session.result() {
        tracing::info!(
            score = result.score,
            total_marks = result.total_marks,
            percentage = result.percentage,
            pass = result.is_pass(),
            "attempt complete"
        );
    }
    Ok(())
}
