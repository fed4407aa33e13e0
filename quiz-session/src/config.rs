use sentry::types::Dsn;
use std::env::var;
use tracing::{error, warn};

#[derive(Clone, Debug)]
pub struct EnvVars {
    pub environment: Environment,
    pub quiz_service_url: String,
    pub quiz_service_token: String,
    pub quiz_id: String,
    pub course_id: String,
    pub subsection_id: String,
    pub sentry_dsn: Option<String>,
}

#[derive(Clone, Debug)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "development" => Environment::Development,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            other => {
                warn!(
                    "ENVIRONMENT value '{}' is not valid. Defaulting to 'production'.",
                    other
                );
                Environment::Production
            }
        }
    }
}

impl ToString for Environment {
    fn to_string(&self) -> String {
        match self {
            Environment::Development => "development".to_string(),
            Environment::Staging => "staging".to_string(),
            Environment::Production => "production".to_string(),
        }
    }
}

impl EnvVars {
    pub fn new() -> Self {
        let Ok(quiz_service_url) = var("QUIZ_SERVICE_URL") else {
            error!("QUIZ_SERVICE_URL not set");
            panic!("QUIZ_SERVICE_URL required");
        };
        assert!(
            !quiz_service_url.is_empty(),
            "QUIZ_SERVICE_URL must not be empty"
        );

        let Ok(quiz_service_token) = var("QUIZ_SERVICE_TOKEN") else {
            error!("QUIZ_SERVICE_TOKEN not set");
            panic!("QUIZ_SERVICE_TOKEN required");
        };

        let Ok(quiz_id) = var("QUIZ_ID") else {
            error!("QUIZ_ID not set");
            panic!("QUIZ_ID required");
        };
        assert!(!quiz_id.is_empty(), "QUIZ_ID must not be empty");

        let Ok(course_id) = var("COURSE_ID") else {
            error!("COURSE_ID not set");
            panic!("COURSE_ID required");
        };
        let Ok(subsection_id) = var("SUBSECTION_ID") else {
            error!("SUBSECTION_ID not set");
            panic!("SUBSECTION_ID required");
        };

        let sentry_dsn = match var("SENTRY_DSN") {
            Ok(dsn_string) => {
                assert!(
                    valid_sentry_dsn(&dsn_string),
                    "SENTRY_DSN is not valid DSN."
                );
                Some(dsn_string)
            }
            Err(_e) => {
                if cfg!(not(debug_assertions)) {
                    panic!("SENTRY_DSN is not allowed to be unset outside of a debug build");
                }
                warn!("SENTRY_DSN not set.");
                None
            }
        };

        let environment = match var("ENVIRONMENT") {
            Ok(v) => v.into(),
            Err(_e) => {
                warn!("ENVIRONMENT not set. Defaulting to 'production'.");
                Environment::Production
            }
        };

        Self {
            environment,
            quiz_service_url,
            quiz_service_token,
            quiz_id,
            course_id,
            subsection_id,
            sentry_dsn,
        }
    }
}

fn valid_sentry_dsn(url: &str) -> bool {
    url.parse::<Dsn>().is_ok()
}
