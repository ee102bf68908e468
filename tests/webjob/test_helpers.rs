//! Shared fixtures for web job BDD scenarios.

use mgmtctl::CommandError;
use mgmtctl::test_support::{RecordingSink, RecordingWebJobClient};
use rstest::fixture;

#[derive(Clone, Debug)]
pub struct WebJobContext {
    pub client: RecordingWebJobClient,
    pub sink: RecordingSink,
    pub outcome: Option<WebJobOutcome>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WebJobOutcome {
    Success,
    Rejected { field: &'static str },
    Failure(String),
}

impl WebJobOutcome {
    pub fn from_result<T, E>(result: Result<T, CommandError<E>>) -> Self
    where
        E: std::error::Error + 'static,
    {
        match result {
            Ok(_) => Self::Success,
            Err(err) => err.as_validation().map_or_else(
                || Self::Failure(err.to_string()),
                |validation| Self::Rejected {
                    field: validation.field(),
                },
            ),
        }
    }
}

#[fixture]
pub fn webjob_context() -> WebJobContext {
    WebJobContext {
        client: RecordingWebJobClient::new(),
        sink: RecordingSink::new(),
        outcome: None,
    }
}
