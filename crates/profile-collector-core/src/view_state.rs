use serde::Serialize;

pub const OAUTH_PROFILE_ERROR_MESSAGE: &str =
    "Could not retrieve your Facebook profile. Please try Option B (manual entry) instead.";
pub const SUBMISSION_ERROR_MESSAGE: &str = "Failed to submit your profile. Please try again. If the problem persists, contact your chapter PRO.";

/// The one view currently shown to the member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState {
    #[default]
    Loading,
    Invalid,
    Main,
    Submitting,
    Success,
    Error { message: String },
}

/// Everything that can move the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    TokenResolved { present: bool },
    SubmissionStarted,
    SubmissionSucceeded,
    SubmissionFailed,
    ProfileFetchFailed,
    Retry,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("view transition rejected: {event:?} is not valid from {from}")]
pub struct TransitionError {
    pub from: &'static str,
    pub event: ViewEvent,
}

impl ViewState {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Invalid => "invalid",
            Self::Main => "main",
            Self::Submitting => "submitting",
            Self::Success => "success",
            Self::Error { .. } => "error",
        }
    }

    /// DOM region id for this view.
    #[must_use]
    pub fn region_id(&self) -> &'static str {
        match self {
            Self::Loading => "state-loading",
            Self::Invalid => "state-invalid",
            Self::Main => "state-main",
            Self::Submitting => "state-submitting",
            Self::Success => "state-success",
            Self::Error { .. } => "state-error",
        }
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message.as_str()),
            _ => None,
        }
    }

    /// Invalid and Success have no outgoing transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Success)
    }

    #[must_use]
    pub fn accepts_submissions(&self) -> bool {
        matches!(self, Self::Main)
    }

    /// The transition table. Any pair not listed is rejected and the caller
    /// keeps its current state.
    pub fn apply(&self, event: ViewEvent) -> Result<Self, TransitionError> {
        let next = match (self, event) {
            (Self::Loading, ViewEvent::TokenResolved { present: true }) => Self::Main,
            (Self::Loading, ViewEvent::TokenResolved { present: false }) => Self::Invalid,
            (Self::Main, ViewEvent::SubmissionStarted) => Self::Submitting,
            (Self::Main, ViewEvent::ProfileFetchFailed) => Self::Error {
                message: OAUTH_PROFILE_ERROR_MESSAGE.to_string(),
            },
            (Self::Submitting, ViewEvent::SubmissionSucceeded) => Self::Success,
            (Self::Submitting, ViewEvent::SubmissionFailed) => Self::Error {
                message: SUBMISSION_ERROR_MESSAGE.to_string(),
            },
            (Self::Error { .. }, ViewEvent::Retry) => Self::Main,
            _ => {
                return Err(TransitionError {
                    from: self.as_str(),
                    event,
                });
            }
        };
        Ok(next)
    }
}

/// All region ids, in display order.
pub const VIEW_REGION_IDS: [&str; 6] = [
    "state-loading",
    "state-invalid",
    "state-main",
    "state-submitting",
    "state-success",
    "state-error",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn all_states() -> Vec<ViewState> {
        vec![
            ViewState::Loading,
            ViewState::Invalid,
            ViewState::Main,
            ViewState::Submitting,
            ViewState::Success,
            ViewState::Error {
                message: "boom".to_string(),
            },
        ]
    }

    fn all_events() -> [ViewEvent; 7] {
        [
            ViewEvent::TokenResolved { present: true },
            ViewEvent::TokenResolved { present: false },
            ViewEvent::SubmissionStarted,
            ViewEvent::SubmissionSucceeded,
            ViewEvent::SubmissionFailed,
            ViewEvent::ProfileFetchFailed,
            ViewEvent::Retry,
        ]
    }

    #[test]
    fn starts_loading() {
        assert_eq!(ViewState::default(), ViewState::Loading);
    }

    #[test]
    fn token_resolution_picks_main_or_invalid() {
        assert_eq!(
            ViewState::Loading.apply(ViewEvent::TokenResolved { present: true }),
            Ok(ViewState::Main)
        );
        assert_eq!(
            ViewState::Loading.apply(ViewEvent::TokenResolved { present: false }),
            Ok(ViewState::Invalid)
        );
    }

    #[test]
    fn submission_failure_carries_generic_message() {
        let next = ViewState::Submitting
            .apply(ViewEvent::SubmissionFailed)
            .expect("valid transition");
        assert_eq!(next.error_message(), Some(SUBMISSION_ERROR_MESSAGE));
    }

    #[test]
    fn profile_fetch_failure_skips_submitting() {
        let next = ViewState::Main
            .apply(ViewEvent::ProfileFetchFailed)
            .expect("valid transition");
        assert_eq!(next.error_message(), Some(OAUTH_PROFILE_ERROR_MESSAGE));
    }

    #[test]
    fn retry_only_leaves_error() {
        let error = ViewState::Error {
            message: SUBMISSION_ERROR_MESSAGE.to_string(),
        };
        assert_eq!(error.apply(ViewEvent::Retry), Ok(ViewState::Main));
        assert!(ViewState::Main.apply(ViewEvent::Retry).is_err());
        assert!(ViewState::Submitting.apply(ViewEvent::Retry).is_err());
    }

    #[test]
    fn terminal_states_reject_every_event() {
        for state in [ViewState::Invalid, ViewState::Success] {
            assert!(state.is_terminal());
            for event in all_events() {
                assert!(state.apply(event).is_err(), "{state:?} accepted {event:?}");
            }
        }
    }

    #[test]
    fn table_has_exactly_seven_edges() {
        let accepted = all_states()
            .iter()
            .flat_map(|state| all_events().map(|event| state.apply(event).is_ok()))
            .filter(|ok| *ok)
            .count();
        assert_eq!(accepted, 7);
    }

    #[test]
    fn region_ids_are_distinct_per_state() {
        let ids = all_states()
            .iter()
            .map(ViewState::region_id)
            .collect::<Vec<_>>();
        assert_eq!(ids, VIEW_REGION_IDS.to_vec());
    }

    #[test]
    fn serializes_with_state_tag() {
        let json = serde_json::to_value(ViewState::Error {
            message: "x".to_string(),
        })
        .expect("serialize");
        assert_eq!(json, serde_json::json!({"state": "error", "message": "x"}));
    }
}
