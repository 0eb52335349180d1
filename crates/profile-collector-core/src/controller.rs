use std::cell::RefCell;

use tracing::{debug, info, warn};

use crate::identity::{IdentityProvider, LOGIN_SCOPE, LoginOutcome, ProfileUrl, ProfileUrlError};
use crate::submission::{ProfileSubmission, SubmissionError, WebhookTransport};
use crate::token::{MembershipToken, extract_token};
use crate::view_state::{TransitionError, ViewEvent, ViewState};

/// Presentation seam. Each `show` call replaces the visible view in one step.
pub trait ViewRenderer {
    fn show(&self, view: &ViewState);
    fn mark_input_invalid(&self, message: &str);
    fn clear_input_invalid(&self);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualEntryField {
    pub value: String,
    pub invalid: Option<String>,
}

/// Everything the page remembers for one session.
#[derive(Debug, Clone, Default)]
pub struct FormSession {
    pub token: Option<MembershipToken>,
    pub view: ViewState,
    pub in_flight: bool,
    pub login_pending: bool,
    pub manual_field: ManualEntryField,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error("submissions are not accepted while the form shows {view}")]
    NotAcceptingSubmissions { view: &'static str },
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("a provider login is already in progress")]
    LoginInProgress,
    #[error("no membership token was resolved for this session")]
    MissingToken,
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Success,
    Failure(SubmissionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManualSubmitOutcome {
    Rejected(ProfileUrlError),
    Submitted(SubmissionOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginFlowOutcome {
    Cancelled,
    ProfileUnavailable,
    Submitted(SubmissionOutcome),
}

/// Holds `login_pending` for the life of one delegated login, including when
/// the login future is dropped early.
struct PendingLogin<'a> {
    session: &'a RefCell<FormSession>,
}

impl<'a> PendingLogin<'a> {
    fn begin(session: &'a RefCell<FormSession>) -> Self {
        session.borrow_mut().login_pending = true;
        Self { session }
    }
}

impl Drop for PendingLogin<'_> {
    fn drop(&mut self) {
        self.session.borrow_mut().login_pending = false;
    }
}

/// Owns the session state and is the only place view transitions happen.
///
/// All operations take `&self`; state lives in a `RefCell` that is never
/// borrowed across an `.await`, so a second UI event arriving mid-flight is
/// answered by the in-flight guard.
pub struct FormController<T, P, R> {
    transport: T,
    provider: P,
    renderer: R,
    session: RefCell<FormSession>,
}

impl<T, P, R> FormController<T, P, R>
where
    T: WebhookTransport,
    P: IdentityProvider,
    R: ViewRenderer,
{
    pub fn new(transport: T, provider: P, renderer: R) -> Self {
        Self {
            transport,
            provider,
            renderer,
            session: RefCell::new(FormSession::default()),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn view(&self) -> ViewState {
        self.session.borrow().view.clone()
    }

    pub fn token(&self) -> Option<MembershipToken> {
        self.session.borrow().token.clone()
    }

    pub fn in_flight(&self) -> bool {
        self.session.borrow().in_flight
    }

    pub fn login_pending(&self) -> bool {
        self.session.borrow().login_pending
    }

    pub fn manual_field(&self) -> ManualEntryField {
        self.session.borrow().manual_field.clone()
    }

    /// Resolves the token from the page address and leaves Loading.
    pub fn start(&self, address: &str) -> Result<ViewState, ControllerError> {
        let token = extract_token(address);
        let present = token.is_some();
        self.session.borrow_mut().token = token;
        if !present {
            info!("no membership token in page address");
        }
        self.transition(ViewEvent::TokenResolved { present })
            .map_err(ControllerError::from)
    }

    /// Any edit clears a stale invalid mark.
    pub fn edit_manual_input(&self, value: &str) {
        {
            let mut session = self.session.borrow_mut();
            session.manual_field.value = value.to_string();
            session.manual_field.invalid = None;
        }
        self.renderer.clear_input_invalid();
    }

    /// Manual-entry strategy. Validation failures stay local to the field.
    pub async fn submit_manual(&self, raw: &str) -> Result<ManualSubmitOutcome, ControllerError> {
        let token = self.ensure_accepting()?;
        self.session.borrow_mut().manual_field.value = raw.to_string();

        let profile_url = match ProfileUrl::parse(raw) {
            Ok(url) => url,
            Err(error) => {
                let message = error.user_message();
                self.session.borrow_mut().manual_field.invalid = Some(message.to_string());
                self.renderer.mark_input_invalid(message);
                debug!(%error, "manual profile url rejected");
                return Ok(ManualSubmitOutcome::Rejected(error));
            }
        };

        self.session.borrow_mut().manual_field.invalid = None;
        self.renderer.clear_input_invalid();

        let outcome = self
            .submit(ProfileSubmission::manual(token, profile_url))
            .await?;
        Ok(ManualSubmitOutcome::Submitted(outcome))
    }

    /// Delegated-login strategy. Competing entry points are rejected until
    /// the provider answers.
    pub async fn login_with_provider(&self) -> Result<LoginFlowOutcome, ControllerError> {
        self.ensure_accepting()?;
        let pending = PendingLogin::begin(&self.session);

        match self.provider.login(LOGIN_SCOPE).await {
            LoginOutcome::Cancelled => {
                debug!("provider login cancelled");
                return Ok(LoginFlowOutcome::Cancelled);
            }
            LoginOutcome::Authorized { .. } => {}
        }

        let submission = match self.provider.fetch_profile().await {
            Ok(profile) => self
                .token()
                .ok_or(ControllerError::MissingToken)
                .map(|token| ProfileSubmission::oauth(token, profile))?,
            Err(error) => Err(error),
        };
        drop(pending);

        match submission {
            Ok(submission) => {
                let outcome = self.submit(submission).await?;
                Ok(LoginFlowOutcome::Submitted(outcome))
            }
            Err(error) => {
                debug!(%error, "provider profile unavailable");
                self.transition(ViewEvent::ProfileFetchFailed)?;
                Ok(LoginFlowOutcome::ProfileUnavailable)
            }
        }
    }

    /// Submission workflow: Main -> Submitting -> Success | Error, one POST.
    pub async fn submit(
        &self,
        submission: ProfileSubmission,
    ) -> Result<SubmissionOutcome, ControllerError> {
        {
            let mut session = self.session.borrow_mut();
            if session.in_flight {
                return Err(ControllerError::SubmissionInFlight);
            }
            if session.login_pending {
                return Err(ControllerError::LoginInProgress);
            }
            if !session.view.accepts_submissions() {
                return Err(ControllerError::NotAcceptingSubmissions {
                    view: session.view.as_str(),
                });
            }
            session.in_flight = true;
        }

        if let Err(error) = self.transition(ViewEvent::SubmissionStarted) {
            self.session.borrow_mut().in_flight = false;
            return Err(error.into());
        }

        let payload = submission.to_payload();
        info!(method = payload.method.as_str(), "submitting profile");
        let result = self.transport.post_profile(&payload).await;
        self.session.borrow_mut().in_flight = false;

        match result {
            Ok(()) => {
                self.transition(ViewEvent::SubmissionSucceeded)?;
                Ok(SubmissionOutcome::Success)
            }
            Err(error) => {
                debug!(status = ?error.status(), %error, "profile submission failed");
                self.transition(ViewEvent::SubmissionFailed)?;
                Ok(SubmissionOutcome::Failure(error))
            }
        }
    }

    /// Error -> Main. Both strategies start fresh.
    pub fn retry(&self) -> Result<ViewState, ControllerError> {
        let next = self.transition(ViewEvent::Retry)?;
        self.session.borrow_mut().manual_field.invalid = None;
        self.renderer.clear_input_invalid();
        self.provider.forget_authorization();
        Ok(next)
    }

    fn ensure_accepting(&self) -> Result<MembershipToken, ControllerError> {
        let session = self.session.borrow();
        if session.in_flight {
            return Err(ControllerError::SubmissionInFlight);
        }
        if session.login_pending {
            return Err(ControllerError::LoginInProgress);
        }
        if !session.view.accepts_submissions() {
            return Err(ControllerError::NotAcceptingSubmissions {
                view: session.view.as_str(),
            });
        }
        session.token.clone().ok_or(ControllerError::MissingToken)
    }

    fn transition(&self, event: ViewEvent) -> Result<ViewState, TransitionError> {
        let next = {
            let mut session = self.session.borrow_mut();
            let next = session.view.apply(event).inspect_err(|error| {
                warn!(%error, "view transition rejected");
            })?;
            debug!(from = session.view.as_str(), to = next.as_str(), "view transition");
            session.view = next.clone();
            next
        };
        self.renderer.show(&next);
        Ok(next)
    }
}
