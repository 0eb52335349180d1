//! Client core for the membership profile collector.
//!
//! The page flow is: resolve the membership token from the address, let the
//! member identify a Facebook profile (provider login or a typed URL), then
//! post one JSON record to the collection webhook. [`controller::FormController`]
//! owns that flow; transports, identity providers, and renderers plug in
//! through traits so the browser shell and the CLI share the same logic.

pub mod config;
pub mod controller;
pub mod identity;
pub mod submission;
pub mod token;
pub mod view_state;

pub use config::{CollectorConfig, ConfigError};
pub use controller::{
    ControllerError, FormController, FormSession, LoginFlowOutcome, ManualEntryField,
    ManualSubmitOutcome, SubmissionOutcome, ViewRenderer,
};
pub use identity::{
    IdentityProvider, LoginOutcome, ProfileFetchError, ProfileUrl, ProfileUrlError,
    ProviderProfile,
};
pub use submission::{
    IdentitySource, ProfileSubmission, SubmissionError, WebhookPayload, WebhookTransport,
};
pub use token::{MembershipToken, extract_token};
pub use view_state::{TransitionError, ViewEvent, ViewState};
