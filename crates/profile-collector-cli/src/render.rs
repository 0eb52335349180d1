use std::cell::RefCell;
use std::io::Write;

use profile_collector_core::{ViewRenderer, ViewState};

/// Prints each view as it becomes visible. Only the newest view is current;
/// earlier lines are history.
pub struct TerminalRenderer<W: Write> {
    out: RefCell<W>,
    group_url: String,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, group_url: impl Into<String>) -> Self {
        Self {
            out: RefCell::new(out),
            group_url: group_url.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn line(&self, text: &str) {
        let mut out = self.out.borrow_mut();
        let _ = writeln!(out, "{text}");
        let _ = out.flush();
    }
}

#[must_use]
pub fn view_text(view: &ViewState, group_url: &str) -> String {
    match view {
        ViewState::Loading => "[loading] Checking your membership link...".to_string(),
        ViewState::Invalid => "[invalid] This link is missing its membership token. Please open the link from your invitation again.".to_string(),
        ViewState::Main => "[main] Ready to collect your Facebook profile.".to_string(),
        ViewState::Submitting => "[submitting] Submitting your profile...".to_string(),
        ViewState::Success => format!(
            "[success] Thank you! Your profile was submitted. Join the community group: {group_url}"
        ),
        ViewState::Error { message } => format!("[error] {message}"),
    }
}

impl<W: Write> ViewRenderer for TerminalRenderer<W> {
    fn show(&self, view: &ViewState) {
        self.line(&view_text(view, &self.group_url));
    }

    fn mark_input_invalid(&self, message: &str) {
        self.line(&format!("  ! {message}"));
    }

    fn clear_input_invalid(&self) {}
}
