use web_sys::{Document, HtmlElement, HtmlInputElement};

use profile_collector_core::{ViewRenderer, ViewState};
use wasm_bindgen::JsCast;

use crate::page::{ERROR_MESSAGE_ID, MANUAL_INPUT_ID, region_display};

/// Shows exactly one `state-*` region at a time.
pub(super) struct DomRenderer {
    document: Document,
}

impl DomRenderer {
    pub(super) fn new(document: Document) -> Self {
        Self { document }
    }

    fn manual_input(&self) -> Option<HtmlInputElement> {
        self.document
            .get_element_by_id(MANUAL_INPUT_ID)
            .and_then(|element| element.dyn_into::<HtmlInputElement>().ok())
    }
}

impl ViewRenderer for DomRenderer {
    fn show(&self, view: &ViewState) {
        if let Some(message) = view.error_message() {
            if let Some(region) = self.document.get_element_by_id(ERROR_MESSAGE_ID) {
                region.set_text_content(Some(message));
            }
        }

        for (id, display) in region_display(view) {
            if let Some(region) = self
                .document
                .get_element_by_id(id)
                .and_then(|element| element.dyn_into::<HtmlElement>().ok())
            {
                let _ = region.style().set_property("display", display);
            }
        }
    }

    fn mark_input_invalid(&self, message: &str) {
        if let Some(input) = self.manual_input() {
            input.set_custom_validity(message);
            let _ = input.report_validity();
        }
    }

    fn clear_input_invalid(&self) {
        if let Some(input) = self.manual_input() {
            input.set_custom_validity("");
        }
    }
}
