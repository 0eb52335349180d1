pub mod page;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use profile_collector_core::{CollectorConfig, FormController, ViewState};
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;
    use web_sys::{Document, HtmlAnchorElement, HtmlInputElement};

    use crate::page::{
        CONFIG_GLOBAL, FB_LOGIN_BUTTON_ID, GROUP_LINK_ID, MANUAL_INPUT_ID,
        MANUAL_SUBMIT_BUTTON_ID, RETRY_BUTTON_ID, resolve_page_config,
    };

    mod dom;
    mod network;
    mod sdk;

    use dom::DomRenderer;
    use network::FetchWebhookTransport;
    use sdk::{FacebookSdkProvider, install_sdk_init};

    type PageController = FormController<FetchWebhookTransport, FacebookSdkProvider, DomRenderer>;

    thread_local! {
        static DEBUG_LOGGING: Cell<bool> = const { Cell::new(false) };
        static READY_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static CLICK_HANDLERS: RefCell<Vec<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(Vec::new()) };
    }

    pub(crate) fn debug_log(message: &str) {
        if DEBUG_LOGGING.with(Cell::get) {
            web_sys::console::log_1(&JsValue::from_str(message));
        }
    }

    pub(crate) fn debug_error(message: &str) {
        if DEBUG_LOGGING.with(Cell::get) {
            web_sys::console::error_1(&JsValue::from_str(message));
        }
    }

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        let Some(document) = web_sys::window().and_then(|window| window.document()) else {
            return;
        };

        if document.ready_state() == "loading" {
            let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event| {
                run_boot();
            }));
            let _ = document.add_event_listener_with_callback(
                "DOMContentLoaded",
                callback.as_ref().unchecked_ref(),
            );
            READY_HANDLER.with(|slot| {
                slot.replace(Some(callback));
            });
        } else {
            run_boot();
        }
    }

    fn run_boot() {
        if let Err(error) = boot() {
            web_sys::console::error_1(&JsValue::from_str(&format!(
                "profile form failed to start: {error}"
            )));
        }
    }

    fn load_config() -> Result<CollectorConfig, String> {
        let window = web_sys::window().ok_or_else(|| "window is unavailable".to_string())?;
        let raw = js_sys::Reflect::get(&window, &JsValue::from_str(CONFIG_GLOBAL))
            .ok()
            .filter(|value| !value.is_undefined() && !value.is_null())
            .and_then(|value| js_sys::JSON::stringify(&value).ok())
            .and_then(|json| json.as_string());
        resolve_page_config(raw.as_deref()).map_err(|error| error.to_string())
    }

    fn boot() -> Result<(), String> {
        let window = web_sys::window().ok_or_else(|| "window is unavailable".to_string())?;
        let document = window
            .document()
            .ok_or_else(|| "document is unavailable".to_string())?;
        let config = load_config()?;
        DEBUG_LOGGING.with(|flag| flag.set(config.debug));

        install_sdk_init(&config);
        set_group_link(&document, &config.group_url);

        let transport = FetchWebhookTransport::new(&config.webhook_url);
        let controller = Rc::new(FormController::new(
            transport,
            FacebookSdkProvider::default(),
            DomRenderer::new(document.clone()),
        ));
        let address = window
            .location()
            .href()
            .map_err(|_| "page address is unavailable".to_string())?;
        let view = controller.start(&address).map_err(|error| error.to_string())?;
        debug_log(&format!(
            "profile form started: {}",
            serde_json::to_string(&view).unwrap_or_default()
        ));
        if view != ViewState::Main {
            return Ok(());
        }

        bind_controls(&document, &controller)
    }

    fn set_group_link(document: &Document, group_url: &str) {
        if let Some(link) = document
            .get_element_by_id(GROUP_LINK_ID)
            .and_then(|element| element.dyn_into::<HtmlAnchorElement>().ok())
        {
            link.set_href(group_url);
        }
    }

    fn bind_controls(document: &Document, controller: &Rc<PageController>) -> Result<(), String> {
        let login_button = document
            .get_element_by_id(FB_LOGIN_BUTTON_ID)
            .ok_or_else(|| "missing facebook login button".to_string())?;
        let submit_button = document
            .get_element_by_id(MANUAL_SUBMIT_BUTTON_ID)
            .ok_or_else(|| "missing manual submit button".to_string())?;
        let retry_button = document
            .get_element_by_id(RETRY_BUTTON_ID)
            .ok_or_else(|| "missing retry button".to_string())?;
        let input = document
            .get_element_by_id(MANUAL_INPUT_ID)
            .and_then(|element| element.dyn_into::<HtmlInputElement>().ok())
            .ok_or_else(|| "missing manual profile input".to_string())?;

        let login = {
            let controller = controller.clone();
            Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event| {
                let controller = controller.clone();
                spawn_local(async move {
                    match controller.login_with_provider().await {
                        Ok(outcome) => debug_log(&format!("facebook login finished: {outcome:?}")),
                        Err(error) => debug_log(&format!("facebook login ignored: {error}")),
                    }
                });
            }))
        };

        let submit = {
            let controller = controller.clone();
            let input = input.clone();
            Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event| {
                let controller = controller.clone();
                let value = input.value();
                spawn_local(async move {
                    match controller.submit_manual(&value).await {
                        Ok(outcome) => debug_log(&format!("manual entry finished: {outcome:?}")),
                        Err(error) => debug_log(&format!("manual entry ignored: {error}")),
                    }
                });
            }))
        };

        let retry = {
            let controller = controller.clone();
            Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event| {
                if let Err(error) = controller.retry() {
                    debug_log(&format!("retry ignored: {error}"));
                }
            }))
        };

        let edit = {
            let controller = controller.clone();
            let field = input.clone();
            Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event| {
                controller.edit_manual_input(&field.value());
            }))
        };

        let _ = login_button
            .add_event_listener_with_callback("click", login.as_ref().unchecked_ref());
        let _ = submit_button
            .add_event_listener_with_callback("click", submit.as_ref().unchecked_ref());
        let _ = retry_button
            .add_event_listener_with_callback("click", retry.as_ref().unchecked_ref());
        let _ = input.add_event_listener_with_callback("input", edit.as_ref().unchecked_ref());

        CLICK_HANDLERS.with(|handlers| {
            handlers.borrow_mut().extend([login, submit, retry, edit]);
        });
        Ok(())
    }
}
