use std::cell::{Cell, RefCell};

use async_trait::async_trait;
use futures::channel::oneshot;
use js_sys::{Function, Object, Reflect};
use profile_collector_core::identity::PROFILE_FIELDS;
use profile_collector_core::{
    CollectorConfig, IdentityProvider, LoginOutcome, ProfileFetchError, ProviderProfile,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use super::debug_log;
use crate::page::profile_from_sdk_json;

thread_local! {
    static SDK_INIT_HANDLER: RefCell<Option<Closure<dyn FnMut()>>> = const { RefCell::new(None) };
}

fn sdk() -> Option<Object> {
    let window = web_sys::window()?;
    Reflect::get(&window, &JsValue::from_str("FB"))
        .ok()
        .and_then(|value| value.dyn_into::<Object>().ok())
}

fn sdk_method(sdk: &Object, name: &str) -> Option<Function> {
    Reflect::get(sdk, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok())
}

fn options(entries: &[(&str, JsValue)]) -> Object {
    let object = Object::new();
    for (key, value) in entries {
        let _ = Reflect::set(&object, &JsValue::from_str(key), value);
    }
    object
}

/// Registers `window.fbAsyncInit`, or initializes right away when the SDK
/// script already ran.
pub(super) fn install_sdk_init(config: &CollectorConfig) {
    let app_id = config.fb_app_id.clone();
    let version = config.fb_api_version.clone();
    let init = move || {
        let Some(fb) = sdk() else {
            return;
        };
        let Some(init) = sdk_method(&fb, "init") else {
            return;
        };
        let settings = options(&[
            ("appId", JsValue::from_str(&app_id)),
            ("cookie", JsValue::TRUE),
            ("xfbml", JsValue::FALSE),
            ("version", JsValue::from_str(&version)),
        ]);
        if init.call1(&fb, &settings).is_ok() {
            debug_log("Facebook SDK initialized");
        }
    };

    if sdk().is_some() {
        init();
        return;
    }

    let Some(window) = web_sys::window() else {
        return;
    };
    let callback = Closure::<dyn FnMut()>::new(init);
    let _ = Reflect::set(&window, &JsValue::from_str("fbAsyncInit"), callback.as_ref());
    SDK_INIT_HANDLER.with(|slot| {
        slot.replace(Some(callback));
    });
}

/// Delegated login through the Facebook JS SDK popup.
#[derive(Default)]
pub(super) struct FacebookSdkProvider {
    authorized: Cell<bool>,
}

impl FacebookSdkProvider {
    /// Calls `FB.<method>(...args, callback)` and waits for the callback.
    async fn call_with_callback(method: &str, args: &[JsValue]) -> Option<JsValue> {
        let fb = sdk()?;
        let function = sdk_method(&fb, method)?;
        let (sender, receiver) = oneshot::channel::<JsValue>();
        let callback = Closure::once(move |response: JsValue| {
            let _ = sender.send(response);
        });

        let call_args = js_sys::Array::new();
        for arg in args {
            call_args.push(arg);
        }
        call_args.push(callback.as_ref());
        if function.apply(&fb, &call_args).is_err() {
            return None;
        }

        let response = receiver.await.ok();
        drop(callback);
        response
    }
}

#[async_trait(?Send)]
impl IdentityProvider for FacebookSdkProvider {
    async fn login(&self, scope: &str) -> LoginOutcome {
        let login_options = options(&[("scope", JsValue::from_str(scope))]);
        // FB.login takes the callback first.
        let Some(fb) = sdk() else {
            debug_log("Facebook SDK is not loaded");
            return LoginOutcome::Cancelled;
        };
        let Some(login) = sdk_method(&fb, "login") else {
            return LoginOutcome::Cancelled;
        };
        let (sender, receiver) = oneshot::channel::<JsValue>();
        let callback = Closure::once(move |response: JsValue| {
            let _ = sender.send(response);
        });
        if login.call2(&fb, callback.as_ref(), &login_options).is_err() {
            return LoginOutcome::Cancelled;
        }
        let response = receiver.await.unwrap_or(JsValue::UNDEFINED);
        drop(callback);

        let auth_response = Reflect::get(&response, &JsValue::from_str("authResponse"))
            .unwrap_or(JsValue::UNDEFINED);
        if !auth_response.is_truthy() {
            return LoginOutcome::Cancelled;
        }
        self.authorized.set(true);
        let access_token = Reflect::get(&auth_response, &JsValue::from_str("accessToken"))
            .ok()
            .and_then(|value| value.as_string());
        LoginOutcome::Authorized { access_token }
    }

    async fn fetch_profile(&self) -> Result<ProviderProfile, ProfileFetchError> {
        if !self.authorized.get() {
            return Err(ProfileFetchError::NotAuthorized);
        }
        let fields = options(&[("fields", JsValue::from_str(PROFILE_FIELDS))]);
        let response =
            Self::call_with_callback("api", &[JsValue::from_str("/me"), fields.into()]).await;
        let json = response
            .filter(|value| !value.is_undefined() && !value.is_null())
            .and_then(|value| js_sys::JSON::stringify(&value).ok())
            .and_then(|json| json.as_string());
        profile_from_sdk_json(json.as_deref())
    }

    fn forget_authorization(&self) {
        self.authorized.set(false);
    }
}
