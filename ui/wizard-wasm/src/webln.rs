//! Optional browser wallet (`window.webln`).
//!
//! Absence is normal: the only thing that depends on it is the
//! "pay with wallet" button on the payment tab.

use js_sys::{Function, Promise, Reflect};
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::dom::Elements;
use crate::render;
use crate::state;

#[derive(Debug, Deserialize)]
pub struct SendPaymentResponse {
    pub preimage: String,
}

fn provider() -> Option<JsValue> {
    let provider = Reflect::get(&gloo_utils::window(), &JsValue::from_str("webln")).ok()?;
    if provider.is_undefined() || provider.is_null() {
        None
    } else {
        Some(provider)
    }
}

async fn call(provider: &JsValue, method: &str, arg: Option<&JsValue>) -> Result<JsValue, String> {
    let function: Function = Reflect::get(provider, &JsValue::from_str(method))
        .map_err(|e| format!("webln.{method}: {e:?}"))?
        .dyn_into()
        .map_err(|_| format!("webln.{method} is not a function"))?;

    let returned = match arg {
        Some(arg) => function.call1(provider, arg),
        None => function.call0(provider),
    }
    .map_err(|e| format!("webln.{method}: {e:?}"))?;

    let promise: Promise = returned
        .dyn_into()
        .map_err(|_| format!("webln.{method} did not return a promise"))?;
    JsFuture::from(promise)
        .await
        .map_err(|e| format!("webln.{method} rejected: {e:?}"))
}

/// Ask the wallet for permission once at page load.
pub async fn negotiate(els: &Elements) {
    let Some(provider) = provider() else {
        gloo_console::debug!("no webln provider");
        return;
    };

    match call(&provider, "enable", None).await {
        Ok(_) => {
            state::set_webln_enabled(true);
            render::render(els);
        }
        Err(e) => gloo_console::warn!(format!("webln unavailable: {e}")),
    }
}

pub async fn send_payment(payment_request: &str) -> Result<SendPaymentResponse, String> {
    let provider = provider().ok_or_else(|| "no webln provider".to_string())?;
    let result = call(&provider, "sendPayment", Some(&JsValue::from_str(payment_request))).await?;
    serde_wasm_bindgen::from_value(result).map_err(|e| format!("unexpected sendPayment result: {e}"))
}

/// Click handler for the "pay with wallet" button.
pub async fn on_pay_with_wallet(_els: &Elements) {
    let Some(payment_request) = state::with(|w| w.state().payment.as_ref().map(|p| p.payment_request.clone())).flatten()
    else {
        return;
    };

    // Receipt is confirmed by the server's `receive_payment`, not by this result.
    match send_payment(&payment_request).await {
        Ok(response) => gloo_console::log!(format!("wallet paid, preimage {}", response.preimage)),
        Err(e) => gloo_console::error!(format!("wallet payment failed: {e}")),
    }
}
