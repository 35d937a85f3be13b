//! Page configuration.
//!
//! The hosting site renders a `<script type="application/json" id="wizard-config">`
//! block; a missing block means defaults everywhere.

use ic_wizard::WizardConfig;
use wasm_bindgen::prelude::*;

use crate::dom;

pub const CONFIG_ELEMENT_ID: &str = "wizard-config";
pub const DEFAULT_SOCKET_PORT: u16 = 8765;

pub fn load() -> Result<WizardConfig, JsValue> {
    let text = dom::by_id(CONFIG_ELEMENT_ID)
        .and_then(|el| el.text_content())
        .unwrap_or_default();
    WizardConfig::from_json(&text).map_err(|e| JsValue::from_str(&format!("invalid #{CONFIG_ELEMENT_ID}: {e}")))
}

/// Determine the socket endpoint.
///
/// Priority: configured `socket_url` → same host on the default socket port,
/// upgrading to `wss:` when the page itself is served over https.
pub fn socket_url(config: &WizardConfig) -> String {
    if let Some(url) = config.socket_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        return url.to_string();
    }

    let loc = gloo_utils::window().location();
    let host = loc.hostname().unwrap_or_else(|_| "localhost".into());
    let protocol = loc.protocol().unwrap_or_else(|_| "http:".into());
    let scheme = if protocol == "https:" { "wss:" } else { "ws:" };

    format!("{}//{}:{}/", scheme, host, DEFAULT_SOCKET_PORT)
}
