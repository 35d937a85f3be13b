//! Inbound capacity wizard, WASM front end.
//!
//! Binds the server-rendered page, opens the message socket and keeps the
//! page in step with the `ic-wizard` controller.

pub mod config;
pub mod dom;
pub mod estimate;
pub mod events;
pub mod forms;
pub mod keyboard;
pub mod render;
pub mod socket;
pub mod state;
pub mod webln;

use ic_wizard::{SessionContext, WizardController};
use wasm_bindgen::prelude::*;

/// WASM entry point – called automatically when the module is instantiated.
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    // Improve panic messages in the browser console
    console_error_panic_hook::set_once();

    init().await
}

async fn init() -> Result<(), JsValue> {
    let els = dom::Elements::bind()?;

    let config = config::load()?;
    let session = SessionContext::from_config(&config).map_err(|e| JsValue::from_str(&e.to_string()))?;
    gloo_console::log!(format!("wizard session {}", session.session_id()));
    state::install(WizardController::new(session));

    events::bind_events(&els)?;

    // Fill the fee table before anything arrives from the server.
    estimate::recalculate(&els);

    let url = config::socket_url(&config);
    socket::connect(&els, &url)?;
    if let Some(register) = state::with(|w| w.on_channel_open()) {
        socket::send(&register).map_err(|e| JsValue::from_str(&e))?;
    }

    webln::negotiate(&els).await;

    Ok(())
}
