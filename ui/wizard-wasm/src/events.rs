//! Event binding.
//!
//! Wires form submits, fee selector changes and the wallet button. The
//! per-stage keyboard shortcut lives in `keyboard.rs` because it is rebound
//! on every stage change.

use ic_wizard::Stage;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::dom::Elements;
use crate::estimate;
use crate::forms;
use crate::webln;

/// Helper: attach async click handler to an HtmlElement.
macro_rules! on_click_async {
    ($el:expr, $els:expr, $handler:expr) => {{
        let els = $els.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            let els2 = els.clone();
            wasm_bindgen_futures::spawn_local(async move {
                $handler(&els2).await;
            });
        }) as Box<dyn FnMut(_)>);
        $el.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())?;
        cb.forget();
    }};
}

/// Helper: attach a sync handler for a plain `Event`.
macro_rules! on_event {
    ($el:expr, $event:expr, $cb:expr) => {{
        let cb = Closure::wrap(Box::new($cb) as Box<dyn FnMut(web_sys::Event)>);
        $el.add_event_listener_with_callback($event, cb.as_ref().unchecked_ref())?;
        cb.forget();
    }};
}

/// Bind all UI event listeners. Call once after init.
pub fn bind_events(els: &Elements) -> Result<(), JsValue> {
    // ── Stage forms ──
    for stage in Stage::FORMS {
        let Some(stage_els) = els.stage(stage) else {
            continue;
        };
        let els2 = els.clone();
        on_event!(stage_els.form, "submit", move |event: web_sys::Event| {
            event.prevent_default();
            forms::submit(&els2, stage);
        });
    }

    // ── Fee selectors ──
    for select in [
        &els.capacity_select,
        &els.capacity_fee_rate_select,
        &els.transaction_fee_rate_select,
    ] {
        let els2 = els.clone();
        on_event!(select, "change", move |_: web_sys::Event| {
            estimate::recalculate(&els2);
        });
    }

    // ── Wallet ──
    if let Some(button) = &els.webln_button {
        on_click_async!(button, els, webln::on_pay_with_wallet);
    }

    Ok(())
}
