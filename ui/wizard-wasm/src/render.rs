//! Applies a [`View`] to the page.
//!
//! This is the only module that mutates wizard elements; handlers update the
//! controller and then call [`render`].

use ic_wizard::{RateSelector, TabView, View};
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlOptionElement};

use crate::dom::{self, Elements};
use crate::keyboard;
use crate::state;

/// Re-render the whole wizard from the controller's current state.
pub fn render(els: &Elements) {
    let Some(view) = state::with(|w| w.view()) else {
        return;
    };
    apply(els, &view);
    if let Err(e) = keyboard::sync(els, view.stage) {
        gloo_console::error!("failed to bind submit shortcut", e);
    }
}

pub fn apply(els: &Elements, view: &View) {
    for tab in &view.tabs {
        apply_tab(els, tab, &view.rate_selector);
    }
    apply_progress(els, view);
    apply_error(els, view);
    apply_fees(els, view);
    apply_payment(els, view);
    apply_channel(els, view);
}

fn apply_tab(els: &Elements, tab: &TabView, rate: &RateSelector) {
    let Some(stage_els) = els.stage(tab.stage) else {
        return;
    };

    dom::toggle_class(&stage_els.tab, "active", tab.active);
    dom::toggle_class(&stage_els.tab, "disabled", tab.disabled);
    dom::toggle_class(&stage_els.content, "active", tab.active);
    dom::toggle_class(&stage_els.content, "show", tab.active);

    let rate_select: &Element = els.capacity_fee_rate_select.unchecked_ref();
    for control in dom::form_controls(&stage_els.form) {
        let disabled = if &control == rate_select {
            !tab.inputs_enabled || !rate.enabled
        } else {
            !tab.inputs_enabled
        };
        dom::set_disabled(&control, disabled);
    }
}

fn apply_progress(els: &Elements, view: &View) {
    match &view.progress {
        Some(progress) => {
            dom::set_style(&els.progress_bar, "width", &format!("{}%", progress.percent));
            els.progress_bar.set_text_content(Some(progress.label));
        }
        None => {
            dom::set_style(&els.progress_bar, "width", "0%");
            els.progress_bar.set_text_content(Some(""));
        }
    }
}

fn apply_error(els: &Elements, view: &View) {
    let error = view.error.as_deref().unwrap_or("");
    els.error_message.set_text_content(Some(error));
    dom::set_style(
        &els.error_message,
        "visibility",
        if view.error.is_some() { "visible" } else { "hidden" },
    );
    if let Some(notice) = &els.connection_lost {
        dom::set_shown(notice, view.connection_lost);
    }
}

fn apply_fees(els: &Elements, view: &View) {
    let fees = &view.fees;
    let cells = &els.fee_cells;
    dom::set_opt_text(&cells.selected_capacity, &fees.selected_capacity);
    dom::set_opt_text(&cells.selected_capacity_usd, &fees.selected_capacity_fiat);
    dom::set_opt_text(&cells.capacity_fee_rate, &fees.capacity_fee_rate);
    dom::set_opt_text(&cells.capacity_fee_rate_usd, &fees.capacity_fee_rate);
    dom::set_opt_text(&cells.capacity_fee, &fees.capacity_fee);
    dom::set_opt_text(&cells.capacity_fee_usd, &fees.capacity_fee_fiat);
    dom::set_opt_text(&cells.transaction_fee_rate, &fees.transaction_fee_rate);
    dom::set_opt_text(&cells.expected_bytes, &fees.expected_bytes);
    dom::set_opt_text(&cells.transaction_fee, &fees.transaction_fee);
    dom::set_opt_text(&cells.transaction_fee_usd, &fees.transaction_fee_fiat);
    dom::set_opt_text(&cells.total_fee, &fees.total_fee);
    dom::set_opt_text(&cells.total_fee_usd, &fees.total_fee_fiat);
    dom::set_opt_text(
        &els.reciprocate_capacity,
        view.reciprocate_capacity.as_deref().unwrap_or(""),
    );

    apply_rate_selector(els, &view.rate_selector);
}

/// Keep the fee-rate `<select>` in step with the capacity rule.
fn apply_rate_selector(els: &Elements, rate: &RateSelector) {
    let select = &els.capacity_fee_rate_select;
    let options = select.options();

    let mut zero_index = None;
    let mut match_index = None;
    for i in 0..options.length() {
        let Some(option) = options.item(i).and_then(|o| o.dyn_into::<HtmlOptionElement>().ok()) else {
            continue;
        };
        let value = option.value().trim().parse::<f64>().unwrap_or(f64::NAN);
        if value == 0.0 && zero_index.is_none() {
            zero_index = Some(i);
            option.set_disabled(!rate.zero_option_enabled);
        }
        if (value - rate.value).abs() < 1e-9 && match_index.is_none() {
            match_index = Some(i);
        }
    }

    let current = select.value().trim().parse::<f64>().unwrap_or(f64::NAN);
    if (current - rate.value).abs() >= 1e-9 || current.is_nan() {
        if let Some(i) = match_index {
            select.set_selected_index(i as i32);
        }
    }
}

fn apply_payment(els: &Elements, view: &View) {
    let payment = view.payment.as_ref();

    if let Some(qr) = &els.payment_qrcode {
        // QR markup is rendered server-side.
        qr.set_inner_html(payment.map(|p| p.qrcode.as_str()).unwrap_or(""));
    }
    dom::set_opt_text(
        &els.payment_request,
        payment.map(|p| p.payment_request.as_str()).unwrap_or(""),
    );
    if let Some(link) = &els.payment_uri_link {
        match payment.filter(|p| !p.uri.is_empty()) {
            Some(p) => {
                let _ = link.set_attribute("href", &p.uri);
            }
            None => {
                let _ = link.remove_attribute("href");
            }
        }
    }

    let received = payment.is_some_and(|p| p.received);
    if let Some(status) = &els.payment_status {
        status.set_text_content(Some(if received { "Payment received" } else { "" }));
        dom::set_shown(status, received);
    }
    if let Some(button) = &els.webln_button {
        dom::set_shown(button, state::webln_enabled() && payment.is_some() && !received);
    }
}

fn apply_channel(els: &Elements, view: &View) {
    if let Some(panel) = &els.channel_open {
        dom::set_shown(panel, view.done);
    }
    if let (Some(link), Some(details)) = (&els.channel_open_link, &view.channel_open) {
        if let Some(url) = &details.url {
            let _ = link.set_attribute("href", url);
        }
        link.set_text_content(Some(details.txid.as_deref().or(details.url.as_deref()).unwrap_or("")));
    }
}
