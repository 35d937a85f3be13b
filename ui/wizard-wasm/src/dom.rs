//! DOM element bindings.
//!
//! All fields are resolved once at startup. Elements that only some page
//! revisions carry (payment details, wallet button, fee cells) are optional.

use ic_wizard::Stage;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, HtmlFormElement, HtmlSelectElement};

// ── Helpers ──

fn doc() -> Document {
    gloo_utils::document()
}

pub fn by_id(id: &str) -> Option<Element> {
    doc().get_element_by_id(id)
}

pub fn by_id_typed<T: JsCast>(id: &str) -> Option<T> {
    by_id(id).and_then(|e| e.dyn_into::<T>().ok())
}

pub fn query_typed<T: JsCast>(selector: &str) -> Option<T> {
    doc()
        .query_selector(selector)
        .ok()?
        .and_then(|e| e.dyn_into::<T>().ok())
}

pub fn set_text(el: &Element, text: &str) {
    el.set_text_content(Some(text));
}

pub fn set_opt_text(el: &Option<Element>, text: &str) {
    if let Some(el) = el {
        set_text(el, text);
    }
}

pub fn toggle_class(el: &Element, cls: &str, force: bool) {
    let _ = el.class_list().toggle_with_force(cls, force);
}

pub fn set_style(el: &HtmlElement, property: &str, value: &str) {
    let _ = el.style().set_property(property, value);
}

pub fn set_shown(el: &HtmlElement, shown: bool) {
    set_style(el, "display", if shown { "" } else { "none" });
}

/// Toggles the `disabled` attribute, which every form control honours.
pub fn set_disabled(el: &Element, disabled: bool) {
    let _ = if disabled {
        el.set_attribute("disabled", "")
    } else {
        el.remove_attribute("disabled")
    };
}

/// Every `input`, `select`, `textarea` and `button` inside `form`.
pub fn form_controls(form: &HtmlFormElement) -> Vec<Element> {
    let collection = form.elements();
    (0..collection.length())
        .filter_map(|i| collection.item(i))
        .collect()
}

/// Element id prefix used by the page for each wizard tab.
pub fn stage_key(stage: Stage) -> &'static str {
    match stage {
        Stage::Connect => "connect",
        Stage::Capacity => "capacity",
        Stage::ChainFee => "chain",
        Stage::Payment | Stage::AwaitingChannel | Stage::Done => "payment",
    }
}

// ── Elements struct ──

/// The tab link, its panel, and its form.
#[derive(Clone)]
pub struct StageElements {
    pub stage: Stage,
    pub tab: Element,
    pub content: Element,
    pub form: HtmlFormElement,
}

#[derive(Clone)]
pub struct FeeCells {
    pub selected_capacity: Option<Element>,
    pub selected_capacity_usd: Option<Element>,
    pub capacity_fee_rate: Option<Element>,
    pub capacity_fee_rate_usd: Option<Element>,
    pub capacity_fee: Option<Element>,
    pub capacity_fee_usd: Option<Element>,
    pub transaction_fee_rate: Option<Element>,
    pub expected_bytes: Option<Element>,
    pub transaction_fee: Option<Element>,
    pub transaction_fee_usd: Option<Element>,
    pub total_fee: Option<Element>,
    pub total_fee_usd: Option<Element>,
}

/// All DOM element references used by the wizard.
/// Clone-friendly (all inner types are reference-counted via JS GC).
#[derive(Clone)]
pub struct Elements {
    pub progress_bar: HtmlElement,
    pub error_message: HtmlElement,
    pub connection_lost: Option<HtmlElement>,

    /// Indexed by [`Stage::form_index`].
    pub stages: Vec<StageElements>,

    // Fee selectors
    pub capacity_select: HtmlSelectElement,
    pub capacity_fee_rate_select: HtmlSelectElement,
    pub transaction_fee_rate_select: HtmlSelectElement,
    pub fee_cells: FeeCells,
    pub reciprocate_capacity: Option<Element>,

    // Payment
    pub payment_qrcode: Option<Element>,
    pub payment_request: Option<Element>,
    pub payment_uri_link: Option<Element>,
    pub payment_status: Option<HtmlElement>,
    pub webln_button: Option<HtmlElement>,

    // Channel
    pub channel_open: Option<HtmlElement>,
    pub channel_open_link: Option<Element>,
}

macro_rules! get_el {
    ($id:expr) => {
        by_id($id).ok_or_else(|| JsValue::from_str(&format!("missing element #{}", $id)))?
    };
}

macro_rules! get_html {
    ($id:expr) => {
        by_id_typed::<HtmlElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing html element #{}", $id)))?
    };
}

macro_rules! get_select {
    ($name:expr) => {
        query_typed::<HtmlSelectElement>(&format!("select[name=\"{}\"]", $name))
            .ok_or_else(|| JsValue::from_str(&format!("missing select[name={}]", $name)))?
    };
}

impl Elements {
    /// Resolve all DOM references. Call once after DOMContentLoaded.
    pub fn bind() -> Result<Elements, JsValue> {
        let mut stages = Vec::with_capacity(Stage::FORMS.len());
        for stage in Stage::FORMS {
            let key = stage_key(stage);
            stages.push(StageElements {
                stage,
                tab: get_el!(&format!("{key}-tab")),
                content: get_el!(&format!("{key}-tab-content")),
                form: by_id_typed::<HtmlFormElement>(&format!("{key}_form"))
                    .ok_or_else(|| JsValue::from_str(&format!("missing form #{key}_form")))?,
            });
        }

        Ok(Elements {
            progress_bar: get_html!("progress_bar"),
            error_message: get_html!("error_message"),
            connection_lost: by_id_typed("connection_lost"),

            stages,

            capacity_select: get_select!("capacity"),
            capacity_fee_rate_select: get_select!("capacity_fee_rate"),
            transaction_fee_rate_select: get_select!("transaction_fee_rate"),
            fee_cells: FeeCells {
                selected_capacity: by_id("selected-capacity"),
                selected_capacity_usd: by_id("selected-capacity-usd"),
                capacity_fee_rate: by_id("capacity-fee-rate"),
                capacity_fee_rate_usd: by_id("capacity-fee-rate-usd"),
                capacity_fee: by_id("capacity-fee"),
                capacity_fee_usd: by_id("capacity-fee-usd"),
                transaction_fee_rate: by_id("transaction-fee-rate"),
                expected_bytes: by_id("expected-bytes"),
                transaction_fee: by_id("transaction-fee"),
                transaction_fee_usd: by_id("transaction-fee-usd"),
                total_fee: by_id("total-fee"),
                total_fee_usd: by_id("total-fee-usd"),
            },
            reciprocate_capacity: by_id("reciprocate-capacity"),

            payment_qrcode: by_id("payment-qrcode"),
            payment_request: by_id("payment-request"),
            payment_uri_link: by_id("payment-uri-link"),
            payment_status: by_id_typed("payment-status"),
            webln_button: by_id_typed("webln-pay-button"),

            channel_open: by_id_typed("channel-open"),
            channel_open_link: by_id("channel-open-link"),
        })
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageElements> {
        stage.form_index().and_then(|i| self.stages.get(i))
    }
}
