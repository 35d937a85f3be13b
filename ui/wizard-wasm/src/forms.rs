//! Form serialization and submission.

use ic_protocol::FormField;
use ic_wizard::Stage;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlFormElement, HtmlInputElement, HtmlOptionElement, HtmlSelectElement, HtmlTextAreaElement};

use crate::dom::{self, Elements};
use crate::render;
use crate::socket;
use crate::state;

/// Collect the form's successful controls as `{name, value}` pairs in
/// document order. Unnamed, disabled, button-like and unchecked controls are
/// skipped; multi-selects contribute one pair per selected option.
pub fn serialize(form: &HtmlFormElement) -> Vec<FormField> {
    let mut fields = Vec::new();
    for control in dom::form_controls(form) {
        let name = control.get_attribute("name").unwrap_or_default();
        if name.is_empty() || control.has_attribute("disabled") {
            continue;
        }
        collect_control(&control, name, &mut fields);
    }
    fields
}

fn collect_control(control: &Element, name: String, fields: &mut Vec<FormField>) {
    if let Some(input) = control.dyn_ref::<HtmlInputElement>() {
        let kind = input.type_().to_ascii_lowercase();
        match kind.as_str() {
            "submit" | "button" | "reset" | "image" | "file" => {}
            "checkbox" | "radio" => {
                if input.checked() {
                    fields.push(FormField::new(name, input.value()));
                }
            }
            _ => fields.push(FormField::new(name, input.value())),
        }
    } else if let Some(select) = control.dyn_ref::<HtmlSelectElement>() {
        let selected = select.selected_options();
        for i in 0..selected.length() {
            if let Some(option) = selected.item(i).and_then(|o| o.dyn_into::<HtmlOptionElement>().ok()) {
                fields.push(FormField::new(name.clone(), option.value()));
            }
        }
    } else if let Some(textarea) = control.dyn_ref::<HtmlTextAreaElement>() {
        fields.push(FormField::new(name, textarea.value()));
    }
}

/// Submit handler shared by the form `submit` event and the keyboard shortcut.
pub fn submit(els: &Elements, stage: Stage) {
    let Some(stage_els) = els.stage(stage) else {
        return;
    };
    let fields = serialize(&stage_els.form);

    match state::with_mut(|w| w.on_form_submit(stage, fields)) {
        Some(Ok(message)) => {
            if let Err(e) = socket::send(&message) {
                gloo_console::error!(format!("{} not sent: {e}", message.action.tag()));
            }
        }
        Some(Err(e)) => gloo_console::debug!(format!("submit ignored: {e}")),
        None => return,
    }

    render::render(els);
}
