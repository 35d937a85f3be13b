//! Enter/Tab submit shortcut for the active stage's form.
//!
//! Exactly one `keydown` listener exists at a time. It is removed and
//! reinstalled whenever the active stage changes so handlers never stack.

use ic_wizard::shortcut::{self, KeyPress, Rebind};
use ic_wizard::Stage;
use std::cell::RefCell;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlFormElement, KeyboardEvent};

use crate::dom::Elements;
use crate::forms;

struct KeyBinding {
    stage: Stage,
    target: HtmlFormElement,
    callback: Closure<dyn FnMut(KeyboardEvent)>,
}

impl Drop for KeyBinding {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback("keydown", self.callback.as_ref().unchecked_ref());
    }
}

thread_local! {
    static BINDING: RefCell<Option<KeyBinding>> = const { RefCell::new(None) };
}

fn is_submit_key(event: &KeyboardEvent) -> bool {
    let key = event.key();
    KeyPress {
        key: &key,
        shift: event.shift_key(),
        alt: event.alt_key(),
        ctrl: event.ctrl_key(),
        meta: event.meta_key(),
    }
    .is_submit()
}

pub fn bound_stage() -> Option<Stage> {
    BINDING.with(|b| b.borrow().as_ref().map(|binding| binding.stage))
}

/// Point the shortcut at `stage`'s form, or drop it when the stage has none.
pub fn sync(els: &Elements, stage: Stage) -> Result<(), JsValue> {
    let stage = match shortcut::rebind(bound_stage(), stage) {
        Rebind::Keep => return Ok(()),
        Rebind::Replace(stage) => stage,
        Rebind::Drop => {
            BINDING.with(|b| b.borrow_mut().take());
            return Ok(());
        }
    };

    // Dropping the old binding detaches its listener.
    BINDING.with(|b| b.borrow_mut().take());

    let Some(stage_els) = els.stage(stage) else {
        return Ok(());
    };

    let els2 = els.clone();
    let callback = Closure::wrap(Box::new(move |event: KeyboardEvent| {
        if is_submit_key(&event) {
            event.prevent_default();
            forms::submit(&els2, stage);
        }
    }) as Box<dyn FnMut(_)>);

    let target = stage_els.form.clone();
    target.add_event_listener_with_callback("keydown", callback.as_ref().unchecked_ref())?;

    BINDING.with(|b| {
        *b.borrow_mut() = Some(KeyBinding {
            stage,
            target,
            callback,
        })
    });
    Ok(())
}
