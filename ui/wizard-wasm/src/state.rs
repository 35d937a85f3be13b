//! Page-global state.
//!
//! Uses `RefCell`-wrapped `thread_local!` storage (WASM is single-threaded).
//! The wizard controller is installed once during init; handlers that fire
//! before that see `None`.

use ic_wizard::WizardController;
use std::cell::{Cell, RefCell};

thread_local! {
    static WIZARD: RefCell<Option<WizardController>> = const { RefCell::new(None) };
    static WEBLN_ENABLED: Cell<bool> = const { Cell::new(false) };
}

pub fn install(controller: WizardController) {
    WIZARD.with(|w| *w.borrow_mut() = Some(controller));
}

/// Run a closure with shared read access to the controller.
pub fn with<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&WizardController) -> R,
{
    WIZARD.with(|w| w.borrow().as_ref().map(f))
}

/// Run a closure with mutable access to the controller.
pub fn with_mut<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut WizardController) -> R,
{
    WIZARD.with(|w| w.borrow_mut().as_mut().map(f))
}

pub fn webln_enabled() -> bool {
    WEBLN_ENABLED.with(Cell::get)
}

pub fn set_webln_enabled(enabled: bool) {
    WEBLN_ENABLED.with(|e| e.set(enabled));
}
