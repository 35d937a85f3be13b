//! Live fee estimate: read the fee selectors, update the controller, re-render.

use ic_wizard::FeeInputs;

use crate::dom::Elements;
use crate::render;
use crate::state;

pub fn read_inputs(els: &Elements) -> FeeInputs {
    FeeInputs::parse(
        &els.capacity_select.value(),
        &els.capacity_fee_rate_select.value(),
        &els.transaction_fee_rate_select.value(),
    )
}

/// Called on every selector `change` and once at startup.
pub fn recalculate(els: &Elements) {
    let inputs = read_inputs(els);
    state::with_mut(|w| w.update_fees(inputs));
    render::render(els);
}
