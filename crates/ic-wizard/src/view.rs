//! Render model: a flat description of the page derived from [`UiState`].
//!
//! The front end applies a whole `View` after every event instead of patching
//! individual elements from each handler.

use ic_protocol::ChannelOpenDetails;

use crate::controller::{ChannelStatus, UiState};
use crate::fees::{FeeDisplay, FeeEstimate, RateSelector};
use crate::format;
use crate::stage::Stage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabView {
    pub stage: Stage,
    pub active: bool,
    pub disabled: bool,
    pub inputs_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressView {
    pub percent: u8,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentView {
    pub qrcode: String,
    pub payment_request: String,
    pub uri: String,
    pub received: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub stage: Stage,
    pub tabs: Vec<TabView>,
    pub progress: Option<ProgressView>,
    pub error: Option<String>,
    pub connection_lost: bool,
    pub fees: FeeDisplay,
    pub rate_selector: RateSelector,
    pub reciprocate_capacity: Option<String>,
    pub payment: Option<PaymentView>,
    pub channel_open: Option<ChannelOpenDetails>,
    pub done: bool,
}

impl View {
    pub fn from_state(state: &UiState, estimate: &FeeEstimate) -> Self {
        let active_tab = state.stage.tab();
        let accepting = state.channel == ChannelStatus::Registered && state.stage.form_index().is_some();

        let tabs = Stage::FORMS
            .into_iter()
            .map(|stage| {
                let active = stage == active_tab;
                TabView {
                    stage,
                    active,
                    disabled: !active,
                    inputs_enabled: active && accepting && !state.pending.is_set(stage),
                }
            })
            .collect();

        let progress = match state.pending.any() {
            Some(stage) => Some(ProgressView {
                percent: 50,
                label: stage.progress_label(),
            }),
            None if state.stage == Stage::AwaitingChannel => Some(ProgressView {
                percent: 75,
                label: Stage::AwaitingChannel.progress_label(),
            }),
            None => None,
        };

        let payment = state.payment.as_ref().map(|details| PaymentView {
            qrcode: details.qrcode.clone(),
            payment_request: details.payment_request.clone(),
            uri: details.uri.clone(),
            received: state.payment_received,
        });

        View {
            stage: state.stage,
            tabs,
            progress,
            error: state.error.clone(),
            connection_lost: state.channel == ChannelStatus::Closed,
            fees: estimate.display(),
            rate_selector: state.rate_selector,
            reciprocate_capacity: state.reciprocate_capacity.map(format::group_digits),
            payment,
            channel_open: state.channel_open.clone(),
            done: state.stage.is_terminal(),
        }
    }

    pub fn active_tab(&self) -> Option<&TabView> {
        self.tabs.iter().find(|tab| tab.active)
    }

    /// Form the Enter shortcut should submit, if any.
    pub fn submit_target(&self) -> Option<Stage> {
        self.active_tab().filter(|tab| tab.inputs_enabled).map(|tab| tab.stage)
    }
}
