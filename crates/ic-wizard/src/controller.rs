//! Wizard state machine.
//!
//! Inbound server messages are the only thing that moves the stage forward.
//! The controller never touches the DOM: callers feed it events and apply
//! [`WizardController::view`] afterwards.

use ic_protocol::{
    ChannelOpenDetails, ClientMessage, FormField, PaymentRequestDetails, ProtocolError, ServerMessage,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::SessionContext;
use crate::fees::{FeeEstimate, FeeInputs, RateSelector};
use crate::stage::Stage;
use crate::view::View;

/// State of the message socket as seen by the wizard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelStatus {
    #[default]
    Connecting,
    Registered,
    Closed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("a {0} request is already awaiting a reply")]
    AlreadyPending(Stage),
    #[error("{requested} form submitted while {active} is active")]
    NotActive { requested: Stage, active: Stage },
    #[error("session is not registered with the server yet")]
    NotRegistered,
    #[error("connection to the server is closed")]
    ChannelClosed,
    #[error("{0} has nothing to submit")]
    NothingToSubmit(Stage),
}

/// Why an inbound frame left the state untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ignored {
    /// Known tag that does not apply to the active stage.
    OutOfOrder { action: &'static str, stage: Stage },
    UnknownAction(String),
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Registered,
    Advanced { from: Stage, to: Stage },
    /// Same stage, new data (a re-issued payment request).
    Refreshed(Stage),
    ErrorShown(Stage),
    Ignored(Ignored),
}

/// Pending Request flags, one per form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingFlags([bool; 4]);

impl PendingFlags {
    pub fn is_set(&self, stage: Stage) -> bool {
        stage.form_index().is_some_and(|i| self.0[i])
    }

    fn set(&mut self, stage: Stage, pending: bool) {
        if let Some(i) = stage.form_index() {
            self.0[i] = pending;
        }
    }

    pub fn any(&self) -> Option<Stage> {
        Stage::FORMS.into_iter().find(|stage| self.is_set(*stage))
    }
}

/// Everything the page displays, owned by the controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    pub stage: Stage,
    pub channel: ChannelStatus,
    pub pending: PendingFlags,
    pub error: Option<String>,
    pub fee_inputs: FeeInputs,
    pub rate_selector: RateSelector,
    pub reciprocate_capacity: Option<u64>,
    pub payment: Option<PaymentRequestDetails>,
    pub payment_received: bool,
    pub channel_open: Option<ChannelOpenDetails>,
}

pub struct WizardController {
    session: SessionContext,
    state: UiState,
}

impl WizardController {
    pub fn new(session: SessionContext) -> Self {
        Self {
            session,
            state: UiState::default(),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    /// Frame to send as soon as the socket opens.
    pub fn on_channel_open(&self) -> ClientMessage {
        ClientMessage::register(self.session.session_id().clone())
    }

    pub fn on_channel_closed(&mut self) {
        if self.state.channel != ChannelStatus::Closed {
            warn!("wizard socket closed at stage {}", self.state.stage);
        }
        self.state.channel = ChannelStatus::Closed;
    }

    /// Builds the outbound frame for a form submit and marks the form pending.
    ///
    /// Returns an error, and changes nothing, when the submit must not go out.
    pub fn on_form_submit(&mut self, stage: Stage, form_data: Vec<FormField>) -> Result<ClientMessage, SubmitError> {
        match self.state.channel {
            ChannelStatus::Connecting => return Err(SubmitError::NotRegistered),
            ChannelStatus::Closed => return Err(SubmitError::ChannelClosed),
            ChannelStatus::Registered => {}
        }
        if stage != self.state.stage {
            return Err(SubmitError::NotActive {
                requested: stage,
                active: self.state.stage,
            });
        }
        if self.state.pending.is_set(stage) {
            return Err(SubmitError::AlreadyPending(stage));
        }
        let action = stage.request(form_data).ok_or(SubmitError::NothingToSubmit(stage))?;

        self.state.pending.set(stage, true);
        self.state.error = None;
        debug!("submitting {} for stage {}", action.tag(), stage);

        Ok(ClientMessage {
            session_id: self.session.session_id().clone(),
            action,
        })
    }

    /// Decodes and applies a raw inbound frame. Undecodable frames are logged
    /// and reported as [`Transition::Ignored`].
    pub fn on_frame(&mut self, text: &str) -> Transition {
        match ServerMessage::from_json(text) {
            Ok(message) => self.on_message(message),
            Err(ProtocolError::UnknownAction(action)) => {
                warn!("ignoring unknown action `{}`", action);
                Transition::Ignored(Ignored::UnknownAction(action))
            }
            Err(err) => {
                warn!("ignoring malformed frame: {}", err);
                Transition::Ignored(Ignored::Malformed(err.to_string()))
            }
        }
    }

    pub fn on_message(&mut self, message: ServerMessage) -> Transition {
        let stage = self.state.stage;
        let transition = match message {
            ServerMessage::Registered => {
                if self.state.channel == ChannelStatus::Connecting {
                    self.state.channel = ChannelStatus::Registered;
                    Transition::Registered
                } else {
                    self.out_of_order("registered")
                }
            }
            ServerMessage::ErrorMessage { error } => {
                self.state.pending.set(stage, false);
                self.state.error = Some(error);
                Transition::ErrorShown(stage)
            }
            ServerMessage::Connected { data } => match stage {
                Stage::Connect => {
                    self.state.reciprocate_capacity = data.and_then(|totals| totals.capacity).filter(|c| *c > 0);
                    self.advance("connected")
                }
                _ => self.out_of_order("connected"),
            },
            ServerMessage::ConfirmedCapacity => match stage {
                Stage::Capacity => self.advance("confirmed_capacity"),
                _ => self.out_of_order("confirmed_capacity"),
            },
            ServerMessage::ConfirmedChainFee => match stage {
                Stage::ChainFee => self.advance("confirmed_chain_fee"),
                _ => self.out_of_order("confirmed_chain_fee"),
            },
            ServerMessage::PaymentRequest(details) => match stage {
                Stage::ChainFee => {
                    self.state.payment = Some(details);
                    self.advance("payment_request")
                }
                Stage::Payment => {
                    self.state.payment = Some(details);
                    self.state.pending.set(Stage::Payment, false);
                    Transition::Refreshed(Stage::Payment)
                }
                _ => self.out_of_order("payment_request"),
            },
            ServerMessage::ReceivePayment => match stage {
                Stage::Payment => {
                    self.state.payment_received = true;
                    self.advance("receive_payment")
                }
                _ => self.out_of_order("receive_payment"),
            },
            ServerMessage::ChannelOpen(details) => match stage {
                Stage::AwaitingChannel => {
                    self.state.channel_open = Some(details);
                    self.advance("channel_open")
                }
                _ => self.out_of_order("channel_open"),
            },
        };

        if let Transition::Ignored(Ignored::OutOfOrder { action, stage }) = &transition {
            warn!("ignoring `{}` received during stage {}", action, stage);
        }
        transition
    }

    /// Applies new selector values and returns the resulting estimate.
    pub fn update_fees(&mut self, mut inputs: FeeInputs) -> FeeEstimate {
        self.state.rate_selector = inputs.apply_capacity_rule(self.session.default_capacity_fee_rate());
        self.state.fee_inputs = inputs;
        self.estimate()
    }

    pub fn estimate(&self) -> FeeEstimate {
        self.state
            .fee_inputs
            .estimate(self.session.expected_bytes(), self.session.price_per_sat())
    }

    pub fn view(&self) -> View {
        View::from_state(&self.state, &self.estimate())
    }

    /// Moves to the next stage. Stages are never skipped.
    fn advance(&mut self, action: &'static str) -> Transition {
        let from = self.state.stage;
        let Some(to) = from.next() else {
            return self.out_of_order(action);
        };
        self.state.pending.set(from, false);
        self.state.error = None;
        self.state.stage = to;
        debug!("wizard advanced from {} to {}", from, to);
        Transition::Advanced { from, to }
    }

    fn out_of_order(&self, action: &'static str) -> Transition {
        Transition::Ignored(Ignored::OutOfOrder {
            action,
            stage: self.state.stage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WizardConfig;
    use ic_protocol::{ClientAction, PeerChannelTotals};

    fn controller() -> WizardController {
        let config = WizardConfig {
            session_id: Some("session-1".to_owned()),
            ..WizardConfig::default()
        };
        WizardController::new(SessionContext::from_config(&config).unwrap())
    }

    fn registered() -> WizardController {
        let mut wizard = controller();
        assert_eq!(wizard.on_message(ServerMessage::Registered), Transition::Registered);
        wizard
    }

    fn advanced(transition: Transition) -> bool {
        matches!(transition, Transition::Advanced { .. })
    }

    fn pubkey_form() -> Vec<FormField> {
        vec![FormField::new("pubkey", "02".repeat(33))]
    }

    fn payment_request() -> ServerMessage {
        ServerMessage::PaymentRequest(PaymentRequestDetails {
            qrcode: "<img src=\"data:image/png;base64,AAAA\">".to_owned(),
            payment_request: "lnbc1mock".to_owned(),
            uri: "lightning:lnbc1mock".to_owned(),
        })
    }

    #[test]
    fn register_frame_uses_session_id() {
        let frame = controller().on_channel_open();
        assert_eq!(frame.session_id.as_str(), "session-1");
        assert_eq!(frame.action, ClientAction::Register);
    }

    #[test]
    fn submit_before_registration_is_refused() {
        let mut wizard = controller();
        assert_eq!(
            wizard.on_form_submit(Stage::Connect, pubkey_form()),
            Err(SubmitError::NotRegistered)
        );
        assert!(!wizard.state().pending.is_set(Stage::Connect));
    }

    #[test]
    fn full_happy_path_reaches_done() {
        let mut wizard = registered();

        let frame = wizard.on_form_submit(Stage::Connect, pubkey_form()).unwrap();
        assert_eq!(frame.action.tag(), "connect");
        assert!(wizard.state().pending.is_set(Stage::Connect));
        assert_eq!(
            wizard.on_message(ServerMessage::Connected { data: None }),
            Transition::Advanced {
                from: Stage::Connect,
                to: Stage::Capacity
            }
        );
        assert!(!wizard.state().pending.is_set(Stage::Connect));

        wizard.on_form_submit(Stage::Capacity, Vec::new()).unwrap();
        assert!(advanced(wizard.on_message(ServerMessage::ConfirmedCapacity)));

        let frame = wizard.on_form_submit(Stage::ChainFee, Vec::new()).unwrap();
        assert_eq!(frame.action.tag(), "chain_fee");
        assert!(advanced(wizard.on_message(payment_request())));
        assert_eq!(wizard.stage(), Stage::Payment);
        assert_eq!(
            wizard.state().payment.as_ref().map(|p| p.payment_request.as_str()),
            Some("lnbc1mock")
        );

        assert!(advanced(wizard.on_message(ServerMessage::ReceivePayment)));
        assert!(wizard.state().payment_received);
        assert_eq!(wizard.stage(), Stage::AwaitingChannel);

        let opened = ChannelOpenDetails {
            url: Some("https://blockstream.info/tx/ab".to_owned()),
            txid: Some("ab".to_owned()),
        };
        assert!(advanced(wizard.on_message(ServerMessage::ChannelOpen(opened.clone()))));
        assert_eq!(wizard.stage(), Stage::Done);
        assert_eq!(wizard.state().channel_open, Some(opened));
    }

    #[test]
    fn early_confirmation_never_skips_a_stage() {
        let mut wizard = registered();
        wizard.on_form_submit(Stage::Connect, pubkey_form()).unwrap();

        let transition = wizard.on_message(ServerMessage::ConfirmedCapacity);
        assert_eq!(
            transition,
            Transition::Ignored(Ignored::OutOfOrder {
                action: "confirmed_capacity",
                stage: Stage::Connect
            })
        );
        assert_eq!(wizard.stage(), Stage::Connect);
        assert!(wizard.state().pending.is_set(Stage::Connect));

        wizard.on_message(ServerMessage::Connected { data: None });
        assert_eq!(wizard.stage(), Stage::Capacity);
    }

    #[test]
    fn duplicate_submit_while_pending_is_refused() {
        let mut wizard = registered();
        wizard.on_form_submit(Stage::Connect, pubkey_form()).unwrap();
        assert_eq!(
            wizard.on_form_submit(Stage::Connect, pubkey_form()),
            Err(SubmitError::AlreadyPending(Stage::Connect))
        );
    }

    #[test]
    fn submit_for_inactive_stage_is_refused() {
        let mut wizard = registered();
        assert_eq!(
            wizard.on_form_submit(Stage::Capacity, Vec::new()),
            Err(SubmitError::NotActive {
                requested: Stage::Capacity,
                active: Stage::Connect
            })
        );
    }

    #[test]
    fn error_message_reenables_active_form_only() {
        let mut wizard = registered();
        wizard.on_form_submit(Stage::Connect, pubkey_form()).unwrap();

        let transition = wizard.on_message(ServerMessage::error("Invalid PubKey format"));
        assert_eq!(transition, Transition::ErrorShown(Stage::Connect));
        assert_eq!(wizard.stage(), Stage::Connect);
        assert_eq!(wizard.state().error.as_deref(), Some("Invalid PubKey format"));
        assert!(!wizard.state().pending.is_set(Stage::Connect));

        let view = wizard.view();
        let enabled: Vec<_> = view.tabs.iter().filter(|tab| tab.inputs_enabled).map(|tab| tab.stage).collect();
        assert_eq!(enabled, vec![Stage::Connect]);

        wizard.on_form_submit(Stage::Connect, pubkey_form()).unwrap();
        assert_eq!(wizard.state().error, None);
    }

    #[test]
    fn error_in_later_stage_does_not_revert() {
        let mut wizard = registered();
        wizard.on_form_submit(Stage::Connect, pubkey_form()).unwrap();
        wizard.on_message(ServerMessage::Connected { data: None });
        wizard.on_form_submit(Stage::Capacity, Vec::new()).unwrap();

        wizard.on_message(ServerMessage::error("capacity unavailable"));
        assert_eq!(wizard.stage(), Stage::Capacity);
        assert!(wizard.on_form_submit(Stage::Capacity, Vec::new()).is_ok());
    }

    #[test]
    fn connected_totals_set_reciprocate_capacity() {
        let mut wizard = registered();
        wizard.on_form_submit(Stage::Connect, pubkey_form()).unwrap();
        wizard.on_message(ServerMessage::Connected {
            data: Some(PeerChannelTotals {
                capacity: Some(2_000_000),
                count: Some(1),
                balance: Some(0.2),
            }),
        });
        assert_eq!(wizard.state().reciprocate_capacity, Some(2_000_000));
    }

    #[test]
    fn connected_frame_with_string_capacity_advances() {
        let mut wizard = registered();
        wizard.on_form_submit(Stage::Connect, pubkey_form()).unwrap();

        let transition = wizard
            .on_frame(r#"{"action":"connected","data":{"remote_pubkey":"02ab","count":1,"capacity":"2000000"}}"#);

        assert_eq!(
            transition,
            Transition::Advanced {
                from: Stage::Connect,
                to: Stage::Capacity
            }
        );
        assert!(!wizard.state().pending.is_set(Stage::Connect));
        assert_eq!(wizard.state().reciprocate_capacity, Some(2_000_000));
    }

    #[test]
    fn earlier_revision_confirms_chain_fee_then_requests_payment() {
        let mut wizard = registered();
        wizard.on_form_submit(Stage::Connect, pubkey_form()).unwrap();
        wizard.on_message(ServerMessage::Connected { data: None });
        wizard.on_form_submit(Stage::Capacity, Vec::new()).unwrap();
        wizard.on_message(ServerMessage::ConfirmedCapacity);
        wizard.on_form_submit(Stage::ChainFee, Vec::new()).unwrap();
        wizard.on_message(ServerMessage::ConfirmedChainFee);
        assert_eq!(wizard.stage(), Stage::Payment);
        assert!(wizard.state().payment.is_none());

        let frame = wizard.on_form_submit(Stage::Payment, Vec::new()).unwrap();
        assert_eq!(frame.action.tag(), "payment_request");
        assert_eq!(wizard.on_message(payment_request()), Transition::Refreshed(Stage::Payment));
        assert!(!wizard.state().pending.is_set(Stage::Payment));
        assert!(wizard.state().payment.is_some());
    }

    #[test]
    fn unknown_and_malformed_frames_are_ignored() {
        let mut wizard = registered();
        let before = wizard.state().clone();

        assert_eq!(
            wizard.on_frame(r#"{"action":"channel_closed"}"#),
            Transition::Ignored(Ignored::UnknownAction("channel_closed".to_owned()))
        );
        assert!(matches!(wizard.on_frame("garbage"), Transition::Ignored(Ignored::Malformed(_))));
        assert_eq!(wizard.state(), &before);
    }

    #[test]
    fn second_registered_is_out_of_order() {
        let mut wizard = registered();
        assert!(matches!(
            wizard.on_message(ServerMessage::Registered),
            Transition::Ignored(Ignored::OutOfOrder { action: "registered", .. })
        ));
    }

    #[test]
    fn closed_channel_blocks_submits() {
        let mut wizard = registered();
        wizard.on_channel_closed();
        assert_eq!(
            wizard.on_form_submit(Stage::Connect, pubkey_form()),
            Err(SubmitError::ChannelClosed)
        );
        assert!(wizard.view().tabs.iter().all(|tab| !tab.inputs_enabled));
    }

    #[test]
    fn fee_update_applies_capacity_rule() {
        let mut wizard = controller();
        let estimate = wizard.update_fees(FeeInputs {
            capacity: 500_000,
            capacity_fee_rate: 0.0,
            transaction_fee_rate: 10,
        });
        assert_eq!(wizard.state().fee_inputs.capacity_fee_rate, 0.03);
        assert!(wizard.state().rate_selector.enabled);
        assert_eq!(estimate.capacity_fee, 15_000);
        assert_eq!(estimate.transaction_fee, 5_000);

        wizard.update_fees(FeeInputs {
            capacity: 0,
            capacity_fee_rate: 0.03,
            transaction_fee_rate: 10,
        });
        assert!(!wizard.state().rate_selector.enabled);
        assert_eq!(wizard.estimate().capacity_fee, 0);
    }
}
