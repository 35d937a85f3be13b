use ic_protocol::{ClientAction, FormField};
use serde::{Deserialize, Serialize};

/// Wizard steps in the order the server walks them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Connect,
    Capacity,
    ChainFee,
    Payment,
    AwaitingChannel,
    Done,
}

impl Stage {
    /// Stages that own a form and a tab.
    pub const FORMS: [Stage; 4] = [Stage::Connect, Stage::Capacity, Stage::ChainFee, Stage::Payment];

    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Connect => Some(Stage::Capacity),
            Stage::Capacity => Some(Stage::ChainFee),
            Stage::ChainFee => Some(Stage::Payment),
            Stage::Payment => Some(Stage::AwaitingChannel),
            Stage::AwaitingChannel => Some(Stage::Done),
            Stage::Done => None,
        }
    }

    pub fn form_index(self) -> Option<usize> {
        Self::FORMS.iter().position(|stage| *stage == self)
    }

    /// The tab that stays visible while this stage is active.
    pub fn tab(self) -> Stage {
        match self {
            Stage::AwaitingChannel | Stage::Done => Stage::Payment,
            other => other,
        }
    }

    /// Wraps serialized form fields in this stage's outbound action.
    pub fn request(self, form_data: Vec<FormField>) -> Option<ClientAction> {
        match self {
            Stage::Connect => Some(ClientAction::Connect { form_data }),
            Stage::Capacity => Some(ClientAction::CapacityRequest { form_data }),
            Stage::ChainFee => Some(ClientAction::ChainFee { form_data }),
            Stage::Payment => Some(ClientAction::PaymentRequest { form_data }),
            Stage::AwaitingChannel | Stage::Done => None,
        }
    }

    /// Progress bar text shown while this stage's request is in flight.
    pub fn progress_label(self) -> &'static str {
        match self {
            Stage::Connect => "Connecting...",
            Stage::Capacity => "Confirming capacity...",
            Stage::ChainFee => "Confirming chain fee...",
            Stage::Payment => "Getting payment request...",
            Stage::AwaitingChannel => "Opening channel...",
            Stage::Done => "",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Stage::Done
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Connect => "connect",
            Stage::Capacity => "capacity",
            Stage::ChainFee => "chain_fee",
            Stage::Payment => "payment",
            Stage::AwaitingChannel => "awaiting_channel",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}
