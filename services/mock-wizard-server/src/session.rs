//! Scripted per-connection session.
//!
//! Answers each client action the way the production backend would on the
//! happy path, minus the node: invoices are fake and the payment and channel
//! open are announced on a timer.

use ic_protocol::{
    ChannelOpenDetails, ClientAction, ClientMessage, FormField, PaymentRequestDetails,
    ServerMessage, SessionId, field_value,
};
use ic_wizard::FeeInputs;
use ic_wizard::fees::DEFAULT_EXPECTED_BYTES;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const PUBKEY_LENGTH: usize = 66;

/// Fee rates the capacity form offers. Anything else is rejected.
pub const CAPACITY_FEE_RATES: [f64; 5] = [0.0, 0.02, 0.03, 0.1, 0.18];

const EXPLORER_URL: &str = "https://blockstream.info/tx";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePeer {
    pub pubkey: String,
    pub host: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PubkeyError {
    #[error("Please enter your PubKey")]
    Missing,
    #[error("Invalid PubKey format")]
    InvalidFormat,
    #[error("Invalid PubKey length, expected {} characters", PUBKEY_LENGTH)]
    InvalidLength,
}

/// Accepts `pubkey` or `pubkey@host[:port]`.
pub fn parse_remote_pubkey(input: &str) -> Result<RemotePeer, PubkeyError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(PubkeyError::Missing);
    }

    let parts: Vec<&str> = input.split('@').collect();
    let (pubkey, host) = match parts.as_slice() {
        [pubkey] => (*pubkey, None),
        [pubkey, host] => (*pubkey, Some((*host).to_owned())),
        _ => return Err(PubkeyError::InvalidFormat),
    };

    if pubkey.chars().count() != PUBKEY_LENGTH {
        return Err(PubkeyError::InvalidLength);
    }

    Ok(RemotePeer {
        pubkey: pubkey.to_owned(),
        host,
    })
}

/// Frames to send for one client message. `later` frames go out one per
/// step delay, in order, after everything in `now`.
#[derive(Debug, Default, PartialEq)]
pub struct Reply {
    pub now: Vec<ServerMessage>,
    pub later: Vec<ServerMessage>,
}

impl Reply {
    fn send(message: ServerMessage) -> Self {
        Self {
            now: vec![message],
            later: Vec::new(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self::send(ServerMessage::error(message))
    }
}

#[derive(Debug, Default)]
pub struct MockSession {
    session_id: Option<SessionId>,
    peer: Option<RemotePeer>,
    fees: FeeInputs,
    invoice_issued: bool,
    fail_connect: bool,
}

impl MockSession {
    pub fn new(fail_connect: bool) -> Self {
        Self {
            fail_connect,
            ..Self::default()
        }
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn peer(&self) -> Option<&RemotePeer> {
        self.peer.as_ref()
    }

    pub fn handle(&mut self, message: ClientMessage) -> Reply {
        if let Some(registered) = &self.session_id {
            if *registered != message.session_id {
                warn!(
                    registered = %registered,
                    received = %message.session_id,
                    "frame carries a different session id"
                );
            }
        }

        match message.action {
            ClientAction::Register => {
                info!(session_id = %message.session_id, "session registered");
                self.session_id = Some(message.session_id);
                Reply::send(ServerMessage::Registered)
            }
            ClientAction::Connect { form_data } => self.connect(&form_data),
            ClientAction::CapacityRequest { form_data } => self.confirm_capacity(&form_data),
            ClientAction::ChainFee { form_data } => self.chain_fee(&form_data),
            ClientAction::PaymentRequest { .. } => self.payment_request(),
        }
    }

    fn connect(&mut self, form_data: &[FormField]) -> Reply {
        if self.fail_connect {
            warn!("connect forced to fail");
            return Reply::error("Unable to connect to peer");
        }

        match parse_remote_pubkey(field_value(form_data, "pubkey").unwrap_or_default()) {
            Ok(peer) => {
                info!(pubkey = %peer.pubkey, host = ?peer.host, "peer connected");
                self.peer = Some(peer);
                Reply::send(ServerMessage::Connected { data: None })
            }
            Err(e) => {
                debug!(error = %e, "rejected pubkey");
                self.peer = None;
                Reply::error(e.to_string())
            }
        }
    }

    fn confirm_capacity(&mut self, form_data: &[FormField]) -> Reply {
        let Some(capacity) = field_value(form_data, "capacity").and_then(|raw| raw.trim().parse::<u64>().ok())
        else {
            return Reply::error("Invalid capacity");
        };

        // A disabled rate selector is not submitted: that is the reciprocate choice.
        let capacity_fee_rate = match field_value(form_data, "capacity_fee_rate") {
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(rate) if CAPACITY_FEE_RATES.iter().any(|known| (known - rate).abs() < 1e-9) => rate,
                _ => return Reply::error("Invalid capacity fee rate"),
            },
            None => 0.0,
        };

        self.fees.capacity = capacity;
        self.fees.capacity_fee_rate = capacity_fee_rate;
        info!(capacity, capacity_fee_rate, "capacity confirmed");
        Reply::send(ServerMessage::ConfirmedCapacity)
    }

    fn chain_fee(&mut self, form_data: &[FormField]) -> Reply {
        // Payment and channel open are scheduled once per session.
        if self.invoice_issued {
            warn!("chain_fee repeated after the invoice was issued");
            return Reply::error("A payment request was already issued");
        }

        let rate = field_value(form_data, "transaction_fee_rate")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(0);
        if rate == 0 {
            return Reply::error("Invalid transaction fee rate");
        }
        self.fees.transaction_fee_rate = rate;
        self.invoice_issued = true;

        let invoice = self.invoice();
        let txid = mock_txid(&invoice.payment_request);
        Reply {
            now: vec![ServerMessage::PaymentRequest(invoice)],
            later: vec![
                ServerMessage::ReceivePayment,
                ServerMessage::ChannelOpen(ChannelOpenDetails {
                    url: Some(format!("{EXPLORER_URL}/{txid}")),
                    txid: Some(txid),
                }),
            ],
        }
    }

    /// Re-issues the invoice for the fees already confirmed.
    fn payment_request(&mut self) -> Reply {
        if self.fees.transaction_fee_rate == 0 {
            return Reply::error("Please confirm the chain fee first");
        }
        Reply::send(ServerMessage::PaymentRequest(self.invoice()))
    }

    fn invoice(&self) -> PaymentRequestDetails {
        let total_fee = self.fees.estimate(DEFAULT_EXPECTED_BYTES, 0.0).total_fee;
        let session = self.session_id.as_ref().map(SessionId::as_str).unwrap_or("anonymous");
        let payment_request = format!("lnmock{total_fee}n1{}", session.replace('-', ""));
        let uri = format!("lightning:{payment_request}");

        info!(
            total_fee,
            capacity = self.fees.capacity,
            capacity_fee_rate = self.fees.capacity_fee_rate,
            "issued mock invoice"
        );

        PaymentRequestDetails {
            qrcode: qr_markup(&uri),
            payment_request,
            uri,
        }
    }
}

/// Placeholder QR image: a grey square titled with the encoded URI.
fn qr_markup(uri: &str) -> String {
    format!(
        "<img class=\"qrcode\" title=\"{uri}\" alt=\"QR code\" src=\"data:image/svg+xml;charset=utf-8,\
         %3Csvg xmlns='http://www.w3.org/2000/svg' width='200' height='200'%3E\
         %3Crect width='200' height='200' fill='%23ddd'/%3E%3C/svg%3E\">"
    )
}

fn mock_txid(payment_request: &str) -> String {
    let seed = payment_request
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3));
    format!("{seed:016x}").repeat(4)
}
