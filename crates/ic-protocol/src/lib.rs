//! Wire types for the inbound-capacity wizard socket.
//!
//! Every frame is a JSON object discriminated by its `action` field. Client
//! frames additionally carry the page's `session_id`.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One successful form control, in document order (`serializeArray` shape).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

impl FormField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Returns the first value submitted under `name`.
pub fn field_value<'a>(fields: &'a [FormField], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|field| field.name == name)
        .map(|field| field.value.as_str())
}

// ── Client → server ──

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientMessage {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub action: ClientAction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientAction {
    Register,
    Connect { form_data: Vec<FormField> },
    CapacityRequest { form_data: Vec<FormField> },
    ChainFee { form_data: Vec<FormField> },
    PaymentRequest { form_data: Vec<FormField> },
}

impl ClientAction {
    pub fn tag(&self) -> &'static str {
        match self {
            ClientAction::Register => "register",
            ClientAction::Connect { .. } => "connect",
            ClientAction::CapacityRequest { .. } => "capacity_request",
            ClientAction::ChainFee { .. } => "chain_fee",
            ClientAction::PaymentRequest { .. } => "payment_request",
        }
    }

    pub fn form_data(&self) -> &[FormField] {
        match self {
            ClientAction::Register => &[],
            ClientAction::Connect { form_data }
            | ClientAction::CapacityRequest { form_data }
            | ClientAction::ChainFee { form_data }
            | ClientAction::PaymentRequest { form_data } => form_data,
        }
    }
}

impl ClientMessage {
    pub fn register(session_id: SessionId) -> Self {
        Self {
            session_id,
            action: ClientAction::Register,
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let value = parse_frame(text)?;
        let tag = action_tag(&value)?;
        if !CLIENT_ACTIONS.contains(&tag.as_str()) {
            return Err(ProtocolError::UnknownAction(tag));
        }
        serde_json::from_value(value).map_err(ProtocolError::Malformed)
    }
}

pub const CLIENT_ACTIONS: &[&str] = &[
    "register",
    "connect",
    "capacity_request",
    "chain_fee",
    "payment_request",
];

// ── Server → client ──

/// Totals for channels that already exist between the node and the peer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PeerChannelTotals {
    /// Summed capacity in sats. The backend sends it stringified.
    #[serde(default, deserialize_with = "lenient_sats")]
    pub capacity: Option<u64>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub balance: Option<f64>,
}

/// Accepts a sats amount as a JSON number or a numeric string. Anything that
/// does not read as a non-negative amount becomes `None`.
fn lenient_sats<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Sats {
        Whole(u64),
        Fractional(f64),
        Text(String),
        Other(IgnoredAny),
    }

    let from_float = |value: f64| (value.is_finite() && value >= 0.0).then(|| value.trunc() as u64);

    Ok(match Option::<Sats>::deserialize(deserializer)? {
        Some(Sats::Whole(sats)) => Some(sats),
        Some(Sats::Fractional(value)) => from_float(value),
        Some(Sats::Text(text)) => {
            let text = text.trim();
            text.parse::<u64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(from_float))
        }
        Some(Sats::Other(_)) | None => None,
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentRequestDetails {
    /// Server-rendered QR markup (an `<img>` tag or data URI).
    #[serde(default)]
    pub qrcode: String,
    pub payment_request: String,
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelOpenDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerMessage {
    Registered,
    Connected {
        #[serde(default)]
        data: Option<PeerChannelTotals>,
    },
    ConfirmedCapacity,
    ConfirmedChainFee,
    PaymentRequest(PaymentRequestDetails),
    ReceivePayment,
    ChannelOpen(ChannelOpenDetails),
    ErrorMessage {
        error: String,
    },
}

pub const SERVER_ACTIONS: &[&str] = &[
    "registered",
    "connected",
    "confirmed_capacity",
    "confirmed_chain_fee",
    "payment_request",
    "receive_payment",
    "channel_open",
    "error_message",
];

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::ErrorMessage {
            error: message.into(),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ServerMessage::Registered => "registered",
            ServerMessage::Connected { .. } => "connected",
            ServerMessage::ConfirmedCapacity => "confirmed_capacity",
            ServerMessage::ConfirmedChainFee => "confirmed_chain_fee",
            ServerMessage::PaymentRequest(_) => "payment_request",
            ServerMessage::ReceivePayment => "receive_payment",
            ServerMessage::ChannelOpen(_) => "channel_open",
            ServerMessage::ErrorMessage { .. } => "error_message",
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Decodes an inbound frame. Tags outside [`SERVER_ACTIONS`] come back as
    /// [`ProtocolError::UnknownAction`] so callers can log them by name.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let value = parse_frame(text)?;
        let tag = action_tag(&value)?;
        if !SERVER_ACTIONS.contains(&tag.as_str()) {
            return Err(ProtocolError::UnknownAction(tag));
        }
        serde_json::from_value(value).map_err(ProtocolError::Malformed)
    }
}

// ── Errors ──

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("frame has no string `action` field")]
    MissingAction,
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    #[error("malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
}

fn parse_frame(text: &str) -> Result<serde_json::Value, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::InvalidJson)
}

fn action_tag(value: &serde_json::Value) -> Result<String, ProtocolError> {
    value
        .get("action")
        .and_then(|action| action.as_str())
        .map(ToOwned::to_owned)
        .ok_or(ProtocolError::MissingAction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> SessionId {
        SessionId("6f1c1d6e-9a55-4c1e-8e0b-3b8f5d2f7a10".to_owned())
    }

    #[test]
    fn register_frame_carries_session_and_action() {
        let frame = ClientMessage::register(session()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(
            value,
            json!({
                "session_id": "6f1c1d6e-9a55-4c1e-8e0b-3b8f5d2f7a10",
                "action": "register"
            })
        );
    }

    #[test]
    fn capacity_request_frame_has_form_data_list() {
        let message = ClientMessage {
            session_id: session(),
            action: ClientAction::CapacityRequest {
                form_data: vec![
                    FormField::new("capacity", "500000"),
                    FormField::new("capacity_fee_rate", "0.03"),
                ],
            },
        };
        let value: serde_json::Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();
        assert_eq!(value["action"], "capacity_request");
        assert_eq!(value["form_data"][0], json!({"name": "capacity", "value": "500000"}));
        assert_eq!(value["form_data"][1]["value"], "0.03");
    }

    #[test]
    fn client_frame_decodes_on_server_side() {
        let text = r#"{"session_id":"abc","action":"connect","form_data":[{"name":"pubkey","value":"02ab"}]}"#;
        let message = ClientMessage::from_json(text).unwrap();
        assert_eq!(message.session_id.as_str(), "abc");
        assert_eq!(message.action.tag(), "connect");
        assert_eq!(field_value(message.action.form_data(), "pubkey"), Some("02ab"));
        assert_eq!(field_value(message.action.form_data(), "email_address"), None);
    }

    #[test]
    fn connected_accepts_null_and_totals() {
        let empty = ServerMessage::from_json(r#"{"action":"connected","data":null}"#).unwrap();
        assert_eq!(empty, ServerMessage::Connected { data: None });

        let missing = ServerMessage::from_json(r#"{"action":"connected"}"#).unwrap();
        assert_eq!(missing, ServerMessage::Connected { data: None });

        let totals = ServerMessage::from_json(
            r#"{"action":"connected","data":{"capacity":2000000,"count":1,"balance":0.4}}"#,
        )
        .unwrap();
        match totals {
            ServerMessage::Connected { data: Some(data) } => {
                assert_eq!(data.capacity, Some(2_000_000));
                assert_eq!(data.count, Some(1));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn connected_capacity_may_arrive_as_string() {
        let message = ServerMessage::from_json(
            r#"{"action":"connected","data":{"remote_pubkey":"02ab","count":1,"capacity":"2000000"}}"#,
        )
        .unwrap();
        let ServerMessage::Connected { data: Some(data) } = message else {
            panic!("expected connected totals, got {message:?}");
        };
        assert_eq!(data.capacity, Some(2_000_000));
        assert_eq!(data.count, Some(1));

        for junk in [r#""None""#, r#""""#, "-5", "null", "true"] {
            let text = format!(r#"{{"action":"connected","data":{{"count":1,"capacity":{junk}}}}}"#);
            let message = ServerMessage::from_json(&text).unwrap();
            assert_eq!(
                message,
                ServerMessage::Connected {
                    data: Some(PeerChannelTotals {
                        capacity: None,
                        count: Some(1),
                        balance: None,
                    })
                },
                "capacity {junk}"
            );
        }
    }

    #[test]
    fn payment_request_fields_are_flat() {
        let message = ServerMessage::from_json(
            r#"{"action":"payment_request","qrcode":"<img>","payment_request":"lnbc1","uri":"lightning:lnbc1"}"#,
        )
        .unwrap();
        assert_eq!(
            message,
            ServerMessage::PaymentRequest(PaymentRequestDetails {
                qrcode: "<img>".to_owned(),
                payment_request: "lnbc1".to_owned(),
                uri: "lightning:lnbc1".to_owned(),
            })
        );
    }

    #[test]
    fn channel_open_details_are_optional() {
        let bare = ServerMessage::from_json(r#"{"action":"channel_open"}"#).unwrap();
        assert_eq!(bare, ServerMessage::ChannelOpen(ChannelOpenDetails::default()));

        let full = ServerMessage::ChannelOpen(ChannelOpenDetails {
            url: Some("https://blockstream.info/tx/ab".to_owned()),
            txid: Some("ab".to_owned()),
        });
        let value: serde_json::Value = serde_json::from_str(&full.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"action": "channel_open", "url": "https://blockstream.info/tx/ab", "txid": "ab"})
        );
    }

    #[test]
    fn error_message_carries_text() {
        let message = ServerMessage::from_json(r#"{"action":"error_message","error":"boom"}"#).unwrap();
        assert_eq!(message, ServerMessage::error("boom"));
        assert_eq!(message.tag(), "error_message");
    }

    #[test]
    fn unknown_tag_is_reported_by_name() {
        let err = ServerMessage::from_json(r#"{"action":"channel_closed"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownAction(ref tag) if tag == "channel_closed"));
    }

    #[test]
    fn missing_action_and_bad_json_are_distinct() {
        assert!(matches!(
            ServerMessage::from_json(r#"{"error":"x"}"#),
            Err(ProtocolError::MissingAction)
        ));
        assert!(matches!(
            ServerMessage::from_json("not json"),
            Err(ProtocolError::InvalidJson(_))
        ));
        assert!(matches!(
            ServerMessage::from_json(r#"{"action":"error_message"}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn every_server_tag_is_listed() {
        let samples = [
            ServerMessage::Registered,
            ServerMessage::Connected { data: None },
            ServerMessage::ConfirmedCapacity,
            ServerMessage::ConfirmedChainFee,
            ServerMessage::PaymentRequest(PaymentRequestDetails::default()),
            ServerMessage::ReceivePayment,
            ServerMessage::ChannelOpen(ChannelOpenDetails::default()),
            ServerMessage::error("x"),
        ];
        for sample in samples {
            assert!(SERVER_ACTIONS.contains(&sample.tag()));
        }
    }
}
