//! Signaling messages and their JSON wire codec
//!
//! Three messages travel through the relay:
//!
//! - [`SessionDescription`]: `{"type": "offer"|"answer", "sdp": "..."}`
//! - [`Candidate`]: `{"candidate": "candidate:...", "sdpMid": "0", "sdpMLineIndex": 0}`
//! - [`Message::Terminate`]: `{"type": "bye"}`
//!
//! Decoding first classifies the object into a [`WireKind`] and then matches
//! on it exhaustively. Classification priority is description, then
//! candidate, then terminate, so an object carrying both `"type": "offer"`
//! and a `candidate` member decodes as a description.
//!
//! Encoding is only defined for descriptions and the terminate sentinel.
//! Candidates have no encoder; [`encode`] returns [`Error::Unsupported`].

use crate::candidate::CandidateDescriptor;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

/// Wire value of `type` for the terminate sentinel
pub const BYE_TYPE: &str = "bye";

/// Prefix browsers put in front of the candidate descriptor
pub const CANDIDATE_PREFIX: &str = "candidate:";

/// Negotiation role of a description, also the key of a relay slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    /// Sent by the initiating peer
    Offer,
    /// Sent by the responding peer
    Answer,
}

impl SdpType {
    /// Wire name (`offer` / `answer`)
    pub fn as_str(&self) -> &'static str {
        match self {
            SdpType::Offer => "offer",
            SdpType::Answer => "answer",
        }
    }

    /// The slot the other peer writes into
    pub fn counterpart(&self) -> SdpType {
        match self {
            SdpType::Offer => SdpType::Answer,
            SdpType::Answer => SdpType::Offer,
        }
    }
}

impl fmt::Display for SdpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SdpType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "offer" => Ok(SdpType::Offer),
            "answer" => Ok(SdpType::Answer),
            other => Err(Error::MalformedMessage(format!(
                "unknown description type: {:?}",
                other
            ))),
        }
    }
}

/// Session description exchanged during negotiation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    /// Offer or answer
    #[serde(rename = "type")]
    pub sdp_type: SdpType,

    /// SDP text
    pub sdp: String,
}

impl SessionDescription {
    pub fn new(sdp_type: SdpType, sdp: impl Into<String>) -> Self {
        Self {
            sdp_type,
            sdp: sdp.into(),
        }
    }

    pub fn offer(sdp: impl Into<String>) -> Self {
        Self::new(SdpType::Offer, sdp)
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self::new(SdpType::Answer, sdp)
    }
}

/// Connectivity candidate received from the counterpart
///
/// `candidate` holds the descriptor with the `candidate:` prefix removed,
/// e.g. `842163049 1 udp 1677729535 203.0.113.7 46154 typ srflx ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Descriptor text without the `candidate:` prefix
    pub candidate: String,

    /// Media stream identification tag
    pub sdp_mid: Option<String>,

    /// Index of the media description the candidate belongs to
    pub sdp_mline_index: Option<u32>,
}

impl Candidate {
    /// Parse the descriptor into its attributes
    pub fn descriptor(&self) -> Result<CandidateDescriptor> {
        self.candidate.parse()
    }
}

/// Typed signaling message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Offer or answer
    SessionDescription(SessionDescription),
    /// Connectivity candidate
    Candidate(Candidate),
    /// End of negotiation
    Terminate,
}

impl From<SessionDescription> for Message {
    fn from(description: SessionDescription) -> Self {
        Message::SessionDescription(description)
    }
}

impl From<Candidate> for Message {
    fn from(candidate: Candidate) -> Self {
        Message::Candidate(candidate)
    }
}

/// Shape of a session description on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodeMode {
    /// `{"type": t, "sdp": "..."}`
    #[default]
    Flat,
    /// `{"type": t, "sdp": {"type": t, "sdp": "..."}}`, the shape the relay
    /// stores and hands back to the polling counterpart
    Nested,
}

/// Discriminant computed from a wire object before decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireKind {
    Description(SdpType),
    Candidate,
    Terminate,
}

impl WireKind {
    /// Classify a wire object, `None` when no rule matches
    pub fn classify(object: &Map<String, Value>) -> Option<WireKind> {
        let type_field = object.get("type").and_then(Value::as_str);

        match type_field {
            Some("offer") => return Some(WireKind::Description(SdpType::Offer)),
            Some("answer") => return Some(WireKind::Description(SdpType::Answer)),
            _ => {}
        }

        if object.contains_key("candidate") {
            return Some(WireKind::Candidate);
        }

        if type_field == Some(BYE_TYPE) {
            return Some(WireKind::Terminate);
        }

        None
    }
}

/// Decode a wire value into a typed message
pub fn decode(value: &Value) -> Result<Message> {
    let object = value.as_object().ok_or_else(|| {
        Error::MalformedMessage(format!("expected a JSON object, got {}", value))
    })?;

    let kind = WireKind::classify(object).ok_or_else(|| {
        Error::MalformedMessage(format!("unrecognized message: {}", value))
    })?;

    match kind {
        WireKind::Description(sdp_type) => {
            let sdp = object
                .get("sdp")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    Error::MalformedMessage(format!("{} without string sdp", sdp_type))
                })?;
            Ok(Message::SessionDescription(SessionDescription::new(
                sdp_type, sdp,
            )))
        }
        WireKind::Candidate => decode_candidate(object).map(Message::Candidate),
        WireKind::Terminate => Ok(Message::Terminate),
    }
}

/// Decode JSON text into a typed message
pub fn decode_str(text: &str) -> Result<Message> {
    let value: Value = serde_json::from_str(text)?;
    decode(&value)
}

/// Decode the `sdp` member of a relay slot
///
/// Slots normally hold a full description object. A bare string is accepted
/// too and is attributed to the slot it was read from.
pub fn decode_slot_sdp(slot_type: SdpType, value: &Value) -> Result<Message> {
    match value {
        Value::String(sdp) => Ok(Message::SessionDescription(SessionDescription::new(
            slot_type,
            sdp.clone(),
        ))),
        other => decode(other),
    }
}

fn decode_candidate(object: &Map<String, Value>) -> Result<Candidate> {
    let text = object
        .get("candidate")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::MalformedMessage("candidate is not a string".to_string()))?;

    // "candidate:<descriptor>" -> "<descriptor>"
    let (_, descriptor) = text.split_once(':').ok_or_else(|| {
        Error::MalformedMessage(format!("candidate without {:?} prefix: {}", CANDIDATE_PREFIX, text))
    })?;

    let sdp_mid = match object.get("sdpMid") {
        None | Some(Value::Null) => None,
        Some(Value::String(mid)) => Some(mid.clone()),
        Some(other) => Some(other.to_string()),
    };

    let sdp_mline_index = match object.get("sdpMLineIndex") {
        None | Some(Value::Null) => None,
        Some(index) => Some(
            index
                .as_u64()
                .and_then(|i| u32::try_from(i).ok())
                .ok_or_else(|| {
                    Error::MalformedMessage(format!("invalid sdpMLineIndex: {}", index))
                })?,
        ),
    };

    Ok(Candidate {
        candidate: descriptor.to_string(),
        sdp_mid,
        sdp_mline_index,
    })
}

/// Encode a typed message into its wire value
pub fn encode(message: &Message, mode: EncodeMode) -> Result<Value> {
    match message {
        Message::SessionDescription(description) => {
            let flat = json!({
                "type": description.sdp_type.as_str(),
                "sdp": description.sdp,
            });
            Ok(match mode {
                EncodeMode::Flat => flat,
                EncodeMode::Nested => json!({
                    "type": description.sdp_type.as_str(),
                    "sdp": flat,
                }),
            })
        }
        Message::Terminate => Ok(json!({ "type": BYE_TYPE })),
        Message::Candidate(_) => Err(Error::Unsupported(
            "candidate encoding is not implemented".to_string(),
        )),
    }
}
