//! Signaling core for the sigrelay relay
//!
//! Transport-agnostic building blocks shared by the relay server and its
//! polling clients:
//!
//! - [`message`]: typed messages and the JSON wire codec
//! - [`candidate`]: candidate admission policy and descriptor parsing
//! - [`store`]: the in-memory session store behind the relay
//! - [`signaling`]: the client-side [`Signaling`] trait
//!
//! # Example
//!
//! ```
//! use sigrelay_core::{SdpType, SessionStore};
//! use serde_json::json;
//!
//! let store = SessionStore::new();
//! store.upsert("s1", SdpType::Offer, Some(json!("v=0")), None);
//!
//! let slot = store.get("s1", SdpType::Offer).unwrap();
//! assert_eq!(slot.sdp, json!("v=0"));
//! assert!(store.get("s1", SdpType::Answer).is_none());
//! ```

pub mod candidate;
pub mod error;
pub mod message;
pub mod signaling;
pub mod store;

pub use candidate::{CandidateDescriptor, CandidateFilter, Rejection};
pub use error::{Error, Result};
pub use message::{
    decode, decode_slot_sdp, decode_str, encode, Candidate, EncodeMode, Message, SdpType,
    SessionDescription, WireKind,
};
pub use signaling::{ConnectionState, Signaling};
pub use store::{FieldOutcome, SessionStore, Slot, UpsertOutcome};
