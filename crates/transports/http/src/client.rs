//! HTTP polling client for the signaling relay
//!
//! Each peer writes into its own slot (`offer` or `answer`) and polls the
//! other one at a fixed interval. The client remembers the last `sdp` and
//! `candidate` it returned and only surfaces a slot field when it changed.
//!
//! # Usage
//!
//! ```no_run
//! use sigrelay_core::{Message, SdpType, SessionDescription, Signaling};
//! use sigrelay_http::{HttpSignalingClient, SignalingConfig};
//!
//! # async fn example() -> sigrelay_http::Result<()> {
//! let config = SignalingConfig::new("http://localhost:3000", "s1", SdpType::Offer);
//! let mut signaling = HttpSignalingClient::new(config)?;
//!
//! signaling.connect().await?;
//! signaling.send(&SessionDescription::offer("v=0...").into()).await?;
//!
//! if let Message::SessionDescription(answer) = signaling.receive().await? {
//!     println!("answer: {}", answer.sdp);
//! }
//! signaling.disconnect().await?;
//! # Ok(())
//! # }
//! ```
//!
//! A slot only holds the latest value of each field. Candidates posted faster
//! than the poll interval overwrite each other and only the last one is seen.

use crate::config::SignalingConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use sigrelay_core::{
    decode, decode_slot_sdp, encode, ConnectionState, EncodeMode, Message, SdpType, Signaling,
    Slot,
};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

const STATE_CONNECTING: u8 = 0;
const STATE_EXCHANGING: u8 = 1;
const STATE_CLOSED: u8 = 2;

fn state_from_u8(raw: u8) -> ConnectionState {
    match raw {
        STATE_CONNECTING => ConnectionState::Connecting,
        STATE_EXCHANGING => ConnectionState::Exchanging,
        _ => ConnectionState::Closed,
    }
}

/// Cloneable handle that can close a client from another task
///
/// Closing is cooperative: a poll already in flight completes, the next loop
/// iteration sees the flag and returns [`Message::Terminate`].
#[derive(Debug, Clone)]
pub struct ClientHandle {
    state: Arc<AtomicU8>,
}

impl ClientHandle {
    pub fn close(&self) {
        self.state.store(STATE_CLOSED, Ordering::SeqCst);
    }

    pub fn state(&self) -> ConnectionState {
        state_from_u8(self.state.load(Ordering::SeqCst))
    }
}

/// Polling signaling client for one peer of a session
pub struct HttpSignalingClient {
    config: SignalingConfig,

    /// `{base_url}/signaling/{session_id}`
    session_url: reqwest::Url,

    /// Reqwest HTTP client
    client: reqwest::Client,

    state: Arc<AtomicU8>,

    /// Last slot values returned by `receive`
    last_sdp: Option<Value>,
    last_candidate: Option<Value>,
}

impl HttpSignalingClient {
    /// Create a client; no request is issued until `send`/`receive`
    pub fn new(config: SignalingConfig) -> Result<Self> {
        config.validate()?;

        let mut session_url = reqwest::Url::parse(&config.base_url).map_err(|e| {
            Error::ConnectionError(format!("Invalid base_url {}: {}", config.base_url, e))
        })?;
        session_url
            .path_segments_mut()
            .map_err(|_| {
                Error::ConnectionError(format!("base_url cannot be a base: {}", config.base_url))
            })?
            .pop_if_empty()
            .push("signaling")
            .push(&config.session_id);

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::ConnectionError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            session_url,
            client,
            state: Arc::new(AtomicU8::new(STATE_CONNECTING)),
            last_sdp: None,
            last_candidate: None,
        })
    }

    pub fn config(&self) -> &SignalingConfig {
        &self.config
    }

    /// Slot this client writes into
    pub fn role(&self) -> SdpType {
        self.config.role
    }

    /// Slot this client polls
    pub fn counterpart(&self) -> SdpType {
        self.config.role.counterpart()
    }

    pub fn session_url(&self) -> &reqwest::Url {
        &self.session_url
    }

    pub fn handle(&self) -> ClientHandle {
        ClientHandle {
            state: Arc::clone(&self.state),
        }
    }

    fn current_state(&self) -> ConnectionState {
        state_from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: ConnectionState) {
        let raw = match state {
            ConnectionState::Connecting => STATE_CONNECTING,
            ConnectionState::Exchanging => STATE_EXCHANGING,
            ConnectionState::Closed => STATE_CLOSED,
        };
        self.state.store(raw, Ordering::SeqCst);
    }

    /// GET the counterpart's slot; `None` while it does not exist yet
    async fn fetch_slot(&self) -> Result<Option<Slot>> {
        let response = self
            .client
            .get(self.session_url.clone())
            .query(&[("type", self.counterpart().as_str())])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = check_status(response).await?;
        let body = response.bytes().await?;
        let slot = serde_json::from_slice::<Slot>(&body).map_err(sigrelay_core::Error::from)?;
        Ok(Some(slot))
    }

    /// Surface the first slot field that changed since the last call
    ///
    /// The cache is updated before decoding, so a malformed value is reported
    /// once rather than on every poll.
    fn observe(&mut self, slot: Slot) -> Result<Option<Message>> {
        if slot.has_sdp() && self.last_sdp.as_ref() != Some(&slot.sdp) {
            let message = decode_slot_sdp(self.counterpart(), &slot.sdp);
            self.last_sdp = Some(slot.sdp);
            return Ok(Some(message?));
        }

        if slot.has_candidate() && self.last_candidate.as_ref() != Some(&slot.candidate) {
            let message = decode(&slot.candidate);
            self.last_candidate = Some(slot.candidate);
            return Ok(Some(message?));
        }

        Ok(None)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(Error::UnexpectedStatus { status, body })
}

#[async_trait]
impl Signaling for HttpSignalingClient {
    type Error = Error;

    async fn connect(&mut self) -> Result<()> {
        // A close from a ClientHandle must not be overwritten
        let _ = self.state.compare_exchange(
            STATE_CONNECTING,
            STATE_EXCHANGING,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        Ok(())
    }

    /// POST `message` into this peer's slot in nested form
    async fn send(&mut self, message: &Message) -> Result<()> {
        if self.current_state().is_closed() {
            return Err(Error::InvalidState("Signaling client is closed".to_string()));
        }

        let body = encode(message, EncodeMode::Nested)?;

        let response = self
            .client
            .post(self.session_url.clone())
            .query(&[("type", self.role().as_str())])
            .json(&body)
            .send()
            .await?;
        check_status(response).await?;

        debug!(
            session_id = %self.config.session_id,
            role = %self.role(),
            "Posted signaling message"
        );
        Ok(())
    }

    async fn receive(&mut self) -> Result<Message> {
        let mut polls: u32 = 0;

        loop {
            if self.current_state().is_closed() {
                return Ok(Message::Terminate);
            }

            tokio::time::sleep(self.config.poll_interval()).await;

            if self.current_state().is_closed() {
                return Ok(Message::Terminate);
            }

            match self.fetch_slot().await? {
                None => debug!(
                    session_id = %self.config.session_id,
                    slot = %self.counterpart(),
                    "Counterpart not connected yet"
                ),
                Some(slot) => {
                    if let Some(message) = self.observe(slot)? {
                        return Ok(message);
                    }
                }
            }

            polls += 1;
            if let Some(max_polls) = self.config.max_polls {
                if polls >= max_polls {
                    return Err(Error::PollLimitReached {
                        session_id: self.config.session_id.clone(),
                        polls,
                    });
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.set_state(ConnectionState::Closed);
        Ok(())
    }

    /// DELETE the session on the relay, then close
    async fn disconnect(&mut self) -> Result<()> {
        let response = self.client.delete(self.session_url.clone()).send().await?;
        check_status(response).await?;

        self.set_state(ConnectionState::Closed);
        info!(session_id = %self.config.session_id, "Signaling session deleted");
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.current_state()
    }
}
