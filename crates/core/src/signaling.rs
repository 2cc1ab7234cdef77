//! Client-side signaling abstraction
//!
//! A [`Signaling`] implementation carries [`Message`]s between two peers until
//! their direct connection is up. The negotiation engine drives it:
//!
//! ```ignore
//! signaling.connect().await?;
//! signaling.send(&local_offer.into()).await?;
//! loop {
//!     match signaling.receive().await? {
//!         Message::SessionDescription(answer) => apply_answer(answer),
//!         Message::Candidate(candidate) => add_candidate(candidate),
//!         Message::Terminate => break,
//!     }
//! }
//! signaling.disconnect().await?;
//! ```

use crate::message::Message;
use async_trait::async_trait;
use std::fmt;

/// Lifecycle of a signaling client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created, `connect` not called yet
    Connecting,
    /// Ready to send and poll
    Exchanging,
    /// Torn down; `receive` yields `Terminate` without network traffic
    Closed,
}

impl ConnectionState {
    pub fn is_closed(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Exchanging => write!(f, "exchanging"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

/// Message exchange with the remote peer
///
/// Implementations must be `Send` so the negotiation loop can run on any
/// tokio worker.
#[async_trait]
pub trait Signaling: Send {
    /// Transport error type
    type Error: std::error::Error + Send + Sync + 'static;

    /// Mark the client ready for exchange
    async fn connect(&mut self) -> Result<(), Self::Error>;

    /// Deliver one message to the remote peer, without retrying
    async fn send(&mut self, message: &Message) -> Result<(), Self::Error>;

    /// Wait for the next message from the remote peer
    ///
    /// Returns [`Message::Terminate`] once the client is closed.
    async fn receive(&mut self) -> Result<Message, Self::Error>;

    /// Release local resources without notifying the remote side
    async fn close(&mut self) -> Result<(), Self::Error>;

    /// Tear down the exchange on the remote side, then close
    async fn disconnect(&mut self) -> Result<(), Self::Error>;

    /// Current lifecycle state
    fn state(&self) -> ConnectionState;
}
