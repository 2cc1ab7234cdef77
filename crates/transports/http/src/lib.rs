//! HTTP transport for the signaling relay
//!
//! Two halves share this crate:
//!
//! - [`RelayServer`]: axum server holding per-session offer/answer slots
//! - [`HttpSignalingClient`]: polling peer implementing
//!   [`sigrelay_core::Signaling`] over reqwest
//!
//! # Usage
//!
//! ## Server
//!
//! ```no_run
//! use sigrelay_http::{RelayServer, RelayServerConfig};
//!
//! # async fn example() -> sigrelay_http::Result<()> {
//! let server = RelayServer::new(RelayServerConfig::new("0.0.0.0:3000"))?;
//! server.serve().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Client
//!
//! See [`client`] for a full offer/answer exchange.

pub mod client;
pub mod config;
pub mod error;
pub mod server;

pub use client::{ClientHandle, HttpSignalingClient};
pub use config::{RelayServerConfig, SignalingConfig, DEFAULT_PORT};
pub use error::{Error, Result};
pub use server::{build_router, RelayServer};
