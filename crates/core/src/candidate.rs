//! Candidate admission policy and descriptor parsing
//!
//! The relay consults [`CandidateFilter`] before storing a candidate. Two kinds
//! of candidates are never relayed:
//!
//! - those tagged with media id `"3"`, a line reserved for local use
//! - host-only addresses (mDNS `*.local` names) the remote peer cannot resolve
//!
//! A rejected candidate is dropped silently; the writer still gets a success
//! response.

use crate::error::{Error, Result};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Media id that is never negotiated over the relay
pub const RESERVED_SDP_MID: &str = "3";

/// Substring marking an mDNS host-local candidate address
pub const HOST_LOCAL_MARKER: &str = ".local";

/// Why a candidate was not stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// `sdpMid` is the reserved media id
    ReservedMid,
    /// Candidate text contains a host-local address
    HostLocal,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::ReservedMid => write!(f, "reserved sdpMid {:?}", RESERVED_SDP_MID),
            Rejection::HostLocal => write!(f, "host-local address"),
        }
    }
}

/// Accept/reject policy applied to inbound candidates
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateFilter;

impl CandidateFilter {
    pub fn new() -> Self {
        Self
    }

    /// Check a candidate as posted to the relay
    ///
    /// Members that are missing or not strings never match a rule.
    pub fn check(&self, candidate: &Value) -> std::result::Result<(), Rejection> {
        if candidate.get("sdpMid").and_then(Value::as_str) == Some(RESERVED_SDP_MID) {
            return Err(Rejection::ReservedMid);
        }

        let text = candidate.get("candidate").and_then(Value::as_str);
        if text.is_some_and(|t| t.contains(HOST_LOCAL_MARKER)) {
            return Err(Rejection::HostLocal);
        }

        Ok(())
    }
}

/// Attributes of a candidate descriptor (RFC 8839 `candidate-attribute`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateDescriptor {
    pub foundation: String,
    pub component: u16,
    pub protocol: String,
    pub priority: u32,
    pub address: String,
    pub port: u16,
    /// `host`, `srflx`, `prflx` or `relay`
    pub kind: String,
    pub related_address: Option<String>,
    pub related_port: Option<u16>,
    pub tcp_type: Option<String>,
}

impl FromStr for CandidateDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let descriptor = s.strip_prefix(crate::message::CANDIDATE_PREFIX).unwrap_or(s);
        let fields: Vec<&str> = descriptor.split_whitespace().collect();

        if fields.len() < 8 || fields[6] != "typ" {
            return Err(Error::MalformedMessage(format!(
                "invalid candidate descriptor: {}",
                s
            )));
        }

        let mut parsed = CandidateDescriptor {
            foundation: fields[0].to_string(),
            component: parse_number(fields[1], "component")?,
            protocol: fields[2].to_lowercase(),
            priority: parse_number(fields[3], "priority")?,
            address: fields[4].to_string(),
            port: parse_number(fields[5], "port")?,
            kind: fields[7].to_string(),
            related_address: None,
            related_port: None,
            tcp_type: None,
        };

        // Trailing extensions come as name/value pairs; unknown ones are skipped
        for pair in fields[8..].chunks(2) {
            let [name, value] = pair else { break };
            match *name {
                "raddr" => parsed.related_address = Some(value.to_string()),
                "rport" => parsed.related_port = Some(parse_number(value, "rport")?),
                "tcptype" => parsed.tcp_type = Some(value.to_string()),
                _ => {}
            }
        }

        Ok(parsed)
    }
}

fn parse_number<T: FromStr>(field: &str, name: &str) -> Result<T> {
    field
        .parse()
        .map_err(|_| Error::MalformedMessage(format!("invalid candidate {}: {:?}", name, field)))
}
