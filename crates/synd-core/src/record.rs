//! Decoded signed-record payloads.
//!
//! Signature verification happens upstream. This module only exposes the
//! claims the resolver needs from an already-decoded payload.

use crate::error::{SyndError, SyndResult};
use crate::types::{PipeId, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Message-kind discriminator carried by every signed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Subject,
    SyndicateRequest,
    Query,
    QueryResult,
    MessageAck,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Subject => write!(f, "subject"),
            MessageKind::SyndicateRequest => write!(f, "syndicate_request"),
            MessageKind::Query => write!(f, "query"),
            MessageKind::QueryResult => write!(f, "query_result"),
            MessageKind::MessageAck => write!(f, "message_ack"),
            MessageKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// A decoded signed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedRecord {
    #[serde(rename = "jti")]
    pub record_id: RecordId,

    #[serde(rename = "pn_typ")]
    pub kind: MessageKind,

    #[serde(rename = "pn_pipe", default, skip_serializing_if = "Option::is_none")]
    pub privacy_pipe: Option<PipeId>,

    #[serde(rename = "pn_subject", default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Value>,
}

impl SignedRecord {
    /// Build a subject record.
    pub fn subject(record_id: impl Into<RecordId>, pipe: impl Into<PipeId>, subject: Value) -> Self {
        Self {
            record_id: record_id.into(),
            kind: MessageKind::Subject,
            privacy_pipe: Some(pipe.into()),
            subject: Some(subject),
        }
    }

    /// Decode from a JSON payload.
    pub fn from_json(payload: &Value) -> SyndResult<Self> {
        serde_json::from_value(payload.clone())
            .map_err(|e| SyndError::Record(format!("undecodable record payload: {}", e)))
    }

    pub fn is_subject(&self) -> bool {
        self.kind == MessageKind::Subject
    }
}
