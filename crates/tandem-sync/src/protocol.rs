//! Wire messages exchanged between two peers.
//!
//! Every frame is one JSON-encoded [`PeerMessage`]. Requests carry a fresh
//! [`RequestId`] so the answer can be routed back to the waiting caller; the
//! [`TransactionId`] inside a request names the remote chain it belongs to.
//!
//! | Request | Answer |
//! |---|---|
//! | [`Request::CreateRemoteInteractionChain`] | [`Response::ChainCreated`] |
//! | [`Request::AppendRemoteInteraction`] | [`Response::FollowUps`] |
//! | [`Request::ApplyRemoteGsus`] | none |
//! | [`Request::AbortRemoteGsus`] | none |
//!
//! Any request that expects an answer may instead get [`Response::Error`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use tandem_core::{Interaction, RemoteChainId, TransactionId};

/// Key of one request in the correlation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req:{}", self.0)
    }
}

/// A request from the acting peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Open a remote chain for `transaction`.
    CreateRemoteInteractionChain {
        /// Transaction the chain belongs to.
        transaction: TransactionId,
    },
    /// Run `interaction` inside the open chain.
    AppendRemoteInteraction {
        /// Transaction the chain belongs to.
        transaction: TransactionId,
        /// The interaction to run.
        interaction: Interaction,
        /// Whether transcendent handling must not be mirrored back.
        suppress_follow_up: bool,
    },
    /// Commit the chain's updates.
    ApplyRemoteGsus {
        /// Transaction to commit.
        transaction: TransactionId,
    },
    /// Discard the chain.
    AbortRemoteGsus {
        /// Transaction to discard.
        transaction: TransactionId,
    },
}

impl Request {
    /// Transaction this request belongs to.
    #[must_use]
    pub const fn transaction(&self) -> TransactionId {
        match self {
            Self::CreateRemoteInteractionChain { transaction }
            | Self::AppendRemoteInteraction { transaction, .. }
            | Self::ApplyRemoteGsus { transaction }
            | Self::AbortRemoteGsus { transaction } => *transaction,
        }
    }

    /// Short name for logs and timeout errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateRemoteInteractionChain { .. } => "create remote chain",
            Self::AppendRemoteInteraction { .. } => "append remote interaction",
            Self::ApplyRemoteGsus { .. } => "apply remote updates",
            Self::AbortRemoteGsus { .. } => "abort remote updates",
        }
    }
}

/// An answer from the receiving peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// The chain is open.
    ChainCreated {
        /// Id the receiver gave it.
        chain: RemoteChainId,
    },
    /// The interaction ran; these follow-ups are for the acting peer.
    FollowUps {
        /// Follow-up interactions, in queue order.
        interactions: Vec<Interaction>,
    },
    /// The request was refused.
    Error {
        /// Human-readable reason.
        reason: String,
    },
}

/// One frame on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeerMessage {
    /// A request, keyed for correlation.
    Request {
        /// Correlation key.
        id: RequestId,
        /// The request.
        request: Request,
    },
    /// The answer to request `id`.
    Response {
        /// Correlation key of the request being answered.
        id: RequestId,
        /// The answer.
        response: Response,
    },
}

/// Frame encoding failure.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The bytes are not a valid message.
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encodes a message into a frame.
///
/// # Errors
///
/// Returns [`CodecError`] if serialization fails.
pub fn encode(message: &PeerMessage) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(message)?)
}

/// Decodes a frame.
///
/// # Errors
///
/// Returns [`CodecError`] if the frame is not a valid message.
pub fn decode(frame: &[u8]) -> Result<PeerMessage, CodecError> {
    Ok(serde_json::from_slice(frame)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::interaction::ControllerId;
    use tandem_core::position::{Direction, Position};

    #[test]
    fn append_request_keeps_interaction_payload() {
        let interaction = Interaction::use_at(Position::new(2, 3), Direction::West, ControllerId::new())
            .with_params(vec![2]);
        let message = PeerMessage::Request {
            id: RequestId::new(),
            request: Request::AppendRemoteInteraction {
                transaction: TransactionId::new(),
                interaction,
                suppress_follow_up: true,
            },
        };
        let decoded = decode(&encode(&message).unwrap()).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn frames_are_tagged_json() {
        let message = PeerMessage::Response {
            id: RequestId::new(),
            response: Response::ChainCreated {
                chain: RemoteChainId::new(7),
            },
        };
        let json: serde_json::Value = serde_json::from_slice(&encode(&message).unwrap()).unwrap();
        assert_eq!(json["kind"], "response");
        assert_eq!(json["response"]["type"], "chain_created");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode(b"{\"kind\":\"shout\"}").is_err());
        assert!(decode(b"not json").is_err());
    }

    #[test]
    fn every_request_names_its_transaction() {
        let transaction = TransactionId::new();
        assert_eq!(Request::CreateRemoteInteractionChain { transaction }.transaction(), transaction);
        assert_eq!(Request::ApplyRemoteGsus { transaction }.transaction(), transaction);
        assert_eq!(Request::AbortRemoteGsus { transaction }.transaction(), transaction);
        assert_eq!(Request::AbortRemoteGsus { transaction }.name(), "abort remote updates");
    }
}
