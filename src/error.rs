//! The error type shared by every client operation.
//!
//! Errors are grouped the way a caller reacts to them:
//!
//! - **Construction** ([`StreamLoadError::NoEndpoints`], [`StreamLoadError::InvalidEndpoint`],
//!   [`StreamLoadError::MissingConfig`]) never reach the network.
//! - **Transport** ([`StreamLoadError::Transport`], [`StreamLoadError::RedirectTransport`])
//!   wrap the last [`TransportError`] after failover gave up.
//! - **Protocol** ([`StreamLoadError::MissingLocation`], [`StreamLoadError::RedirectLoop`],
//!   [`StreamLoadError::Decode`]) mean the
//!   server answered with something the protocol does not allow.
//! - **Application** ([`StreamLoadError::HttpStatus`], [`StreamLoadError::Status`]) carry the
//!   decoded [`ServerReply`] so counters such as rejected rows stay inspectable.

use crate::response::ServerReply;
use crate::transport::TransportError;
use std::fmt;
use thiserror::Error;

/// The protocol call an error was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    StreamLoad,
    BeginTransaction,
    LoadTransaction,
    PrepareTransaction,
    CommitTransaction,
    RollbackTransaction,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StreamLoad => "stream load",
            Self::BeginTransaction => "begin transaction",
            Self::LoadTransaction => "transaction load",
            Self::PrepareTransaction => "prepare transaction",
            Self::CommitTransaction => "commit transaction",
            Self::RollbackTransaction => "rollback transaction",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum StreamLoadError {
    // =========================================================================
    // === Construction
    // =========================================================================
    #[error("at least one endpoint is required")]
    NoEndpoints,

    #[error("invalid endpoint '{input}': {reason}")]
    InvalidEndpoint { input: String, reason: String },

    #[error("missing client configuration: {0}")]
    MissingConfig(&'static str),

    // =========================================================================
    // === Request preparation
    // =========================================================================
    #[error("{operation}: failed to prepare payload")]
    Payload {
        operation: Operation,
        #[source]
        source: anyhow::Error,
    },

    // =========================================================================
    // === Transport
    // =========================================================================
    #[error("{operation}: failed to send request after {attempts} attempt(s)")]
    Transport {
        operation: Operation,
        attempts: usize,
        #[source]
        source: TransportError,
    },

    #[error("{operation}: failed to send redirect request to {location}")]
    RedirectTransport {
        operation: Operation,
        location: String,
        #[source]
        source: TransportError,
    },

    // =========================================================================
    // === Protocol
    // =========================================================================
    #[error("{operation}: received 307 redirect without Location header")]
    MissingLocation { operation: Operation },

    #[error("{operation}: redirected again by {location}; only one hop is followed")]
    RedirectLoop {
        operation: Operation,
        location: String,
    },

    #[error("{operation}: failed to parse response (HTTP {status})")]
    Decode {
        operation: Operation,
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    // =========================================================================
    // === Application
    // =========================================================================
    #[error("{operation} failed with status {status}: {}", .reply.message())]
    HttpStatus {
        operation: Operation,
        status: u16,
        reply: Box<ServerReply>,
    },

    #[error("{operation} failed: {}", .reply.message())]
    Status {
        operation: Operation,
        expected: &'static str,
        reply: Box<ServerReply>,
    },
}

impl StreamLoadError {
    /// The operation that failed, when the error came from a protocol call.
    #[must_use]
    pub const fn operation(&self) -> Option<Operation> {
        match self {
            Self::NoEndpoints | Self::InvalidEndpoint { .. } | Self::MissingConfig(_) => None,
            Self::Payload { operation, .. }
            | Self::Transport { operation, .. }
            | Self::RedirectTransport { operation, .. }
            | Self::MissingLocation { operation }
            | Self::RedirectLoop { operation, .. }
            | Self::Decode { operation, .. }
            | Self::HttpStatus { operation, .. }
            | Self::Status { operation, .. } => Some(*operation),
        }
    }

    /// The decoded server reply attached to an application failure.
    #[must_use]
    pub fn reply(&self) -> Option<&ServerReply> {
        match self {
            Self::HttpStatus { reply, .. } | Self::Status { reply, .. } => Some(reply),
            _ => None,
        }
    }

    /// Consume the error and keep only the attached reply.
    #[must_use]
    pub fn into_reply(self) -> Option<ServerReply> {
        match self {
            Self::HttpStatus { reply, .. } | Self::Status { reply, .. } => Some(*reply),
            _ => None,
        }
    }

    /// `true` for errors raised because no endpoint could be reached.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::RedirectTransport { .. })
    }
}

pub type Result<T, E = StreamLoadError> = std::result::Result<T, E>;
