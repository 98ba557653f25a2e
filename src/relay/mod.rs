//! Request/response relay between the renderer side and the main side
//!
//! ```text
//!  renderer                           main
//!  RelayClient::send(channel, p) ──▶ Transport ──▶ Dispatcher ──▶ handler
//!        ▲                                                          │
//!        └──── once(correlation id) ◀── Responder::respond ◀────────┘
//! ```
//!
//! Every request carries a correlation id; the response is emitted on that id and
//! only the listener registered for it receives it.

pub mod bus;
pub mod client;
pub mod dispatcher;
pub mod envelope;

use serde_json::Value;
use thiserror::Error;

pub use bus::LocalBus;
pub use client::{PendingResponse, RelayClient, Transport};
pub use dispatcher::{Dispatcher, Responder};
pub use envelope::{Payload, Request};

/// Failures seen by the sending side of the relay
#[derive(Debug, Error)]
pub enum RelayError {
    /// The cross-process messaging primitive could not be obtained
    #[error("Unable to load the relay transport")]
    TransportUnavailable,

    /// The response carried an `error` field
    #[error("request rejected: {}", display_error_value(.0))]
    Rejected(Value),

    /// The listener was dropped without a response (transport shut down)
    #[error("response listener dropped before a response arrived")]
    Dropped,

    /// The transport refused the request
    #[error("transport closed: {0}")]
    Closed(String),

    /// A payload did not have the expected shape
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl RelayError {
    /// Error value of a rejected response
    pub fn rejection(&self) -> Option<&Value> {
        match self {
            RelayError::Rejected(value) => Some(value),
            _ => None,
        }
    }
}

fn display_error_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
