//! # Dynamic gRPC Transport
//!
//! The low-level pieces used to perform a call without generated client code.
//!
//! * [`channel`] builds the plaintext channel to the target server.
//! * [`codec`] moves [`prost_reflect::DynamicMessage`]s over the wire.
//! * [`stub`] is the per-service client the engine invokes methods on.
use crate::BoxError;

pub mod channel;
pub mod codec;
pub mod stub;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid target '{target}': {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("Internal error, the client was not ready: '{0}'")]
    ClientNotReady(#[source] BoxError),

    #[error("Call failed with status '{}': {}", .0.code(), .0.message())]
    Status(#[from] tonic::Status),

    #[error("Invalid request path '{0}'")]
    InvalidPath(String),
}
