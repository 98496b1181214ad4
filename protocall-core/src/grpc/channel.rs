//! Plaintext channel construction.
use super::TransportError;
use crate::request::ConnectTarget;
use tonic::transport::{Channel, Endpoint};

/// Builds an insecure channel to `target`.
///
/// The channel connects lazily, so an unreachable server surfaces on the first call rather
/// than here.
pub fn open_channel(target: &ConnectTarget) -> Result<Channel, TransportError> {
    let uri = target.uri();

    let endpoint = Endpoint::from_shared(uri.clone())
        .map_err(|source| TransportError::InvalidTarget { target: uri, source })?;

    tracing::debug!(server = %target, "Opened channel");

    Ok(endpoint.connect_lazy())
}
