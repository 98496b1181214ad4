//! # Invocation Errors
//!
//! [`InvocationError`] is the single error returned by the engine. It wraps the error of the
//! module that failed, and [`InvocationError::stage`] tells where in the pipeline that was.
use crate::bindings::LoadError;
use crate::compiler::CompileError;
use crate::grpc::TransportError;
use crate::marshal::MarshalError;
use crate::request::RequestError;
use crate::resolver::ResolutionError;
use crate::workspace::WorkspaceError;
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Marshal(#[from] MarshalError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The call succeeded but its workspace could not be removed.
    #[error("Invocation succeeded but cleanup failed: {0}")]
    Cleanup(#[source] WorkspaceError),
}

/// The pipeline stage an invocation failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Request,
    Compile,
    Load,
    Resolve,
    Connect,
    Invoke,
    Convert,
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Request => "request",
            Stage::Compile => "compile",
            Stage::Load => "load",
            Stage::Resolve => "resolve",
            Stage::Connect => "connect",
            Stage::Invoke => "invoke",
            Stage::Convert => "convert",
            Stage::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

impl InvocationError {
    pub fn stage(&self) -> Stage {
        match self {
            InvocationError::Request(_) => Stage::Request,
            InvocationError::Compile(_) => Stage::Compile,
            InvocationError::Load(_) => Stage::Load,
            InvocationError::Resolution(_) => Stage::Resolve,
            InvocationError::Marshal(MarshalError::Mismatch { .. }) => Stage::Invoke,
            InvocationError::Marshal(MarshalError::Unmarshal { .. }) => Stage::Convert,
            InvocationError::Transport(TransportError::InvalidTarget { .. }) => Stage::Connect,
            InvocationError::Transport(_) => Stage::Invoke,
            InvocationError::Cleanup(_) => Stage::Cleanup,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_stage_of_wrapped_errors() {
        let err: InvocationError = ResolutionError::MalformedPath("OrderServiceGetOrder".into()).into();
        assert_eq!(err.stage(), Stage::Resolve);

        let err: InvocationError = TransportError::Status(tonic::Status::not_found("gone")).into();
        assert_eq!(err.stage(), Stage::Invoke);

        let err: InvocationError = CompileError::InvalidPackage(String::new()).into();
        assert_eq!(err.stage(), Stage::Compile);
        assert_eq!(err.stage().to_string(), "compile");
    }
}
