//! Unified error type for the gateway.

use shellgate_auth::{AuthError, StoreError};
use shellgate_protocol::ProtocolError;
use shellgate_provision::ProvisionError;
use shellgate_sandbox::SandboxError;
use shellgate_terminal::TerminalError;

/// Top-level error that wraps all layer-specific errors.
///
/// Callers embedding the gateway deal with this single type; the `#[from]`
/// attributes let `?` convert layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A wire-protocol error (encode, decode, invalid event).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A credential or token error.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A registry storage error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A sandbox violation or sandboxed-IO error.
    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    /// A tool discovery error.
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    /// A pty supervision error.
    #[error(transparent)]
    Terminal(#[from] TerminalError),

    /// A WebSocket transport error.
    #[error("socket error: {0}")]
    Socket(#[from] axum::Error),

    /// A listener or other I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_auth_error() {
        let err: GatewayError = AuthError::InvalidCredentials.into();
        assert!(matches!(err, GatewayError::Auth(_)));
        assert_eq!(err.to_string(), "invalid credentials");
    }

    #[test]
    fn test_from_sandbox_error() {
        let err: GatewayError = SandboxError::AccessDenied.into();
        assert!(matches!(err, GatewayError::Sandbox(_)));
        assert_eq!(err.to_string(), "access denied");
    }

    #[test]
    fn test_from_terminal_error() {
        let err: GatewayError = TerminalError::ProcessGone.into();
        assert!(matches!(err, GatewayError::Terminal(_)));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: GatewayError =
            ProtocolError::InvalidEvent("bad".into()).into();
        assert!(matches!(err, GatewayError::Protocol(_)));
        assert!(err.to_string().contains("bad"));
    }
}
