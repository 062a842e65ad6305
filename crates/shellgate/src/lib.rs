//! # Shellgate
//!
//! A multi-tenant interactive session gateway: each user authenticates,
//! gets a sandboxed home directory, and drives an interactive
//! command-line AI tool over a persistent WebSocket, with HTTP endpoints
//! for browsing and editing files inside the sandbox.
//!
//! The meta-crate ties the layers together: configuration, the HTTP
//! surface, and the per-connection session supervisor.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use shellgate::{Gateway, GatewayConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), shellgate::GatewayError> {
//!     let gateway = Gateway::bind(GatewayConfig::from_env()).await?;
//!     gateway.run().await
//! }
//! ```

mod config;
mod error;
mod http;
mod server;
mod ws;

pub use config::{EngineConfig, GatewayConfig, ProvisionConfig};
pub use error::GatewayError;
pub use server::{build_router, AppState, Gateway};

// Re-exported so binaries, integration tests, and embedding callers can
// speak the wire protocol and mint/verify tokens without naming the
// sub-crates directly.
pub use shellgate_auth::{NewUser, SessionClaims, TokenKeys, User};
pub use shellgate_protocol::{ClientEvent, ServerEvent, UserSummary};
