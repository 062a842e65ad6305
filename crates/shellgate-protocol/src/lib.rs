//! Wire protocol for Shellgate.
//!
//! This crate defines the "language" that browser clients and the gateway
//! speak over a terminal session's persistent connection:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`UserSummary`]) — the
//!   event structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those events are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (raw frames) and the
//! session supervisor (authentication, process ownership). It doesn't know
//! about connections, users, or processes — it only knows how to serialize
//! and deserialize events.
//!
//! ```text
//! Transport (frames) → Protocol (events) → Supervisor (session state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientEvent, ServerEvent, UserSummary};
