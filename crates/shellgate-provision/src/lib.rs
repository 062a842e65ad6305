//! Tool plugin provisioning for Shellgate.
//!
//! Before a terminal session starts, the gateway tries to make the
//! engine's auxiliary command plugins available in the user's environment.
//! Two pieces:
//!
//! 1. **Catalog** ([`ToolCatalog`]) — where the tool list comes from.
//!    [`EngineCatalog`] asks the engine itself (with a bounded timeout and
//!    a static fallback); [`StaticCatalog`] is an operator allow-list that
//!    bypasses discovery entirely. Configuration picks one.
//! 2. **Provisioner** ([`Provisioner`]) — attempts installation of each
//!    tool with a per-tool timeout, streaming one human-readable progress
//!    line per attempt.
//!
//! Provisioning is strictly best-effort: a tool that fails to install
//! degrades the session, it never blocks it. The provisioner therefore has
//! no error return at all — failures become progress text and log lines.

#![allow(async_fn_in_trait)]

mod catalog;
mod error;
mod provisioner;

pub use catalog::{EngineCatalog, StaticCatalog, ToolCatalog};
pub use error::ProvisionError;
pub use provisioner::Provisioner;
