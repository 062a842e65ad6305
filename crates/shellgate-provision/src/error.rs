//! Error types for the provisioning layer.

/// Errors from tool discovery.
///
/// Install failures are deliberately not represented here — installation
/// is best-effort and reports through progress text, not errors.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// Launching the discovery command failed.
    #[error("discovery failed to start: {0}")]
    DiscoverySpawn(#[source] std::io::Error),

    /// The discovery command ran but reported failure.
    #[error("discovery exited unsuccessfully")]
    DiscoveryFailed,

    /// The discovery command exceeded its time budget.
    #[error("discovery timed out")]
    DiscoveryTimeout,
}
