//! Tool catalogs: where the list of installable tools comes from.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::ProvisionError;

/// A source of tool identifiers.
///
/// Dyn-safe on purpose — the gateway holds an `Arc<dyn ToolCatalog>`
/// chosen by configuration and doesn't care which implementation is
/// behind it.
#[async_trait]
pub trait ToolCatalog: Send + Sync {
    /// Returns the tools a session should attempt to provision.
    async fn discover(&self) -> Result<Vec<String>, ProvisionError>;
}

// ---------------------------------------------------------------------------
// StaticCatalog
// ---------------------------------------------------------------------------

/// A fixed, operator-supplied allow-list. No discovery runs at all.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    tools: Vec<String>,
}

impl StaticCatalog {
    pub fn new(tools: Vec<String>) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl ToolCatalog for StaticCatalog {
    async fn discover(&self) -> Result<Vec<String>, ProvisionError> {
        Ok(self.tools.clone())
    }
}

// ---------------------------------------------------------------------------
// EngineCatalog
// ---------------------------------------------------------------------------

/// Live discovery: asks the engine for its declared capability list.
///
/// Runs the configured listing command under a time budget and parses one
/// tool identifier per output line. Any failure — spawn error, nonzero
/// exit, timeout — falls back to the static list instead of propagating,
/// so a misbehaving engine can't keep sessions from starting.
pub struct EngineCatalog {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    fallback: Vec<String>,
}

impl EngineCatalog {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        timeout: Duration,
        fallback: Vec<String>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
            fallback,
        }
    }

    /// Runs the listing command once. Split from `discover` so the
    /// fallback decision sits in exactly one place.
    async fn query(&self) -> Result<Vec<String>, ProvisionError> {
        let run = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| ProvisionError::DiscoveryTimeout)?
            .map_err(ProvisionError::DiscoverySpawn)?;

        if !output.status.success() {
            return Err(ProvisionError::DiscoveryFailed);
        }

        let tools = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        Ok(tools)
    }
}

#[async_trait]
impl ToolCatalog for EngineCatalog {
    async fn discover(&self) -> Result<Vec<String>, ProvisionError> {
        match self.query().await {
            Ok(tools) => Ok(tools),
            Err(e) => {
                tracing::warn!(error = %e, "tool discovery failed, using fallback list");
                Ok(self.fallback.clone())
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_catalog_returns_configured_list() {
        let catalog = StaticCatalog::new(vec!["ripgrep".into(), "jq".into()]);

        let tools = catalog.discover().await.unwrap();

        assert_eq!(tools, vec!["ripgrep".to_string(), "jq".to_string()]);
    }

    #[tokio::test]
    async fn test_static_catalog_empty_list_is_valid() {
        let catalog = StaticCatalog::new(Vec::new());
        assert!(catalog.discover().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_engine_catalog_parses_one_tool_per_line() {
        // `printf` is a portable way to produce a known multi-line listing.
        let catalog = EngineCatalog::new(
            "printf",
            vec!["ripgrep\\njq\\n\\n  fd  \\n".into()],
            Duration::from_secs(5),
            vec!["fallback".into()],
        );

        let tools = catalog.discover().await.unwrap();

        assert_eq!(
            tools,
            vec!["ripgrep".to_string(), "jq".to_string(), "fd".to_string()]
        );
    }

    #[tokio::test]
    async fn test_engine_catalog_missing_binary_falls_back() {
        let catalog = EngineCatalog::new(
            "/definitely/not/a/binary",
            vec![],
            Duration::from_secs(1),
            vec!["ripgrep".into()],
        );

        let tools = catalog.discover().await.unwrap();

        assert_eq!(tools, vec!["ripgrep".to_string()]);
    }

    #[tokio::test]
    async fn test_engine_catalog_nonzero_exit_falls_back() {
        let catalog = EngineCatalog::new(
            "false",
            vec![],
            Duration::from_secs(5),
            vec!["jq".into()],
        );

        let tools = catalog.discover().await.unwrap();

        assert_eq!(tools, vec!["jq".to_string()]);
    }

    #[tokio::test]
    async fn test_engine_catalog_timeout_falls_back() {
        let catalog = EngineCatalog::new(
            "sleep",
            vec!["5".into()],
            Duration::from_millis(50),
            vec!["fd".into()],
        );

        let tools = catalog.discover().await.unwrap();

        assert_eq!(tools, vec!["fd".to_string()]);
    }
}
