//! Gateway configuration.
//!
//! Plain structs with sensible defaults plus a [`GatewayConfig::from_env`]
//! constructor reading `SHELLGATE_*` variables — the deployment story is
//! "set a handful of env vars and run the binary". Everything is also
//! settable programmatically, which is how the integration tests build
//! throwaway gateways.

use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use shellgate_auth::DEFAULT_TOKEN_TTL;

/// Top-level gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address the HTTP/WebSocket listener binds to.
    pub bind_addr: String,

    /// Location of the user registry file.
    pub registry_path: PathBuf,

    /// Parent directory for defaulted user home directories.
    pub homes_root: PathBuf,

    /// HMAC secret for session tokens. When absent from the environment a
    /// random secret is generated, which means tokens do not survive a
    /// restart.
    pub signing_secret: Vec<u8>,

    /// Session token lifetime.
    pub token_ttl: Duration,

    /// Request body cap, which bounds file uploads.
    pub upload_limit: usize,

    /// The interactive engine spawned per session.
    pub engine: EngineConfig,

    /// Tool plugin provisioning.
    pub provision: ProvisionConfig,
}

/// The interactive engine: the child process every session runs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Engine binary. Defaults to a plain shell so a fresh checkout runs
    /// without any AI tooling installed.
    pub program: String,

    /// Arguments passed to the engine.
    pub args: Vec<String>,

    /// Name of the environment variable the engine reads its API
    /// credential from.
    pub api_key_var: String,

    /// Gateway-wide fallback credential for users without a personal one.
    pub default_api_key: Option<String>,

    /// Value for `TERM` inside sessions.
    pub term: String,
}

/// Tool provisioning configuration.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    /// Operator-supplied allow-list. When set, discovery is bypassed
    /// entirely and exactly these tools are attempted.
    pub tools_override: Option<Vec<String>>,

    /// Arguments that make the engine print its tool list, one per line.
    pub discover_args: Vec<String>,

    /// Time budget for the discovery command.
    pub discover_timeout: Duration,

    /// Tools assumed available when discovery fails or times out.
    pub fallback_tools: Vec<String>,

    /// Installer binary invoked as `<program> [args..] <tool>`. Empty
    /// disables installation.
    pub install_program: String,

    /// Leading arguments for the installer.
    pub install_args: Vec<String>,

    /// Time budget per tool install attempt.
    pub per_tool_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8717".to_string(),
            registry_path: PathBuf::from("data/users.json"),
            homes_root: PathBuf::from("data/homes"),
            signing_secret: ephemeral_secret(),
            token_ttl: DEFAULT_TOKEN_TTL,
            upload_limit: 10 * 1024 * 1024,
            engine: EngineConfig::default(),
            provision: ProvisionConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "bash".to_string(),
            args: Vec::new(),
            api_key_var: "API_KEY".to_string(),
            default_api_key: None,
            term: "xterm-256color".to_string(),
        }
    }
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            tools_override: None,
            discover_args: vec!["tools".to_string(), "list".to_string()],
            discover_timeout: Duration::from_secs(10),
            fallback_tools: Vec::new(),
            install_program: String::new(),
            install_args: Vec::new(),
            per_tool_timeout: Duration::from_secs(30),
        }
    }
}

impl GatewayConfig {
    /// Builds a config from `SHELLGATE_*` environment variables, falling
    /// back to defaults per field.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("SHELLGATE_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(path) = std::env::var("SHELLGATE_REGISTRY") {
            config.registry_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("SHELLGATE_HOMES") {
            config.homes_root = PathBuf::from(path);
        }
        match std::env::var("SHELLGATE_SECRET") {
            Ok(secret) if !secret.is_empty() => {
                config.signing_secret = secret.into_bytes();
            }
            _ => {
                tracing::warn!(
                    "SHELLGATE_SECRET is not set; using an ephemeral signing \
                     secret, sessions will not survive a restart"
                );
            }
        }
        if let Some(secs) = env_u64("SHELLGATE_TOKEN_TTL_SECS") {
            config.token_ttl = Duration::from_secs(secs);
        }
        if let Some(limit) = env_u64("SHELLGATE_UPLOAD_LIMIT") {
            config.upload_limit = limit as usize;
        }

        if let Ok(program) = std::env::var("SHELLGATE_ENGINE") {
            config.engine.program = program;
        }
        if let Ok(args) = std::env::var("SHELLGATE_ENGINE_ARGS") {
            config.engine.args =
                args.split_whitespace().map(ToOwned::to_owned).collect();
        }
        if let Ok(key) = std::env::var("SHELLGATE_DEFAULT_API_KEY") {
            if !key.is_empty() {
                config.engine.default_api_key = Some(key);
            }
        }
        if let Ok(var) = std::env::var("SHELLGATE_API_KEY_VAR") {
            config.engine.api_key_var = var;
        }

        if let Ok(tools) = std::env::var("SHELLGATE_TOOLS") {
            config.provision.tools_override = Some(split_list(&tools));
        }
        if let Ok(tools) = std::env::var("SHELLGATE_TOOL_FALLBACK") {
            config.provision.fallback_tools = split_list(&tools);
        }
        if let Ok(installer) = std::env::var("SHELLGATE_INSTALLER") {
            config.provision.install_program = installer;
        }

        config
    }
}

/// A fresh random 256-bit secret for deployments that didn't set one.
fn ephemeral_secret() -> Vec<u8> {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    bytes.to_vec()
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok()?.parse().ok()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry_of_config() {
        let config = GatewayConfig::default();

        assert_eq!(config.token_ttl, DEFAULT_TOKEN_TTL);
        assert_eq!(config.engine.term, "xterm-256color");
        assert!(config.provision.tools_override.is_none());
        // Installation is off until an installer is configured.
        assert!(config.provision.install_program.is_empty());
    }

    #[test]
    fn test_ephemeral_secrets_are_unique() {
        assert_ne!(ephemeral_secret(), ephemeral_secret());
    }

    #[test]
    fn test_split_list_trims_and_drops_empties() {
        assert_eq!(
            split_list(" ripgrep, jq ,,fd "),
            vec!["ripgrep".to_string(), "jq".to_string(), "fd".to_string()]
        );
        assert!(split_list("").is_empty());
    }
}
