//! Shared application state, router assembly, and the server loop.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, FromRef};
use axum::routing::{get, post};
use axum::Router;
use shellgate_auth::{TokenKeys, UserStore};
use shellgate_protocol::JsonCodec;
use shellgate_provision::{EngineCatalog, Provisioner, StaticCatalog, ToolCatalog};
use tokio::net::TcpListener;

use crate::{http, ws, GatewayConfig, GatewayError};

/// Shared state handed to every handler and connection task.
///
/// Cheap to clone (one `Arc`). All interior pieces are either immutable
/// after construction or synchronize internally (the store's write lock) —
/// there is no per-session state in here, by design.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppInner>,
}

struct AppInner {
    config: GatewayConfig,
    store: UserStore,
    keys: TokenKeys,
    catalog: Arc<dyn ToolCatalog>,
    provisioner: Provisioner,
    codec: JsonCodec,
}

impl AppState {
    /// Wires the layers together from a config: registry store, token
    /// keys, and the catalog implementation the config selects (operator
    /// allow-list bypasses discovery; otherwise the engine is queried
    /// with a static fallback).
    pub fn new(config: GatewayConfig) -> Self {
        let store = UserStore::new(&config.registry_path, &config.homes_root);
        let keys = TokenKeys::new(&config.signing_secret, config.token_ttl);

        let catalog: Arc<dyn ToolCatalog> = match &config.provision.tools_override {
            Some(tools) => Arc::new(StaticCatalog::new(tools.clone())),
            None => Arc::new(EngineCatalog::new(
                config.engine.program.clone(),
                config.provision.discover_args.clone(),
                config.provision.discover_timeout,
                config.provision.fallback_tools.clone(),
            )),
        };

        let provisioner = Provisioner::new(
            config.provision.install_program.clone(),
            config.provision.install_args.clone(),
            config.provision.per_tool_timeout,
        );

        Self {
            inner: Arc::new(AppInner {
                config,
                store,
                keys,
                catalog,
                provisioner,
                codec: JsonCodec,
            }),
        }
    }

    pub(crate) fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    pub(crate) fn store(&self) -> &UserStore {
        &self.inner.store
    }

    pub(crate) fn keys(&self) -> &TokenKeys {
        &self.inner.keys
    }

    pub(crate) fn catalog(&self) -> &dyn ToolCatalog {
        &*self.inner.catalog
    }

    pub(crate) fn provisioner(&self) -> &Provisioner {
        &self.inner.provisioner
    }

    pub(crate) fn codec(&self) -> &JsonCodec {
        &self.inner.codec
    }
}

/// Lets the auth gate extractors pull the verification keys straight out
/// of the shared state.
impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> TokenKeys {
        state.inner.keys.clone()
    }
}

/// Assembles the gateway's full route table over the given state.
///
/// The body limit bounds every request body, which is what caps uploads.
pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config().upload_limit;
    Router::new()
        .route("/login", post(http::login))
        .route("/session", get(http::session))
        .route("/users", post(http::create_user))
        .route("/setup-status", get(http::setup_status))
        .route("/setup", post(http::setup))
        .route("/files", get(http::files_list).delete(http::files_delete))
        .route(
            "/files/content",
            get(http::file_read).put(http::file_write),
        )
        .route("/files/upload", post(http::file_upload))
        .route("/ws", get(ws::ws_handler))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}

/// A bound, not-yet-running gateway.
///
/// Binding is split from running so callers (and tests) can learn the
/// actual listen address before the accept loop starts.
pub struct Gateway {
    listener: TcpListener,
    state: AppState,
}

impl Gateway {
    /// Binds the listener and wires up the state.
    pub async fn bind(config: GatewayConfig) -> Result<Self, GatewayError> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        Ok(Self {
            listener,
            state: AppState::new(config),
        })
    }

    /// The address the listener actually bound (useful with port 0).
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the server until the process is terminated.
    pub async fn run(self) -> Result<(), GatewayError> {
        tracing::info!("shellgate running");
        let app = build_router(self.state);
        axum::serve(self.listener, app).await?;
        Ok(())
    }
}
