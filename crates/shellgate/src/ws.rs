//! The session supervisor: one WebSocket connection, one state machine.
//!
//! Each accepted connection gets its own task running
//! [`handle_connection`]. The lifecycle is:
//!
//! ```text
//! Connected ──auth ok──→ Provisioning ──→ Active ──process exits──→ Terminated
//!     │  ↖ auth failed (retryable)                │
//!     └──────── socket closes (any state) ────────┴──→ Terminated
//! ```
//!
//! - Authentication failures are retryable in place: the client gets an
//!   `auth-failed` event and the socket stays open.
//! - Provisioning runs synchronously relative to session start, streaming
//!   `progress` lines so a slow install reads as work, not a hang.
//! - `Active` is two directional byte pumps in one `select!` loop:
//!   client `data` events are written to the pty in arrival order, pty
//!   output is forwarded in production order.
//! - The terminal handle lives in this task's local state — there is no
//!   global connection table. When the task ends, for any reason, the
//!   handle drops and the child process is force-killed.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use shellgate_auth::SessionClaims;
use shellgate_protocol::{ClientEvent, Codec, ServerEvent};
use shellgate_terminal::{TermSize, Terminal, TerminalEvent, TerminalSpec};
use tokio::sync::mpsc;

use crate::server::AppState;
use crate::GatewayError;

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// `GET /ws` — upgrade and hand the socket to a fresh connection task.
pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let conn_id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = handle_connection(conn_id, socket, state).await {
            tracing::debug!(conn_id, error = %e, "connection ended with error");
        }
    })
}

/// Connection lifecycle, as the supervisor sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Socket open, no valid token yet. `auth` is accepted and retryable.
    Connected,
    /// Token accepted. The session owns a process — or sits degraded with
    /// none, if the spawn failed.
    Active,
    /// The process exited. The socket may stay open, but the session is
    /// spent; nothing restarts it.
    Terminated,
}

/// Everything an `Active` session owns. Exists only inside its
/// connection task; dropping it kills the child process.
struct LiveSession {
    claims: SessionClaims,
    terminal: Terminal,
    events: mpsc::Receiver<TerminalEvent>,
}

/// Handles a single connection from upgrade to close.
async fn handle_connection(
    conn_id: u64,
    mut socket: WebSocket,
    state: AppState,
) -> Result<(), GatewayError> {
    tracing::debug!(conn_id, "handling new connection");

    let mut phase = Phase::Connected;
    let mut session: Option<LiveSession> = None;

    loop {
        tokio::select! {
            biased;

            // Process → client: forward output chunks, then the exit code.
            event = next_terminal_event(&mut session) => {
                match event {
                    TerminalEvent::Output(chunk) => {
                        let data = String::from_utf8_lossy(&chunk).into_owned();
                        if send_event(&mut socket, &state, &ServerEvent::Data { data })
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    TerminalEvent::Exit(code) => {
                        if let Some(live) = session.take() {
                            tracing::info!(
                                conn_id,
                                username = %live.claims.username,
                                code,
                                "terminal exited"
                            );
                        }
                        phase = Phase::Terminated;
                        // Stop relaying; the socket stays open but owns no
                        // process. Sessions are not resumable.
                        if send_event(&mut socket, &state, &ServerEvent::Exit { code })
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                }
            }

            // Client → server: decode and dispatch one event.
            incoming = socket.recv() => {
                let Some(Ok(msg)) = incoming else {
                    // Closed or errored; teardown below kills any child.
                    break;
                };
                let payload = match msg {
                    Message::Text(text) => text.as_bytes().to_vec(),
                    Message::Binary(bytes) => bytes.to_vec(),
                    Message::Close(_) => break,
                    // Ping/pong are answered by the websocket stack.
                    _ => continue,
                };

                let event: ClientEvent = match state.codec().decode(&payload) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::debug!(conn_id, error = %e, "undecodable event skipped");
                        continue;
                    }
                };

                match event {
                    ClientEvent::Auth { token } => {
                        if phase != Phase::Connected {
                            tracing::debug!(conn_id, ?phase, "auth out of phase ignored");
                            continue;
                        }
                        match state.keys().verify(&token) {
                            Some(claims) => {
                                session = start_session(
                                    conn_id, &mut socket, &state, claims,
                                )
                                .await?;
                                phase = Phase::Active;
                            }
                            None => {
                                // Retryable: remain unauthenticated, keep
                                // the socket open, spawn nothing.
                                tracing::debug!(conn_id, "auth rejected");
                                let failed = ServerEvent::AuthFailed {
                                    reason: "invalid or expired token".into(),
                                };
                                if send_event(&mut socket, &state, &failed)
                                    .await
                                    .is_err()
                                {
                                    break;
                                }
                            }
                        }
                    }

                    ClientEvent::Data { data } => {
                        if let Some(live) = session.as_ref() {
                            if live.terminal.write(data.into_bytes()).await.is_err() {
                                tracing::debug!(conn_id, "input dropped, process gone");
                            }
                        }
                    }

                    ClientEvent::Resize { cols, rows } => {
                        if let Some(live) = session.as_ref() {
                            if let Err(e) =
                                live.terminal.resize(TermSize { cols, rows })
                            {
                                tracing::debug!(conn_id, error = %e, "resize failed");
                            }
                        }
                    }
                }
            }
        }
    }

    // `session` drops here: any owned child process is force-killed and
    // in-flight output is discarded.
    tracing::debug!(conn_id, "connection closed");
    Ok(())
}

/// Runs the authenticated half of session startup: announce the
/// principal, provision tools with visible progress, spawn the terminal.
///
/// Returns `None` when the spawn fails — the connection then sits in the
/// degraded no-process state, with the failure already surfaced to the
/// client as terminal-style output.
async fn start_session(
    conn_id: u64,
    socket: &mut WebSocket,
    state: &AppState,
    claims: SessionClaims,
) -> Result<Option<LiveSession>, GatewayError> {
    tracing::info!(conn_id, username = %claims.username, "connection authenticated");
    send_event(
        socket,
        state,
        &ServerEvent::AuthSuccess {
            user: claims.summary(),
        },
    )
    .await?;

    provision_tools(conn_id, socket, state).await?;

    let spec = terminal_spec(state, &claims);
    match Terminal::spawn(&spec) {
        Ok((terminal, events)) => {
            tracing::info!(conn_id, program = %spec.program, "terminal started");
            send_event(socket, state, &ServerEvent::Ready).await?;
            Ok(Some(LiveSession {
                claims,
                terminal,
                events,
            }))
        }
        Err(e) => {
            // Surfaced the way everything else in a terminal is: as
            // output. The session stays open but owns no process.
            tracing::error!(conn_id, error = %e, "terminal spawn failed");
            let notice = ServerEvent::Data {
                data: format!("{e}\r\n"),
            };
            send_event(socket, state, &notice).await?;
            Ok(None)
        }
    }
}

/// Discovers and installs tools, forwarding each progress line to the
/// client as it is produced. Failures degrade to progress text; nothing
/// here can keep the session from starting.
async fn provision_tools(
    conn_id: u64,
    socket: &mut WebSocket,
    state: &AppState,
) -> Result<(), GatewayError> {
    let tools = match state.catalog().discover().await {
        Ok(tools) => tools,
        Err(e) => {
            tracing::warn!(conn_id, error = %e, "tool discovery unavailable");
            Vec::new()
        }
    };
    if tools.is_empty() {
        return Ok(());
    }
    tracing::debug!(conn_id, count = tools.len(), "provisioning tools");

    let (tx, mut rx) = mpsc::channel(16);
    let provisioner = state.provisioner().clone();
    let worker =
        tokio::spawn(async move { provisioner.provision(&tools, tx).await });

    while let Some(message) = rx.recv().await {
        send_event(socket, state, &ServerEvent::Progress { message }).await?;
    }
    let _ = worker.await;
    Ok(())
}

/// Builds the spawn spec for a user's terminal: engine binary, the user's
/// home as cwd, and the inherited environment plus terminal-type and
/// credential overrides (personal key first, gateway default second).
fn terminal_spec(state: &AppState, claims: &SessionClaims) -> TerminalSpec {
    let engine = &state.config().engine;

    let mut env = vec![("TERM".to_string(), engine.term.clone())];
    let api_key = claims
        .api_key
        .clone()
        .or_else(|| engine.default_api_key.clone());
    if let Some(key) = api_key {
        env.push((engine.api_key_var.clone(), key));
    }

    TerminalSpec {
        program: engine.program.clone(),
        args: engine.args.clone(),
        cwd: PathBuf::from(&claims.home),
        env,
        size: TermSize::default(),
    }
}

/// Yields the next event from the owned terminal, or pends forever when
/// no process is owned — which parks this `select!` branch and leaves the
/// connection driven by client events alone.
async fn next_terminal_event(session: &mut Option<LiveSession>) -> TerminalEvent {
    match session.as_mut() {
        Some(live) => match live.events.recv().await {
            Some(event) => event,
            None => std::future::pending().await,
        },
        None => std::future::pending().await,
    }
}

/// Encodes and sends one server event as a text frame.
async fn send_event(
    socket: &mut WebSocket,
    state: &AppState,
    event: &ServerEvent,
) -> Result<(), GatewayError> {
    let bytes = state.codec().encode(event)?;
    // JSON output is valid UTF-8; lossy is a no-op that spares an unwrap.
    let text = String::from_utf8_lossy(&bytes).into_owned();
    socket.send(Message::Text(text.into())).await?;
    Ok(())
}
