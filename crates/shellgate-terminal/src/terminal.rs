//! The terminal: spawn, relay, resize, kill.

use std::io::{ErrorKind, Read, Write};
use std::path::PathBuf;

use portable_pty::{native_pty_system, ChildKiller, CommandBuilder, MasterPty, PtySize};
use tokio::sync::mpsc;

use crate::TerminalError;

/// Capacity of the output event channel. Deep enough to absorb bursts of
/// pty output while the session task is flushing a frame to the client.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Capacity of the input channel feeding the pty writer.
const INPUT_CHANNEL_CAPACITY: usize = 128;

// ---------------------------------------------------------------------------
// TermSize
// ---------------------------------------------------------------------------

/// Terminal geometry in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermSize {
    pub cols: u16,
    pub rows: u16,
}

/// The geometry a session starts with before the client reports its own.
impl Default for TermSize {
    fn default() -> Self {
        Self { cols: 80, rows: 24 }
    }
}

impl From<TermSize> for PtySize {
    fn from(size: TermSize) -> Self {
        PtySize {
            rows: size.rows,
            cols: size.cols,
            pixel_width: 0,
            pixel_height: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// TerminalSpec
// ---------------------------------------------------------------------------

/// Everything needed to spawn one terminal process.
#[derive(Debug, Clone)]
pub struct TerminalSpec {
    /// Program to execute.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
    /// Working directory. For a session this is the user's sandbox root.
    pub cwd: PathBuf,
    /// Environment overrides, applied on top of the inherited process
    /// environment (the pty command builder inherits by default).
    pub env: Vec<(String, String)>,
    /// Initial geometry.
    pub size: TermSize,
}

// ---------------------------------------------------------------------------
// TerminalEvent
// ---------------------------------------------------------------------------

/// Events produced by a running terminal, in order: any number of
/// `Output` chunks, then exactly one `Exit`.
///
/// The ordering is structural, not best-effort: one blocking task owns
/// both the pty reader and the child handle, drains output to EOF, and
/// only then reaps and reports the exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// A chunk of raw pty output.
    Output(Vec<u8>),
    /// The process exited with this code.
    Exit(i32),
}

// ---------------------------------------------------------------------------
// Terminal
// ---------------------------------------------------------------------------

/// A handle to one running pty-backed process.
///
/// Owned by exactly one session task. Dropping the handle force-kills the
/// child — closing a connection is the only cancellation signal a session
/// has, and it must never leak a process.
pub struct Terminal {
    // Wrapped in a `Mutex` so the handle is `Sync`: `Box<dyn MasterPty +
    // Send>` is not `Sync`, and an `async fn` borrowing `&self` (e.g.
    // `write`) keeps `&Terminal` alive across its await, which the server's
    // `Send` future bound requires. The pty master is only touched by
    // `resize`, so the lock is uncontended in practice.
    master: std::sync::Mutex<Box<dyn MasterPty + Send>>,
    input_tx: mpsc::Sender<Vec<u8>>,
    killer: Box<dyn ChildKiller + Send + Sync>,
}

impl Terminal {
    /// Spawns the process described by `spec` on a fresh pty.
    ///
    /// Returns the handle and the event stream. The stream yields output
    /// chunks as the process produces them and closes shortly after the
    /// final `Exit` event.
    ///
    /// # Errors
    /// [`TerminalError::Pty`] if the pty can't be opened,
    /// [`TerminalError::Spawn`] if the process can't be started.
    pub fn spawn(
        spec: &TerminalSpec,
    ) -> Result<(Self, mpsc::Receiver<TerminalEvent>), TerminalError> {
        let pair = native_pty_system()
            .openpty(spec.size.into())
            .map_err(|e| TerminalError::Pty(e.to_string()))?;

        let mut cmd = CommandBuilder::new(&spec.program);
        for arg in &spec.args {
            cmd.arg(arg);
        }
        cmd.cwd(&spec.cwd);
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        let mut child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| TerminalError::Spawn(e.to_string()))?;
        let killer = child.clone_killer();

        // Close our copy of the slave end so the reader sees EOF when the
        // child exits.
        drop(pair.slave);

        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| TerminalError::Pty(e.to_string()))?;
        let mut writer = pair
            .master
            .take_writer()
            .map_err(|e| TerminalError::Pty(e.to_string()))?;

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (input_tx, mut input_rx) =
            mpsc::channel::<Vec<u8>>(INPUT_CHANNEL_CAPACITY);

        // Reader: drain pty output to EOF, then reap the child. Owning
        // both here guarantees Exit is delivered after the last Output.
        tokio::task::spawn_blocking(move || {
            let mut buf = [0u8; 8192];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        let chunk = TerminalEvent::Output(buf[..n].to_vec());
                        if event_tx.blocking_send(chunk).is_err() {
                            // Session is gone; stop relaying, still reap.
                            break;
                        }
                    }
                    Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }

            let code = match child.wait() {
                Ok(status) => status.exit_code() as i32,
                Err(_) => -1,
            };
            tracing::debug!(code, "terminal process exited");
            let _ = event_tx.blocking_send(TerminalEvent::Exit(code));
        });

        // Writer: client input arrives async, pty writes are blocking.
        tokio::task::spawn_blocking(move || {
            while let Some(bytes) = input_rx.blocking_recv() {
                if writer.write_all(&bytes).is_err() {
                    break;
                }
                let _ = writer.flush();
            }
        });

        Ok((
            Self {
                master: std::sync::Mutex::new(pair.master),
                input_tx,
                killer,
            },
            event_rx,
        ))
    }

    /// Queues bytes for the process's input stream, in arrival order.
    ///
    /// # Errors
    /// [`TerminalError::ProcessGone`] once the writer has shut down.
    pub async fn write(&self, bytes: Vec<u8>) -> Result<(), TerminalError> {
        self.input_tx
            .send(bytes)
            .await
            .map_err(|_| TerminalError::ProcessGone)
    }

    /// Updates the pty geometry without restarting the process.
    ///
    /// # Errors
    /// [`TerminalError::Resize`] if the pty rejects the new size.
    pub fn resize(&self, size: TermSize) -> Result<(), TerminalError> {
        self.master
            .lock()
            .expect("terminal master mutex poisoned")
            .resize(size.into())
            .map_err(|e| TerminalError::Resize(e.to_string()))
    }

    /// Force-kills the child process. Safe to call more than once.
    pub fn kill(&mut self) {
        if let Err(e) = self.killer.kill() {
            // Already reaped or never fully started; nothing to clean up.
            tracing::debug!(error = %e, "terminal kill was a no-op");
        }
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        self.kill();
    }
}

// =========================================================================
// Tests
// =========================================================================
