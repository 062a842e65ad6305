//! The provisioner: best-effort installation with visible progress.

use std::time::Duration;

use tokio::process::Command;
use tokio::sync::mpsc;

/// Installs tools one at a time, each under a bounded timeout.
///
/// Every attempt emits exactly one progress line, success or failure, so
/// a slow step reads as work-in-progress instead of a hung session. A
/// failing tool never aborts the rest of the batch — the session simply
/// starts with fewer capabilities.
#[derive(Debug, Clone)]
pub struct Provisioner {
    /// Install command: `program [args..] <tool>` per tool. An empty
    /// program disables installation entirely.
    program: String,
    args: Vec<String>,
    per_tool_timeout: Duration,
}

impl Provisioner {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        per_tool_timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            per_tool_timeout,
        }
    }

    /// Attempts installation of every tool, streaming progress lines into
    /// `progress`. Infallible by contract: every outcome is a line, not an
    /// error. A dropped receiver just stops the commentary, not the work.
    pub async fn provision(&self, tools: &[String], progress: mpsc::Sender<String>) {
        if self.program.is_empty() || tools.is_empty() {
            return;
        }

        for tool in tools {
            let outcome = self.install(tool).await;
            tracing::debug!(%tool, outcome, "tool install attempt finished");
            let _ = progress
                .send(format!("installing {tool}... {outcome}"))
                .await;
        }
    }

    /// Runs one install attempt and renders its outcome as a short,
    /// human-readable word for the progress line.
    async fn install(&self, tool: &str) -> &'static str {
        let run = Command::new(&self.program)
            .args(&self.args)
            .arg(tool)
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.per_tool_timeout, run).await {
            Ok(Ok(output)) if output.status.success() => "done",
            Ok(Ok(_)) => "failed",
            Ok(Err(_)) => "failed to start",
            Err(_) => "timed out",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
