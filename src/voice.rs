//! Capability-gated voice input. The capture command is an external
//! transcriber configured at startup; with none configured the capability
//! is absent and the voice trigger is a no-op.

use tokio::process::Command;
use tracing::{debug, warn};

pub struct VoiceInput {
    command: Option<String>,
}

impl VoiceInput {
    pub fn new(command: Option<String>) -> Self {
        Self { command }
    }

    pub fn is_available(&self) -> bool {
        self.command.is_some()
    }

    /// Capture at most one utterance. Every failure mode — unconfigured,
    /// spawn error, non-zero exit, empty output — is logged and mapped to
    /// `None`; the caller never sees an error.
    pub async fn capture(&self) -> Option<String> {
        let Some(command) = &self.command else {
            debug!("voice capture not configured");
            return None;
        };

        let output = match Command::new("sh").arg("-c").arg(command).output().await {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "voice capture failed to start");
                return None;
            }
        };

        if !output.status.success() {
            warn!(status = %output.status, "voice capture exited with failure");
            return None;
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            debug!("voice capture produced no text");
            return None;
        }
        Some(text)
    }
}
