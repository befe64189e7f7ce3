use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::domain::inference::InferenceBackend;
use crate::domain::DomainError;

const DEFAULT_INTERPRETER: &str = "python3";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ProcessBackendConfig {
    pub interpreter: String,
    pub timeout: Duration,
}

impl Default for ProcessBackendConfig {
    fn default() -> Self {
        Self {
            interpreter: DEFAULT_INTERPRETER.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ProcessBackendConfig {
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Runs the prediction script as a subprocess:
/// `<interpreter> <script_ref> <artifact_ref>` with the input JSON on stdin
/// and the output JSON expected on stdout.
///
/// The script runs on CPU with a hard wall-clock timeout; `kill_on_drop`
/// reaps it when the timeout fires.
#[derive(Debug)]
pub struct ProcessBackend {
    config: ProcessBackendConfig,
}

impl ProcessBackend {
    pub fn new(config: ProcessBackendConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl InferenceBackend for ProcessBackend {
    async fn run(
        &self,
        artifact_ref: &str,
        script_ref: &str,
        input: &Value,
    ) -> Result<Value, DomainError> {
        debug!(script = script_ref, "Spawning prediction subprocess");

        let mut child = Command::new(&self.config.interpreter)
            .arg(script_ref)
            .arg(artifact_ref)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DomainError::inference(format!(
                    "Failed to spawn '{}': {}",
                    self.config.interpreter, e
                ))
            })?;

        let payload = serde_json::to_vec(input)
            .map_err(|e| DomainError::inference(format!("Failed to encode input: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| DomainError::inference("Subprocess stdin unavailable"))?;
        // write stdin while draining stdout, otherwise a script that fills
        // the stdout pipe before reading its input stalls both sides
        let write_input = async move {
            // a script may exit without draining stdin; its exit status is
            // the authoritative result, so a broken pipe here is not fatal
            if let Err(e) = stdin.write_all(&payload).await {
                debug!(error = %e, "Prediction script did not consume its input");
            }
            drop(stdin);
        };

        let (_, output) = tokio::time::timeout(self.config.timeout, async {
            tokio::join!(write_input, child.wait_with_output())
        })
        .await
        .map_err(|_| {
            DomainError::inference(format!(
                "Prediction timed out after {}s",
                self.config.timeout.as_secs()
            ))
        })?;
        let output =
            output.map_err(|e| DomainError::inference(format!("Subprocess failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DomainError::inference(format!(
                "Prediction script exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            DomainError::inference(format!("Prediction script produced invalid JSON: {}", e))
        })
    }
}
