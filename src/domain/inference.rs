use async_trait::async_trait;
use serde_json::Value;

use crate::domain::DomainError;

/// Executes a single prediction against a stored model bundle.
///
/// `artifact_ref` and `script_ref` are blob store references as recorded
/// on the version. The backend is responsible for resolving them.
#[async_trait]
pub trait InferenceBackend: Send + Sync + std::fmt::Debug {
    async fn run(
        &self,
        artifact_ref: &str,
        script_ref: &str,
        input: &Value,
    ) -> Result<Value, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Test backend with a scripted response; records every call
    #[derive(Debug)]
    pub struct MockBackend {
        response: Result<Value, DomainError>,
        calls: Mutex<Vec<Value>>,
    }

    impl MockBackend {
        pub fn with_output(output: Value) -> Self {
            Self {
                response: Ok(output),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn with_error(error: DomainError) -> Self {
            Self {
                response: Err(error),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<Value> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl InferenceBackend for MockBackend {
        async fn run(
            &self,
            _artifact_ref: &str,
            _script_ref: &str,
            input: &Value,
        ) -> Result<Value, DomainError> {
            self.calls.lock().unwrap().push(input.clone());
            self.response.clone()
        }
    }
}
