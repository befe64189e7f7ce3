use async_trait::async_trait;

use crate::domain::version::ModelVersion;

/// Outcome of running a version through its smoke check
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub passed: bool,
    pub log: String,
}

impl ValidationReport {
    pub fn passed(log: impl Into<String>) -> Self {
        Self {
            passed: true,
            log: log.into(),
        }
    }

    pub fn failed(log: impl Into<String>) -> Self {
        Self {
            passed: false,
            log: log.into(),
        }
    }
}

/// Runs a freshly uploaded version once against a schema-derived dummy
/// input. Infallible by contract: any internal failure becomes a failed
/// report with the error captured in the log.
#[async_trait]
pub trait Validator: Send + Sync + std::fmt::Debug {
    async fn validate(&self, version: &ModelVersion) -> ValidationReport;
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// Test validator with a scripted outcome
    #[derive(Debug)]
    pub struct MockValidator {
        report: ValidationReport,
    }

    impl MockValidator {
        pub fn passing() -> Self {
            Self {
                report: ValidationReport::passed("Validation successful"),
            }
        }

        pub fn failing(log: impl Into<String>) -> Self {
            Self {
                report: ValidationReport::failed(log),
            }
        }
    }

    #[async_trait]
    impl Validator for MockValidator {
        async fn validate(&self, _version: &ModelVersion) -> ValidationReport {
            self.report.clone()
        }
    }
}
