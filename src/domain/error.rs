use thiserror::Error;

/// Core domain errors
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("No active version: {message}")]
    NoActiveVersion { message: String },

    #[error("Inference error: {message}")]
    Inference { message: String },

    #[error("Broadcast error: {message}")]
    Broadcast { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    pub fn no_active_version(message: impl Into<String>) -> Self {
        Self::NoActiveVersion {
            message: message.into(),
        }
    }

    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference {
            message: message.into(),
        }
    }

    pub fn broadcast(message: impl Into<String>) -> Self {
        Self::Broadcast {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("ModelUpload 'test-id' not found");
        assert_eq!(
            error.to_string(),
            "Not found: ModelUpload 'test-id' not found"
        );
    }

    #[test]
    fn test_invalid_state_error() {
        let error = DomainError::invalid_state("cannot activate a failed version");
        assert_eq!(
            error.to_string(),
            "Invalid state: cannot activate a failed version"
        );
    }

    #[test]
    fn test_no_active_version_error() {
        let error = DomainError::no_active_version("upload 'x' has no active version");
        assert_eq!(
            error.to_string(),
            "No active version: upload 'x' has no active version"
        );
    }
}
