//! Errors raised by the DHIS2 API client

use super::resilience::{RetryPolicy, RetryableError};

/// Failure talking to the DHIS2 API
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request never produced a response (connect failure, timeout, ...)
    Transport {
        url: String,
        message: String,
        attempts: u32,
    },
    /// DHIS2 answered with a non-success status
    Status {
        url: String,
        status: u16,
        body: String,
        attempts: u32,
    },
    /// A success response whose body could not be understood
    Decode { url: String, message: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Attempts made before giving up
    pub fn attempts(&self) -> u32 {
        match self {
            ApiError::Transport { attempts, .. } | ApiError::Status { attempts, .. } => *attempts,
            ApiError::Decode { .. } => 1,
        }
    }
}

impl RetryableError for ApiError {
    fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport { .. } => true,
            ApiError::Status { status, .. } => RetryPolicy::is_retryable_status(*status),
            ApiError::Decode { .. } => false,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Transport {
                url,
                message,
                attempts,
            } => write!(
                f,
                "Request to '{}' failed after {} attempt(s): {}",
                url, attempts, message
            ),
            ApiError::Status {
                url,
                status,
                body,
                attempts,
            } => {
                write!(
                    f,
                    "DHIS2 returned HTTP {} for '{}' after {} attempt(s)",
                    status, url, attempts
                )?;
                if !body.is_empty() {
                    write!(f, ": {}", body)?;
                }
                Ok(())
            }
            ApiError::Decode { url, message } => {
                write!(f, "Unexpected response from '{}': {}", url, message)
            }
        }
    }
}

impl std::error::Error for ApiError {}
