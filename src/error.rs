//! Error types and handling for the delivery fee service

use thiserror::Error;

use crate::fees::FeeRejection;

/// Main error type for the delivery fee service
#[derive(Error, Debug)]
pub enum DeliveryFeeError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Weather feed retrieval or parsing errors
    #[error("Feed error: {message}")]
    Feed { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Observation store errors
    #[error("Store error: {message}")]
    Store { message: String },

    /// Business rule rejections of a fee request
    #[error(transparent)]
    Rejected(#[from] FeeRejection),
}

impl DeliveryFeeError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new feed error
    pub fn feed<S: Into<String>>(message: S) -> Self {
        Self::Feed {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Whether the error is caused by the request rather than the service
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DeliveryFeeError::Validation { .. } | DeliveryFeeError::Rejected(_)
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            DeliveryFeeError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            DeliveryFeeError::Feed { .. } => {
                "Unable to retrieve weather observations.".to_string()
            }
            DeliveryFeeError::Validation { message } => message.clone(),
            DeliveryFeeError::Store { .. } => {
                "Weather observations are currently unavailable.".to_string()
            }
            DeliveryFeeError::Rejected(rejection) => rejection.to_string(),
        }
    }
}
