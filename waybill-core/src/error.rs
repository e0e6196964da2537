//! Unified error handling
//!
//! Structured error types carrying context and recovery suggestions, shared by every Waybill crate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, warn};

pub type WaybillResult<T> = Result<T, WaybillError>;

/// Path of the sign-in view, the target of every missing-credential redirect
pub const SIGN_IN_PATH: &str = "/login";

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: HashMap<String, String>,
    /// Recovery suggestions, shown next to the failing action
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the Waybill client
#[derive(Error, Debug)]
pub enum WaybillError {
    /// No usable credential. Resolved by sending the user to `redirect_to`,
    /// never by issuing the request unauthenticated.
    #[error("Authentication required: {message}")]
    Authentication {
        message: String,
        redirect_to: String,
        context: ErrorContext,
    },

    #[error("Malformed token claims: {message}")]
    Claims {
        message: String,
        context: ErrorContext,
    },

    #[error("Session storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl WaybillError {
    /// Missing or unusable credential, redirecting to the sign-in view
    pub fn authentication_required(component: &str, operation: &str) -> Self {
        WaybillError::Authentication {
            message: "no session token is stored".to_string(),
            redirect_to: SIGN_IN_PATH.to_string(),
            context: ErrorContext::new(component)
                .with_operation(operation)
                .with_suggestion("Sign in again with `waybill login`"),
        }
    }

    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            WaybillError::Authentication { context, .. } => Some(context),
            WaybillError::Claims { context, .. } => Some(context),
            WaybillError::Storage { context, .. } => Some(context),
            WaybillError::Config { context, .. } => Some(context),
            WaybillError::Network { context, .. } => Some(context),
            WaybillError::Http { context, .. } => Some(context),
            WaybillError::Validation { context, .. } => Some(context),
            WaybillError::Internal { context, .. } => Some(context),
            WaybillError::Io(_) | WaybillError::Serialization(_) => None,
        }
    }

    /// Where the user should be sent to resolve this error, if anywhere
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            WaybillError::Authentication { redirect_to, .. } => Some(redirect_to),
            WaybillError::Http { status: 401, .. } => Some(SIGN_IN_PATH),
            _ => None,
        }
    }

    /// Check if error is recoverable by retrying the same action
    pub fn is_recoverable(&self) -> bool {
        match self {
            WaybillError::Network { .. } => true,
            WaybillError::Http { status, .. } => *status >= 500 || *status == 429,
            WaybillError::Authentication { .. } => false,
            WaybillError::Config { .. } => false,
            WaybillError::Validation { .. } => false,
            _ => false,
        }
    }

    /// Get retry delay in milliseconds for recoverable errors
    pub fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            WaybillError::Network { .. } => Some(1000),
            WaybillError::Http { status: 429, .. } => Some(5000),
            WaybillError::Http { status, .. } if *status >= 500 => Some(2000),
            _ => None,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            WaybillError::Internal { .. } | WaybillError::Storage { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Internal error occurred"
                );
            }
            WaybillError::Config { .. } | WaybillError::Validation { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Configuration or validation error"
                );
            }
            WaybillError::Network { .. } | WaybillError::Http { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    recoverable = self.is_recoverable(),
                    "Request failed"
                );
            }
            WaybillError::Authentication { .. } | WaybillError::Claims { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Credential problem"
                );
            }
            _ => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Error occurred"
                );
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! storage_error {
    ($msg:expr, $component:expr) => {
        $crate::WaybillError::Storage {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::WaybillError::Storage {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check that the session directory exists and is writable"),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::WaybillError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}
