use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    Timeout,
    Network,
    MalformedResponse,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("security violation: {0}")]
    Security(String),

    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        kind: GatewayErrorKind,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl PaymentError {
    pub fn gateway(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self::Gateway {
            message: message.into(),
            kind,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Gateway { .. })
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Security(_) => "SECURITY_VIOLATION",
            Self::Gateway {
                kind: GatewayErrorKind::Timeout,
                ..
            } => "GATEWAY_TIMEOUT",
            Self::Gateway { .. } => "GATEWAY_ERROR",
            Self::NotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorPayload {
                code: self.code().to_string(),
                message: self.to_string(),
                details: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}
