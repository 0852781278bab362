// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Unified Error Handling System
//!
//! Centralized error type for the Relay MCP Server. Every HTTP-visible
//! failure renders as the protocol-shaped JSON-RPC envelope, so a caller sees
//! the same error surface regardless of which route produced it.

use crate::jsonrpc::{error_codes, JSONRPC_VERSION};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Malformed envelope, missing session id, or other caller mistake
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput,
    /// Session id not present in the registry (or already terminated)
    #[serde(rename = "SESSION_NOT_FOUND")]
    SessionNotFound,
    /// Caller origin is not in the allow-list
    #[serde(rename = "ORIGIN_FORBIDDEN")]
    OriginForbidden,
    /// Protocol version header does not match a supported version
    #[serde(rename = "VERSION_MISMATCH")]
    VersionMismatch,
    /// No transport is currently connected to accept the message
    #[serde(rename = "TRANSPORT_UNAVAILABLE")]
    TransportUnavailable,
    /// Configuration error
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError,
    /// Data serialization/deserialization failure
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError,
    /// Any other internal failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::InvalidInput | Self::VersionMismatch => StatusCode::BAD_REQUEST,
            Self::SessionNotFound => StatusCode::NOT_FOUND,
            Self::OriginForbidden => StatusCode::FORBIDDEN,
            Self::TransportUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::ConfigError | Self::SerializationError | Self::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the JSON-RPC error code carried in the response envelope
    #[must_use]
    pub const fn jsonrpc_code(self) -> i32 {
        match self {
            Self::InvalidInput | Self::VersionMismatch | Self::TransportUnavailable => {
                error_codes::BAD_REQUEST
            }
            Self::SessionNotFound => error_codes::SESSION_NOT_FOUND,
            Self::OriginForbidden => error_codes::FORBIDDEN,
            Self::ConfigError | Self::SerializationError | Self::InternalError => {
                error_codes::INTERNAL_ERROR
            }
        }
    }

    /// Get a short description of this error class
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::SessionNotFound => "The requested session was not found",
            Self::OriginForbidden => "The request origin is not allowed",
            Self::VersionMismatch => "The requested protocol version is not supported",
            Self::TransportUnavailable => "No transport is currently connected",
            Self::ConfigError => "Configuration error encountered",
            Self::SerializationError => "Data serialization failed",
            Self::InternalError => "An internal server error occurred",
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach a source error for chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Session not found
    pub fn session_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SessionNotFound, message)
    }

    /// Disallowed origin
    pub fn origin_forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::OriginForbidden, message)
    }

    /// Unsupported protocol version
    pub fn version_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::VersionMismatch, message)
    }

    /// No transport connected
    pub fn transport_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TransportUnavailable, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Render as the protocol-shaped error envelope used on every HTTP surface
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "jsonrpc": JSONRPC_VERSION,
            "error": {
                "code": self.code.jsonrpc_code(),
                "message": self.message,
            },
            "id": serde_json::Value::Null,
        });
        (self.code.http_status(), Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(ErrorCode::InternalError, error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(ErrorCode::SerializationError, error.to_string()).with_source(error)
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::new(ErrorCode::InternalError, error.to_string()).with_source(error)
    }
}
