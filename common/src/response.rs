//! API response wrapper types.
//!
//! Every catalog endpoint answers with an `ApiResponse` envelope; list
//! endpoints put an `EntityList` inside it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard API response wrapper.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,

    /// Response data (present on success).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Error details (present on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    /// Response metadata.
    pub meta: ResponseMeta,
}

/// API error details.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Error code for client handling (e.g., "VALIDATION_ERROR", "NOT_FOUND").
    pub code: String,

    /// Human-readable error message.
    pub message: String,

    /// Structured details, e.g. the list of field violations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Response metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseMeta {
    /// Request ID for tracing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Response timestamp.
    pub timestamp: DateTime<Utc>,

    /// Service name that handled the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            request_id: None,
            timestamp: Utc::now(),
            service: None,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response tagged with the answering service.
    pub fn ok_with_service(data: T, service: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: ResponseMeta {
                service: Some(service.into()),
                ..Default::default()
            },
        }
    }

    /// Sets the request ID on the response.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.meta.request_id = Some(request_id.into());
        self
    }
}

impl ApiResponse<()> {
    /// Creates an error response.
    pub fn err(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::err_inner(code.into(), message.into(), None)
    }

    /// Creates an error response with structured details.
    pub fn err_with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::err_inner(code.into(), message.into(), Some(details))
    }

    fn err_inner(code: String, message: String, details: Option<serde_json::Value>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message,
                details,
            }),
            meta: ResponseMeta::default(),
        }
    }
}

/// Offset paging information for list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    /// Total number of matching entities.
    pub total: u64,

    /// Number of entities skipped.
    pub offset: u64,

    /// Page size that was applied.
    pub limit: u32,

    /// Whether entities remain after this page.
    pub has_more: bool,
}

impl Paging {
    pub fn new(total: u64, offset: u64, limit: u32) -> Self {
        Self {
            total,
            offset,
            limit,
            has_more: offset.saturating_add(u64::from(limit)) < total,
        }
    }
}

/// One page of entities.
#[derive(Debug, Serialize, ToSchema)]
pub struct EntityList<T: Serialize> {
    /// Entities on this page.
    pub data: Vec<T>,

    /// Paging information.
    pub paging: Paging,
}

impl<T: Serialize> EntityList<T> {
    pub fn new(data: Vec<T>, total: u64, offset: u64, limit: u32) -> Self {
        Self {
            data,
            paging: Paging::new(total, offset, limit),
        }
    }
}
