//! Error handling.

use axum::{
    extract::rejection::PathRejection,
    http::header,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::error::Error;
use strum_macros::IntoStaticStr;
use thiserror::Error;
use tracing::{event, Level};

use crate::metrics::FAILED_REQUESTS;

/// Biodiversity server error type
///
/// This type encapsulates the various errors that may occur.
/// Each variant may result in a different API error response.
#[derive(Debug, Error, IntoStaticStr)]
pub enum BiodiversityError {
    /// Error querying the SQLite store
    #[error("database query failed")]
    Database(#[from] sqlx::Error),

    /// Sample identifier does not have the `<prefix><digits>` form
    #[error("malformed sample identifier")]
    MalformedIdentifier(#[from] validator::ValidationErrors),

    /// Metadata row exists but the requested column is NULL
    #[error("sample {sample} has no value for {column}")]
    MissingValue { sample: String, column: &'static str },

    /// No metadata row matches the sample identifier
    #[error("no metadata found for sample {sample}")]
    LookupNotFound { sample: String },

    /// Error extracting the request path parameters
    #[error("request path is not valid")]
    PathRejection(#[from] PathRejection),

    /// Sample is not a column of the count matrix
    #[error("Error! Sample: {sample} Not Found!")]
    SampleNotFound { sample: String },

    /// The backing store does not satisfy the declared schema
    #[error("table {table} does not match the expected schema: {reason}")]
    SchemaMismatch { table: &'static str, reason: String },
}

impl IntoResponse for BiodiversityError {
    /// Convert from a `BiodiversityError` into an [axum::response::Response].
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

/// A response to send in error cases
///
/// The body is the error message rendered as a JSON string, which is what the dashboard
/// expects from every failing route.
struct ErrorResponse {
    /// HTTP status of the response
    status: StatusCode,

    /// Main error message
    message: String,
}

impl ErrorResponse {
    /// Return a new ErrorResponse
    ///
    /// # Arguments
    ///
    /// * `status`: HTTP status of the response
    /// * `error`: The error that occurred
    fn new<E>(status: StatusCode, error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        ErrorResponse {
            status,
            message: error.to_string(),
        }
    }

    /// Return a 400 bad request ErrorResponse
    fn bad_request<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// Return a 404 not found ErrorResponse
    fn not_found<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    /// Return a 500 internal server error ErrorResponse
    fn internal_server_error<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl From<BiodiversityError> for ErrorResponse {
    /// Convert from a `BiodiversityError` into an `ErrorResponse`.
    fn from(error: BiodiversityError) -> Self {
        let response = match &error {
            // Bad request
            BiodiversityError::MalformedIdentifier(_)
            | BiodiversityError::PathRejection(_)
            | BiodiversityError::SampleNotFound { sample: _ } => Self::bad_request(&error),

            // Not found
            BiodiversityError::LookupNotFound { sample: _ }
            | BiodiversityError::MissingValue {
                sample: _,
                column: _,
            } => Self::not_found(&error),

            // Internal server error
            BiodiversityError::Database(_)
            | BiodiversityError::SchemaMismatch {
                table: _,
                reason: _,
            } => Self::internal_server_error(&error),
        };

        let kind: &'static str = (&error).into();
        FAILED_REQUESTS.with_label_values(&[kind]).inc();

        // Log server errors.
        if response.status.is_server_error() {
            event!(Level::ERROR, "{}", error.to_string());
            let mut current = error.source();
            while let Some(source) = current {
                event!(Level::ERROR, "Caused by: {}", source.to_string());
                current = source.source();
            }
        } else {
            event!(Level::DEBUG, kind, "{}", response.message);
        }

        response
    }
}

impl IntoResponse for ErrorResponse {
    /// Convert from an `ErrorResponse` into an `axum::response::Response`.
    ///
    /// Renders the message as a JSON string.
    fn into_response(self) -> Response {
        match serde_json::to_string(&self.message) {
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialise error response: {}", err),
            )
                .into_response(),
            Ok(json_body) => (
                self.status,
                [(&header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
                json_body,
            )
                .into_response(),
        }
    }
}
