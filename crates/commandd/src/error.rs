//! Request errors and their HTTP mapping

use crate::repo::RepoError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use command_common::dtos::field_errors;
use command_common::PatchError;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

const VALIDATION_TITLE: &str = "One or more validation errors occurred.";

#[derive(Debug, Error)]
pub enum ApiError {
    /// No command with the requested id
    #[error("not found")]
    NotFound,

    #[error("validation failed")]
    Validation {
        status: StatusCode,
        errors: BTreeMap<String, Vec<String>>,
    },

    #[error("store failure: {0}")]
    Store(#[from] RepoError),

    /// The store reported that a commit did not take effect
    #[error("save was not accepted by the store")]
    SaveFailed,
}

/// Body of 400 / 422 responses
#[derive(Debug, Serialize)]
pub struct ValidationProblem {
    pub title: &'static str,
    pub status: u16,
    pub errors: BTreeMap<String, Vec<String>>,
}

/// Body of 500 responses; deliberately free of store details
#[derive(Debug, Serialize)]
pub struct ServerProblem {
    pub title: &'static str,
    pub status: u16,
}

impl ApiError {
    pub fn validation(status: StatusCode, errors: &ValidationErrors) -> Self {
        ApiError::Validation {
            status,
            errors: field_errors(errors),
        }
    }

    pub fn single(status: StatusCode, key: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(key.into(), vec![message.into()]);
        ApiError::Validation { status, errors }
    }

    /// Patch operations that cannot be applied are unprocessable
    pub fn patch(err: &PatchError) -> Self {
        let key = err.member().unwrap_or_else(|| "patch".to_string());
        Self::single(StatusCode::UNPROCESSABLE_ENTITY, key, err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation { status, .. } => *status,
            ApiError::Store(_) | ApiError::SaveFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Content-type and body-size failures keep their own status (415 / 413)
        let status = match rejection {
            JsonRejection::MissingJsonContentType(_) | JsonRejection::BytesRejection(_) => {
                rejection.status()
            }
            _ => StatusCode::BAD_REQUEST,
        };
        Self::single(status, "body", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::NotFound => status.into_response(),
            ApiError::Validation { errors, .. } => (
                status,
                Json(ValidationProblem {
                    title: VALIDATION_TITLE,
                    status: status.as_u16(),
                    errors,
                }),
            )
                .into_response(),
            ApiError::Store(ref e) => {
                error!("  Store failure: {}", e);
                server_problem(status)
            }
            ApiError::SaveFailed => {
                error!("  Store did not accept the commit");
                server_problem(status)
            }
        }
    }
}

fn server_problem(status: StatusCode) -> Response {
    (
        status,
        Json(ServerProblem {
            title: "An error occurred while processing your request.",
            status: status.as_u16(),
        }),
    )
        .into_response()
}
