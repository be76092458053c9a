// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::core::ErrorResponse;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ItemwatchError {
    #[error("invalid connection configuration: {0}")]
    Configuration(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("resource version conflict: {0}")]
    Conflict(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("api unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, ItemwatchError>;

impl From<kube::Error> for ItemwatchError {
    fn from(error: kube::Error) -> Self {
        match error {
            kube::Error::Api(response) => Self::from_response(response),
            kube::Error::Auth(error) => ItemwatchError::Unauthorized(error.to_string()),
            other => ItemwatchError::Unavailable(other.to_string()),
        }
    }
}

impl ItemwatchError {
    /// Classify an API status response, by reason first and HTTP code second.
    fn from_response(response: ErrorResponse) -> Self {
        match (response.reason.as_str(), response.code) {
            ("NotFound", _) | (_, 404) => ItemwatchError::NotFound(response.message),
            ("AlreadyExists", _) => ItemwatchError::AlreadyExists(response.message),
            ("Conflict", _) | (_, 409) => ItemwatchError::Conflict(response.message),
            ("Invalid" | "BadRequest", _) | (_, 400 | 422) => ItemwatchError::Invalid(response.message),
            ("Unauthorized" | "Forbidden", _) | (_, 401 | 403) => {
                ItemwatchError::Unauthorized(response.message)
            }
            _ => ItemwatchError::Unavailable(response.message),
        }
    }
}
