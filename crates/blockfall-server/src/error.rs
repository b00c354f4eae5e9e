use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::{error, warn};
use serde::Serialize;

use crate::store::StoreError;

/// A rejected request. Rendered as `{"success": false, "message": ...}`.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ApiError {
    #[display("username and password are required")]
    MissingCredentials,
    #[display("username is already taken")]
    UsernameTaken,
    #[display("invalid username or password")]
    InvalidCredentials,
    #[display("score, level and gameMode are required")]
    InvalidScore,
    #[display("authentication required")]
    Unauthorized,
    #[display("invalid or expired token")]
    InvalidToken,
    #[display("user not found")]
    UserNotFound,
    #[display("storage failure: {source}")]
    Store { source: StoreError },
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredentials
            | Self::UsernameTaken
            | Self::InvalidCredentials
            | Self::InvalidScore => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidToken => StatusCode::FORBIDDEN,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(source: StoreError) -> Self {
        Self::Store { source }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!("{self}");
            "internal server error".to_owned()
        } else {
            warn!("rejected request: {self}");
            self.to_string()
        };
        let body = ErrorBody {
            success: false,
            message,
        };
        (status, Json(body)).into_response()
    }
}
