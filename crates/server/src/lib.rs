use api_types::ErrorBody;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::EngineError;

pub use server::{ServerState, router, run, run_with_listener};

mod admin;
mod bookings;
mod convert;
mod expeditions;
mod media;
mod payments;
mod reviews;
mod server;
mod trails;
mod users;

pub enum ServerError {
    Engine(EngineError),
    Unauthenticated,
    Validation(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_)
        | EngineError::CapacityExceeded(_)
        | EngineError::Conflict(_) => StatusCode::CONFLICT,
        EngineError::NotBookable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Database(_) | EngineError::PasswordHash(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::PasswordHash(msg) => {
            tracing::error!("password hashing error: {msg}");
            "internal server error".to_string()
        }
        EngineError::Validation(msg)
        | EngineError::KeyNotFound(msg)
        | EngineError::ExistingKey(msg)
        | EngineError::CapacityExceeded(msg)
        | EngineError::NotBookable(msg)
        | EngineError::Conflict(msg)
        | EngineError::Forbidden(msg) => msg,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match self {
            ServerError::Engine(err) => {
                let code = err.code();
                (status_for_engine_error(&err), code, message_for_engine_error(err))
            }
            ServerError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "missing or invalid credentials".to_string(),
            ),
            ServerError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
        };

        let mut response = (
            status,
            Json(ErrorBody {
                code: code.to_string(),
                message,
            }),
        )
            .into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Basic realm=\"trekko\""),
            );
        }
        response
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Validation(value.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(value: QueryRejection) -> Self {
        Self::Validation(value.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(value: PathRejection) -> Self {
        Self::Validation(value.body_text())
    }
}
