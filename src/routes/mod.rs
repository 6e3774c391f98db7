//! HTTP handlers of the JSON API.

use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::json;

use crate::domain::auth::Actor;
use crate::dto::status::ErrorResponse;
use crate::models::auth::AuthenticatedUser;
use crate::services::{ErrorCode, ServiceError};

pub mod status;

pub(crate) fn status_code(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::InvalidTransition | ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Renders a service failure as the JSON error envelope.
pub fn error_response(err: &ServiceError) -> HttpResponse {
    HttpResponse::build(status_code(err.code())).json(ErrorResponse::from(err))
}

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({
        "error": { "code": "VALIDATION_ERROR", "message": message }
    }))
}

/// Actor of an already verified token.
pub(crate) fn actor_of(user: &AuthenticatedUser) -> Result<Actor, HttpResponse> {
    user.actor().map_err(|err| {
        log::warn!("Token of {} carries an invalid identity: {err}", user.email);
        HttpResponse::Unauthorized().json(json!({
            "error": { "code": "UNAUTHORIZED", "message": "invalid bearer token" }
        }))
    })
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = bad_request(format!("Malformed request body: {err}"));
    InternalError::from_response(err, response).into()
}

fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = bad_request(format!("Malformed query string: {err}"));
    InternalError::from_response(err, response).into()
}

/// Registers the `/api` scope with JSON error handling for bad payloads.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(
            web::scope("/api")
                .service(status::get_client_status)
                .service(status::list_client_status_history)
                .service(status::update_status)
                .service(status::bulk_update_status)
                .service(status::list_period_statuses)
                .service(status::list_status_types),
        );
}
