use actix_web::{HttpResponse, Responder, get, post, web};

use crate::dto::status::{BulkUpdateResponse, PageResponse, StatusTypeResponse};
use crate::forms::status::{BulkStatusUpdateForm, HistoryQuery, PeriodQuery, StatusUpdateForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::routes::{actor_of, error_response};
use crate::services::{ServiceError, bulk, catalog, query, status};

#[get("/v1/clients/{client_id}/status")]
pub async fn get_client_status(
    client_id: web::Path<i32>,
    params: web::Query<PeriodQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let actor = match actor_of(&user) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match query::get_current_status(repo.get_ref(), &actor, client_id.into_inner(), &params) {
        Ok(status) => HttpResponse::Ok().json(status),
        Err(err) => error_response(&err),
    }
}

#[get("/v1/clients/{client_id}/status/history")]
pub async fn list_client_status_history(
    client_id: web::Path<i32>,
    params: web::Query<HistoryQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let actor = match actor_of(&user) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match query::list_status_history(repo.get_ref(), &actor, client_id.into_inner(), &params) {
        Ok(page) => HttpResponse::Ok().json(PageResponse::from(page)),
        Err(err) => error_response(&err),
    }
}

#[post("/v1/status")]
pub async fn update_status(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<StatusUpdateForm>,
) -> impl Responder {
    let actor = match actor_of(&user) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match status::update_status(repo.get_ref(), &actor, form) {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(err) => error_response(&err),
    }
}

#[post("/v1/status/bulk")]
pub async fn bulk_update_status(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<BulkStatusUpdateForm>,
) -> impl Responder {
    let actor = match actor_of(&user) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    // Up to a hundred sequential writes; keep them off the async workers.
    let result = web::block(move || bulk::bulk_update_statuses(repo.get_ref(), &actor, form))
        .await
        .map_err(|err| {
            log::error!("Bulk update task failed: {err}");
            ServiceError::Internal(err.to_string())
        })
        .and_then(|result| result);

    match result {
        Ok(result) => HttpResponse::Ok().json(BulkUpdateResponse::from(result)),
        Err(err) => error_response(&err),
    }
}

#[get("/v1/statuses")]
pub async fn list_period_statuses(
    params: web::Query<PeriodQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let actor = match actor_of(&user) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match query::list_period_statuses(repo.get_ref(), &actor, &params) {
        Ok(page) => HttpResponse::Ok().json(PageResponse::from(page)),
        Err(err) => error_response(&err),
    }
}

#[get("/v1/status-types")]
pub async fn list_status_types(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let actor = match actor_of(&user) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match catalog::list_status_types(repo.get_ref(), &actor) {
        Ok(entries) => HttpResponse::Ok().json(
            entries
                .into_iter()
                .map(StatusTypeResponse::from)
                .collect::<Vec<_>>(),
        ),
        Err(err) => error_response(&err),
    }
}
