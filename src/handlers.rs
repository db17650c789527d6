use crate::config::Config;
use crate::enrichment::EnrichContext;
use crate::errors::AppError;
use crate::models::*;
use crate::person_service::PersonService;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Person CRUD and enrichment.
    pub service: PersonService,
    /// Application configuration.
    pub config: Config,
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "name-analyzer",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/v1/persons
///
/// Creates a person and enriches it with age, gender and nationality.
/// The body is decoded into a value owned by this request only.
#[utoipa::path(
    post,
    path = "/api/v1/persons",
    tag = "persons",
    request_body = CreatePersonRequest,
    responses(
        (status = 201, description = "Person created", body = Person),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_person(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreatePersonRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Person>), AppError> {
    let Json(request) = payload.map_err(invalid_body)?;
    tracing::info!("POST /persons - name: {:?}", request.name);

    let ctx = EnrichContext::with_timeout(state.config.enrichment_deadline);
    let person = state.service.create(request, &ctx).await?;

    Ok((StatusCode::CREATED, Json(person)))
}

/// GET /api/v1/persons/:id
#[utoipa::path(
    get,
    path = "/api/v1/persons/{id}",
    tag = "persons",
    params(("id" = Uuid, Path, description = "Person id")),
    responses(
        (status = 200, description = "Person found", body = Person),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "Person not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_person(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Person>, AppError> {
    let Path(id) = id.map_err(invalid_id)?;
    tracing::info!("GET /persons/{}", id);

    let person = state.service.get(id).await?;
    Ok(Json(person))
}

/// GET /api/v1/persons
///
/// Lists persons, newest first, with optional filters and pagination.
#[utoipa::path(
    get,
    path = "/api/v1/persons",
    tag = "persons",
    params(PersonFilter),
    responses(
        (status = 200, description = "Matching persons", body = [Person]),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_persons(
    State(state): State<Arc<AppState>>,
    filter: Result<Query<PersonFilter>, QueryRejection>,
) -> Result<Json<Vec<Person>>, AppError> {
    let Query(filter) = filter
        .map_err(|e| AppError::BadRequest(format!("invalid query parameters: {}", e)))?;
    tracing::info!("GET /persons - filter: {:?}", filter);

    let persons = state.service.list(&filter).await?;
    tracing::debug!("Returning {} person(s)", persons.len());

    Ok(Json(persons))
}

/// PUT /api/v1/persons/:id
///
/// Updates only the fields present in the body. Enrichment is not re-run.
#[utoipa::path(
    put,
    path = "/api/v1/persons/{id}",
    tag = "persons",
    params(("id" = Uuid, Path, description = "Person id")),
    request_body = UpdatePersonRequest,
    responses(
        (status = 200, description = "Person updated", body = Person),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Person not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn update_person(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdatePersonRequest>, JsonRejection>,
) -> Result<Json<Person>, AppError> {
    let Path(id) = id.map_err(invalid_id)?;
    let Json(request) = payload.map_err(invalid_body)?;
    tracing::info!("PUT /persons/{}", id);

    let person = state.service.update(id, request).await?;
    Ok(Json(person))
}

/// DELETE /api/v1/persons/:id
#[utoipa::path(
    delete,
    path = "/api/v1/persons/{id}",
    tag = "persons",
    params(("id" = Uuid, Path, description = "Person id")),
    responses(
        (status = 204, description = "Person deleted"),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "Person not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn delete_person(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id.map_err(invalid_id)?;
    tracing::info!("DELETE /persons/{}", id);

    state.service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn invalid_body(rejection: JsonRejection) -> AppError {
    tracing::debug!("Rejected request body: {}", rejection);
    AppError::BadRequest("invalid request body".to_string())
}

fn invalid_id(rejection: PathRejection) -> AppError {
    tracing::debug!("Rejected path: {}", rejection);
    AppError::BadRequest("invalid id".to_string())
}
