use crate::errors::AppError;
use crate::handlers::{self, AppState};
use crate::models::{CreatePersonRequest, ErrorResponse, Gender, Person, UpdatePersonRequest};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Largest accepted request body. Person payloads are a few hundred bytes.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Name Analyzer API",
        description = "Person records enriched with age, gender and nationality inferred from the name"
    ),
    paths(
        handlers::create_person,
        handlers::list_persons,
        handlers::get_person,
        handlers::update_person,
        handlers::delete_person
    ),
    components(schemas(Person, CreatePersonRequest, UpdatePersonRequest, ErrorResponse, Gender)),
    tags((name = "persons", description = "Person CRUD with enrichment"))
)]
pub struct ApiDoc;

/// Person API routes without rate limiting.
pub fn person_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/v1/persons",
            post(handlers::create_person).get(handlers::list_persons),
        )
        .route(
            "/api/v1/persons/:id",
            get(handlers::get_person)
                .put(handlers::update_person)
                .delete(handlers::delete_person),
        )
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)))
}

/// Person API routes behind a per-client-IP limiter: `rate_limit` requests
/// per second, with bursts of up to twice that.
///
/// The client IP comes from `X-Forwarded-For`, `X-Real-IP` or `Forwarded`,
/// falling back to the peer address, so the service must be served with
/// `ConnectInfo<SocketAddr>`.
pub fn rate_limited_person_routes(rate_limit: u64) -> Result<Router<Arc<AppState>>, AppError> {
    let per_second = u32::try_from(rate_limit)
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            AppError::InternalError(format!("Invalid rate limit: {} requests/second", rate_limit))
        })?;

    // One token is replenished every 1/rate_limit seconds
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .period(Duration::from_secs(1) / per_second)
            .burst_size(per_second.saturating_mul(2))
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| {
                AppError::InternalError("Invalid rate limiter configuration".to_string())
            })?,
    );

    Ok(person_routes().layer(ServiceBuilder::new().layer(GovernorLayer {
        config: governor_conf,
    })))
}

/// Full application: health check, Swagger UI and the
/// person API, with request tracing and permissive CORS.
pub fn build_router(state: Arc<AppState>, api: Router<Arc<AppState>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
