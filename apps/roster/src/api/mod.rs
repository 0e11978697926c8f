//! # HTTP API
//!
//! JSON/REST surface over a shared [`Registry`], plus export downloads.
//!
//! ## Endpoints
//!
//! - `GET /health`
//! - `GET /people?q=`, `POST /people`
//! - `GET|DELETE /people/{id}`, `GET /people/by-national-id/{raw}`
//! - `PUT /people/{id}/given-name|family-name|birth-date|sex|national-id`
//! - `GET /filters/sex/{code}`, `/filters/oldest`, `/filters/youngest`,
//!   `/filters/minors`, `/filters/adults`, `/filters/above-average`,
//!   `/filters/birth-month/{month}`
//! - `GET /stats`, `/stats/age-brackets`, `/stats/birth-months`
//! - `GET /export/{csv|json|xlsx}`

pub mod dto;
mod error;
mod extract;
mod handlers;

pub use error::ApiError;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::{Method, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use chrono::{DateTime, Local, NaiveDate, Utc};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use roster_core::Registry;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

// =============================================================================
// STATE
// =============================================================================

/// Source of "now" for timestamps and "today" for age computations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    /// Wall clock; "today" is the local calendar date.
    System,
    /// Frozen instant, for tests.
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn now(self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Fixed(at) => at,
        }
    }

    pub fn today(self) -> NaiveDate {
        match self {
            Self::System => Local::now().date_naive(),
            Self::Fixed(at) => at.date_naive(),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RwLock<Registry>>,
    pub clock: Clock,
}

impl AppState {
    pub fn new(registry: Registry, clock: Clock) -> Self {
        Self {
            registry: Arc::new(RwLock::new(registry)),
            clock,
        }
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the router with tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(handlers::health))
        // People
        .route(
            "/people",
            get(handlers::list_people).post(handlers::create_person),
        )
        .route(
            "/people/{id}",
            get(handlers::get_person).delete(handlers::delete_person),
        )
        .route(
            "/people/by-national-id/{national_id}",
            get(handlers::find_by_national_id),
        )
        .route("/people/{id}/given-name", put(handlers::update_given_name))
        .route("/people/{id}/family-name", put(handlers::update_family_name))
        .route("/people/{id}/birth-date", put(handlers::update_birth_date))
        .route("/people/{id}/sex", put(handlers::update_sex))
        .route("/people/{id}/national-id", put(handlers::update_national_id))
        // Filters
        .route("/filters/sex/{code}", get(handlers::by_sex))
        .route("/filters/oldest", get(handlers::oldest))
        .route("/filters/youngest", get(handlers::youngest))
        .route("/filters/minors", get(handlers::minors))
        .route("/filters/adults", get(handlers::adults))
        .route("/filters/above-average", get(handlers::above_average))
        .route("/filters/birth-month/{month}", get(handlers::by_birth_month))
        // Statistics
        .route("/stats", get(handlers::stats))
        .route("/stats/age-brackets", get(handlers::age_brackets))
        .route("/stats/birth-months", get(handlers::birth_months))
        // Export
        .route("/export/{format}", get(handlers::export))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

// =============================================================================
// RATE LIMITING
// =============================================================================

type Limiter = Arc<DefaultDirectRateLimiter>;

async fn rate_limit(State(limiter): State<Limiter>, request: Request, next: Next) -> Response {
    if limiter.check().is_err() {
        tracing::warn!(path = %request.uri().path(), "rate limit exceeded");
        return ApiError::RateLimited.into_response();
    }
    next.run(request).await
}

/// Wrap `router` in a global limit of `per_second` requests per second.
pub fn with_rate_limit(router: Router, per_second: NonZeroU32) -> Router {
    let limiter: Limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));
    router.layer(middleware::from_fn_with_state(limiter, rate_limit))
}
