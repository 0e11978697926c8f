//! Route handlers.
//!
//! Handlers hold the registry lock only for the duration of one registry
//! call. Writes take the write lock; the last committed write wins.

use super::dto::{
    AboveAverageList, CutoffList, FieldUpdate, HealthResponse, PersonDto, SearchParams,
};
use super::extract::JsonBody;
use super::{ApiError, AppState};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use roster_core::derive::adult_cutoff;
use roster_core::stats::{BracketCount, MonthCount};
use roster_core::validate::parse_month;
use roster_core::{ExportFormat, FieldErrors, PersonField, PersonForm, PersonId, Sex, Statistics};

type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// HEALTH
// =============================================================================

pub async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let people = state.registry.read().await.count()?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        people,
    }))
}

// =============================================================================
// PEOPLE
// =============================================================================

pub async fn list_people(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<PersonDto>>> {
    let query = params.q.unwrap_or_default();
    let people = state.registry.read().await.search(&query)?;
    Ok(Json(PersonDto::list(&people, state.clock.today())))
}

pub async fn create_person(
    State(state): State<AppState>,
    JsonBody(form): JsonBody<PersonForm>,
) -> ApiResult<(StatusCode, Json<PersonDto>)> {
    let person = state.registry.write().await.create(&form, state.clock.now())?;
    tracing::info!(id = person.id.0, "person created");
    Ok((
        StatusCode::CREATED,
        Json(PersonDto::new(&person, state.clock.today())),
    ))
}

pub async fn get_person(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<PersonDto>> {
    let person = state.registry.read().await.get(PersonId(id))?;
    Ok(Json(PersonDto::new(&person, state.clock.today())))
}

pub async fn find_by_national_id(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<Json<PersonDto>> {
    let person = state
        .registry
        .read()
        .await
        .find_by_national_id(&raw)?
        .ok_or_else(|| ApiError::NotFound(format!("no person with national ID {raw}")))?;
    Ok(Json(PersonDto::new(&person, state.clock.today())))
}

pub async fn delete_person(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<PersonDto>> {
    let person = state.registry.write().await.delete(PersonId(id))?;
    tracing::info!(id, "person deleted");
    Ok(Json(PersonDto::new(&person, state.clock.today())))
}

// -----------------------------------------------------------------------------
// Single-field updates
// -----------------------------------------------------------------------------

async fn update(
    state: &AppState,
    id: u64,
    field: PersonField,
    value: &str,
) -> ApiResult<Json<PersonDto>> {
    let now = state.clock.now();
    let person = state
        .registry
        .write()
        .await
        .update_field(PersonId(id), field, value, now)?;
    tracing::info!(id, field = %field, "person updated");
    Ok(Json(PersonDto::new(&person, state.clock.today())))
}

pub async fn update_given_name(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    JsonBody(body): JsonBody<FieldUpdate>,
) -> ApiResult<Json<PersonDto>> {
    update(&state, id, PersonField::GivenName, &body.value).await
}

pub async fn update_family_name(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    JsonBody(body): JsonBody<FieldUpdate>,
) -> ApiResult<Json<PersonDto>> {
    update(&state, id, PersonField::FamilyName, &body.value).await
}

pub async fn update_birth_date(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    JsonBody(body): JsonBody<FieldUpdate>,
) -> ApiResult<Json<PersonDto>> {
    update(&state, id, PersonField::BirthDate, &body.value).await
}

pub async fn update_sex(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    JsonBody(body): JsonBody<FieldUpdate>,
) -> ApiResult<Json<PersonDto>> {
    update(&state, id, PersonField::Sex, &body.value).await
}

pub async fn update_national_id(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    JsonBody(body): JsonBody<FieldUpdate>,
) -> ApiResult<Json<PersonDto>> {
    update(&state, id, PersonField::NationalId, &body.value).await
}

// =============================================================================
// FILTERS
// =============================================================================

pub async fn by_sex(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<Vec<PersonDto>>> {
    let sex: Sex = code
        .parse()
        .map_err(|e| FieldErrors::single("sex", &e))?;
    let people = state.registry.read().await.by_sex(sex)?;
    Ok(Json(PersonDto::list(&people, state.clock.today())))
}

pub async fn oldest(State(state): State<AppState>) -> ApiResult<Json<Option<PersonDto>>> {
    let person = state.registry.read().await.oldest()?;
    let today = state.clock.today();
    Ok(Json(person.map(|p| PersonDto::new(&p, today))))
}

pub async fn youngest(State(state): State<AppState>) -> ApiResult<Json<Option<PersonDto>>> {
    let person = state.registry.read().await.youngest()?;
    let today = state.clock.today();
    Ok(Json(person.map(|p| PersonDto::new(&p, today))))
}

pub async fn minors(State(state): State<AppState>) -> ApiResult<Json<CutoffList>> {
    let today = state.clock.today();
    let people = state.registry.read().await.minors(today)?;
    Ok(Json(CutoffList {
        cutoff: adult_cutoff(today),
        people: PersonDto::list(&people, today),
    }))
}

pub async fn adults(State(state): State<AppState>) -> ApiResult<Json<CutoffList>> {
    let today = state.clock.today();
    let people = state.registry.read().await.adults(today)?;
    Ok(Json(CutoffList {
        cutoff: adult_cutoff(today),
        people: PersonDto::list(&people, today),
    }))
}

pub async fn above_average(State(state): State<AppState>) -> ApiResult<Json<AboveAverageList>> {
    let today = state.clock.today();
    let registry = state.registry.read().await;
    let average_age = registry.average_age(today)?;
    let people = registry.above_average(today)?;
    Ok(Json(AboveAverageList {
        average_age,
        people: PersonDto::list(&people, today),
    }))
}

pub async fn by_birth_month(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<Json<Vec<PersonDto>>> {
    let month = parse_month(&raw).map_err(|e| FieldErrors::single("month", &e))?;
    let people = state.registry.read().await.by_birth_month(month)?;
    Ok(Json(PersonDto::list(&people, state.clock.today())))
}

// =============================================================================
// STATISTICS
// =============================================================================

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<Statistics>> {
    let stats = state.registry.read().await.statistics(state.clock.today())?;
    Ok(Json(stats))
}

pub async fn age_brackets(State(state): State<AppState>) -> ApiResult<Json<Vec<BracketCount>>> {
    let stats = state.registry.read().await.statistics(state.clock.today())?;
    Ok(Json(stats.age_brackets))
}

pub async fn birth_months(State(state): State<AppState>) -> ApiResult<Json<Vec<MonthCount>>> {
    let stats = state.registry.read().await.statistics(state.clock.today())?;
    Ok(Json(stats.birth_months))
}

// =============================================================================
// EXPORT
// =============================================================================

pub async fn export(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<Response> {
    let format: ExportFormat = raw
        .parse()
        .map_err(|e: roster_core::export::UnknownExportFormat| ApiError::NotFound(e.to_string()))?;
    let file = state.registry.read().await.export(format, state.clock.today())?;
    tracing::info!(format = %format, bytes = file.bytes.len(), "export generated");

    let disposition = format!("attachment; filename=\"{}\"", file.filename());
    Ok((
        [
            (header::CONTENT_TYPE, file.mime_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}
