//! HTTP API

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::{
    database::CatalogStore,
    errors::CatalogError,
    models::{
        Appointment, Doctor, Hospital, HospitalFilter, Inquiry, NewAppointment, NewInquiry,
        PackageFilter, PackageKey, PackageRecord, PopularityOverride, TreatmentFilter,
        TreatmentRecord,
    },
    ranking,
    scoring::PopularityScore,
};

/// Repository handle shared by all handlers
pub type SharedStore = Arc<dyn CatalogStore>;

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = match &self {
            CatalogError::NotFound { .. } => StatusCode::NOT_FOUND,
            e if e.is_validation() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {:?}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Build the application router
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/hospitals", get(list_hospitals))
        .route("/api/hospitals/{id}", get(get_hospital))
        .route("/api/hospitals/{id}/doctors", get(list_doctors))
        .route("/api/treatments", get(list_treatments))
        .route("/api/treatments/{id}", get(get_treatment))
        .route("/api/packages", get(list_packages))
        .route("/api/packages/{key}", get(view_package))
        .route("/api/inquiries", post(create_inquiry))
        .route("/api/appointments", post(create_appointment))
        .route(
            "/api/admin/packages/{id}/popularity",
            put(override_popularity),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_hospitals(
    State(store): State<SharedStore>,
    Query(filter): Query<HospitalFilter>,
) -> Result<Json<Vec<Hospital>>, CatalogError> {
    let hospitals = store.list_hospitals(filter.city.as_deref()).await?;
    Ok(Json(hospitals))
}

async fn get_hospital(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<Json<Hospital>, CatalogError> {
    store
        .get_hospital(id)
        .await?
        .map(Json)
        .ok_or_else(|| CatalogError::not_found("hospital", id))
}

async fn list_doctors(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Doctor>>, CatalogError> {
    if store.get_hospital(id).await?.is_none() {
        return Err(CatalogError::not_found("hospital", id));
    }
    Ok(Json(store.list_doctors(id).await?))
}

/// Public treatment listing, one best offer per treatment unless `dedupe=false`
async fn list_treatments(
    State(store): State<SharedStore>,
    Query(filter): Query<TreatmentFilter>,
) -> Result<Json<Vec<TreatmentRecord>>, CatalogError> {
    let records = store.list_treatments(&filter).await?;
    Ok(Json(ranking::rank(&records, filter.dedupe())))
}

async fn get_treatment(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<Json<TreatmentRecord>, CatalogError> {
    store
        .get_treatment(id)
        .await?
        .map(Json)
        .ok_or_else(|| CatalogError::not_found("treatment", id))
}

async fn list_packages(
    State(store): State<SharedStore>,
    Query(filter): Query<PackageFilter>,
) -> Result<Json<Vec<PackageRecord>>, CatalogError> {
    Ok(Json(store.list_packages(filter.featured).await?))
}

async fn view_package(
    State(store): State<SharedStore>,
    Path(key): Path<String>,
) -> Result<Json<PackageRecord>, CatalogError> {
    let key = PackageKey::from(key.as_str());
    store
        .view_package(&key)
        .await?
        .map(Json)
        .ok_or_else(|| CatalogError::not_found("package", &key))
}

async fn create_inquiry(
    State(store): State<SharedStore>,
    Json(inquiry): Json<NewInquiry>,
) -> Result<(StatusCode, Json<Inquiry>), CatalogError> {
    let inquiry = store.create_inquiry(inquiry).await?;
    Ok((StatusCode::CREATED, Json(inquiry)))
}

async fn create_appointment(
    State(store): State<SharedStore>,
    Json(appointment): Json<NewAppointment>,
) -> Result<(StatusCode, Json<Appointment>), CatalogError> {
    let appointment = store.create_appointment(appointment).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// Replace the computed score until the next view or inquiry
async fn override_popularity(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
    Json(body): Json<PopularityOverride>,
) -> Result<Json<PackageRecord>, CatalogError> {
    let score = PopularityScore::try_from(&body.popularity_score)?;
    store
        .override_popularity(id, score)
        .await?
        .map(Json)
        .ok_or_else(|| CatalogError::not_found("package", id))
}
