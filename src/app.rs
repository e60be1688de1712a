//! HTTP API.
//!
//! Every route runs one query against the store and reshapes the result into JSON.

use crate::app_state::{AppState, SharedAppState};
use crate::error::BiodiversityError;
use crate::metrics::{metrics_handler, record_response_metrics, request_counter};
use crate::models::{MetadataPath, SampleMetadata, SamplePath, SampleVector};
use crate::operations;
use crate::validated_path::ValidatedPath;

use axum::{
    extract::State,
    response::Html,
    routing::get,
    Json, Router,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

/// Dashboard page served at `/`.
static INDEX_HTML: &str = include_str!("../templates/index.html");

/// Service type exposed by [service].
pub type Service = NormalizePath<Router>;

/// Returns a [axum::Router] with all routes.
///
/// # Arguments
///
/// * `state`: Shared application state
pub fn router(state: SharedAppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/names", get(names))
        .route("/otu", get(otu))
        .route("/otu/catalog", get(otu_catalog))
        .route("/metadata/:sample", get(sample_metadata))
        .route("/wfreq/:sample", get(sample_wfreq))
        .route("/samples/:sample", get(samples))
        .route("/metrics", get(metrics_handler))
        .layer(
            TraceLayer::new_for_http()
                .on_request(request_counter)
                .on_response(record_response_metrics),
        )
        .with_state(state)
}

/// Returns a [Service] with all routes, that strips trailing slashes before routing.
///
/// # Arguments
///
/// * `state`: Application state
pub fn service(state: AppState) -> Service {
    NormalizePathLayer::trim_trailing_slash().layer(router(Arc::new(state)))
}

/// Dashboard homepage.
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// List of sample names, in column order of the count matrix.
#[tracing::instrument(skip(state))]
async fn names(
    State(state): State<SharedAppState>,
) -> Result<Json<Vec<String>>, BiodiversityError> {
    let columns = state.db.sample_columns().await?;
    Ok(Json(operations::sample_names(&columns)))
}

/// List of taxonomic unit descriptions.
#[tracing::instrument(skip(state))]
async fn otu(
    State(state): State<SharedAppState>,
) -> Result<Json<Vec<Option<String>>>, BiodiversityError> {
    Ok(Json(state.db.otu_descriptions().await?))
}

/// Taxonomic unit descriptions keyed by `otu_id`.
#[tracing::instrument(skip(state))]
async fn otu_catalog(
    State(state): State<SharedAppState>,
) -> Result<Json<BTreeMap<i64, Option<String>>>, BiodiversityError> {
    let catalog = state.db.otu_catalog().await?;
    Ok(Json(catalog.into_iter().collect()))
}

/// Metadata for a given sample.
#[tracing::instrument(skip(state))]
async fn sample_metadata(
    State(state): State<SharedAppState>,
    ValidatedPath(path): ValidatedPath<MetadataPath>,
) -> Result<Json<SampleMetadata>, BiodiversityError> {
    let sample_id = path.sample_id()?;
    let rows = state.db.sample_metadata(sample_id).await?;
    Ok(Json(operations::sample_metadata(&path.sample, rows)?))
}

/// Weekly washing frequency of a given sample, as an integer.
#[tracing::instrument(skip(state))]
async fn sample_wfreq(
    State(state): State<SharedAppState>,
    ValidatedPath(path): ValidatedPath<MetadataPath>,
) -> Result<Json<i64>, BiodiversityError> {
    let sample_id = path.sample_id()?;
    let values = state.db.wash_frequencies(sample_id).await?;
    Ok(Json(operations::wash_frequency(&path.sample, values)?))
}

/// Taxonomic units with more than one count in a given sample, largest first.
///
/// Responds with a single-element list for compatibility with the dashboard.
#[tracing::instrument(skip(state))]
async fn samples(
    State(state): State<SharedAppState>,
    ValidatedPath(path): ValidatedPath<SamplePath>,
) -> Result<Json<[SampleVector; 1]>, BiodiversityError> {
    let rows = state.db.sample_counts(&path.sample).await?;
    Ok(Json([operations::sample_vector(rows)]))
}
