//! Web application routes and request handlers.

use crate::app_state::{AppState, SharedAppState};
use crate::cli::CommandLineArgs;
use crate::dataset::Dataset;
use crate::error::AccessorError;
use crate::extract::Selection;
use crate::metrics::{metrics_handler, record_response_metrics, request_counter};
use crate::models::{
    Cleanse, DatasetInfoData, DatasetParams, DatasetsData, FeatureData, FeatureParams,
    FeaturePoint, FeatureQuery, Label, LabelsData, NonzeroData, SetParams, ShapeData, Success,
    VisitParams,
};
use crate::validated::{ValidatedPath, ValidatedQuery};

use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

/// Result of a request handler.
type ApiResult<T> = Result<Json<Success<T>>, AccessorError>;

/// Application router.
///
/// # Arguments
///
/// * `state`: Shared application state
pub fn router(state: SharedAppState) -> Router {
    fn datasets() -> Router<SharedAppState> {
        Router::new()
            .route("/", get(list_datasets))
            .route("/:dataset", get(dataset_info))
            .route("/:dataset/:collection/:set", get(shape))
            .route("/:dataset/:collection/:set/labels", get(labels))
            .route("/:dataset/:collection/:set/feature", get(feature_by_query))
            .route("/:dataset/:collection/:set/:visit", get(nonzero))
            .route("/:dataset/:collection/:set/:visit/:feature", get(feature))
    }

    Router::new()
        .nest("/api/datasets", datasets())
        .layer(
            TraceLayer::new_for_http()
                .on_request(request_counter)
                .on_response(record_response_metrics),
        )
        .with_state(state)
        .route("/metrics", get(metrics_handler))
}

/// The axum service type with trailing slashes normalised.
pub type Service = NormalizePath<Router>;

/// Returns a [crate::app::Service] with all routes and middleware.
///
/// Fails if the application state cannot be created.
///
/// # Arguments
///
/// * `args`: Command line arguments
pub fn service(args: &CommandLineArgs) -> Result<Service, AccessorError> {
    let state = Arc::new(AppState::new(args)?);
    Ok(NormalizePathLayer::trim_trailing_slash().layer(router(state)))
}

/// Run a store read on a blocking thread.
///
/// A task permit from the resource manager is held until the read completes. Reads run on the
/// Rayon thread pool if so configured, otherwise on Tokio's blocking pool.
///
/// # Arguments
///
/// * `state`: Shared application state
/// * `f`: The store read
async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, AccessorError>
where
    F: FnOnce() -> Result<T, AccessorError> + Send + 'static,
    T: Send + 'static,
{
    let _permit = state.resource_manager.task().await?;
    if state.args.use_rayon {
        tokio_rayon::spawn(f).await
    } else {
        tokio::task::spawn_blocking(f).await?
    }
}

/// Returns a handle to a registered dataset.
fn dataset(state: &AppState, id: &str) -> Result<Dataset, AccessorError> {
    state.registry.get(id).cloned()
}

#[tracing::instrument(level = "DEBUG", skip(state))]
async fn list_datasets(State(state): State<SharedAppState>) -> ApiResult<DatasetsData> {
    Ok(Json(Success::new(DatasetsData {
        datasets: state.registry.ids(),
    })))
}

#[tracing::instrument(level = "DEBUG", skip(state))]
async fn dataset_info(
    State(state): State<SharedAppState>,
    ValidatedPath(params): ValidatedPath<DatasetParams>,
) -> ApiResult<DatasetInfoData> {
    let dataset = dataset(&state, &params.dataset)?;
    let nodes = run_blocking(&state, move || dataset.summary()).await?;
    Ok(Json(Success::new(DatasetInfoData { nodes })))
}

#[tracing::instrument(level = "DEBUG", skip(state))]
async fn shape(
    State(state): State<SharedAppState>,
    ValidatedPath(params): ValidatedPath<SetParams>,
) -> ApiResult<ShapeData> {
    let dataset = dataset(&state, &params.dataset)?;
    let shape =
        run_blocking(&state, move || dataset.shape_of(params.collection, params.set)).await?;
    Ok(Json(Success::new(shape.into())))
}

#[tracing::instrument(level = "DEBUG", skip(state))]
async fn labels(
    State(state): State<SharedAppState>,
    ValidatedPath(params): ValidatedPath<SetParams>,
) -> ApiResult<LabelsData> {
    let dataset = dataset(&state, &params.dataset)?;
    let labels = run_blocking(&state, move || {
        dataset.feature_labels(params.collection, params.set)
    })
    .await?;
    let labels = labels
        .into_iter()
        .enumerate()
        .map(|(value, name)| Label { value, name })
        .collect();
    Ok(Json(Success::new(LabelsData { labels })))
}

#[tracing::instrument(level = "DEBUG", skip(state))]
async fn nonzero(
    State(state): State<SharedAppState>,
    ValidatedPath(params): ValidatedPath<VisitParams>,
) -> ApiResult<NonzeroData> {
    let dataset = dataset(&state, &params.dataset)?;
    let reduction = run_blocking(&state, move || {
        dataset.nonzero_features(params.collection, params.set, params.visit)
    })
    .await?;
    Ok(Json(Success::new(reduction.into())))
}

#[tracing::instrument(level = "DEBUG", skip(state))]
async fn feature(
    State(state): State<SharedAppState>,
    ValidatedPath(params): ValidatedPath<FeatureParams>,
    ValidatedQuery(query): ValidatedQuery<FeatureQuery>,
) -> ApiResult<FeatureData> {
    let cleanse = query.cleanse.unwrap_or(state.args.cleanse);
    feature_series(&state, params, cleanse).await
}

#[tracing::instrument(level = "DEBUG", skip(state))]
async fn feature_by_query(
    State(state): State<SharedAppState>,
    ValidatedPath(params): ValidatedPath<SetParams>,
    ValidatedQuery(query): ValidatedQuery<FeatureQuery>,
) -> ApiResult<FeatureData> {
    let visit = query
        .visit
        .ok_or(AccessorError::MissingArgument { name: "visit" })?;
    let feature = query
        .feature
        .ok_or(AccessorError::MissingArgument { name: "feature" })?;
    let cleanse = query.cleanse.unwrap_or(state.args.cleanse);
    let params = FeatureParams {
        dataset: params.dataset,
        collection: params.collection,
        set: params.set,
        visit,
        feature,
    };
    feature_series(&state, params, cleanse).await
}

/// Extract one feature series and its label.
async fn feature_series(
    state: &AppState,
    params: FeatureParams,
    cleanse: Cleanse,
) -> ApiResult<FeatureData> {
    let dataset = dataset(state, &params.dataset)?;
    let FeatureParams {
        collection,
        set,
        visit,
        feature,
        ..
    } = params;
    let (series, label) = run_blocking(state, move || {
        let selection = Selection::series(visit, feature);
        let series = dataset.extract(collection, set, &selection, cleanse)?;
        let mut labels = dataset.feature_labels(collection, set)?;
        // The extraction checks feature < F and feature_labels checks F labels.
        let value = usize::try_from(feature)?;
        let name = labels.swap_remove(value);
        Ok((series, Label { value, name }))
    })
    .await?;
    let feature = series
        .points()
        .map(|(x, y)| FeaturePoint { x, y })
        .collect();
    Ok(Json(Success::new(FeatureData { feature, label })))
}
