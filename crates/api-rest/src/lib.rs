//! # API REST
//!
//! REST API implementation for LST.
//!
//! Handles:
//! - HTTP endpoints with axum (program selection rides on the path)
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, error mapping)
//!
//! Uses `api-shared` for wire types and the session-context extractor. The
//! router lives here so both the standalone binary and the workspace
//! launcher serve the same surface.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use api_shared::dto::{
    parse_range, CollectReq, CollectRes, CreateSpecimenReq, CreateSpecimenRes, ListParams,
    ListSpecimensRes, OkRes, PackageSpecimensReq, PackageSpecimensRes, PackagedListRes,
    SpecimenDto, TimeSeriesParams, TimeSeriesPointDto, TimeSeriesRes,
};
use api_shared::{FacilityContext, HealthRes, HealthService};
use lst_core::query::SpecimenQuery;
use lst_core::{Program, SpecimenId, TrackerError, TrackerService};

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: TrackerService,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        create_specimen,
        collect_specimen,
        delete_specimen,
        list_specimens,
        package_specimens,
        list_ready_for_packaging,
        list_packaged,
        time_series,
    ),
    components(schemas(
        HealthRes,
        CreateSpecimenReq,
        CreateSpecimenRes,
        CollectReq,
        CollectRes,
        OkRes,
        SpecimenDto,
        ListSpecimensRes,
        PackageSpecimensReq,
        PackageSpecimensRes,
        PackagedListRes,
        TimeSeriesPointDto,
        TimeSeriesRes,
    ))
)]
struct ApiDoc;

/// Build the REST router over a configured [`TrackerService`].
pub fn router(service: TrackerService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/:program/specimens",
            post(create_specimen).get(list_specimens),
        )
        .route("/:program/specimens/:id/collect", post(collect_specimen))
        .route("/:program/specimens/:id", delete(delete_specimen))
        .route(
            "/:program/packages",
            post(package_specimens).get(list_packaged),
        )
        .route("/:program/packages/ready", get(list_ready_for_packaging))
        .route("/:program/analytics/time-series", get(time_series))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(AppState { service })
}

type HandlerError = (StatusCode, String);

/// Map a core failure onto an HTTP status. Business rejections keep their
/// message; storage failures are logged and masked.
fn error_response(err: TrackerError) -> HandlerError {
    let status = match &err {
        TrackerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        TrackerError::NotFound => StatusCode::NOT_FOUND,
        TrackerError::TenantMismatch => StatusCode::FORBIDDEN,
        TrackerError::BatchFull { .. }
        | TrackerError::AlreadyPackaged { .. }
        | TrackerError::InvalidState(_) => StatusCode::CONFLICT,
        TrackerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("request failed: {err}");
        return (status, "Internal error".into());
    }
    (status, err.to_string())
}

fn parse_program(raw: &str) -> Result<Program, HandlerError> {
    raw.parse::<Program>().map_err(error_response)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/{program}/specimens",
    request_body = CreateSpecimenReq,
    responses(
        (status = 200, description = "Specimen created in the open batch", body = CreateSpecimenRes),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Batch is full")
    )
)]
/// Create a specimen in the caller's open batch.
async fn create_specimen(
    State(state): State<AppState>,
    AxumPath(program): AxumPath<String>,
    ctx: FacilityContext,
    Json(req): Json<CreateSpecimenReq>,
) -> Result<Json<CreateSpecimenRes>, HandlerError> {
    let program = parse_program(&program)?;
    let (facility, sender, draft) = req.into_parts(ctx.facility_id).map_err(error_response)?;
    let specimen = state
        .service
        .create_specimen(program, &facility, &sender, draft)
        .map_err(error_response)?;
    Ok(Json(CreateSpecimenRes {
        specimen_id: specimen.id.as_uuid(),
        batch_id: specimen.batch_id.as_uuid(),
        position: specimen.position.get(),
    }))
}

#[utoipa::path(
    post,
    path = "/{program}/specimens/{id}/collect",
    request_body = CollectReq,
    responses(
        (status = 200, description = "Collection recorded", body = CollectRes),
        (status = 403, description = "Specimen belongs to another facility"),
        (status = 404, description = "Specimen not found")
    )
)]
/// Record that a sample was collected.
async fn collect_specimen(
    State(state): State<AppState>,
    AxumPath((program, id)): AxumPath<(String, Uuid)>,
    ctx: FacilityContext,
    Json(req): Json<CollectReq>,
) -> Result<Json<CollectRes>, HandlerError> {
    let program = parse_program(&program)?;
    let collected_at = req.collected_at().map_err(error_response)?;
    let record = state
        .service
        .collect(
            program,
            ctx.facility_id,
            SpecimenId::new(id),
            collected_at,
            req.barcode,
        )
        .map_err(error_response)?;
    let collected_at = record
        .collected_at
        .map(|at| at.to_rfc3339())
        .unwrap_or_default();
    Ok(Json(CollectRes {
        specimen_id: record.id.as_uuid(),
        collected_at,
    }))
}

#[utoipa::path(
    delete,
    path = "/{program}/specimens/{id}",
    responses(
        (status = 200, description = "Specimen deleted", body = OkRes),
        (status = 404, description = "Specimen not found"),
        (status = 409, description = "Specimen has progressed past creation")
    )
)]
/// Delete a specimen that has not progressed past creation.
async fn delete_specimen(
    State(state): State<AppState>,
    AxumPath((program, id)): AxumPath<(String, Uuid)>,
    ctx: FacilityContext,
) -> Result<Json<OkRes>, HandlerError> {
    let program = parse_program(&program)?;
    state
        .service
        .delete_specimen(program, ctx.facility_id, SpecimenId::new(id))
        .map_err(error_response)?;
    Ok(Json(OkRes {
        ok: true,
        message: "Specimen deleted".into(),
    }))
}

#[utoipa::path(
    get,
    path = "/{program}/specimens",
    params(ListParams),
    responses(
        (status = 200, description = "Paginated specimen listing", body = ListSpecimensRes)
    )
)]
/// List the facility's specimens with stage filter and search.
async fn list_specimens(
    State(state): State<AppState>,
    AxumPath(program): AxumPath<String>,
    ctx: FacilityContext,
    Query(params): Query<ListParams>,
) -> Result<Json<ListSpecimensRes>, HandlerError> {
    let program = parse_program(&program)?;
    let query = SpecimenQuery {
        status: params.status,
        search: params.search,
    };
    let page = state
        .service
        .list_specimens(
            program,
            ctx.facility_id,
            &query,
            params.limit,
            params.offset,
        )
        .map_err(error_response)?;
    Ok(Json(ListSpecimensRes {
        items: page
            .items
            .iter()
            .map(|record| SpecimenDto::from_record(program, record))
            .collect(),
        total: page.total,
    }))
}

#[utoipa::path(
    post,
    path = "/{program}/packages",
    request_body = PackageSpecimensReq,
    responses(
        (status = 200, description = "Specimens packaged", body = PackageSpecimensRes),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Specimen not found"),
        (status = 409, description = "A specimen is already packaged")
    )
)]
/// Group collected specimens into a named transport package.
async fn package_specimens(
    State(state): State<AppState>,
    AxumPath(program): AxumPath<String>,
    ctx: FacilityContext,
    Json(req): Json<PackageSpecimensReq>,
) -> Result<Json<PackageSpecimensRes>, HandlerError> {
    let program = parse_program(&program)?;
    let specimens: Vec<SpecimenId> = req.specimens.into_iter().map(SpecimenId::new).collect();
    let receipt = state
        .service
        .package_specimens(program, ctx.facility_id, &req.package, &specimens)
        .map_err(error_response)?;
    Ok(Json(PackageSpecimensRes {
        ok: true,
        message: format!(
            "{} specimen(s) packaged in \"{}\"",
            receipt.specimens.len(),
            receipt.label
        ),
        package: receipt.label.as_str().to_owned(),
        specimen_count: receipt.specimens.len(),
    }))
}

#[utoipa::path(
    get,
    path = "/{program}/packages/ready",
    params(ListParams),
    responses(
        (status = 200, description = "Collected, unpackaged specimens", body = ListSpecimensRes)
    )
)]
/// Specimens eligible for packaging.
async fn list_ready_for_packaging(
    State(state): State<AppState>,
    AxumPath(program): AxumPath<String>,
    ctx: FacilityContext,
    Query(params): Query<ListParams>,
) -> Result<Json<ListSpecimensRes>, HandlerError> {
    let program = parse_program(&program)?;
    let page = state
        .service
        .list_ready_for_packaging(program, ctx.facility_id, params.limit, params.offset)
        .map_err(error_response)?;
    Ok(Json(ListSpecimensRes {
        items: page
            .items
            .iter()
            .map(|record| SpecimenDto::from_record(program, record))
            .collect(),
        total: page.total,
    }))
}

#[utoipa::path(
    get,
    path = "/{program}/packages",
    params(ListParams),
    responses(
        (status = 200, description = "Packaged specimens and known labels", body = PackagedListRes)
    )
)]
/// Packaged specimens, optionally narrowed to one package label.
async fn list_packaged(
    State(state): State<AppState>,
    AxumPath(program): AxumPath<String>,
    ctx: FacilityContext,
    Query(params): Query<ListParams>,
) -> Result<Json<PackagedListRes>, HandlerError> {
    let program = parse_program(&program)?;
    let listing = state
        .service
        .list_packaged(
            program,
            ctx.facility_id,
            params.package.as_deref(),
            params.limit,
            params.offset,
        )
        .map_err(error_response)?;
    Ok(Json(PackagedListRes {
        items: listing
            .page
            .items
            .iter()
            .map(|record| SpecimenDto::from_record(program, record))
            .collect(),
        total: listing.page.total,
        packages: listing.labels,
    }))
}

#[utoipa::path(
    get,
    path = "/{program}/analytics/time-series",
    params(TimeSeriesParams),
    responses(
        (status = 200, description = "Cumulative pending/collected series", body = TimeSeriesRes)
    )
)]
/// Dashboard time series for the facility.
async fn time_series(
    State(state): State<AppState>,
    AxumPath(program): AxumPath<String>,
    ctx: FacilityContext,
    Query(params): Query<TimeSeriesParams>,
) -> Result<Json<TimeSeriesRes>, HandlerError> {
    let program = parse_program(&program)?;
    let range = parse_range(&params.range).map_err(error_response)?;
    let points = state
        .service
        .time_series(program, ctx.facility_id, range)
        .map_err(error_response)?;
    Ok(Json(TimeSeriesRes {
        points: points.into_iter().map(TimeSeriesPointDto::from).collect(),
    }))
}
