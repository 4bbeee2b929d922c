// Office Records - API Server
// REST surface over the survey tracker and the mail log

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
    Router,
};
use clap::Parser;
use office_records::{
    Config, CsvExporter, MailDraft, MailField, MailKind, MailRecord, MailSection, MailStats,
    ReconciledRow, ReconciliationReport, RecordStore, SampleField, SortDirection, SortState,
    SqliteStore, StoreError, SurveySection, UpdateDraft,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "office-server", version, about = "REST API for office records")]
struct Args {
    #[arg(short, long, env = "OFFICE_RECORDS_CONFIG")]
    config: Option<PathBuf>,

    /// Override bind_addr from the config
    #[arg(long, env = "OFFICE_RECORDS_BIND")]
    bind: Option<String>,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<SqliteStore>,
    config: Arc<Config>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Handler failure, rendered as an `ApiResponse` with `success: false`
enum ApiError {
    BadRequest(String),
    Store(StoreError),
    Failed(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Store(StoreError::NotFound(what)) => (StatusCode::NOT_FOUND, what),
            ApiError::Store(StoreError::Constraint(msg)) => (StatusCode::CONFLICT, msg),
            ApiError::Store(e) => {
                tracing::error!(error = %e, "store failure");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApiError::Failed(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// `?q=&sort=&dir=` on list endpoints
#[derive(Debug, Default, Deserialize)]
struct ListParams {
    #[serde(default)]
    q: String,
    sort: Option<String>,
    dir: Option<SortDirection>,
}

impl ListParams {
    fn sort_state<F: Copy + PartialEq>(
        &self,
        parse: fn(&str) -> Option<F>,
    ) -> Result<SortState<F>, ApiError> {
        match self.sort.as_deref() {
            None | Some("") => Ok(SortState::new()),
            Some(name) => {
                let field = parse(name)
                    .ok_or_else(|| ApiError::BadRequest(format!("unknown sort field: {}", name)))?;
                Ok(SortState::with(field, self.dir.unwrap_or(SortDirection::Ascending)))
            }
        }
    }
}

fn parse_kind(kind: &str) -> Result<MailKind, ApiError> {
    MailKind::from_name(kind).ok_or_else(|| ApiError::BadRequest(format!("unknown mail kind: {}", kind)))
}

/// First error notice of a section, or a generic message
fn failure_message(notices: Vec<office_records::Notification>) -> String {
    notices
        .into_iter()
        .find(|n| n.is_error())
        .map(|n| n.message)
        .unwrap_or_else(|| "request failed".to_string())
}

#[derive(Serialize)]
struct StatsResponse {
    survey: String,
    progress: ReconciliationReport,
    mail: MailStats,
}

#[derive(Serialize)]
struct RowsResponse {
    report: ReconciliationReport,
    rows: Vec<ReconciledRow>,
}

#[derive(Serialize)]
struct SavedResponse<I> {
    id: I,
}

#[derive(Serialize)]
struct ExportResponse {
    path: String,
    rows: usize,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/stats - progress of the default survey plus mail totals
async fn get_stats(State(state): State<AppState>) -> ApiResult<StatsResponse> {
    let survey = state.config.default_survey.clone();
    let mut section = SurveySection::new(state.store.clone(), &survey);
    if !section.refresh().await {
        return Err(ApiError::Failed(failure_message(section.take_notices())));
    }

    let mail = MailStats::collect(state.store.as_ref()).await?;

    Ok(Json(ApiResponse::ok(StatsResponse {
        survey,
        progress: section.report().clone(),
        mail,
    })))
}

/// GET /api/surveys/:survey/rows - reconciled table, filtered and sorted
async fn get_survey_rows(
    State(state): State<AppState>,
    Path(survey): Path<String>,
    Query(params): Query<ListParams>,
) -> ApiResult<RowsResponse> {
    let sort = params.sort_state(SampleField::from_name)?;

    let mut section = SurveySection::new(state.store.clone(), &survey);
    section.set_sort(sort);
    if !section.set_query(&params.q).await {
        return Err(ApiError::Failed(failure_message(section.take_notices())));
    }

    Ok(Json(ApiResponse::ok(RowsResponse {
        report: section.report().clone(),
        rows: section.visible_rows(),
    })))
}

/// POST /api/surveys/:survey/updates - insert, or edit when the body carries an id
async fn save_update(
    State(state): State<AppState>,
    Path(survey): Path<String>,
    Json(draft): Json<UpdateDraft>,
) -> ApiResult<SavedResponse<i64>> {
    let id = match draft.id {
        Some(id) => {
            state.store.update_update(&survey, id, &draft).await?;
            id
        }
        None => state.store.insert_update(&survey, &draft).await?,
    };

    tracing::info!(%survey, id, sample_code = %draft.sample_code, "update saved");
    Ok(Json(ApiResponse::ok(SavedResponse { id })))
}

/// DELETE /api/surveys/:survey/updates/:id
async fn delete_update(
    State(state): State<AppState>,
    Path((survey, id)): Path<(String, i64)>,
) -> ApiResult<SavedResponse<i64>> {
    state.store.delete_update(&survey, id).await?;
    tracing::info!(%survey, id, "update deleted");
    Ok(Json(ApiResponse::ok(SavedResponse { id })))
}

/// Query of the export route: search text only, rows are written in fetch order
#[derive(Debug, Default, Deserialize)]
struct ExportParams {
    #[serde(default)]
    q: String,
}

/// GET /api/surveys/:survey/export - write the CSV into export_dir
async fn export_survey(
    State(state): State<AppState>,
    Path(survey): Path<String>,
    Query(params): Query<ExportParams>,
) -> ApiResult<ExportResponse> {
    let exporter = CsvExporter::new(&state.config.export_dir);

    let mut section = SurveySection::new(state.store.clone(), &survey)
        .with_region(state.config.region());
    if !section.set_query(&params.q).await {
        return Err(ApiError::Failed(failure_message(section.take_notices())));
    }

    let rows = section.rows().len();
    match section.export(&exporter) {
        Some(path) => Ok(Json(ApiResponse::ok(ExportResponse {
            path: path.display().to_string(),
            rows,
        }))),
        None => Err(ApiError::Failed(failure_message(section.take_notices()))),
    }
}

/// GET /api/surveys/:survey/samples - sample codes for the update form picker
async fn get_sample_choices(
    State(state): State<AppState>,
    Path(survey): Path<String>,
) -> ApiResult<Vec<String>> {
    let mut section = SurveySection::new(state.store.clone(), &survey);
    let codes = section.sample_choices().await;
    let notices = section.take_notices();
    if notices.iter().any(|n| n.is_error()) {
        return Err(ApiError::Failed(failure_message(notices)));
    }
    Ok(Json(ApiResponse::ok(codes)))
}

/// GET /api/mail/:kind - mail log of one direction
async fn get_mail(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<MailRecord>> {
    let kind = parse_kind(&kind)?;
    let sort = params.sort_state(MailField::from_name)?;

    let mut section = MailSection::new(state.store.clone(), kind);
    section.set_sort(sort);
    if !section.set_query(&params.q).await {
        return Err(ApiError::Failed(failure_message(section.take_notices())));
    }

    Ok(Json(ApiResponse::ok(section.visible_mails())))
}

/// POST /api/mail/:kind - insert, or edit when the body carries an id
async fn save_mail(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(draft): Json<MailDraft>,
) -> ApiResult<SavedResponse<String>> {
    let kind = parse_kind(&kind)?;

    let id = match draft.id.clone() {
        Some(id) => {
            state.store.update_mail(kind, &id, &draft).await?;
            id
        }
        None => state.store.insert_mail(kind, &draft).await?,
    };

    tracing::info!(kind = kind.as_str(), %id, number = %draft.number, "mail saved");
    Ok(Json(ApiResponse::ok(SavedResponse { id })))
}

/// DELETE /api/mail/:kind/:id
async fn delete_mail(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<SavedResponse<String>> {
    let kind = parse_kind(&kind)?;
    state.store.delete_mail(kind, &id).await?;
    tracing::info!(kind = kind.as_str(), %id, "mail deleted");
    Ok(Json(ApiResponse::ok(SavedResponse { id })))
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(get_stats))
        .route("/surveys/:survey/rows", get(get_survey_rows))
        .route("/surveys/:survey/updates", axum::routing::post(save_update))
        .route("/surveys/:survey/updates/:id", delete(delete_update))
        .route("/surveys/:survey/samples", get(get_sample_choices))
        .route("/surveys/:survey/export", get(export_survey))
        .route("/mail/:kind", get(get_mail).post(save_mail))
        .route("/mail/:kind/:id", delete(delete_mail))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = Config::load_or_default(args.config.as_deref())
        .context("Failed to load config file")?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    println!("🌐 Office Records - API Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let store = SqliteStore::open(&config.database_path).with_context(|| {
        format!("Failed to open database {}", config.database_path.display())
    })?;
    println!("✓ Database opened: {}", config.database_path.display());

    let addr = config.bind_addr.clone();
    let state = AppState {
        store: Arc::new(store),
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/health", addr);
    println!("\n   Press Ctrl+C to stop\n");
    tracing::info!(%addr, "server started");

    axum::serve(listener, router(state))
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use office_records::Sample;
    use tower::ServiceExt;

    async fn create_test_app(export_dir: &std::path::Path) -> Router {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .import_samples(vec![
                Sample::new("ssn_m25", "140503"),
                Sample::new("ssn_m25", "140501"),
            ])
            .await
            .unwrap();

        let mut config = Config::default();
        config.export_dir = export_dir.to_path_buf();
        router(AppState {
            store: Arc::new(store),
            config: Arc::new(config),
        })
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_export_ignores_sort_params() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_test_app(dir.path()).await;

        let (status, body) = get_json(app, "/api/surveys/ssn_m25/export?sort=bogus&dir=desc").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["rows"], 2);
        assert!(dir.path().join("pemutakhiran-data-ssn_m25.csv").exists());
    }

    #[tokio::test]
    async fn test_rows_reject_unknown_sort_field() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_test_app(dir.path()).await;

        let (status, body) = get_json(app, "/api/surveys/ssn_m25/rows?sort=bogus").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_sample_choices_route() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_test_app(dir.path()).await;

        let (status, body) = get_json(app, "/api/surveys/ssn_m25/samples").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], serde_json::json!(["140501", "140503"]));
    }
}
