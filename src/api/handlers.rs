//! API request handlers
//!
//! Extraction and file work is synchronous, so every handler that touches
//! the dashboard runs it on the blocking pool.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio::task::JoinError;
use uuid::Uuid;

use super::server::AppState;
use crate::dashboard::DatasetView;
use crate::error::{DashError, DashResult};
use crate::excel::{export_table_to_buffer, DEFAULT_SHEET_NAME};
use crate::services::FilterParams;
use crate::types::Extraction;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Error side of every handler: a status plus an `ApiResponse` body
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl From<DashError> for ApiError {
    fn from(err: DashError) -> Self {
        let status = match &err {
            DashError::UnknownWorkbook(_) | DashError::UnknownTable { .. } => StatusCode::NOT_FOUND,
            DashError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("Worker failed: {}", err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::err(self.message))).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> DashResult<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(work).await??)
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

fn endpoint(method: &str, path: &str, description: &str) -> EndpointInfo {
    EndpointInfo {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(RootResponse {
        name: "McDagua Dashboard API".to_string(),
        version: state.version.clone(),
        description: "Chart series and datasets extracted from the dashboard workbooks".to_string(),
        endpoints: vec![
            endpoint("GET", "/health", "Health check endpoint"),
            endpoint("GET", "/version", "Server version and configured workbooks"),
            endpoint("GET", "/api/graficos-data", "Chart series of the general workbook"),
            endpoint("GET", "/api/haccp-graficos", "Chart series of the HACCP workbook"),
            endpoint("GET", "/api/:kind", "Filtered dataset, filter options and KPIs"),
            endpoint("GET", "/download/:kind", "Filtered dataset as .xlsx"),
            endpoint("POST", "/upload/:kind", "Replace a workbook (raw .xlsx body)"),
            endpoint("POST", "/api/refresh", "Clear every cached result"),
        ],
    }))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub workbooks: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        workbooks: state
            .dashboard
            .config()
            .workbooks
            .iter()
            .map(|w| w.kind.clone())
            .collect(),
    }))
}

async fn charts_of(state: Arc<AppState>, kind: &'static str) -> ApiResult<Extraction> {
    let dashboard = Arc::clone(&state.dashboard);
    let charts = run_blocking(move || dashboard.charts(kind)).await?;
    Ok(Json(ApiResponse::ok(charts)))
}

/// GET /api/graficos-data - Chart series of the general workbook
pub async fn graficos_data(State(state): State<Arc<AppState>>) -> ApiResult<Extraction> {
    charts_of(state, "geral").await
}

/// GET /api/haccp-graficos - Chart series of the HACCP workbook
pub async fn haccp_graficos(State(state): State<Arc<AppState>>) -> ApiResult<Extraction> {
    charts_of(state, "haccp").await
}

/// GET /api/:kind - Filtered dataset
pub async fn dataset(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Query(params): Query<FilterParams>,
) -> ApiResult<DatasetView> {
    let dashboard = Arc::clone(&state.dashboard);
    let view = run_blocking(move || dashboard.dataset(&kind, &params)).await?;
    Ok(Json(ApiResponse::ok(view)))
}

/// GET /download/:kind - Filtered dataset as .xlsx
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Query(params): Query<FilterParams>,
) -> Result<Response, ApiError> {
    let dashboard = Arc::clone(&state.dashboard);
    let filename = format!("attachment; filename=\"{}.xlsx\"", kind);
    let bytes = run_blocking(move || {
        let view = dashboard.dataset(&kind, &params)?;
        export_table_to_buffer(&view.table, DEFAULT_SHEET_NAME)
    })
    .await?;

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        bytes,
    )
        .into_response())
}

/// Upload response
#[derive(Serialize, Default)]
pub struct UploadResponse {
    pub workbook: String,
    pub path: String,
    pub bytes: usize,
    pub message: String,
}

/// POST /upload/:kind - Replace a workbook
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    body: Bytes,
) -> ApiResult<UploadResponse> {
    if body.is_empty() {
        return Err(DashError::InvalidUpload("empty body".to_string()).into());
    }
    let dashboard = Arc::clone(&state.dashboard);
    let size = body.len();
    let workbook = kind.clone();
    let path = run_blocking(move || dashboard.replace_workbook(&workbook, &body)).await?;

    Ok(Json(ApiResponse::ok(UploadResponse {
        workbook: kind,
        path: path.display().to_string(),
        bytes: size,
        message: "Workbook replaced".to_string(),
    })))
}

/// Refresh response
#[derive(Serialize, Default)]
pub struct RefreshResponse {
    pub invalidated: usize,
}

/// POST /api/refresh - Clear every cached result
pub async fn refresh(State(state): State<Arc<AppState>>) -> ApiResult<RefreshResponse> {
    let dashboard = Arc::clone(&state.dashboard);
    let invalidated = run_blocking(move || Ok(dashboard.refresh())).await?;
    Ok(Json(ApiResponse::ok(RefreshResponse { invalidated })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_ok_creates_success_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test data".to_string());
        assert!(response.success);
        assert_eq!(response.data, Some("test data".to_string()));
        assert!(response.error.is_none());
        // UUID v4 (8-4-4-4-12)
        assert_eq!(response.request_id.len(), 36);
    }

    #[test]
    fn test_api_response_err_creates_error_response() {
        let response: ApiResponse<String> = ApiResponse::err("Something went wrong");
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error, Some("Something went wrong".to_string()));
    }

    #[test]
    fn test_api_response_request_id_is_unique() {
        let a: ApiResponse<String> = ApiResponse::ok("a".to_string());
        let b: ApiResponse<String> = ApiResponse::ok("b".to_string());
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_error_status_mapping() {
        let not_found = ApiError::from(DashError::UnknownWorkbook("x".to_string()));
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);

        let bad = ApiError::from(DashError::InvalidUpload("x".to_string()));
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);

        let internal = ApiError::from(DashError::Export("x".to_string()));
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_response_omits_data() {
        let json = serde_json::to_value(ApiResponse::<()>::err("boom")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "boom");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_upload_response_default() {
        let response = UploadResponse::default();
        assert!(response.workbook.is_empty());
        assert_eq!(response.bytes, 0);
    }
}
