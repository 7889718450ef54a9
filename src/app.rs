#![cfg(feature = "web")]
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::cleaning::FillReport;
use crate::config::ServerConfig;
use crate::downloader::{self, ConversionTarget};
use crate::error::SweeperError;
use crate::frame::Value;
use crate::graph::{self, ChartData, GraphOptions};
use crate::pipeline::{self, FileOutcome, PipelineOptions, UploadedFile};

pub struct AppState {
    config: ServerConfig,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: String,
    message: String,
}

#[derive(Serialize)]
struct FilePreview<'a> {
    file_name: &'a str,
    size_kb: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    columns: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    numeric_columns: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preview: Option<Vec<Vec<&'a Value>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duplicates_removed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filled: Option<&'a FillReport>,
}

#[derive(Serialize)]
struct PreviewResponse<'a> {
    files: Vec<FilePreview<'a>>,
    processed: usize,
    failed: usize,
}

/// Everything a pipeline request carries
#[derive(Debug, Default)]
struct UploadRequest {
    files: Vec<UploadedFile>,
    options: PipelineOptions,
    target: ConversionTarget,
}

impl UploadRequest {
    /// The single file expected by convert and chart
    fn single_file(
        mut self,
    ) -> Result<(UploadedFile, PipelineOptions, ConversionTarget), SweeperError> {
        if self.files.is_empty() {
            return Err(SweeperError::BadRequest("No file data received".to_string()));
        }
        let file = self.files.swap_remove(0);
        Ok((file, self.options, self.target))
    }
}

impl IntoResponse for SweeperError {
    fn into_response(self) -> Response {
        let status = match &self {
            SweeperError::UnsupportedFormat { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            SweeperError::Parse { .. } | SweeperError::Chart(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SweeperError::UnknownColumn(_) | SweeperError::BadRequest(_) => StatusCode::BAD_REQUEST,
            SweeperError::Export(_) | SweeperError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            status: "error".to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Builds the application router
///
/// Split out of [`run`] so tests can drive it without binding a socket.
pub fn router(config: ServerConfig) -> Router {
    let body_limit = config.max_upload_bytes();
    let app_state = Arc::new(AppState { config });

    Router::new()
        .route("/", get(serve_landing))
        .route("/health", get(health))
        .route("/api/preview", post(preview_files))
        .route("/api/convert", post(convert_file))
        .route("/api/chart", post(chart_file))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

pub async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.addr()?;
    let app = router(config);

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_landing() -> Html<&'static str> {
    Html(include_str!("./static/index.html"))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn preview_files(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, SweeperError> {
    let request = read_upload(multipart).await?;
    if request.files.is_empty() {
        return Err(SweeperError::BadRequest("No file data received".to_string()));
    }

    let outcomes = pipeline::process_all(&request.files, &request.options);
    let (processed, failed) = pipeline::summarize(&outcomes);
    info!("preview: {} processed, {} failed", processed, failed);

    let files = outcomes
        .iter()
        .map(|outcome| file_preview(outcome, state.config.preview_rows))
        .collect();

    Ok(Json(PreviewResponse {
        files,
        processed,
        failed,
    })
    .into_response())
}

fn file_preview(outcome: &FileOutcome, preview_rows: usize) -> FilePreview<'_> {
    let mut preview = FilePreview {
        file_name: &outcome.file_name,
        size_kb: format!("{:.2}", outcome.size_kb),
        error: None,
        rows: None,
        columns: None,
        numeric_columns: None,
        preview: None,
        duplicates_removed: None,
        filled: None,
    };

    match &outcome.result {
        Ok(processed) => {
            let frame = &processed.frame;
            preview.rows = Some(frame.height());
            preview.columns = Some(frame.column_names());
            preview.numeric_columns = Some(frame.numeric_columns());
            preview.preview = Some(frame.head(preview_rows));
            preview.duplicates_removed = processed.report.duplicates_removed;
            preview.filled = processed.report.filled.as_ref();
        }
        Err(e) => preview.error = Some(e.to_string()),
    }

    preview
}

async fn convert_file(multipart: Multipart) -> Result<Response, SweeperError> {
    let (file, options, target) = read_upload(multipart).await?.single_file()?;

    let processed = pipeline::process(&file, &options)?;
    let converted = downloader::convert(&processed.frame, &file.name, target)?;

    let disposition = content_disposition(&converted.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, converted.mime_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        converted.bytes,
    )
        .into_response())
}

async fn chart_file(multipart: Multipart) -> Result<Response, SweeperError> {
    let (file, options, _) = read_upload(multipart).await?.single_file()?;

    let processed = pipeline::process(&file, &options)?;
    let data = ChartData::from_frame(&processed.frame)?;
    let graph_options = GraphOptions {
        title: file.name.clone(),
        ..GraphOptions::default()
    };
    let png = graph::render_bar_chart(&data, &graph_options)?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 name
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    )
}

fn is_enabled(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "on" | "1" | "yes"
    )
}

/// Decodes the multipart form shared by every pipeline endpoint
///
/// Fields with a file name are uploads; the remaining fields are options.
/// Each `columns` field names one column to keep. Unknown fields are
/// ignored.
async fn read_upload(mut multipart: Multipart) -> Result<UploadRequest, SweeperError> {
    let mut request = UploadRequest::default();
    let mut columns: Vec<String> = Vec::new();
    let mut columns_given = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| SweeperError::BadRequest(e.body_text()))?
    {
        let field_name = field.name().unwrap_or("unknown").to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| SweeperError::BadRequest(e.body_text()))?;
            // an empty file input still submits a nameless part
            if !file_name.is_empty() {
                request.files.push(UploadedFile::new(file_name, bytes.to_vec()));
            }
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| SweeperError::BadRequest(e.body_text()))?;

        match field_name.as_str() {
            "remove_duplicates" => request.options.remove_duplicates = is_enabled(&text),
            "fill_missing" => request.options.fill_missing = is_enabled(&text),
            "columns" => {
                columns_given = true;
                if !text.is_empty() {
                    columns.push(text);
                }
            }
            "target" => request.target = text.parse()?,
            other => warn!("ignoring unknown form field {}", other),
        }
    }

    if columns_given {
        request.options.columns = Some(columns);
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: SweeperError) -> StatusCode {
        error.into_response().status()
    }

    #[test]
    fn errors_map_to_statuses() {
        assert_eq!(
            status_of(SweeperError::Chart("no numeric columns".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(SweeperError::Render("font not found".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(SweeperError::Export("disk full".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(SweeperError::UnknownColumn("salary".into())),
            StatusCode::BAD_REQUEST
        );
    }
}
