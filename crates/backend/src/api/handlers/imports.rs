use std::collections::HashMap;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use contracts::imports::{ImportBatchInfo, ImportType};

use crate::api::AppState;
use crate::domain::a101_import_batch::repository as batch_repo;
use crate::shared::config;
use crate::shared::data::scratch::ScratchFile;
use crate::usecases::{u601_bulk_import, u602_duplicate_check};

type ApiError = (StatusCode, Json<Value>);

fn bad_request(error: &str, message: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": error, "message": message })),
    )
}

fn internal_error(message: String) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": "internal_error", "message": message })),
    )
}

/// One parsed multipart upload: the `file` part plus any text fields.
struct UploadForm {
    file_name: String,
    bytes: Vec<u8>,
    fields: HashMap<String, String>,
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut fields = HashMap::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        bad_request("invalid_multipart", format!("failed to read upload: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let bytes = field.bytes().await.map_err(|e| {
                bad_request("invalid_multipart", format!("failed to read file: {}", e))
            })?;
            file = Some((file_name, bytes.to_vec()));
        } else if !name.is_empty() {
            let value = field.text().await.unwrap_or_default();
            fields.insert(name, value);
        }
    }

    let (file_name, bytes) = file.ok_or_else(|| {
        bad_request(
            "missing_file",
            "multipart field \"file\" is required".to_string(),
        )
    })?;

    Ok(UploadForm {
        file_name,
        bytes,
        fields,
    })
}

fn parse_import_type(tag: &str) -> Result<ImportType, ApiError> {
    ImportType::parse(tag).ok_or_else(|| {
        bad_request(
            "unknown_import_type",
            format!(
                "unknown import type \"{}\"; expected one of: {}",
                tag,
                ImportType::ALL
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        )
    })
}

/// POST /api/imports/:import_type
pub async fn upload(
    State(state): State<AppState>,
    Path(import_type): Path<String>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let import_type = parse_import_type(&import_type)?;
    let form = read_upload(multipart).await?;

    // Stage the upload on disk for the duration of this request and run the
    // import from the staged copy.
    let scratch = ScratchFile::create(&config::get().uploads.dir, &form.file_name, &form.bytes)
        .map_err(|e| internal_error(format!("failed to stage upload: {}", e)))?;
    let staged = scratch
        .read()
        .map_err(|e| internal_error(format!("failed to read staged upload: {}", e)))?;

    match u601_bulk_import::run_import(&state.db, import_type, &form.file_name, &staged).await {
        Ok(outcome) => {
            let message = format!(
                "Processed {} rows: {} imported, {} updated, {} errors",
                outcome.total_rows, outcome.imported, outcome.updated, outcome.errors
            );
            Ok(Json(json!({
                "success": true,
                "data": outcome,
                "message": message,
            })))
        }
        Err(e) if e.is_client_error() => {
            tracing::warn!("Import of {} rejected: {}", form.file_name, e);
            Err(bad_request("import_failed", e.to_string()))
        }
        Err(e) => {
            tracing::error!("Import of {} failed: {}", form.file_name, e);
            Err(internal_error(e.to_string()))
        }
    }
}

/// POST /api/imports/duplicate-check
///
/// Advisory pre-check; accepts the same file plus `importType` and an
/// optional `checkPeriod` in days.
pub async fn duplicate_check(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let form = read_upload(multipart).await?;

    let type_tag = form
        .fields
        .get("importType")
        .ok_or_else(|| bad_request("missing_field", "field \"importType\" is required".into()))?;
    let import_type = parse_import_type(type_tag)?;

    let lookback_days = form
        .fields
        .get("checkPeriod")
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(config::get().duplicate_check.lookback_days);

    let result = u602_duplicate_check::assess(
        &state.db,
        import_type,
        &form.file_name,
        &form.bytes,
        lookback_days,
    )
    .await;
    match result {
        Ok(signal) => Ok(Json(json!({ "success": true, "data": signal }))),
        Err(e) => {
            tracing::error!("Duplicate check failed: {}", e);
            Err(internal_error(e.to_string()))
        }
    }
}

#[derive(Deserialize)]
pub struct BatchListParams {
    pub import_type: Option<String>,
    pub limit: Option<u64>,
}

/// GET /api/imports/batches?import_type=&limit=
pub async fn list_batches(
    State(state): State<AppState>,
    Query(params): Query<BatchListParams>,
) -> Result<Json<Value>, ApiError> {
    if let Some(tag) = params.import_type.as_deref() {
        parse_import_type(tag)?;
    }
    let limit = params.limit.unwrap_or(100).clamp(1, 1000);

    match batch_repo::list_recent(&state.db, params.import_type.as_deref(), limit).await {
        Ok(items) => {
            let infos: Vec<ImportBatchInfo> = items.into_iter().map(Into::into).collect();
            Ok(Json(json!({ "success": true, "data": infos })))
        }
        Err(e) => {
            tracing::error!("Failed to list batches: {}", e);
            Err(internal_error(e.to_string()))
        }
    }
}

/// GET /api/imports/batches/:id
pub async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match batch_repo::get_by_id(&state.db, &id).await {
        Ok(Some(batch)) => {
            let error_details: Value =
                serde_json::from_str(&batch.error_details).unwrap_or_else(|_| json!([]));
            let info: ImportBatchInfo = batch.into();
            Ok(Json(json!({
                "success": true,
                "data": { "batch": info, "errorDetails": error_details },
            })))
        }
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "error": "not_found", "message": format!("batch {} not found", id) })),
        )),
        Err(e) => {
            tracing::error!("Failed to load batch {}: {}", id, e);
            Err(internal_error(e.to_string()))
        }
    }
}
