use chrono::NaiveDate;
use contracts::imports::{BatchStatus, ImportOutcome, ImportType, RowErrorDetail};
use sea_orm::DatabaseConnection;
use sha2::{Digest, Sha256};

use crate::domain::a101_import_batch::repository as batch_repo;
use crate::projections::p100_business_record::repository as record_repo;

use super::columns;
use super::error::ImportError;
use super::import_config::spec_for;
use super::parser::{self, ParsedFile};
use super::validate::{self, CanonicalRecord};

/// Upserts are grouped to bound peak memory and the per-chunk existence
/// query; rows are still written one atomic upsert at a time.
const CHUNK_SIZE: usize = 50;

pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Run one uploaded file end-to-end: parse, resolve columns, validate and
/// upsert every row, then write the batch summary exactly once.
///
/// Per-row failures never abort the batch. File- and column-level failures
/// abort before any row is written; if the batch row was already created it
/// is finalized as `failed` with the fatal error recorded.
pub async fn run_import(
    db: &DatabaseConnection,
    import_type: ImportType,
    file_name: &str,
    bytes: &[u8],
) -> Result<ImportOutcome, ImportError> {
    // Unsupported extensions fail before a batch row exists; there is
    // nothing meaningful to record about a file we cannot even classify.
    let kind = parser::sniff_kind(file_name)?;
    let hash = content_hash(bytes);

    let batch_id = batch_repo::insert_processing(db, import_type, file_name, kind, &hash)
        .await
        .map_err(db_err)?;

    tracing::info!(
        "Import batch {} started: type={}, file={}",
        batch_id,
        import_type,
        file_name
    );

    let parsed = match parser::parse_bytes(file_name, bytes) {
        Ok(p) => p,
        Err(e) => return Err(fail_batch(db, &batch_id, e).await),
    };

    let spec = spec_for(import_type);
    let resolved = match columns::resolve(spec, &parsed.headers) {
        Ok(r) => r,
        Err(e) => return Err(fail_batch(db, &batch_id, e).await),
    };

    let run = match process_rows(db, import_type, &batch_id, &parsed, &resolved).await {
        Ok(run) => run,
        Err(e) => return Err(fail_batch(db, &batch_id, e).await),
    };

    let status = if run.valid == 0 {
        BatchStatus::Failed
    } else if run.invalid == 0 {
        BatchStatus::Completed
    } else {
        BatchStatus::Partial
    };

    batch_repo::finalize(
        db,
        &batch_id,
        batch_repo::BatchFinalize {
            status,
            total_rows: run.total as i32,
            valid_rows: run.valid as i32,
            invalid_rows: run.invalid as i32,
            imported_rows: (run.imported + run.updated) as i32,
            errors: run.errors.clone(),
            date_from: run.date_from.map(|d| d.format("%Y-%m-%d").to_string()),
            date_to: run.date_to.map(|d| d.format("%Y-%m-%d").to_string()),
        },
    )
    .await
    .map_err(db_err)?;

    tracing::info!(
        "Import batch {} finished: {:?}, {} imported, {} updated, {} errors",
        batch_id,
        status,
        run.imported,
        run.updated,
        run.errors.len()
    );

    Ok(ImportOutcome {
        imported: run.imported as i32,
        updated: run.updated as i32,
        errors: run.errors.len() as i32,
        batch_id,
        valid_rows: run.valid as i32,
        total_rows: run.total as i32,
        error_details: run.errors,
        file_name: file_name.to_string(),
        file_type: kind,
    })
}

struct RowRun {
    total: usize,
    valid: usize,
    invalid: usize,
    imported: usize,
    updated: usize,
    errors: Vec<RowErrorDetail>,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
}

async fn process_rows(
    db: &DatabaseConnection,
    import_type: ImportType,
    batch_id: &str,
    parsed: &ParsedFile,
    resolved: &columns::ResolvedColumns,
) -> Result<RowRun, ImportError> {
    let spec = spec_for(import_type);
    let key_field = spec.key_field();
    let mut run = RowRun {
        total: parsed.rows.len(),
        valid: 0,
        invalid: 0,
        imported: 0,
        updated: 0,
        errors: Vec::new(),
        date_from: None,
        date_to: None,
    };
    // Keys already written earlier in this same file count as updates.
    let mut seen_in_file: std::collections::HashSet<String> = std::collections::HashSet::new();

    for chunk in parsed.rows.chunks(CHUNK_SIZE) {
        let mut records: Vec<(usize, CanonicalRecord)> = Vec::new();

        for (row_number, row) in chunk {
            match validate::validate_row(spec, resolved, row, *row_number) {
                Ok(record) => records.push((*row_number, record)),
                Err(mut errs) => {
                    run.invalid += 1;
                    run.errors.append(&mut errs);
                }
            }
        }

        let keys: Vec<String> = records.iter().map(|(_, r)| r.record_key.clone()).collect();
        // The imported/updated split depends on this set, so a failed lookup
        // aborts the batch.
        let existing = record_repo::exists_keys(db, import_type, &keys)
            .await
            .map_err(db_err)?;

        for (row_number, record) in records {
            let entry = record_repo::RecordEntry {
                record_key: record.record_key.clone(),
                record_date: record.record_date.map(|d| d.format("%Y-%m-%d").to_string()),
                amount: record.amount,
                quantity: record.quantity,
                account: record.account.clone(),
                status: record.status.clone(),
                fields_json: record.fields_json(),
            };
            match record_repo::upsert_entry(db, import_type, batch_id, &entry).await {
                Ok(()) => {
                    run.valid += 1;
                    if existing.contains(&record.record_key)
                        || !seen_in_file.insert(record.record_key.clone())
                    {
                        run.updated += 1;
                    } else {
                        run.imported += 1;
                    }
                    if let Some(date) = record.record_date {
                        run.date_from = Some(run.date_from.map_or(date, |d| d.min(date)));
                        run.date_to = Some(run.date_to.map_or(date, |d| d.max(date)));
                    }
                }
                // Persistence failure on one row is recoverable, same as a
                // validation failure.
                Err(e) => {
                    tracing::error!("Failed to upsert record {}: {}", record.record_key, e);
                    run.invalid += 1;
                    run.errors.push(RowErrorDetail {
                        row: row_number,
                        field: key_field.to_string(),
                        value: record.record_key,
                        message: format!("failed to store record: {}", e),
                    });
                }
            }
        }
    }

    Ok(run)
}

/// Finalize the batch as failed with the fatal error recorded, then hand
/// the error back to the request handler.
async fn fail_batch(db: &DatabaseConnection, batch_id: &str, error: ImportError) -> ImportError {
    let detail = RowErrorDetail {
        row: 0,
        field: "file".to_string(),
        value: String::new(),
        message: error.to_string(),
    };
    let result = batch_repo::finalize(
        db,
        batch_id,
        batch_repo::BatchFinalize {
            status: BatchStatus::Failed,
            total_rows: 0,
            valid_rows: 0,
            invalid_rows: 0,
            imported_rows: 0,
            errors: vec![detail],
            date_from: None,
            date_to: None,
        },
    )
    .await;
    if let Err(e) = result {
        tracing::error!("Failed to finalize batch {} as failed: {}", batch_id, e);
    }
    error
}

fn db_err(e: anyhow::Error) -> ImportError {
    match e.downcast::<sea_orm::DbErr>() {
        Ok(db) => ImportError::Database(db),
        Err(other) => ImportError::Internal(other.to_string()),
    }
}
