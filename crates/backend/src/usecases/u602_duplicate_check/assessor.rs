use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use contracts::duplicate::{DuplicateSignal, RiskLevel};
use contracts::imports::ImportType;
use sea_orm::DatabaseConnection;

use crate::domain::a101_import_batch::repository as batch_repo;
use crate::usecases::u601_bulk_import::{columns, import_config::spec_for, normalize, parser};

/// Assess how likely an incoming file is a re-import of already ingested
/// data. Purely advisory: the importer's upsert-by-key semantics make a
/// re-import safe, this exists to save operators a pointless upload.
///
/// Reads recorded batches of the same import type within the lookback
/// window; safe to call concurrently with running imports (a slightly
/// stale view is fine for advice).
pub async fn assess(
    db: &DatabaseConnection,
    import_type: ImportType,
    file_name: &str,
    bytes: &[u8],
    lookback_days: i64,
) -> Result<DuplicateSignal> {
    let cutoff = Utc::now() - Duration::days(lookback_days);
    let prior = batch_repo::recent_by_type(db, import_type, cutoff).await?;

    let hash = crate::usecases::u601_bulk_import::executor::content_hash(bytes);
    let inferred_range = if import_type.is_sales_like() {
        infer_date_range(import_type, file_name, bytes)
    } else {
        None
    };

    let threshold = crate::shared::config::get()
        .duplicate_check
        .name_similarity_threshold;

    Ok(evaluate(&prior, &hash, file_name, inferred_range, threshold))
}

/// Pure signal evaluation over already-loaded prior batches.
pub fn evaluate(
    prior: &[batch_repo::Model],
    content_hash: &str,
    file_name: &str,
    inferred_range: Option<(NaiveDate, NaiveDate)>,
    name_similarity_threshold: f64,
) -> DuplicateSignal {
    let mut signal = DuplicateSignal::clean();
    let mut matched_ids: Vec<String> = Vec::new();
    let mut medium_signals = 0usize;

    // Signal 1: identical content hash. An exact re-upload of bytes we have
    // already ingested.
    for batch in prior.iter().filter(|b| b.content_hash == content_hash) {
        signal.is_duplicate = true;
        signal.raise_to(RiskLevel::High);
        signal.warnings.push(format!(
            "File content is identical to \"{}\" imported on {}",
            batch.file_name,
            created_date(batch)
        ));
        push_matched(&mut signal, &mut matched_ids, batch);
    }
    if signal.is_duplicate {
        signal.recommendations.push(
            "This file appears identical to a previous import; re-importing will only \
             update existing records, not duplicate them."
                .to_string(),
        );
    }

    // Signal 2: similar file name.
    let mut name_matched = false;
    for batch in prior.iter().filter(|b| b.content_hash != content_hash) {
        let similarity = strsim::normalized_levenshtein(file_name, &batch.file_name);
        if similarity >= name_similarity_threshold {
            name_matched = true;
            signal.raise_to(RiskLevel::Medium);
            signal.warnings.push(format!(
                "File name closely matches \"{}\" imported on {} ({:.0}% similar)",
                batch.file_name,
                created_date(batch),
                similarity * 100.0
            ));
            push_matched(&mut signal, &mut matched_ids, batch);
        }
    }
    if name_matched {
        medium_signals += 1;
        signal.recommendations.push(
            "A previous import had a nearly identical file name; check whether this is a \
             corrected re-export of the same report."
                .to_string(),
        );
    }

    // Signal 3: overlapping date range (sales-like types only; the caller
    // passes a range only for those).
    if let Some((new_from, new_to)) = inferred_range {
        let mut overlap_matched = false;
        for batch in prior.iter().filter(|b| b.content_hash != content_hash) {
            let (Some(prior_from), Some(prior_to)) =
                (parse_iso(&batch.date_from), parse_iso(&batch.date_to))
            else {
                continue;
            };
            if new_from <= prior_to && prior_from <= new_to {
                overlap_matched = true;
                signal.raise_to(RiskLevel::Medium);
                signal.warnings.push(format!(
                    "Date range {} to {} overlaps batch \"{}\" covering {} to {}",
                    new_from, new_to, batch.label, prior_from, prior_to
                ));
                push_matched(&mut signal, &mut matched_ids, batch);
            }
        }
        if overlap_matched {
            medium_signals += 1;
            signal.recommendations.push(
                "The upload covers dates already imported; records with the same key will \
                 be updated rather than duplicated."
                    .to_string(),
            );
        }
    }

    // Two independent medium signals together are treated as high risk.
    if medium_signals >= 2 {
        signal.raise_to(RiskLevel::High);
    }

    // No signal fired: low if there is recent history to collide with at
    // all, none otherwise.
    if signal.warnings.is_empty() && !prior.is_empty() {
        signal.raise_to(RiskLevel::Low);
    }

    signal
}

fn push_matched(
    signal: &mut DuplicateSignal,
    matched_ids: &mut Vec<String>,
    batch: &batch_repo::Model,
) {
    if !matched_ids.contains(&batch.id) {
        matched_ids.push(batch.id.clone());
        signal.previous_imports.push(batch.clone().into());
    }
}

fn created_date(batch: &batch_repo::Model) -> String {
    batch
        .created_at
        .split('T')
        .next()
        .unwrap_or(&batch.created_at)
        .to_string()
}

fn parse_iso(value: &Option<String>) -> Option<NaiveDate> {
    value
        .as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

/// Best-effort date range of the upload itself, from its mandatory date
/// column. Any parse problem yields `None`: the pre-check must never fail
/// on a file the importer might still reject with a proper error.
fn infer_date_range(
    import_type: ImportType,
    file_name: &str,
    bytes: &[u8],
) -> Option<(NaiveDate, NaiveDate)> {
    let parsed = parser::parse_bytes(file_name, bytes).ok()?;
    let spec = spec_for(import_type);
    let resolved = columns::resolve(spec, &parsed.headers).ok()?;
    let date_idx = resolved.index_of(spec.date_field?)?;

    let mut range: Option<(NaiveDate, NaiveDate)> = None;
    for (_, row) in &parsed.rows {
        let Some(cell) = row.get(date_idx) else { continue };
        if let Some(date) = normalize::normalize_date(cell, spec.date_patterns) {
            range = Some(match range {
                None => (date, date),
                Some((from, to)) => (from.min(date), to.max(date)),
            });
        }
    }
    range
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::imports::{BatchStatus, FileKind};

    fn batch(id: &str, file_name: &str, hash: &str, range: Option<(&str, &str)>) -> batch_repo::Model {
        batch_repo::Model {
            id: id.to_string(),
            label: format!("sales import: {}", file_name),
            import_type: ImportType::Sales.as_str().to_string(),
            file_name: file_name.to_string(),
            file_type: FileKind::Csv.as_str().to_string(),
            total_rows: 10,
            valid_rows: 10,
            invalid_rows: 0,
            imported_rows: 10,
            status: BatchStatus::Completed.as_str().to_string(),
            error_details: "[]".to_string(),
            content_hash: hash.to_string(),
            date_from: range.map(|(f, _)| f.to_string()),
            date_to: range.map(|(_, t)| t.to_string()),
            created_at: "2025-08-28T10:00:00+00:00".to_string(),
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn identical_hash_is_high_risk_exact_duplicate() {
        let prior = vec![batch("b1", "sales_aug.csv", "deadbeef", None)];
        let signal = evaluate(&prior, "deadbeef", "sales_aug_copy.csv", None, 0.8);
        assert!(signal.is_duplicate);
        assert_eq!(signal.risk_level, RiskLevel::High);
        assert_eq!(signal.previous_imports.len(), 1);
        assert_eq!(signal.previous_imports[0].id, "b1");
        assert!(signal.warnings[0].contains("identical"));
        assert!(!signal.recommendations.is_empty());
    }

    #[test]
    fn similar_name_raises_to_medium() {
        let prior = vec![batch("b1", "sales_report_august.csv", "aaaa", None)];
        let signal = evaluate(&prior, "bbbb", "sales_report_august2.csv", None, 0.8);
        assert!(!signal.is_duplicate);
        assert_eq!(signal.risk_level, RiskLevel::Medium);
        assert!(signal.warnings[0].contains("sales_report_august.csv"));
    }

    #[test]
    fn dissimilar_name_with_history_is_low() {
        let prior = vec![batch("b1", "sales_report_august.csv", "aaaa", None)];
        let signal = evaluate(&prior, "bbbb", "returns_q3_summary.xlsx", None, 0.8);
        assert_eq!(signal.risk_level, RiskLevel::Low);
        assert!(signal.warnings.is_empty());
    }

    #[test]
    fn no_history_is_no_risk() {
        let signal = evaluate(&[], "bbbb", "anything.csv", None, 0.8);
        assert_eq!(signal.risk_level, RiskLevel::None);
        assert!(signal.previous_imports.is_empty());
    }

    #[test]
    fn overlapping_date_range_raises_to_medium() {
        let prior = vec![batch(
            "b1",
            "old.csv",
            "aaaa",
            Some(("2025-08-01", "2025-08-15")),
        )];
        let signal = evaluate(
            &prior,
            "bbbb",
            "new_period.csv",
            Some((d(2025, 8, 10), d(2025, 8, 20))),
            0.8,
        );
        assert_eq!(signal.risk_level, RiskLevel::Medium);
        assert!(signal.warnings[0].contains("overlaps"));
    }

    #[test]
    fn disjoint_date_range_is_not_a_signal() {
        let prior = vec![batch(
            "b1",
            "old.csv",
            "aaaa",
            Some(("2025-07-01", "2025-07-31")),
        )];
        let signal = evaluate(
            &prior,
            "bbbb",
            "new_period.csv",
            Some((d(2025, 8, 1), d(2025, 8, 20))),
            0.8,
        );
        assert_eq!(signal.risk_level, RiskLevel::Low);
    }

    #[test]
    fn two_medium_signals_escalate_to_high() {
        let prior = vec![batch(
            "b1",
            "sales_august.csv",
            "aaaa",
            Some(("2025-08-01", "2025-08-31")),
        )];
        let signal = evaluate(
            &prior,
            "bbbb",
            "sales_august_v2.csv",
            Some((d(2025, 8, 10), d(2025, 8, 20))),
            0.8,
        );
        assert_eq!(signal.risk_level, RiskLevel::High);
        assert!(!signal.is_duplicate);
        // Same batch matched twice is listed once.
        assert_eq!(signal.previous_imports.len(), 1);
    }
}
