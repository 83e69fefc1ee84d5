use std::collections::HashSet;

use anyhow::Result;
use chrono::Utc;
use contracts::imports::ImportType;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set};
use serde::{Deserialize, Serialize};

/// SeaORM entity for p100_business_record, the keyed store all import types
/// upsert into. One parameterized table instead of a near-identical table
/// per type; the composite primary key keeps the natural key unique within
/// its import type.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "p100_business_record")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub import_type: String,
    /// Natural/business key from the source file (order id, claim id, ...).
    #[sea_orm(primary_key, auto_increment = false)]
    pub record_key: String,
    /// Primary ordering date of the record, ISO `YYYY-MM-DD`.
    #[sea_orm(nullable)]
    pub record_date: Option<String>,
    pub amount: f64,
    pub quantity: i64,
    pub account: String,
    pub status: String,
    /// Full normalized field map as JSON, including fields that have no
    /// dedicated column.
    pub fields_json: String,
    /// Batch that created or last touched this record.
    pub import_batch_ref: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Mutable payload for one upsert.
#[derive(Debug, Clone)]
pub struct RecordEntry {
    pub record_key: String,
    pub record_date: Option<String>,
    pub amount: f64,
    pub quantity: i64,
    pub account: String,
    pub status: String,
    pub fields_json: String,
}

/// Upsert one record by (import_type, record_key). INSERT ... ON CONFLICT
/// DO UPDATE, atomic per key; on re-import the existing record is updated
/// in place and `updated_at` is stamped, `created_at` is preserved.
pub async fn upsert_entry(
    db: &DatabaseConnection,
    import_type: ImportType,
    batch_id: &str,
    entry: &RecordEntry,
) -> Result<()> {
    let now = Utc::now().to_rfc3339();

    let model = ActiveModel {
        import_type: Set(import_type.as_str().to_string()),
        record_key: Set(entry.record_key.clone()),
        record_date: Set(entry.record_date.clone()),
        amount: Set(entry.amount),
        quantity: Set(entry.quantity),
        account: Set(entry.account.clone()),
        status: Set(entry.status.clone()),
        fields_json: Set(entry.fields_json.clone()),
        import_batch_ref: Set(batch_id.to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
    };

    Entity::insert(model)
        .on_conflict(
            OnConflict::columns([Column::ImportType, Column::RecordKey])
                .update_columns([
                    Column::RecordDate,
                    Column::Amount,
                    Column::Quantity,
                    Column::Account,
                    Column::Status,
                    Column::FieldsJson,
                    Column::ImportBatchRef,
                    Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(db)
        .await?;

    Ok(())
}

/// Which of the given natural keys already exist for this import type.
/// Queried per chunk before upserting so the importer can report
/// imported vs updated counts.
pub async fn exists_keys(
    db: &DatabaseConnection,
    import_type: ImportType,
    keys: &[String],
) -> Result<HashSet<String>> {
    if keys.is_empty() {
        return Ok(HashSet::new());
    }
    let found = Entity::find()
        .select_only()
        .column(Column::RecordKey)
        .filter(Column::ImportType.eq(import_type.as_str()))
        .filter(Column::RecordKey.is_in(keys.to_vec()))
        .into_tuple::<String>()
        .all(db)
        .await?;
    Ok(found.into_iter().collect())
}
