use anyhow::Result;
use chrono::Utc;
use contracts::imports::{BatchStatus, FileKind, ImportBatchInfo, ImportType, RowErrorDetail};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// SeaORM entity for import_batch. One row per upload-and-process run.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "import_batch")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub label: String,
    pub import_type: String,
    pub file_name: String,
    pub file_type: String,
    pub total_rows: i32,
    pub valid_rows: i32,
    pub invalid_rows: i32,
    pub imported_rows: i32,
    pub status: String,
    /// JSON array of RowErrorDetail, written once at finalize.
    pub error_details: String,
    pub content_hash: String,
    /// Inferred date range of this upload (ISO dates), used by the
    /// duplicate-risk assessor for overlap checks on sales-like types.
    #[sea_orm(nullable)]
    pub date_from: Option<String>,
    #[sea_orm(nullable)]
    pub date_to: Option<String>,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ImportBatchInfo {
    fn from(m: Model) -> Self {
        ImportBatchInfo {
            id: m.id,
            label: m.label,
            import_type: m.import_type,
            file_name: m.file_name,
            file_type: m.file_type,
            total_rows: m.total_rows,
            valid_rows: m.valid_rows,
            invalid_rows: m.invalid_rows,
            imported_rows: m.imported_rows,
            status: m.status,
            content_hash: m.content_hash,
            date_from: m.date_from,
            date_to: m.date_to,
            created_at: m.created_at,
        }
    }
}

/// Insert the batch row at upload start, status `processing`, counts zero.
/// Returns the generated batch id.
pub async fn insert_processing(
    db: &DatabaseConnection,
    import_type: ImportType,
    file_name: &str,
    file_kind: FileKind,
    content_hash: &str,
) -> Result<String> {
    let id = Uuid::new_v4().to_string();

    let active = ActiveModel {
        id: Set(id.clone()),
        label: Set(format!("{} import: {}", import_type, file_name)),
        import_type: Set(import_type.as_str().to_string()),
        file_name: Set(file_name.to_string()),
        file_type: Set(file_kind.as_str().to_string()),
        total_rows: Set(0),
        valid_rows: Set(0),
        invalid_rows: Set(0),
        imported_rows: Set(0),
        status: Set(BatchStatus::Processing.as_str().to_string()),
        error_details: Set("[]".to_string()),
        content_hash: Set(content_hash.to_string()),
        date_from: Set(None),
        date_to: Set(None),
        created_at: Set(Utc::now().to_rfc3339()),
    };
    active.insert(db).await?;

    Ok(id)
}

/// Final counts and status for one run. Written exactly once, in a single
/// update; a crash before this leaves the batch visibly `processing`.
pub struct BatchFinalize {
    pub status: BatchStatus,
    pub total_rows: i32,
    pub valid_rows: i32,
    pub invalid_rows: i32,
    pub imported_rows: i32,
    pub errors: Vec<RowErrorDetail>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

pub async fn finalize(db: &DatabaseConnection, id: &str, result: BatchFinalize) -> Result<()> {
    let error_details = serde_json::to_string(&result.errors)?;

    Entity::update_many()
        .col_expr(Column::Status, Expr::value(result.status.as_str()))
        .col_expr(Column::TotalRows, Expr::value(result.total_rows))
        .col_expr(Column::ValidRows, Expr::value(result.valid_rows))
        .col_expr(Column::InvalidRows, Expr::value(result.invalid_rows))
        .col_expr(Column::ImportedRows, Expr::value(result.imported_rows))
        .col_expr(Column::ErrorDetails, Expr::value(error_details))
        .col_expr(Column::DateFrom, Expr::value(result.date_from))
        .col_expr(Column::DateTo, Expr::value(result.date_to))
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;

    Ok(())
}

/// Batches of one import type created after the cutoff, newest first.
/// Read-only; used by the duplicate-risk assessor.
pub async fn recent_by_type(
    db: &DatabaseConnection,
    import_type: ImportType,
    created_after: chrono::DateTime<Utc>,
) -> Result<Vec<Model>> {
    let items = Entity::find()
        .filter(Column::ImportType.eq(import_type.as_str()))
        .filter(Column::CreatedAt.gte(created_after.to_rfc3339()))
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?;
    Ok(items)
}

pub async fn list_recent(
    db: &DatabaseConnection,
    import_type: Option<&str>,
    limit: u64,
) -> Result<Vec<Model>> {
    let mut query = Entity::find();
    if let Some(t) = import_type {
        query = query.filter(Column::ImportType.eq(t));
    }
    let items = query
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await?;
    Ok(items)
}

pub async fn get_by_id(db: &DatabaseConnection, id: &str) -> Result<Option<Model>> {
    let item = Entity::find_by_id(id).one(db).await?;
    Ok(item)
}
