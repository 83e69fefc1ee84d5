use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};

/// Open (creating if needed) the sqlite database at `db_file` and bootstrap
/// the schema. The returned connection is the one handle the whole process
/// uses; callers pass it down explicitly rather than reaching for a global.
pub async fn connect(db_file: &str) -> anyhow::Result<DatabaseConnection> {
    if let Some(parent) = std::path::Path::new(db_file).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if std::path::Path::new(db_file).is_absolute() {
        std::path::PathBuf::from(db_file)
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);
    let conn = Database::connect(&db_url).await?;

    ensure_table(
        &conn,
        "import_batch",
        r#"
            CREATE TABLE import_batch (
                id TEXT PRIMARY KEY NOT NULL,
                label TEXT NOT NULL,
                import_type TEXT NOT NULL,
                file_name TEXT NOT NULL,
                file_type TEXT NOT NULL,
                total_rows INTEGER NOT NULL DEFAULT 0,
                valid_rows INTEGER NOT NULL DEFAULT 0,
                invalid_rows INTEGER NOT NULL DEFAULT 0,
                imported_rows INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'processing',
                error_details TEXT NOT NULL DEFAULT '[]',
                content_hash TEXT NOT NULL DEFAULT '',
                date_from TEXT,
                date_to TEXT,
                created_at TEXT NOT NULL
            );
        "#,
    )
    .await?;

    ensure_table(
        &conn,
        "p100_business_record",
        r#"
            CREATE TABLE p100_business_record (
                import_type TEXT NOT NULL,
                record_key TEXT NOT NULL,
                record_date TEXT,
                amount REAL NOT NULL DEFAULT 0,
                quantity INTEGER NOT NULL DEFAULT 0,
                account TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT '',
                fields_json TEXT NOT NULL DEFAULT '{}',
                import_batch_ref TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (import_type, record_key)
            );
        "#,
    )
    .await?;

    Ok(conn)
}

async fn ensure_table(
    conn: &DatabaseConnection,
    table: &str,
    create_sql: &str,
) -> anyhow::Result<()> {
    let check = format!(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='{}';",
        table
    );
    let existing = conn
        .query_all(Statement::from_string(DatabaseBackend::Sqlite, check))
        .await?;

    if existing.is_empty() {
        tracing::info!("Creating {} table", table);
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            create_sql.to_string(),
        ))
        .await?;
    }
    Ok(())
}
