use thiserror::Error;

/// Fatal import failures. Everything here aborts the run before (or instead
/// of) row processing; row-level problems are recorded as `RowErrorDetail`
/// data and never surface as an `Err`.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unsupported file type: {0} (expected .xlsx, .xls or .csv)")]
    UnsupportedFile(String),

    #[error("file contains no data rows")]
    EmptyFile,

    #[error("failed to parse file: {0}")]
    Parse(String),

    #[error("required columns missing: [{}]; headers found: [{}]", missing.join(", "), found.join(", "))]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Non-database infrastructure failure, e.g. serializing the error
    /// payload. Nothing the operator can fix in the file.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ImportError {
    /// True when the operator can fix the problem in the source file
    /// (HTTP 400); false for infrastructure failures (HTTP 500).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ImportError::Database(_) | ImportError::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_file_problems_only() {
        assert!(ImportError::UnsupportedFile("notes.txt".into()).is_client_error());
        assert!(ImportError::EmptyFile.is_client_error());
        assert!(ImportError::Parse("bad".into()).is_client_error());
        assert!(ImportError::MissingColumns {
            missing: vec!["order_id".into()],
            found: vec![],
        }
        .is_client_error());
        assert!(!ImportError::Database(sea_orm::DbErr::Custom("down".into())).is_client_error());
        assert!(!ImportError::Internal("payload".into()).is_client_error());
    }
}
