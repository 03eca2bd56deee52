use std::path::PathBuf;

use thiserror::Error;

pub type DashResult<T> = Result<T, DashError>;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Workbook unreadable: {path}: {reason}")]
    WorkbookUnreadable { path: PathBuf, reason: String },

    #[error("Sheet not found in {path}: tried {aliases:?}")]
    SheetNotFound { path: PathBuf, aliases: Vec<String> },

    #[error("Anchor not found for sub-table '{table}'")]
    AnchorNotFound { table: String },

    #[error("Malformed block: {0}")]
    MalformedBlock(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Unknown workbook: {0}")]
    UnknownWorkbook(String),

    #[error("Unknown sub-table '{table}' in workbook '{workbook}'")]
    UnknownTable { workbook: String, table: String },

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),
}

impl DashError {
    /// True for the kinds the extraction pipeline degrades to an empty result.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            DashError::WorkbookUnreadable { .. }
                | DashError::SheetNotFound { .. }
                | DashError::AnchorNotFound { .. }
                | DashError::MalformedBlock(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_kinds_are_soft() {
        let unreadable = DashError::WorkbookUnreadable {
            path: PathBuf::from("a.xlsx"),
            reason: "missing".to_string(),
        };
        assert!(unreadable.is_soft());
        assert!(DashError::AnchorNotFound {
            table: "backroom".to_string()
        }
        .is_soft());
        assert!(DashError::MalformedBlock("x".to_string()).is_soft());
        assert!(!DashError::Config("bad".to_string()).is_soft());
    }

    #[test]
    fn test_error_display() {
        let err = DashError::SheetNotFound {
            path: PathBuf::from("geral.xlsx"),
            aliases: vec!["gráfico".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("geral.xlsx"));
        assert!(msg.contains("gráfico"));
    }
}
