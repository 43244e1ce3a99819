use crate::domain::model::{ItemFailure, WatchlistItem, WriteBackReport};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{service} responded with HTTP {status} for {url}")]
    HttpStatus {
        service: String,
        status: u16,
        url: String,
    },

    #[error("Write-back to {service} aborted at '{item}' after {} successful additions", .added.len())]
    WriteBackAborted {
        service: String,
        added: Vec<WatchlistItem>,
        item: WatchlistItem,
        #[source]
        source: Box<SyncError>,
        /// 同時進行的另一個服務的回寫結果
        other: Option<WriteBackReport>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Protocol,
    WriteBack,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SyncError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::Network(_) => ErrorCategory::Network,
            SyncError::HttpStatus { .. } => ErrorCategory::Protocol,
            SyncError::WriteBackAborted { .. } => ErrorCategory::WriteBack,
            SyncError::ConfigValidationError { .. }
            | SyncError::InvalidConfigValueError { .. }
            | SyncError::MissingConfigError { .. } => ErrorCategory::Configuration,
            SyncError::Serialization(_) | SyncError::ProcessingError { .. } => ErrorCategory::Data,
            SyncError::Io(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 網路錯誤通常重跑即可
            SyncError::Network(_) => ErrorSeverity::Medium,
            SyncError::HttpStatus { status, .. } if *status >= 500 => ErrorSeverity::Medium,
            SyncError::HttpStatus { .. } => ErrorSeverity::High,
            SyncError::WriteBackAborted { source, .. } => source.severity(),
            SyncError::Serialization(_) | SyncError::ProcessingError { .. } => ErrorSeverity::High,
            SyncError::ConfigValidationError { .. }
            | SyncError::InvalidConfigValueError { .. }
            | SyncError::MissingConfigError { .. }
            | SyncError::Io(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            SyncError::Network(_) => {
                "Check network connectivity and the service base_url, then run the sync again".to_string()
            }
            SyncError::HttpStatus { status: 401, service, .. }
            | SyncError::HttpStatus { status: 403, service, .. } => format!(
                "The token for {} was rejected; refresh it in the configuration",
                service
            ),
            SyncError::HttpStatus { status, .. } if *status >= 500 => {
                "The remote service is failing; try again later".to_string()
            }
            SyncError::HttpStatus { .. } => {
                "Verify the watchlist_path and payload_field settings for this service".to_string()
            }
            SyncError::WriteBackAborted { added, other, .. }
                if !added.is_empty() || other.as_ref().is_some_and(|r| !r.added.is_empty()) =>
            {
                "Some items were already written; re-running the sync will only push the remainder"
                    .to_string()
            }
            SyncError::WriteBackAborted { .. } => {
                "Nothing was written; fix the cause and re-run, or use write_policy = \"continue\""
                    .to_string()
            }
            SyncError::Io(_) => "Check file paths and permissions".to_string(),
            SyncError::Serialization(_) | SyncError::ProcessingError { .. } => {
                "The service returned an unexpected payload; check items_field".to_string()
            }
            SyncError::MissingConfigError { field } => {
                format!("Add '{}' to the configuration file", field)
            }
            SyncError::ConfigValidationError { .. } | SyncError::InvalidConfigValueError { .. } => {
                "Review the configuration file and environment variables".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach a watchlist service: {}", self),
            ErrorCategory::Protocol => format!("A watchlist service rejected the request: {}", self),
            ErrorCategory::WriteBack => format!("Synchronization stopped part-way: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Unexpected data from a service: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }

    /// Attaches the other service's write-back result to an aborted write-back.
    pub fn with_other_report(mut self, report: WriteBackReport) -> Self {
        if let SyncError::WriteBackAborted { other, .. } = &mut self {
            *other = Some(report);
        }
        self
    }

    /// Turns an aborted write-back into the report of what it managed to do.
    pub fn into_partial_report(self) -> std::result::Result<WriteBackReport, SyncError> {
        match self {
            SyncError::WriteBackAborted {
                service,
                added,
                item,
                source,
                ..
            } => Ok(WriteBackReport {
                service,
                added,
                failed: vec![ItemFailure {
                    item,
                    cause: source.to_string(),
                }],
            }),
            other => Err(other),
        }
    }

    /// 對應到 CLI 的結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(status: u16) -> SyncError {
        SyncError::HttpStatus {
            service: "Plex".to_string(),
            status,
            url: "https://plex.tv/api/watchlist".to_string(),
        }
    }

    #[test]
    fn test_http_status_classification() {
        assert_eq!(status_error(404).category(), ErrorCategory::Protocol);
        assert_eq!(status_error(404).severity(), ErrorSeverity::High);
        assert_eq!(status_error(503).severity(), ErrorSeverity::Medium);
        assert!(status_error(401).recovery_suggestion().contains("Plex"));
    }

    #[test]
    fn test_write_back_aborted_inherits_severity() {
        let err = SyncError::WriteBackAborted {
            service: "Letterboxd".to_string(),
            added: vec![WatchlistItem::from("Dune")],
            item: WatchlistItem::from("Arrival"),
            source: Box::new(status_error(400)),
            other: None,
        };

        assert_eq!(err.category(), ErrorCategory::WriteBack);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("after 1 successful additions"));
        assert!(err.recovery_suggestion().contains("already written"));
    }

    #[test]
    fn test_other_report_attached_and_partial_report() {
        let mut plex = WriteBackReport::new("Plex");
        plex.added.push(WatchlistItem::from("Her"));

        let err = SyncError::WriteBackAborted {
            service: "Letterboxd".to_string(),
            added: vec![],
            item: WatchlistItem::from("Arrival"),
            source: Box::new(status_error(500)),
            other: None,
        }
        .with_other_report(plex);

        assert!(err.recovery_suggestion().contains("already written"));
        assert!(matches!(
            &err,
            SyncError::WriteBackAborted { other: Some(r), .. } if r.service == "Plex"
        ));

        let partial = err.into_partial_report().unwrap();
        assert_eq!(partial.service, "Letterboxd");
        assert!(partial.added.is_empty());
        assert_eq!(partial.failed[0].item, WatchlistItem::from("Arrival"));
        assert!(!partial.is_success());

        assert!(status_error(404).into_partial_report().is_err());
        assert!(matches!(
            status_error(404).with_other_report(WriteBackReport::new("Plex")),
            SyncError::HttpStatus { .. }
        ));
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = SyncError::MissingConfigError {
            field: "service_a.auth.token".to_string(),
        };
        assert_eq!(err.exit_code(), 3);
        assert!(err.user_friendly_message().starts_with("Configuration problem"));
    }
}
