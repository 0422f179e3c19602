use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {message}")]
    InvalidInput {
        message: String,
        details: Option<JsonValue>,
    },

    #[error("data source unavailable for {participant}: {message}")]
    DataSourceUnavailable { participant: String, message: String },

    #[error("record not found")]
    NotFound,

    #[error("database error: {message}")]
    Database { message: String },

    #[error("cache error: {0}")]
    Cache(String),

    #[error("invalid settings: {0}")]
    Settings(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "invalid input");
        AppError::InvalidInput {
            message,
            details: None,
        }
    }

    pub fn invalid_input_with_details(message: impl Into<String>, details: JsonValue) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, details = %details, "invalid input with details");
        AppError::InvalidInput {
            message,
            details: Some(details),
        }
    }

    pub fn data_source_unavailable(
        participant: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let participant = participant.into();
        let message = message.into();
        warn!(target: "app::datasource", %participant, %message, "data source unavailable");
        AppError::DataSourceUnavailable {
            participant,
            message,
        }
    }

    pub fn not_found() -> Self {
        warn!(target: "app::database", "resource not found");
        AppError::NotFound
    }

    pub fn database(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::database", %message, "database error");
        AppError::Database { message }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::cache", %message, "cache error");
        AppError::Cache(message)
    }

    pub fn settings(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::settings", %message, "settings error");
        AppError::Settings(message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::other", %message, "other error");
        AppError::Other(message)
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, AppError::InvalidInput { .. })
    }

    pub fn details(&self) -> Option<&JsonValue> {
        match self {
            AppError::InvalidInput { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        use rusqlite::Error::QueryReturnedNoRows;

        match &error {
            QueryReturnedNoRows => AppError::not_found(),
            _ => {
                error!(target: "app::database", error = ?error, "sqlite error");
                AppError::database(error.to_string())
            }
        }
    }
}
