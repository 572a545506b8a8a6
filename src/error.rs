use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArgsError {
    #[error("Unused parameters: {}", keys.join(", "))]
    UnusedParameters {
        keys: Vec<String>,
        suggestion: String
    },

    #[error("Required options are missing: {}", keys.join(", "))]
    MissingRequired {
        keys: Vec<String>,
        suggestion: String
    },

    #[error("{program} requires a subcommand: {}", choices.join("|"))]
    MissingSubcommand {
        program: String,
        choices: Vec<String>
    },

    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error
    },

    #[error("Failed to parse {format} config file {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String
    },

    #[error("Config file {path} has an unexpected shape: {details}")]
    ConfigShape {
        path: PathBuf,
        details: String
    },

    #[error("Dataset not found: {path}")]
    DatasetNotFound {
        path: PathBuf,
        suggestion: String
    },

    #[error("Unsupported dataset source: {path}")]
    UnsupportedSource {
        path: String,
        suggestion: String
    },

    #[error("Dataset processing failed: {message}")]
    DatasetProcessing {
        message: String,
        suggestion: String
    },

    #[error("Column '{column}' not found in sample")]
    MissingColumn {
        column: String,
        available: Vec<String>
    },

    #[error("Invalid template '{format}': {message}")]
    Template {
        format: String,
        message: String
    },

    #[error("Failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error
    },
}

impl ArgsError {
    /// Create an unused-parameter error naming every offending key
    pub fn unused_parameters(keys: Vec<String>) -> Self {
        let suggestion = "スペルミスがないか確認してください//Check if typos exist.".to_string();
        Self::UnusedParameters { keys, suggestion }
    }

    /// Create a missing-required error listing all missing alias-specs
    pub fn missing_required(keys: Vec<String>) -> Self {
        let suggestion = format!(
            "Set them on the command line (--{}=...) or in the environment",
            keys.first().map(String::as_str).unwrap_or("key")
        );
        Self::MissingRequired { keys, suggestion }
    }

    pub fn config_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigRead { path: path.into(), source }
    }

    pub fn config_parse(
        path: impl Into<PathBuf>,
        format: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        Self::ConfigParse {
            path: path.into(),
            format: format.into(),
            message: message.to_string(),
        }
    }

    /// Create a dataset not found error
    pub fn dataset_not_found(path: PathBuf) -> Self {
        let suggestion = format!("Ensure the dataset file exists at: {}", path.display());
        Self::DatasetNotFound { path, suggestion }
    }

    pub fn unsupported_source(path: impl Into<String>) -> Self {
        let suggestion = "Only local .jsonl/.json(.gz) and .csv files can be streamed; \
                          export hub datasets to JSONL first"
            .to_string();
        Self::UnsupportedSource { path: path.into(), suggestion }
    }

    /// Create a dataset processing error with suggestion
    pub fn dataset_processing(message: impl Into<String>) -> Self {
        let message = message.into();
        let suggestion = "Check that every line of the file is a JSON object".to_string();
        Self::DatasetProcessing { message, suggestion }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write { path: path.into(), source }
    }

    /// Get recovery suggestions for this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::UnusedParameters { suggestion, .. } => vec![suggestion.clone()],
            Self::MissingRequired { suggestion, .. } => vec![suggestion.clone()],
            Self::MissingSubcommand { choices, .. } => {
                vec![format!("Choose one of: {}", choices.join(", "))]
            }
            Self::ConfigRead { path, .. } => {
                vec![format!("Ensure {} exists and is readable", path.display())]
            }
            Self::ConfigParse { format, .. } => {
                vec![format!("Check the {} syntax of the config file", format)]
            }
            Self::ConfigShape { .. } => {
                vec!["The top level of a config file must be a mapping".to_string()]
            }
            Self::DatasetNotFound { suggestion, .. } => vec![suggestion.clone()],
            Self::UnsupportedSource { suggestion, .. } => vec![suggestion.clone()],
            Self::DatasetProcessing { suggestion, .. } => vec![suggestion.clone()],
            Self::MissingColumn { available, .. } => {
                vec![format!("Available columns: {}", available.join(", "))]
            }
            Self::Template { .. } => {
                vec!["Use {field} placeholders and {{ / }} for literal braces".to_string()]
            }
            Self::Write { path, .. } => {
                vec![format!("Check write permissions for {}", path.display())]
            }
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::UnusedParameters { .. } => true,
            Self::MissingRequired { .. } => false,
            Self::MissingSubcommand { .. } => false,
            Self::ConfigRead { .. } => false,
            Self::ConfigParse { .. } => false,
            Self::ConfigShape { .. } => false,
            Self::DatasetNotFound { .. } => false,
            Self::UnsupportedSource { .. } => false,
            Self::DatasetProcessing { .. } => true,
            Self::MissingColumn { .. } => true,
            Self::Template { .. } => true,
            Self::Write { .. } => false,
        }
    }
}

/// Result type for adhoc operations
pub type AdhocResult<T> = std::result::Result<T, ArgsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unused_parameters_message_names_keys() {
        let err = ArgsError::unused_parameters(vec!["y".to_string(), "z".to_string()]);
        assert_eq!(err.to_string(), "Unused parameters: y, z");
        assert!(err.is_recoverable());
        assert_eq!(err.suggestions().len(), 1);
    }

    #[test]
    fn test_missing_subcommand_lists_choices() {
        let err = ArgsError::MissingSubcommand {
            program: "adhoc".to_string(),
            choices: vec!["show".to_string(), "head".to_string()],
        };
        assert_eq!(err.to_string(), "adhoc requires a subcommand: show|head");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_dataset_not_found_suggestion() {
        let err = ArgsError::dataset_not_found(PathBuf::from("data/train.jsonl"));
        assert!(err.suggestions()[0].contains("data/train.jsonl"));
    }
}
