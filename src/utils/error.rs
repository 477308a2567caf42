use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// 覆寫集合種類 (24/7 或週末)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideSet {
    TwentyFourSeven,
    Weekend,
}

impl fmt::Display for OverrideSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverrideSet::TwentyFourSeven => write!(f, "24/7"),
            OverrideSet::Weekend => write!(f, "weekend"),
        }
    }
}

#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("Project '{project}': deploy env '{deploy_env}' has no sizing weight in the weight table or the preview/demo overrides")]
    MissingWeight { project: String, deploy_env: String },

    #[error("Project '{project}': 'prod' must not appear in the {set} override set (prod is always on)")]
    InvalidOverrideValue { project: String, set: OverrideSet },

    #[error("Project '{project}': {set} override set references unknown deploy env '{deploy_env}' (set: {offending_set:?})")]
    UnknownDeployEnv {
        project: String,
        set: OverrideSet,
        deploy_env: String,
        offending_set: Vec<String>,
    },

    #[error("Project '{referenced_by}' depends on undeclared project '{project}'")]
    UnknownProject {
        project: String,
        referenced_by: String,
    },

    #[error("Region '{region}' has no multi-region token")]
    UnknownRegion { region: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

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
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Topology,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TopologyError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TopologyError::MissingWeight { .. }
            | TopologyError::InvalidOverrideValue { .. }
            | TopologyError::UnknownDeployEnv { .. }
            | TopologyError::UnknownProject { .. }
            | TopologyError::UnknownRegion { .. } => ErrorCategory::Topology,
            TopologyError::ConfigError { .. }
            | TopologyError::ConfigValidationError { .. }
            | TopologyError::InvalidConfigValueError { .. }
            | TopologyError::MissingConfigError { .. } => ErrorCategory::Configuration,
            TopologyError::IoError(_) | TopologyError::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    /// 所有拓撲錯誤都是作者的設定錯誤，不可重試
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Topology | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            TopologyError::MissingWeight { project, deploy_env } => format!(
                "Add a [projects.preview_demo.{}] entry with a weight to project '{}', or remove it from deploy_envs",
                deploy_env, project
            ),
            TopologyError::InvalidOverrideValue { project, set } => format!(
                "Remove 'prod' from the {} set of project '{}'; prod always runs 24/7",
                set, project
            ),
            TopologyError::UnknownDeployEnv {
                project, deploy_env, ..
            } => format!(
                "Declare '{}' under [projects.preview_demo] of project '{}', or fix the typo",
                deploy_env, project
            ),
            TopologyError::UnknownProject { project, .. } => {
                format!("Declare project '{}' or drop the dependency on it", project)
            }
            TopologyError::UnknownRegion { .. } => {
                "Use one of the supported AWS regions or pass --region".to_string()
            }
            TopologyError::IoError(_) => {
                "Check that the configuration file exists and is readable".to_string()
            }
            TopologyError::SerializationError(_) => {
                "Check the output path and retry".to_string()
            }
            TopologyError::ConfigError { .. }
            | TopologyError::ConfigValidationError { .. }
            | TopologyError::InvalidConfigValueError { .. }
            | TopologyError::MissingConfigError { .. } => {
                "Fix the topology configuration file and re-run".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Topology => format!("Topology resolution failed: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }

    /// 依嚴重程度決定的退出碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, TopologyError>;
