use chrono::{DateTime, Local, Utc};
use serde::Deserialize;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Services,
    Deploys,
    Jobs,
    Projects,
    Environments,
    Logs,
    Workspaces,
}

impl ResourceKind {
    pub const ALL: [Self; 7] = [
        Self::Services,
        Self::Deploys,
        Self::Jobs,
        Self::Projects,
        Self::Environments,
        Self::Logs,
        Self::Workspaces,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Services => "services",
            Self::Deploys => "deploys",
            Self::Jobs => "jobs",
            Self::Projects => "projects",
            Self::Environments => "environments",
            Self::Logs => "logs",
            Self::Workspaces => "workspaces",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "svc" | "service" | "services" | "srv" => Some(Self::Services),
            "dep" | "deploy" | "deploys" | "deployment" | "deployments" => Some(Self::Deploys),
            "job" | "jobs" => Some(Self::Jobs),
            "proj" | "project" | "projects" => Some(Self::Projects),
            "env" | "envs" | "environment" | "environments" => Some(Self::Environments),
            "log" | "logs" => Some(Self::Logs),
            "ws" | "workspace" | "workspaces" | "owner" | "owners" => Some(Self::Workspaces),
            _ => None,
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub workspace_id: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct Environment {
    pub id: String,
    pub name: String,
    pub project_id: String,
    #[serde(default)]
    pub protected: bool,
}

impl Environment {
    pub fn protected_status(&self) -> &'static str {
        if self.protected {
            "protected"
        } else {
            "unprotected"
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub environment_id: Option<String>,
}

/// A service joined with the project and environment it lives in.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ServiceView {
    pub service: Service,
    pub project: Option<Project>,
    pub environment: Option<Environment>,
}

impl ServiceView {
    pub fn project_name(&self) -> &str {
        self.project.as_ref().map_or("", |project| project.name.as_str())
    }

    pub fn environment_name(&self) -> &str {
        self.environment
            .as_ref()
            .map_or("", |environment| environment.name.as_str())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStatus {
    Created,
    BuildInProgress,
    UpdateInProgress,
    Live,
    Deactivated,
    BuildFailed,
    UpdateFailed,
    Canceled,
}

impl DeployStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::BuildInProgress => "build_in_progress",
            Self::UpdateInProgress => "update_in_progress",
            Self::Live => "live",
            Self::Deactivated => "deactivated",
            Self::BuildFailed => "build_failed",
            Self::UpdateFailed => "update_failed",
            Self::Canceled => "canceled",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct Deploy {
    pub id: String,
    pub service_id: String,
    pub status: DeployStatus,
    #[serde(default)]
    pub commit_message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct Job {
    pub id: String,
    pub service_id: String,
    pub start_command: String,
    #[serde(default)]
    pub plan_id: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct LogEntry {
    /// Service, deploy or job the line belongs to.
    pub resource_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub level: LogLevel,
    pub message: String,
}

/// Local wall-clock rendering used by every table.
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

pub fn format_optional_time(time: Option<&DateTime<Utc>>) -> String {
    time.map(format_time).unwrap_or_default()
}
