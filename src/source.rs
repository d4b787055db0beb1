use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::info;

use crate::model::{
    Deploy, DeployStatus, Environment, Job, LogEntry, LogLevel, Project, Service, ServiceView,
    Workspace,
};

/// Everything the screens need from the platform.
#[async_trait]
pub trait ResourceSource: Send + Sync {
    async fn list_workspaces(&self) -> Result<Vec<Workspace>>;

    async fn set_workspace(&self, workspace_id: &str) -> Result<Workspace>;

    /// Projects of the active workspace, or all projects when none is active.
    async fn list_projects(&self) -> Result<Vec<Project>>;

    async fn list_environments(&self, project_id: Option<&str>) -> Result<Vec<Environment>>;

    async fn list_services(&self, environment_id: Option<&str>) -> Result<Vec<ServiceView>>;

    /// Newest first.
    async fn list_deploys(&self, service_id: &str) -> Result<Vec<Deploy>>;

    async fn list_jobs(&self, service_id: &str) -> Result<Vec<Job>>;

    /// Oldest first.
    async fn list_logs(&self, resource_id: &str) -> Result<Vec<LogEntry>>;

    async fn trigger_deploy(&self, service_id: &str) -> Result<Deploy>;

    async fn restart_service(&self, service_id: &str) -> Result<()>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub workspace: Option<String>,
    #[serde(default)]
    pub workspaces: Vec<Workspace>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub environments: Vec<Environment>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub deploys: Vec<Deploy>,
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl Catalog {
    fn project_in_scope(&self, project: &Project) -> bool {
        match (&self.workspace, &project.workspace_id) {
            (Some(active), Some(owner)) => active == owner,
            _ => true,
        }
    }

    fn service(&self, service_id: &str) -> Result<&Service> {
        self.services
            .iter()
            .find(|service| service.id == service_id)
            .with_context(|| format!("service {service_id} not found"))
    }

    fn join_service(&self, service: &Service) -> ServiceView {
        let environment = service.environment_id.as_ref().and_then(|environment_id| {
            self.environments
                .iter()
                .find(|environment| &environment.id == environment_id)
                .cloned()
        });
        let project = environment.as_ref().and_then(|environment| {
            self.projects
                .iter()
                .find(|project| project.id == environment.project_id)
                .cloned()
        });
        ServiceView {
            service: service.clone(),
            project,
            environment,
        }
    }
}

/// In-memory platform snapshot read from a YAML or JSON catalog file.
///
/// Mutating calls (deploys, restarts, workspace switches) only touch the
/// in-memory copy; the file is never written back.
pub struct CatalogSource {
    catalog: RwLock<Catalog>,
}

impl CatalogSource {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: RwLock::new(catalog),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        let catalog = parse_catalog(path, &raw)?;
        info!(
            catalog = %path.display(),
            services = catalog.services.len(),
            deploys = catalog.deploys.len(),
            "catalog loaded"
        );
        Ok(Self::new(catalog))
    }
}

/// One past the highest numeric `dep-N` id, so new ids never repeat.
fn next_deploy_id(deploys: &[Deploy]) -> String {
    let highest = deploys
        .iter()
        .filter_map(|deploy| deploy.id.strip_prefix("dep-")?.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("dep-{}", highest.saturating_add(1))
}

fn parse_catalog(path: &Path, raw: &str) -> Result<Catalog> {
    let is_json = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(raw)
            .with_context(|| format!("failed to parse catalog {}", path.display()))
    } else {
        serde_yaml::from_str(raw)
            .with_context(|| format!("failed to parse catalog {}", path.display()))
    }
}

#[async_trait]
impl ResourceSource for CatalogSource {
    async fn list_workspaces(&self) -> Result<Vec<Workspace>> {
        Ok(self.catalog.read().await.workspaces.clone())
    }

    async fn set_workspace(&self, workspace_id: &str) -> Result<Workspace> {
        let mut catalog = self.catalog.write().await;
        let workspace = catalog
            .workspaces
            .iter()
            .find(|workspace| workspace.id == workspace_id || workspace.name == workspace_id)
            .cloned()
            .with_context(|| format!("workspace {workspace_id} not found"))?;
        catalog.workspace = Some(workspace.id.clone());
        info!(workspace = %workspace.id, "workspace selected");
        Ok(workspace)
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .projects
            .iter()
            .filter(|project| catalog.project_in_scope(project))
            .cloned()
            .collect())
    }

    async fn list_environments(&self, project_id: Option<&str>) -> Result<Vec<Environment>> {
        let catalog = self.catalog.read().await;
        if let Some(project_id) = project_id
            && !catalog.projects.iter().any(|project| project.id == project_id)
        {
            bail!("project {project_id} not found");
        }
        Ok(catalog
            .environments
            .iter()
            .filter(|environment| project_id.is_none_or(|id| environment.project_id == id))
            .filter(|environment| {
                catalog
                    .projects
                    .iter()
                    .find(|project| project.id == environment.project_id)
                    .is_none_or(|project| catalog.project_in_scope(project))
            })
            .cloned()
            .collect())
    }

    async fn list_services(&self, environment_id: Option<&str>) -> Result<Vec<ServiceView>> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .services
            .iter()
            .filter(|service| {
                environment_id.is_none_or(|id| service.environment_id.as_deref() == Some(id))
            })
            .map(|service| catalog.join_service(service))
            .filter(|view| {
                view.project
                    .as_ref()
                    .is_none_or(|project| catalog.project_in_scope(project))
            })
            .collect())
    }

    async fn list_deploys(&self, service_id: &str) -> Result<Vec<Deploy>> {
        let catalog = self.catalog.read().await;
        catalog.service(service_id)?;
        let mut deploys = catalog
            .deploys
            .iter()
            .filter(|deploy| deploy.service_id == service_id)
            .cloned()
            .collect::<Vec<_>>();
        deploys.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(deploys)
    }

    async fn list_jobs(&self, service_id: &str) -> Result<Vec<Job>> {
        let catalog = self.catalog.read().await;
        catalog.service(service_id)?;
        Ok(catalog
            .jobs
            .iter()
            .filter(|job| job.service_id == service_id)
            .cloned()
            .collect())
    }

    async fn list_logs(&self, resource_id: &str) -> Result<Vec<LogEntry>> {
        let catalog = self.catalog.read().await;
        let mut logs = catalog
            .logs
            .iter()
            .filter(|entry| entry.resource_id == resource_id)
            .cloned()
            .collect::<Vec<_>>();
        logs.sort_by(|left, right| left.timestamp.cmp(&right.timestamp));
        Ok(logs)
    }

    async fn trigger_deploy(&self, service_id: &str) -> Result<Deploy> {
        let mut catalog = self.catalog.write().await;
        catalog.service(service_id)?;
        let commit_message = catalog
            .deploys
            .iter()
            .filter(|deploy| deploy.service_id == service_id)
            .max_by_key(|deploy| deploy.created_at)
            .map(|deploy| deploy.commit_message.clone())
            .unwrap_or_else(|| "manual deploy".to_string());
        let deploy = Deploy {
            id: next_deploy_id(&catalog.deploys),
            service_id: service_id.to_string(),
            status: DeployStatus::Created,
            commit_message,
            created_at: Utc::now(),
        };
        catalog.deploys.push(deploy.clone());
        info!(service = %service_id, deploy = %deploy.id, "deploy triggered");
        Ok(deploy)
    }

    async fn restart_service(&self, service_id: &str) -> Result<()> {
        let mut catalog = self.catalog.write().await;
        let name = catalog.service(service_id)?.name.clone();
        catalog.logs.push(LogEntry {
            resource_id: service_id.to_string(),
            timestamp: Utc::now(),
            level: LogLevel::Info,
            message: format!("restart requested for {name}"),
        });
        info!(service = %service_id, "restart requested");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{Catalog, CatalogSource, ResourceSource, parse_catalog};
    use std::collections::HashSet;
    use crate::model::DeployStatus;
    use std::path::Path;

    pub(crate) const FIXTURE: &str = r#"
workspaces:
  - { id: tea-1, name: Platform, email: ops@example.com }
  - { id: tea-2, name: Sandbox }
projects:
  - { id: prj-1, name: Storefront, workspace_id: tea-1 }
  - { id: prj-2, name: Playground, workspace_id: tea-2 }
environments:
  - { id: env-1, name: production, project_id: prj-1, protected: true }
  - { id: env-2, name: staging, project_id: prj-1 }
  - { id: env-3, name: scratch, project_id: prj-2 }
services:
  - { id: srv-web, name: web, kind: web_service, environment_id: env-1 }
  - { id: srv-worker, name: worker, kind: background_worker, environment_id: env-2 }
  - { id: srv-toy, name: toy, kind: web_service, environment_id: env-3 }
  - { id: srv-orphan, name: orphan, kind: cron_job }
deploys:
  - { id: dep-a, service_id: srv-web, status: deactivated, commit_message: "first", created_at: "2024-05-01T10:00:00Z" }
  - { id: dep-b, service_id: srv-web, status: live, commit_message: "second", created_at: "2024-05-02T10:00:00Z" }
jobs:
  - { id: job-1, service_id: srv-web, start_command: "rake db:migrate", plan_id: starter, started_at: "2024-05-02T11:00:00Z" }
logs:
  - { resource_id: srv-web, timestamp: "2024-05-02T10:05:00Z", level: warn, message: "slow request" }
  - { resource_id: srv-web, timestamp: "2024-05-02T10:01:00Z", message: "listening on :10000" }
"#;

    pub(crate) fn fixture() -> CatalogSource {
        CatalogSource::new(parse_catalog(Path::new("fixture.yaml"), FIXTURE).expect("fixture"))
    }

    #[tokio::test]
    async fn services_join_project_and_environment() {
        let source = fixture();
        let services = source.list_services(None).await.expect("services");
        assert_eq!(services.len(), 4);
        let web = &services[0];
        assert_eq!(web.project_name(), "Storefront");
        assert_eq!(web.environment_name(), "production");
        let orphan = &services[3];
        assert_eq!(orphan.project_name(), "");
    }

    #[tokio::test]
    async fn workspace_scopes_projects_and_services() {
        let source = fixture();
        source.set_workspace("tea-1").await.expect("workspace");

        let projects = source.list_projects().await.expect("projects");
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, "prj-1");

        let services = source.list_services(None).await.expect("services");
        let ids = services
            .iter()
            .map(|view| view.service.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["srv-web", "srv-worker", "srv-orphan"]);
    }

    #[tokio::test]
    async fn workspace_can_be_picked_by_name() {
        let source = fixture();
        let workspace = source.set_workspace("Sandbox").await.expect("workspace");
        assert_eq!(workspace.id, "tea-2");
        assert!(source.set_workspace("nope").await.is_err());
    }

    #[tokio::test]
    async fn environments_filter_by_project() {
        let source = fixture();
        let environments = source
            .list_environments(Some("prj-1"))
            .await
            .expect("environments");
        assert_eq!(environments.len(), 2);
        assert!(source.list_environments(Some("prj-404")).await.is_err());
    }

    #[tokio::test]
    async fn deploys_are_newest_first_and_trigger_appends() {
        let source = fixture();
        let deploys = source.list_deploys("srv-web").await.expect("deploys");
        assert_eq!(deploys[0].id, "dep-b");

        let created = source.trigger_deploy("srv-web").await.expect("deploy");
        assert_eq!(created.status, DeployStatus::Created);
        assert_eq!(created.commit_message, "second");

        let deploys = source.list_deploys("srv-web").await.expect("deploys");
        assert_eq!(deploys[0].id, created.id);
        assert!(source.trigger_deploy("srv-404").await.is_err());
    }

    #[tokio::test]
    async fn triggered_deploy_ids_never_repeat() {
        let catalog = parse_catalog(
            Path::new("catalog.yaml"),
            r#"
services:
  - { id: srv-1, name: api }
deploys:
  - { id: dep-3, service_id: srv-1, status: live, created_at: "2024-05-01T10:00:00Z" }
  - { id: dep-9, service_id: srv-1, status: deactivated, created_at: "2024-04-01T10:00:00Z" }
"#,
        )
        .expect("catalog");
        let source = CatalogSource::new(catalog);

        let first = source.trigger_deploy("srv-1").await.expect("deploy");
        let second = source.trigger_deploy("srv-1").await.expect("deploy");
        assert_eq!(first.id, "dep-10");
        assert_eq!(second.id, "dep-11");

        let deploys = source.list_deploys("srv-1").await.expect("deploys");
        let ids = deploys.iter().map(|deploy| deploy.id.as_str()).collect::<HashSet<_>>();
        assert_eq!(ids.len(), deploys.len());
    }

    #[tokio::test]
    async fn logs_are_chronological_and_restart_is_logged() {
        let source = fixture();
        let logs = source.list_logs("srv-web").await.expect("logs");
        assert_eq!(logs[0].message, "listening on :10000");

        source.restart_service("srv-web").await.expect("restart");
        let logs = source.list_logs("srv-web").await.expect("logs");
        assert_eq!(
            logs.last().map(|entry| entry.message.as_str()),
            Some("restart requested for web")
        );
    }

    #[test]
    fn json_catalog_is_detected_by_extension() {
        let catalog: Catalog = parse_catalog(
            Path::new("catalog.JSON"),
            r#"{"services": [{"id": "srv-1", "name": "api"}]}"#,
        )
        .expect("json catalog");
        assert_eq!(catalog.services.len(), 1);
        assert!(parse_catalog(Path::new("catalog.yaml"), "services: [").is_err());
    }
}
