//! Resource tables built on the generic [`TableWidget`].

use anyhow::{Context, Result};
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::model::{
    Deploy, Environment, Job, LogEntry, Project, ResourceKind, ServiceView, Workspace,
    format_optional_time, format_time,
};
use crate::runtime::{Command, Screen};
use crate::source::ResourceSource;
use crate::widgets::{Column, CustomOption, ErrorScreen, TableWidget};

#[derive(Clone)]
pub struct ScreenContext {
    pub source: Arc<dyn ResourceSource>,
    pub table_height: usize,
    pub search_char_limit: usize,
}

impl ScreenContext {
    fn finish<T: Send + 'static>(&self, table: TableWidget<T>) -> TableWidget<T> {
        table
            .with_height(self.table_height)
            .with_char_limit(self.search_char_limit)
    }
}

pub fn initial_screen(ctx: &ScreenContext, args: &CliArgs) -> Result<Box<dyn Screen>> {
    let kind = ResourceKind::from_token(&args.resource).with_context(|| {
        let known = ResourceKind::ALL.map(ResourceKind::title).join(", ");
        format!("unknown resource {:?} (expected one of {known})", args.resource)
    })?;
    info!(resource = %kind, "opening initial screen");

    let screen: Box<dyn Screen> = match kind {
        ResourceKind::Services => Box::new(services(ctx, args.environment.clone())),
        ResourceKind::Deploys => Box::new(deploys(ctx, required(&args.service, "--service", kind)?)),
        ResourceKind::Jobs => Box::new(jobs(ctx, required(&args.service, "--service", kind)?)),
        ResourceKind::Projects => Box::new(projects(ctx)),
        ResourceKind::Environments => Box::new(environments(ctx, args.project.clone())),
        ResourceKind::Logs => Box::new(logs(ctx, required(&args.id, "--id", kind)?)),
        ResourceKind::Workspaces => Box::new(workspaces(ctx)),
    };
    Ok(screen)
}

fn required(value: &Option<String>, flag: &str, kind: ResourceKind) -> Result<String> {
    value
        .clone()
        .with_context(|| format!("{kind} needs {flag}"))
}

fn matches_any(fields: &[&str], query: &str) -> bool {
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(query))
}

/// Shows `pending` right away, then the outcome of `work` once it finishes.
/// Failures open an [`ErrorScreen`].
fn background<F>(pending: String, work: F) -> Command
where
    F: Future<Output = Result<String>> + Send + 'static,
{
    Command::batch([
        Command::status(pending),
        Command::task(async move {
            match work.await {
                Ok(done) => Command::status(done),
                Err(error) => {
                    warn!("action failed: {error:#}");
                    Command::push(ErrorScreen::new(&error))
                }
            }
        }),
    ])
}

fn deploy_action(source: &Arc<dyn ResourceSource>, service_id: &str, label: &str) -> Command {
    let source = source.clone();
    let service_id = service_id.to_string();
    background(format!("Deploying {label}..."), async move {
        let deploy = source
            .trigger_deploy(&service_id)
            .await
            .with_context(|| format!("failed to deploy {service_id}"))?;
        Ok(format!("Deploy {} created for {service_id}", deploy.id))
    })
}

pub fn services(ctx: &ScreenContext, environment_id: Option<String>) -> TableWidget<ServiceView> {
    let source = ctx.source.clone();
    let load = move || {
        async move { source.list_services(environment_id.as_deref()).await }.boxed()
    };

    let select_ctx = ctx.clone();
    let deploy_source = ctx.source.clone();
    let restart_source = ctx.source.clone();
    let logs_ctx = ctx.clone();
    let jobs_ctx = ctx.clone();

    ctx.finish(TableWidget::new(
        "services",
        load,
        |view: &ServiceView| {
            vec![
                view.project_name().to_string(),
                view.environment_name().to_string(),
                view.service.id.clone(),
                view.service.name.clone(),
            ]
        },
        move |view: &ServiceView| Command::push(deploys(&select_ctx, view.service.id.clone())),
        vec![
            Column::new("Project", 20),
            Column::new("Environment", 16),
            Column::new("ID", 26),
            Column::new("Name", 30),
        ],
        |view: &ServiceView, query: &str| {
            matches_any(
                &[
                    view.service.id.as_str(),
                    view.service.name.as_str(),
                    view.service.kind.as_str(),
                    view.project_name(),
                    view.environment_name(),
                ],
                query,
            )
        },
        vec![
            CustomOption::new("d", "Deploy", move |view: &ServiceView| {
                deploy_action(&deploy_source, &view.service.id, &view.service.name)
            }),
            CustomOption::new("r", "Restart", move |view: &ServiceView| {
                let source = restart_source.clone();
                let service_id = view.service.id.clone();
                let name = view.service.name.clone();
                background(format!("Restarting {name}..."), async move {
                    source
                        .restart_service(&service_id)
                        .await
                        .with_context(|| format!("failed to restart {name}"))?;
                    Ok(format!("Restarted {name}"))
                })
            }),
            CustomOption::new("l", "Logs", move |view: &ServiceView| {
                Command::push(logs(&logs_ctx, view.service.id.clone()))
            }),
            CustomOption::new("j", "Jobs", move |view: &ServiceView| {
                Command::push(jobs(&jobs_ctx, view.service.id.clone()))
            }),
        ],
    ))
}

pub fn deploys(ctx: &ScreenContext, service_id: String) -> TableWidget<Deploy> {
    let source = ctx.source.clone();
    let load = move || async move { source.list_deploys(&service_id).await }.boxed();

    let select_ctx = ctx.clone();
    let redeploy_source = ctx.source.clone();

    ctx.finish(TableWidget::new(
        "deploys",
        load,
        |deploy: &Deploy| {
            vec![
                deploy.id.clone(),
                deploy.status.label().to_string(),
                deploy
                    .commit_message
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .to_string(),
                format_time(&deploy.created_at),
            ]
        },
        move |deploy: &Deploy| Command::push(logs(&select_ctx, deploy.id.clone())),
        vec![
            Column::new("ID", 26),
            Column::new("Status", 20),
            Column::new("Commit", 40),
            Column::new("Created", 20),
        ],
        |deploy: &Deploy, query: &str| {
            matches_any(
                &[
                    deploy.id.as_str(),
                    deploy.status.label(),
                    deploy.commit_message.as_str(),
                ],
                query,
            )
        },
        vec![CustomOption::new("r", "Redeploy", move |deploy: &Deploy| {
            deploy_action(&redeploy_source, &deploy.service_id, &deploy.service_id)
        })],
    ))
}

pub fn jobs(ctx: &ScreenContext, service_id: String) -> TableWidget<Job> {
    let source = ctx.source.clone();
    let load = move || async move { source.list_jobs(&service_id).await }.boxed();
    let select_ctx = ctx.clone();

    ctx.finish(TableWidget::new(
        "jobs",
        load,
        |job: &Job| {
            vec![
                job.start_command.clone(),
                format_optional_time(job.started_at.as_ref()),
                format_optional_time(job.finished_at.as_ref()),
                job.plan_id.clone(),
                job.id.clone(),
            ]
        },
        move |job: &Job| Command::push(logs(&select_ctx, job.id.clone())),
        vec![
            Column::new("Command", 30),
            Column::new("Started", 20),
            Column::new("Finished", 20),
            Column::new("Plan", 12),
            Column::new("ID", 26),
        ],
        |job: &Job, query: &str| {
            matches_any(
                &[
                    job.id.as_str(),
                    job.start_command.as_str(),
                    job.plan_id.as_str(),
                ],
                query,
            )
        },
        Vec::new(),
    ))
}

pub fn projects(ctx: &ScreenContext) -> TableWidget<Project> {
    let source = ctx.source.clone();
    let load = move || async move { source.list_projects().await }.boxed();
    let select_ctx = ctx.clone();

    ctx.finish(TableWidget::new(
        "projects",
        load,
        |project: &Project| vec![project.name.clone(), project.id.clone()],
        move |project: &Project| {
            Command::push(environments(&select_ctx, Some(project.id.clone())))
        },
        vec![Column::new("Name", 30), Column::new("ID", 26)],
        |project: &Project, query: &str| {
            matches_any(&[project.name.as_str(), project.id.as_str()], query)
        },
        Vec::new(),
    ))
}

pub fn environments(ctx: &ScreenContext, project_id: Option<String>) -> TableWidget<Environment> {
    let source = ctx.source.clone();
    let load =
        move || async move { source.list_environments(project_id.as_deref()).await }.boxed();
    let select_ctx = ctx.clone();

    ctx.finish(TableWidget::new(
        "environments",
        load,
        |environment: &Environment| {
            vec![
                environment.name.clone(),
                environment.protected_status().to_string(),
                environment.id.clone(),
            ]
        },
        move |environment: &Environment| {
            Command::push(services(&select_ctx, Some(environment.id.clone())))
        },
        vec![
            Column::new("Name", 24),
            Column::new("Protected", 12),
            Column::new("ID", 26),
        ],
        |environment: &Environment, query: &str| {
            matches_any(&[environment.name.as_str(), environment.id.as_str()], query)
        },
        Vec::new(),
    ))
}

pub fn logs(ctx: &ScreenContext, resource_id: String) -> TableWidget<LogEntry> {
    let source = ctx.source.clone();
    let load = move || async move { source.list_logs(&resource_id).await }.boxed();

    ctx.finish(TableWidget::new(
        "logs",
        load,
        |entry: &LogEntry| {
            vec![
                format_time(&entry.timestamp),
                entry.level.label().to_string(),
                entry.message.clone(),
            ]
        },
        |entry: &LogEntry| Command::status(entry.message.clone()),
        vec![
            Column::new("Time", 20),
            Column::new("Level", 6),
            Column::new("Message", 80),
        ],
        |entry: &LogEntry, query: &str| {
            matches_any(&[entry.level.label(), entry.message.as_str()], query)
        },
        Vec::new(),
    ))
}

pub fn workspaces(ctx: &ScreenContext) -> TableWidget<Workspace> {
    let source = ctx.source.clone();
    let load = move || async move { source.list_workspaces().await }.boxed();
    let select_source = ctx.source.clone();

    ctx.finish(TableWidget::new(
        "workspaces",
        load,
        |workspace: &Workspace| {
            vec![
                workspace.name.clone(),
                workspace.email.clone(),
                workspace.id.clone(),
            ]
        },
        move |workspace: &Workspace| {
            let source = select_source.clone();
            let id = workspace.id.clone();
            background(format!("Switching to {}...", workspace.name), async move {
                let workspace = source
                    .set_workspace(&id)
                    .await
                    .with_context(|| format!("failed to switch workspace to {id}"))?;
                Ok(format!("Workspace set to {}", workspace.name))
            })
        },
        vec![
            Column::new("Name", 24),
            Column::new("Email", 30),
            Column::new("ID", 26),
        ],
        |workspace: &Workspace, query: &str| {
            matches_any(
                &[
                    workspace.name.as_str(),
                    workspace.email.as_str(),
                    workspace.id.as_str(),
                ],
                query,
            )
        },
        Vec::new(),
    ))
}
