use crate::core::catalog::build_catalog;
use crate::core::database::{consolidate, preview_demo_group, ServerMap};
use crate::core::propagation::{propagate, ResolutionState};
use crate::core::schedule::{classify, ScheduleClass, ScheduleKind, ScheduleTarget};
use crate::domain::model::{Catalog, DependencyEdge, DeployEnv, EnvMeta, PreviewDemoMeta};
use crate::domain::ports::TopologySource;
use crate::utils::error::Result;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedProject {
    pub name: String,
    pub components: Vec<String>,
    pub catalog: Catalog,
    pub database: Option<ServerMap>,
    pub dependencies: Vec<DependencyEdge>,
    pub disable_24x7_components: BTreeSet<String>,
    #[serde(skip)]
    database_disable_24x7: bool,
}

/// 每個 (project, component, deploy env) 堆疊的排程分類
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackSchedule {
    pub project: String,
    pub component: String,
    pub deploy_env: DeployEnv,
    pub schedule: ScheduleClass,
    pub kind: ScheduleKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerSchedule {
    pub project: String,
    pub server: String,
    pub instance_type: String,
    pub schedule: ScheduleClass,
    pub kind: ScheduleKind,
}

/// 解析完成且凍結的拓撲
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedTopology {
    pub region: String,
    pub projects: Vec<ResolvedProject>,
    pub schedules: ResolutionState,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopologyPlan<'a> {
    pub topology: &'a ResolvedTopology,
    pub stacks: Vec<StackSchedule>,
    pub servers: Vec<ServerSchedule>,
}

impl ResolvedTopology {
    pub fn project(&self, name: &str) -> Option<&ResolvedProject> {
        self.projects.iter().find(|p| p.name == name)
    }

    pub fn env_meta(&self, project: &str, deploy_env: &str) -> Option<&EnvMeta> {
        self.project(project)?.catalog.get(deploy_env)
    }

    pub fn set_24x7(&self, project: &str) -> Option<&BTreeSet<DeployEnv>> {
        self.schedules.set_24x7.get(project)
    }

    pub fn set_weekend(&self, project: &str) -> Option<&BTreeSet<DeployEnv>> {
        self.schedules.set_weekend.get(project)
    }

    pub fn classify_stack(
        &self,
        project: &str,
        component: &str,
        deploy_env: &str,
    ) -> Option<ScheduleClass> {
        let resolved = self.project(project)?;
        let meta = resolved.catalog.get(deploy_env)?;
        Some(classify(
            ScheduleTarget::DeployEnv {
                name: deploy_env,
                meta,
            },
            self.set_24x7(project),
            self.set_weekend(project),
            resolved.disable_24x7_components.contains(component),
        ))
    }

    pub fn classify_server(&self, project: &str, server_id: &str) -> Option<ScheduleClass> {
        let resolved = self.project(project)?;
        let server = resolved.database.as_ref()?.server(server_id)?;
        Some(classify(
            ScheduleTarget::DatabaseServer(server),
            self.set_24x7(project),
            self.set_weekend(project),
            resolved.database_disable_24x7,
        ))
    }

    pub fn stack_schedules(&self) -> Vec<StackSchedule> {
        let mut stacks = Vec::new();
        for project in &self.projects {
            for component in &project.components {
                for deploy_env in project.catalog.keys() {
                    if let Some(schedule) =
                        self.classify_stack(&project.name, component, deploy_env)
                    {
                        stacks.push(StackSchedule {
                            project: project.name.clone(),
                            component: component.clone(),
                            deploy_env: deploy_env.clone(),
                            schedule,
                            kind: schedule.kind(),
                        });
                    }
                }
            }
        }
        stacks
    }

    pub fn server_schedules(&self) -> Vec<ServerSchedule> {
        let mut servers = Vec::new();
        for project in &self.projects {
            let Some(database) = &project.database else {
                continue;
            };
            for server in &database.servers {
                if let Some(schedule) = self.classify_server(&project.name, &server.id) {
                    servers.push(ServerSchedule {
                        project: project.name.clone(),
                        server: server.id.clone(),
                        instance_type: server.instance_type.clone(),
                        schedule,
                        kind: schedule.kind(),
                    });
                }
            }
        }
        servers
    }

    pub fn plan(&self) -> TopologyPlan<'_> {
        TopologyPlan {
            topology: self,
            stacks: self.stack_schedules(),
            servers: self.server_schedules(),
        }
    }
}

pub struct TopologyEngine<S: TopologySource> {
    source: S,
}

impl<S: TopologySource> TopologyEngine<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// 依序執行目錄、資料庫合併、依賴傳播
    pub fn resolve(&self) -> Result<ResolvedTopology> {
        let region = self.source.region().to_string();
        let weights = self.source.weight_table();
        let base_groups = self.source.base_server_groups();
        let projects = self.source.projects();

        tracing::info!(
            "🧭 Resolving topology for {} project(s) in {}",
            projects.len(),
            region
        );

        // Catalog
        let mut catalogs: BTreeMap<String, Catalog> = BTreeMap::new();
        for project in &projects {
            let catalog = build_catalog(
                &project.name,
                &project.deploy_envs,
                &weights,
                &project.preview_demo,
                &project.sizing,
                &region,
            )?;
            catalogs.insert(project.name.clone(), catalog);
        }
        tracing::info!("📇 Environment catalog built");

        // Database servers
        let mut databases: BTreeMap<String, ServerMap> = BTreeMap::new();
        for project in &projects {
            let Some(database) = &project.database else {
                continue;
            };
            let mut optional_groups = Vec::new();
            if database.preview_demo_server {
                optional_groups.push(preview_demo_group(&project.preview_demo));
            }
            optional_groups.extend(database.groups.iter().cloned());

            let map = consolidate(
                &project.name,
                &catalogs[&project.name],
                &base_groups,
                &optional_groups,
                &database.instance_types,
            );
            databases.insert(project.name.clone(), map);
        }
        tracing::info!("🗄️ Database servers consolidated for {} project(s)", databases.len());

        // Propagation
        let mut state = ResolutionState::from_projects(&projects);
        let edges: Vec<DependencyEdge> = projects
            .iter()
            .flat_map(|p| p.dependencies.iter().cloned())
            .collect();
        let preview_demo: BTreeMap<String, PreviewDemoMeta> = projects
            .iter()
            .map(|p| (p.name.clone(), p.preview_demo.clone()))
            .collect();
        propagate(&edges, &mut state, &catalogs, &preview_demo)?;
        tracing::info!("🔗 Dependency propagation finished over {} edge(s)", edges.len());

        let resolved = projects
            .into_iter()
            .map(|project| ResolvedProject {
                catalog: catalogs.remove(&project.name).unwrap_or_default(),
                database: databases.remove(&project.name),
                database_disable_24x7: project
                    .database
                    .as_ref()
                    .map(|d| d.disable_24x7)
                    .unwrap_or(false),
                name: project.name,
                components: project.components,
                dependencies: project.dependencies,
                disable_24x7_components: project.disable_24x7_components,
            })
            .collect();

        Ok(ResolvedTopology {
            region,
            projects: resolved,
            schedules: state,
        })
    }
}
