use crate::domain::model::{
    find_preview_demo, Catalog, DependencyEdge, DeployEnv, EnvType, PreviewDemoMeta, ProjectDecl,
    PROD, STAGING,
};
use crate::utils::error::{OverrideSet, Result, TopologyError};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// 每個專案的 24/7 與週末集合；傳播期間只增不減，之後凍結
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionState {
    pub set_24x7: BTreeMap<String, BTreeSet<DeployEnv>>,
    /// 沒有條目代表該專案未提供週末集合
    pub set_weekend: BTreeMap<String, BTreeSet<DeployEnv>>,
}

impl ResolutionState {
    pub fn from_projects(projects: &[ProjectDecl]) -> Self {
        let mut state = Self::default();
        for project in projects {
            state
                .set_24x7
                .insert(project.name.clone(), project.set_24x7.clone());
            if let Some(weekend) = &project.set_weekend {
                state.set_weekend.insert(project.name.clone(), weekend.clone());
            }
        }
        state
    }

    pub fn set(&self, which: OverrideSet, project: &str) -> Option<&BTreeSet<DeployEnv>> {
        match which {
            OverrideSet::TwentyFourSeven => self.set_24x7.get(project),
            OverrideSet::Weekend => self.set_weekend.get(project),
        }
    }

    fn sets_mut(&mut self, which: OverrideSet) -> &mut BTreeMap<String, BTreeSet<DeployEnv>> {
        match which {
            OverrideSet::TwentyFourSeven => &mut self.set_24x7,
            OverrideSet::Weekend => &mut self.set_weekend,
        }
    }

    pub fn is_declared(&self, project: &str) -> bool {
        self.set_24x7.contains_key(project)
    }

    /// prod 永遠開啟，任何覆寫集合都不得明列
    pub fn reject_explicit_prod(&self) -> Result<()> {
        for which in [OverrideSet::TwentyFourSeven, OverrideSet::Weekend] {
            let sets = match which {
                OverrideSet::TwentyFourSeven => &self.set_24x7,
                OverrideSet::Weekend => &self.set_weekend,
            };
            if let Some((project, _)) = sets.iter().find(|(_, set)| set.contains(PROD)) {
                return Err(TopologyError::InvalidOverrideValue {
                    project: project.clone(),
                    set: which,
                });
            }
        }
        Ok(())
    }
}

/// Escalates each dependency's override sets to match its dependents, one hop per edge.
///
/// Edges run in dependency order: every edge into a project is applied before the
/// edges leaving it, so a single pass already reaches a fixed point.
pub fn propagate(
    edges: &[DependencyEdge],
    state: &mut ResolutionState,
    catalogs: &BTreeMap<String, Catalog>,
    preview_demo: &BTreeMap<String, PreviewDemoMeta>,
) -> Result<()> {
    state.reject_explicit_prod()?;

    for edge in edges {
        for project in [&edge.source, &edge.dependency] {
            if !state.is_declared(project) {
                let referenced_by = if project == &edge.source {
                    edge.dependency.clone()
                } else {
                    edge.source.clone()
                };
                return Err(TopologyError::UnknownProject {
                    project: project.clone(),
                    referenced_by,
                });
            }
        }
    }

    let empty_catalog = Catalog::new();
    let empty_meta = PreviewDemoMeta::new();

    for edge in propagation_order(edges) {
        if edge.always_prod {
            tracing::debug!(
                "📌 {} -> {} is pinned to prod, skipping propagation",
                edge.source,
                edge.dependency
            );
            continue;
        }

        let catalog = catalogs.get(&edge.source).unwrap_or(&empty_catalog);
        let meta = preview_demo.get(&edge.source).unwrap_or(&empty_meta);

        for which in [OverrideSet::TwentyFourSeven, OverrideSet::Weekend] {
            let Some(source_set) = state.set(which, &edge.source).cloned() else {
                continue;
            };

            let mut escalate = false;
            for deploy_env in &source_set {
                match catalog.get(deploy_env).map(|m| m.env_type) {
                    Some(EnvType::Internal) => escalate = true,
                    _ => {
                        if find_preview_demo(meta, deploy_env).is_none() {
                            return Err(TopologyError::UnknownDeployEnv {
                                project: edge.source.clone(),
                                set: which,
                                deploy_env: deploy_env.clone(),
                                offending_set: source_set.iter().cloned().collect(),
                            });
                        }
                    }
                }
            }

            if escalate {
                let inserted = state
                    .sets_mut(which)
                    .entry(edge.dependency.clone())
                    .or_default()
                    .insert(STAGING.to_string());
                if inserted {
                    tracing::info!(
                        "⬆️ {} {} set gains '{}' (required by {})",
                        edge.dependency,
                        which,
                        STAGING,
                        edge.source
                    );
                }
            }
        }
    }

    Ok(())
}

/// 依賴順序排列邊：指向專案的邊都先於該專案對外的邊；環狀依賴退回宣告順序
fn propagation_order(edges: &[DependencyEdge]) -> Vec<&DependencyEdge> {
    let mut projects: Vec<&str> = Vec::new();
    for edge in edges {
        for project in [edge.source.as_str(), edge.dependency.as_str()] {
            if !projects.contains(&project) {
                projects.push(project);
            }
        }
    }

    // 固定 prod 的邊不傳播，不影響順序
    let live: Vec<&DependencyEdge> = edges.iter().filter(|e| !e.always_prod).collect();
    let mut incoming: BTreeMap<&str, usize> = projects.iter().map(|p| (*p, 0)).collect();
    for edge in &live {
        *incoming.entry(edge.dependency.as_str()).or_default() += 1;
    }

    let mut rank: BTreeMap<&str, usize> = BTreeMap::new();
    let mut remaining = projects;
    while let Some(pos) = remaining
        .iter()
        .position(|p| incoming.get(p).copied().unwrap_or_default() == 0)
    {
        let project = remaining.remove(pos);
        rank.insert(project, rank.len());
        for edge in live.iter().filter(|e| e.source == project) {
            if let Some(count) = incoming.get_mut(edge.dependency.as_str()) {
                *count = count.saturating_sub(1);
            }
        }
    }

    if !remaining.is_empty() {
        tracing::warn!(
            "🔁 Dependency cycle among {:?}; propagating those edges in declaration order",
            remaining
        );
        for project in remaining {
            rank.insert(project, rank.len());
        }
    }

    let mut ordered: Vec<&DependencyEdge> = edges.iter().collect();
    ordered.sort_by_key(|e| rank.get(e.source.as_str()).copied().unwrap_or_default());
    ordered
}
