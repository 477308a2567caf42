use crate::domain::model::{
    Catalog, DatabaseServer, DeployEnv, PreviewDemoMeta, ServerGroup, ServerId, Weight, DEV,
    PERFORM, PROD, STAGING,
};
use serde::Serialize;
use std::collections::BTreeMap;

pub const PREVIEW_DEMO_SERVER: &str = "preview_demo";

const LIGHT_INSTANCE_TYPE: &str = "db.t4g.micro";
const HEAVY_INSTANCE_TYPE: &str = "db.t4g.medium";

/// dev 與 staging 共用一台，perform 與 prod 各自獨立
pub fn standard_server_groups() -> Vec<ServerGroup> {
    vec![
        ServerGroup::new("dev_staging", &[DEV, STAGING]),
        ServerGroup::new(PERFORM, &[PERFORM]),
        ServerGroup::new(PROD, &[PROD]),
    ]
}

/// 涵蓋專案所有 preview/demo 環境的虛擬伺服器
pub fn preview_demo_group(meta: &PreviewDemoMeta) -> ServerGroup {
    ServerGroup {
        id: PREVIEW_DEMO_SERVER.to_string(),
        members: meta.iter().map(|(name, _)| name.clone()).collect(),
    }
}

/// Optional groups replace base groups with the same id in place; new ids are appended.
pub fn merge_groups(base: &[ServerGroup], optional: &[ServerGroup]) -> Vec<ServerGroup> {
    let mut merged = base.to_vec();
    for group in optional {
        match merged.iter_mut().find(|g| g.id == group.id) {
            Some(existing) => existing.members = group.members.clone(),
            None => merged.push(group.clone()),
        }
    }
    merged
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerMap {
    pub servers: Vec<DatabaseServer>,
    pub deploy_env_to_server: BTreeMap<DeployEnv, ServerId>,
}

impl ServerMap {
    pub fn server(&self, id: &str) -> Option<&DatabaseServer> {
        self.servers.iter().find(|s| s.id == id)
    }

    pub fn server_for(&self, deploy_env: &str) -> Option<&DatabaseServer> {
        self.deploy_env_to_server
            .get(deploy_env)
            .and_then(|id| self.server(id))
    }
}

pub fn consolidate(
    project: &str,
    catalog: &Catalog,
    base_groups: &[ServerGroup],
    optional_groups: &[ServerGroup],
    instance_overrides: &BTreeMap<ServerId, String>,
) -> ServerMap {
    let mut map = ServerMap::default();

    for group in merge_groups(base_groups, optional_groups) {
        // 依宣告順序，第一個在目錄中的成員決定伺服器類型
        let Some(first) = group.members.iter().find_map(|m| catalog.get(m)) else {
            tracing::debug!(
                "⏭️ {}: server group '{}' has no active member, dropping it",
                project,
                group.id
            );
            continue;
        };

        let instance_type = instance_overrides
            .get(&group.id)
            .cloned()
            .unwrap_or_else(|| match first.weight {
                Weight::Heavy => HEAVY_INSTANCE_TYPE.to_string(),
                Weight::Light => LIGHT_INSTANCE_TYPE.to_string(),
            });

        map.servers.push(DatabaseServer {
            id: group.id,
            members: group.members,
            env_type: first.env_type,
            instance_type,
        });
    }

    for server in &map.servers {
        for member in &server.members {
            if let Some(previous) = map
                .deploy_env_to_server
                .insert(member.clone(), server.id.clone())
            {
                if previous != server.id {
                    tracing::warn!(
                        "⚠️ {}: deploy env '{}' is claimed by servers '{}' and '{}'; '{}' wins",
                        project,
                        member,
                        previous,
                        server.id,
                        server.id
                    );
                }
            }
        }
    }

    tracing::debug!(
        "🗄️ {}: {} database server(s) for {} deploy env(s)",
        project,
        map.servers.len(),
        map.deploy_env_to_server.len()
    );
    map
}
