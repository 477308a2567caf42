use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub const DEV: &str = "dev";
pub const STAGING: &str = "staging";
pub const PERFORM: &str = "perform";
pub const PROD: &str = "prod";

/// 固定的內部環境分區
pub const INTERNAL_ENVS: [&str; 3] = [DEV, STAGING, PERFORM];

pub type DeployEnv = String;
pub type ServerId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvType {
    Internal,
    External,
    Prod,
}

impl fmt::Display for EnvType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvType::Internal => write!(f, "internal"),
            EnvType::External => write!(f, "external"),
            EnvType::Prod => write!(f, "prod"),
        }
    }
}

/// Heavy 即 staging/prod 級別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weight {
    Light,
    Heavy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheSizing {
    pub node_type: String,
    pub replicas: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComputeSizing {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvMeta {
    pub env_type: EnvType,
    pub weight: Weight,
    pub cache: CacheSizing,
    pub compute: ComputeSizing,
    pub multi_region_token: Option<String>,
    pub tag_deploy: bool,
}

pub type Catalog = BTreeMap<DeployEnv, EnvMeta>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewDemoKind {
    Preview,
    Demo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewDemoEntry {
    pub weight: Weight,
    pub kind: PreviewDemoKind,
    /// 預設為 External；內部預覽環境可宣告為 internal
    #[serde(default)]
    pub env_type: Option<EnvType>,
    /// 未指定時所有區域皆啟用
    #[serde(default)]
    pub regions: Option<Vec<String>>,
}

impl PreviewDemoEntry {
    pub fn is_active_in(&self, region: &str) -> bool {
        self.regions
            .as_ref()
            .map(|regions| regions.iter().any(|r| r == region))
            .unwrap_or(true)
    }
}

/// Preview/demo 名稱 -> 設定，保持宣告順序
pub type PreviewDemoMeta = Vec<(DeployEnv, PreviewDemoEntry)>;

pub fn find_preview_demo<'a>(
    meta: &'a PreviewDemoMeta,
    name: &str,
) -> Option<&'a PreviewDemoEntry> {
    meta.iter()
        .find(|(env, _)| env == name)
        .map(|(_, entry)| entry)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizingOverrides {
    #[serde(default)]
    pub cache_node_type: Option<String>,
    #[serde(default)]
    pub compute_max: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    pub source: String,
    pub dependency: String,
    pub always_prod: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerGroup {
    pub id: ServerId,
    pub members: Vec<DeployEnv>,
}

impl ServerGroup {
    pub fn new(id: &str, members: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseServer {
    pub id: ServerId,
    pub members: Vec<DeployEnv>,
    pub env_type: EnvType,
    pub instance_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseDecl {
    pub preview_demo_server: bool,
    pub disable_24x7: bool,
    pub groups: Vec<ServerGroup>,
    pub instance_types: BTreeMap<ServerId, String>,
}

/// 宣告層級的專案定義 (傳播前)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDecl {
    pub name: String,
    pub components: Vec<String>,
    pub deploy_envs: Vec<DeployEnv>,
    pub dependencies: Vec<DependencyEdge>,
    pub set_24x7: BTreeSet<DeployEnv>,
    pub set_weekend: Option<BTreeSet<DeployEnv>>,
    pub preview_demo: PreviewDemoMeta,
    pub sizing: SizingOverrides,
    pub database: Option<DatabaseDecl>,
    pub disable_24x7_components: BTreeSet<String>,
}
