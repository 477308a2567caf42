use crate::core::catalog::WeightTable;
use crate::domain::model::{ProjectDecl, ServerGroup};

/// 拓撲宣告的來源 (TOML 設定或測試用的靜態表)
pub trait TopologySource {
    fn region(&self) -> &str;
    fn weight_table(&self) -> WeightTable;
    fn base_server_groups(&self) -> Vec<ServerGroup>;
    fn projects(&self) -> Vec<ProjectDecl>;
}
