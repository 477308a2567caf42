use crate::core::engine::ResolvedTopology;
use crate::utils::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// 將解析後的計畫寫成 JSON 檔
#[derive(Debug, Clone)]
pub struct PlanOutput {
    path: PathBuf,
}

impl PlanOutput {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn write(&self, topology: &ResolvedTopology) -> Result<&Path> {
        let json = serde_json::to_vec_pretty(&topology.plan())?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&self.path, json)?;
        Ok(self.path.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::topology_config::TopologyConfig;
    use crate::core::engine::TopologyEngine;
    use tempfile::TempDir;

    #[test]
    fn test_write_plan_creates_parent_dirs() {
        let config = TopologyConfig::from_toml_str(
            r#"
region = "us-east-1"

[[projects]]
name = "cat"
components = ["api"]
deploy_envs = ["dev", "prod"]
"#,
        )
        .unwrap();
        let topology = TopologyEngine::new(config).resolve().unwrap();

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("plans").join("us-east-1.json");
        let output = PlanOutput::new(&path);
        let written = output.write(&topology).unwrap();
        assert_eq!(written, path.as_path());

        let content = std::fs::read_to_string(&path).unwrap();
        let plan: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(plan["topology"]["region"], "us-east-1");
        assert_eq!(plan["stacks"].as_array().unwrap().len(), 2);
        assert_eq!(plan["stacks"][1]["kind"], "always_on");
    }
}
