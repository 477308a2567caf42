use crate::core::catalog::{region_token, WeightTable};
use crate::core::database::standard_server_groups;
use crate::domain::model::{
    DatabaseDecl, DependencyEdge, EnvType, PreviewDemoEntry, ProjectDecl, ServerGroup, ServerId,
    SizingOverrides, Weight, PROD,
};
use crate::domain::ports::TopologySource;
use crate::utils::error::{Result, TopologyError};
use crate::utils::validation::{
    validate_deploy_env_name, validate_non_empty_list, validate_non_empty_string, validate_range,
    validate_required_field, validate_unique_names, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const MAX_COMPUTE: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyConfig {
    pub region: Option<String>,
    #[serde(default)]
    pub weights: Option<BTreeMap<String, Weight>>,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub projects: Vec<ProjectConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub base_groups: Option<Vec<ServerGroup>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub components: Vec<String>,
    pub deploy_envs: Vec<String>,
    #[serde(default, with = "declared_order")]
    pub dependencies: Vec<(String, bool)>, // 依賴專案 -> always_prod
    #[serde(default)]
    pub set_24x7: Vec<String>,
    pub set_weekend: Option<Vec<String>>,
    #[serde(default)]
    pub disable_24x7_components: Vec<String>,
    #[serde(default, with = "declared_order")]
    pub preview_demo: Vec<(String, PreviewDemoEntry)>,
    #[serde(default)]
    pub sizing: SizingOverrides,
    pub database: Option<ProjectDatabaseConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectDatabaseConfig {
    #[serde(default)]
    pub preview_demo_server: bool,
    #[serde(default)]
    pub disable_24x7: bool,
    #[serde(default)]
    pub groups: Vec<ServerGroup>,
    #[serde(default)]
    pub instance_types: BTreeMap<ServerId, String>,
}

impl TopologyConfig {
    /// 從 TOML 檔案載入拓撲設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TopologyError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析拓撲設定
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| TopologyError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DEPLOY_REGION})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TopologyError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 命令列 --region 覆蓋設定檔
    pub fn with_region(mut self, region: Option<String>) -> Self {
        if let Some(region) = region {
            self.region = Some(region);
        }
        self
    }

    pub fn project(&self, name: &str) -> Option<&ProjectConfig> {
        self.projects.iter().find(|p| p.name == name)
    }

    pub fn validate_config(&self) -> Result<()> {
        let region = validate_required_field("region", &self.region)?;
        if region.contains("${") {
            return Err(TopologyError::MissingConfigError {
                field: format!("region (unresolved placeholder {})", region),
            });
        }
        if region_token(region).is_none() {
            return Err(TopologyError::UnknownRegion {
                region: region.clone(),
            });
        }

        validate_unique_names("projects", self.projects.iter().map(|p| p.name.as_str()))?;

        for project in &self.projects {
            self.validate_project(project)?;
        }

        if let Some(groups) = self
            .database
            .as_ref()
            .and_then(|d| d.base_groups.as_ref())
        {
            validate_server_groups("database.base_groups", groups)?;
        }

        Ok(())
    }

    fn validate_project(&self, project: &ProjectConfig) -> Result<()> {
        validate_non_empty_string("projects.name", &project.name)?;
        let field = |name: &str| format!("projects.{}.{}", project.name, name);

        validate_non_empty_list(&field("components"), &project.components)?;
        validate_unique_names(
            &field("components"),
            project.components.iter().map(String::as_str),
        )?;
        validate_non_empty_list(&field("deploy_envs"), &project.deploy_envs)?;
        validate_unique_names(
            &field("deploy_envs"),
            project.deploy_envs.iter().map(String::as_str),
        )?;
        for deploy_env in &project.deploy_envs {
            validate_deploy_env_name(&field("deploy_envs"), deploy_env)?;
        }

        for (dependency, _) in &project.dependencies {
            if self.project(dependency).is_none() {
                return Err(TopologyError::UnknownProject {
                    project: dependency.clone(),
                    referenced_by: project.name.clone(),
                });
            }
        }

        for component in &project.disable_24x7_components {
            if !project.components.contains(component) {
                return Err(TopologyError::InvalidConfigValueError {
                    field: field("disable_24x7_components"),
                    value: component.clone(),
                    reason: "Not one of the project's components".to_string(),
                });
            }
        }

        for (name, entry) in &project.preview_demo {
            validate_deploy_env_name(&field("preview_demo"), name)?;
            if name == PROD || entry.env_type == Some(EnvType::Prod) {
                return Err(TopologyError::InvalidConfigValueError {
                    field: field("preview_demo"),
                    value: name.clone(),
                    reason: "Preview/demo envs cannot be prod".to_string(),
                });
            }
        }

        if let Some(compute_max) = project.sizing.compute_max {
            validate_range(&field("sizing.compute_max"), compute_max, 1, MAX_COMPUTE)?;
        }
        if let Some(node_type) = &project.sizing.cache_node_type {
            validate_non_empty_string(&field("sizing.cache_node_type"), node_type)?;
        }

        if let Some(database) = &project.database {
            validate_server_groups(&field("database.groups"), &database.groups)?;
        }

        Ok(())
    }

    /// 已驗證設定中的區域
    pub fn resolved_region(&self) -> &str {
        self.region.as_deref().unwrap_or_default()
    }
}

/// TOML 表格依宣告順序讀成 (鍵, 值) 清單；需要 toml 的 preserve_order
mod declared_order {
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::fmt;
    use std::marker::PhantomData;

    pub fn serialize<S, V>(entries: &[(String, V)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Vec<(String, V)>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a table")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, V>()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

fn validate_server_groups(field_name: &str, groups: &[ServerGroup]) -> Result<()> {
    validate_unique_names(field_name, groups.iter().map(|g| g.id.as_str()))?;
    for group in groups {
        validate_non_empty_string(field_name, &group.id)?;
        validate_non_empty_list(&format!("{}.{}.members", field_name, group.id), &group.members)?;
    }
    Ok(())
}

impl ProjectConfig {
    fn to_decl(&self) -> ProjectDecl {
        ProjectDecl {
            name: self.name.clone(),
            components: self.components.clone(),
            deploy_envs: self.deploy_envs.clone(),
            dependencies: self
                .dependencies
                .iter()
                .map(|(dependency, always_prod)| DependencyEdge {
                    source: self.name.clone(),
                    dependency: dependency.clone(),
                    always_prod: *always_prod,
                })
                .collect(),
            set_24x7: self.set_24x7.iter().cloned().collect(),
            set_weekend: self
                .set_weekend
                .as_ref()
                .map(|set| set.iter().cloned().collect::<BTreeSet<_>>()),
            preview_demo: self.preview_demo.clone(),
            sizing: self.sizing.clone(),
            database: self.database.as_ref().map(|db| DatabaseDecl {
                preview_demo_server: db.preview_demo_server,
                disable_24x7: db.disable_24x7,
                groups: db.groups.clone(),
                instance_types: db.instance_types.clone(),
            }),
            disable_24x7_components: self.disable_24x7_components.iter().cloned().collect(),
        }
    }
}

impl TopologySource for TopologyConfig {
    fn region(&self) -> &str {
        self.resolved_region()
    }

    fn weight_table(&self) -> WeightTable {
        match &self.weights {
            Some(weights) => {
                WeightTable::from_entries(weights.iter().map(|(name, w)| (name.as_str(), *w)))
            }
            None => WeightTable::standard(),
        }
    }

    fn base_server_groups(&self) -> Vec<ServerGroup> {
        self.database
            .as_ref()
            .and_then(|d| d.base_groups.clone())
            .unwrap_or_else(standard_server_groups)
    }

    fn projects(&self) -> Vec<ProjectDecl> {
        self.projects.iter().map(ProjectConfig::to_decl).collect()
    }
}

impl Validate for TopologyConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PreviewDemoKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
region = "us-east-1"

[[projects]]
name = "cat"
components = ["api", "worker"]
deploy_envs = ["dev", "staging", "prod", "sihp"]
set_24x7 = ["sihp"]
disable_24x7_components = ["worker"]

[projects.dependencies]
bkg = false
lion = true

[projects.preview_demo.sihp]
weight = "light"
kind = "preview"
env_type = "internal"

[projects.sizing]
compute_max = 8

[projects.database]
preview_demo_server = true

[[projects]]
name = "bkg"
components = ["api"]
deploy_envs = ["dev", "staging", "prod"]

[[projects]]
name = "lion"
components = ["api"]
deploy_envs = ["prod"]
"#;

    #[test]
    fn test_parse_basic_topology() {
        let config = TopologyConfig::from_toml_str(BASIC).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.region(), "us-east-1");
        assert_eq!(config.projects.len(), 3);

        let cat = config.project("cat").unwrap();
        assert_eq!(
            cat.dependencies,
            vec![("bkg".to_string(), false), ("lion".to_string(), true)]
        );
        assert_eq!(cat.sizing.compute_max, Some(8));
        let (name, sihp) = &cat.preview_demo[0];
        assert_eq!(name, "sihp");
        assert_eq!(sihp.kind, PreviewDemoKind::Preview);
        assert_eq!(sihp.env_type, Some(EnvType::Internal));
        assert!(cat.database.as_ref().unwrap().preview_demo_server);
    }

    #[test]
    fn test_projects_convert_to_declarations() {
        let config = TopologyConfig::from_toml_str(BASIC).unwrap();
        let decls = config.projects();

        let cat = &decls[0];
        assert_eq!(cat.dependencies.len(), 2);
        assert!(cat
            .dependencies
            .iter()
            .all(|edge| edge.source == "cat"));
        assert!(cat.set_weekend.is_none());
        assert!(cat.disable_24x7_components.contains("worker"));
        assert!(cat.database.is_some());
        assert!(decls[1].database.is_none());
    }

    #[test]
    fn test_tables_keep_declaration_order() {
        let config = TopologyConfig::from_toml_str(
            r#"
region = "us-east-1"

[[projects]]
name = "cat"
components = ["api"]
deploy_envs = ["dev", "prod", "zzprev", "aademo"]

[projects.dependencies]
zebra = true
ant = false

[projects.preview_demo.zzprev]
weight = "light"
kind = "preview"
env_type = "internal"

[projects.preview_demo.aademo]
weight = "light"
kind = "demo"
"#,
        )
        .unwrap();
        let decl = &config.projects()[0];

        let names: Vec<&str> = decl.preview_demo.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["zzprev", "aademo"]);
        let dependencies: Vec<&str> = decl
            .dependencies
            .iter()
            .map(|edge| edge.dependency.as_str())
            .collect();
        assert_eq!(dependencies, vec!["zebra", "ant"]);
    }

    #[test]
    fn test_defaults_apply() {
        let config = TopologyConfig::from_toml_str(BASIC).unwrap();
        assert_eq!(config.weight_table(), WeightTable::standard());
        assert_eq!(config.base_server_groups(), standard_server_groups());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TOPOLOGY_TEST_REGION", "eu-west-1");

        let config = TopologyConfig::from_toml_str(
            r#"
region = "${TOPOLOGY_TEST_REGION}"
"#,
        )
        .unwrap();
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));

        std::env::remove_var("TOPOLOGY_TEST_REGION");
    }

    #[test]
    fn test_unresolved_region_placeholder_rejected() {
        let config = TopologyConfig::from_toml_str(
            r#"
region = "${TOPOLOGY_TEST_UNSET_REGION}"
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(TopologyError::MissingConfigError { .. })
        ));

        let overridden = config.with_region(Some("us-west-2".to_string()));
        assert!(overridden.validate().is_ok());
    }

    #[test]
    fn test_missing_region_rejected() {
        let config = TopologyConfig::from_toml_str("").unwrap();
        assert!(matches!(
            config.validate(),
            Err(TopologyError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let config = TopologyConfig::from_toml_str(
            r#"
region = "us-east-1"

[[projects]]
name = "cat"
components = ["api"]
deploy_envs = ["prod"]

[projects.dependencies]
ghost = false
"#,
        )
        .unwrap();

        match config.validate() {
            Err(TopologyError::UnknownProject {
                project,
                referenced_by,
            }) => {
                assert_eq!(project, "ghost");
                assert_eq!(referenced_by, "cat");
            }
            other => panic!("expected UnknownProject, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_projects_rejected() {
        let config = TopologyConfig::from_toml_str(
            r#"
region = "us-east-1"

[[projects]]
name = "cat"
components = ["api"]
deploy_envs = ["prod"]

[[projects]]
name = "cat"
components = ["api"]
deploy_envs = ["prod"]
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_compute_max_out_of_range_rejected() {
        let config = TopologyConfig::from_toml_str(
            r#"
region = "us-east-1"

[[projects]]
name = "cat"
components = ["api"]
deploy_envs = ["prod"]

[projects.sizing]
compute_max = 500
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(TopologyError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_unknown_disabled_component_rejected() {
        let config = TopologyConfig::from_toml_str(
            r#"
region = "us-east-1"

[[projects]]
name = "cat"
components = ["api"]
deploy_envs = ["prod"]
disable_24x7_components = ["worker"]
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_custom_weights_and_base_groups() {
        let config = TopologyConfig::from_toml_str(
            r#"
region = "us-east-1"

[weights]
dev = "light"
prod = "heavy"

[[database.base_groups]]
id = "shared"
members = ["dev", "prod"]
"#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.weight_table().get("prod"), Some(Weight::Heavy));
        assert_eq!(config.weight_table().get("staging"), None);
        assert_eq!(
            config.base_server_groups(),
            vec![ServerGroup::new("shared", &["dev", "prod"])]
        );
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = TopologyConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.projects[0].name, "cat");
    }

    #[test]
    fn test_invalid_toml_reported() {
        let result = TopologyConfig::from_toml_str("region = ");
        assert!(matches!(
            result,
            Err(TopologyError::ConfigValidationError { .. })
        ));
    }
}
