use anyhow::Result;
use deploy_topology::core::catalog::{build_catalog, WeightTable};
use deploy_topology::core::database::{consolidate, preview_demo_group, PREVIEW_DEMO_SERVER};
use deploy_topology::domain::model::{
    DeployEnv, EnvType, PreviewDemoEntry, PreviewDemoKind, ServerGroup, SizingOverrides, Weight,
};
use deploy_topology::utils::validation::Validate;
use deploy_topology::{OverrideSet, TopologyConfig, TopologyEngine, TopologyError};
use std::collections::{BTreeMap, BTreeSet};

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// cat 依賴 bkg (可傳播) 與 lion (固定 prod)
#[test]
fn test_internal_preview_escalates_only_non_pinned_dependency() -> Result<()> {
    let config = TopologyConfig::from_toml_str(
        r#"
region = "us-east-1"

[[projects]]
name = "cat"
components = ["api"]
deploy_envs = ["dev", "staging", "prod", "sihp"]
set_24x7 = ["sihp"]

[projects.dependencies]
bkg = false
lion = true

[projects.preview_demo.sihp]
weight = "light"
kind = "preview"
env_type = "internal"

[[projects]]
name = "bkg"
components = ["api"]
deploy_envs = ["dev", "staging", "prod"]

[[projects]]
name = "lion"
components = ["api"]
deploy_envs = ["dev", "staging", "prod"]
set_24x7 = ["dev"]
"#,
    )?;
    config.validate()?;

    let topology = TopologyEngine::new(config).resolve()?;

    assert_eq!(topology.set_24x7("bkg"), Some(&set(&["staging"])));
    assert_eq!(topology.set_24x7("lion"), Some(&set(&["dev"])));
    assert_eq!(topology.set_24x7("cat"), Some(&set(&["sihp"])));

    let bkg_staging = topology.classify_stack("bkg", "api", "staging").unwrap();
    assert!(bkg_staging.is_24x7);
    let bkg_dev = topology.classify_stack("bkg", "api", "dev").unwrap();
    assert!(bkg_dev.is_not_24x7);

    Ok(())
}

#[test]
fn test_prod_in_weekend_set_is_fatal() -> Result<()> {
    let config = TopologyConfig::from_toml_str(
        r#"
region = "us-east-1"

[[projects]]
name = "cat"
components = ["api"]
deploy_envs = ["dev", "staging", "prod"]
set_24x7 = ["dev"]

[projects.dependencies]
dog = false

[[projects]]
name = "dog"
components = ["api"]
deploy_envs = ["dev", "staging", "prod"]
set_weekend = ["prod"]
"#,
    )?;
    config.validate()?;

    let err = TopologyEngine::new(config).resolve().unwrap_err();
    match &err {
        TopologyError::InvalidOverrideValue { project, set } => {
            assert_eq!(project, "dog");
            assert_eq!(*set, OverrideSet::Weekend);
        }
        other => panic!("expected InvalidOverrideValue, got {:?}", other),
    }
    let message = err.to_string();
    assert!(message.contains("dog"));
    assert!(message.contains("weekend"));
    assert_ne!(err.exit_code(), 0);

    Ok(())
}

#[test]
fn test_preview_demo_server_joins_standard_groups() -> Result<()> {
    let meta: Vec<(DeployEnv, PreviewDemoEntry)> = ["sihp", "sihd"]
        .iter()
        .map(|name| {
            (
                name.to_string(),
                PreviewDemoEntry {
                    weight: Weight::Light,
                    kind: if *name == "sihp" {
                        PreviewDemoKind::Preview
                    } else {
                        PreviewDemoKind::Demo
                    },
                    env_type: None,
                    regions: None,
                },
            )
        })
        .collect();
    let envs: Vec<DeployEnv> = ["dev", "staging", "perform", "prod", "sihp", "sihd"]
        .iter()
        .map(|e| e.to_string())
        .collect();
    let catalog = build_catalog(
        "cat",
        &envs,
        &WeightTable::standard(),
        &meta,
        &SizingOverrides::default(),
        "us-east-1",
    )?;
    assert_eq!(catalog["sihp"].env_type, EnvType::External);
    assert_eq!(catalog["sihd"].env_type, EnvType::External);

    let base = vec![
        ServerGroup::new("dev_staging", &["dev", "staging"]),
        ServerGroup::new("perform", &["perform"]),
        ServerGroup::new("prod", &["prod"]),
    ];
    let map = consolidate(
        "cat",
        &catalog,
        &base,
        &[preview_demo_group(&meta)],
        &BTreeMap::new(),
    );

    assert_eq!(map.servers.len(), 4);
    assert_eq!(map.deploy_env_to_server["sihd"], PREVIEW_DEMO_SERVER);
    assert_eq!(
        map.server(PREVIEW_DEMO_SERVER).unwrap().env_type,
        EnvType::External
    );

    Ok(())
}

#[test]
fn test_missing_perform_weight_is_fatal() -> Result<()> {
    let config = TopologyConfig::from_toml_str(
        r#"
region = "us-east-1"

[weights]
dev = "light"
staging = "heavy"
prod = "heavy"

[[projects]]
name = "cat"
components = ["api"]
deploy_envs = ["dev", "staging", "perform", "prod"]
"#,
    )?;
    config.validate()?;

    match TopologyEngine::new(config).resolve() {
        Err(TopologyError::MissingWeight {
            project,
            deploy_env,
        }) => {
            assert_eq!(project, "cat");
            assert_eq!(deploy_env, "perform");
        }
        other => panic!("expected MissingWeight, got {:?}", other),
    }

    Ok(())
}

#[test]
fn test_unknown_override_env_is_fatal() -> Result<()> {
    let config = TopologyConfig::from_toml_str(
        r#"
region = "us-east-1"

[[projects]]
name = "cat"
components = ["api"]
deploy_envs = ["dev", "staging", "prod", "sihd"]
set_weekend = ["sihd", "uat"]

[projects.dependencies]
bkg = false

[projects.preview_demo.sihd]
weight = "light"
kind = "demo"

[[projects]]
name = "bkg"
components = ["api"]
deploy_envs = ["dev", "staging", "prod"]
"#,
    )?;
    config.validate()?;

    match TopologyEngine::new(config).resolve() {
        Err(TopologyError::UnknownDeployEnv {
            project,
            set,
            deploy_env,
            offending_set,
        }) => {
            assert_eq!(project, "cat");
            assert_eq!(set, OverrideSet::Weekend);
            assert_eq!(deploy_env, "uat");
            assert_eq!(offending_set, vec!["sihd".to_string(), "uat".to_string()]);
        }
        other => panic!("expected UnknownDeployEnv, got {:?}", other),
    }

    Ok(())
}
