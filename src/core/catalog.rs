use crate::domain::model::{
    find_preview_demo, CacheSizing, Catalog, ComputeSizing, DeployEnv, EnvMeta, EnvType,
    PreviewDemoMeta, SizingOverrides, Weight, DEV, INTERNAL_ENVS, PERFORM, PROD, STAGING,
};
use crate::utils::error::{Result, TopologyError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const LIGHT_CACHE_NODE: &str = "cache.t4g.micro";
const HEAVY_CACHE_NODE: &str = "cache.t4g.small";
const LIGHT_CACHE_REPLICAS: u32 = 0;
const HEAVY_CACHE_REPLICAS: u32 = 1;

const LIGHT_COMPUTE: ComputeSizing = ComputeSizing { min: 1, max: 1 };
const HEAVY_COMPUTE: ComputeSizing = ComputeSizing { min: 1, max: 4 };

/// 區域 -> multi-region token
const REGION_TOKENS: [(&str, &str); 8] = [
    ("us-east-1", "use1"),
    ("us-east-2", "use2"),
    ("us-west-2", "usw2"),
    ("eu-west-1", "euw1"),
    ("eu-central-1", "euc1"),
    ("ap-southeast-1", "apse1"),
    ("ap-southeast-2", "apse2"),
    ("ap-northeast-1", "apne1"),
];

pub fn region_token(region: &str) -> Option<&'static str> {
    REGION_TOKENS
        .iter()
        .find(|(name, _)| *name == region)
        .map(|(_, token)| *token)
}

/// 固定的 deploy env 權重表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable {
    weights: BTreeMap<DeployEnv, Weight>,
}

impl WeightTable {
    pub fn standard() -> Self {
        Self::from_entries([
            (DEV, Weight::Light),
            (STAGING, Weight::Heavy),
            (PERFORM, Weight::Light),
            (PROD, Weight::Heavy),
        ])
    }

    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Weight)>,
    {
        Self {
            weights: entries
                .into_iter()
                .map(|(name, weight)| (name.to_string(), weight))
                .collect(),
        }
    }

    pub fn get(&self, deploy_env: &str) -> Option<Weight> {
        self.weights.get(deploy_env).copied()
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::standard()
    }
}

pub fn env_type_of(deploy_env: &str, declared: Option<EnvType>) -> EnvType {
    if deploy_env == PROD {
        EnvType::Prod
    } else if INTERNAL_ENVS.contains(&deploy_env) {
        EnvType::Internal
    } else {
        match declared {
            Some(EnvType::Internal) => EnvType::Internal,
            _ => EnvType::External,
        }
    }
}

fn cache_sizing(weight: Weight, sizing: &SizingOverrides) -> CacheSizing {
    match weight {
        Weight::Light => CacheSizing {
            node_type: LIGHT_CACHE_NODE.to_string(),
            replicas: LIGHT_CACHE_REPLICAS,
        },
        Weight::Heavy => CacheSizing {
            node_type: sizing
                .cache_node_type
                .clone()
                .unwrap_or_else(|| HEAVY_CACHE_NODE.to_string()),
            replicas: HEAVY_CACHE_REPLICAS,
        },
    }
}

/// 自訂最大值只能往上調整，且只套用於 heavy 環境
pub fn compute_sizing(weight: Weight, custom_max: Option<u32>) -> ComputeSizing {
    match weight {
        Weight::Light => LIGHT_COMPUTE,
        Weight::Heavy => ComputeSizing {
            min: HEAVY_COMPUTE.min,
            max: custom_max.map_or(HEAVY_COMPUTE.max, |custom| custom.max(HEAVY_COMPUTE.max)),
        },
    }
}

/// 為單一專案建立 deploy env 目錄
pub fn build_catalog(
    project: &str,
    deploy_envs: &[DeployEnv],
    weights: &WeightTable,
    overrides: &PreviewDemoMeta,
    sizing: &SizingOverrides,
    region: &str,
) -> Result<Catalog> {
    let token = region_token(region).ok_or_else(|| TopologyError::UnknownRegion {
        region: region.to_string(),
    })?;

    let mut catalog = Catalog::new();

    for deploy_env in deploy_envs {
        let entry = find_preview_demo(overrides, deploy_env);

        if let Some(entry) = entry {
            if weights.get(deploy_env).is_none() && !entry.is_active_in(region) {
                tracing::debug!(
                    "⏭️ {}/{} is not active in {}, leaving it out of the catalog",
                    project,
                    deploy_env,
                    region
                );
                continue;
            }
        }

        let weight = weights
            .get(deploy_env)
            .or_else(|| entry.map(|e| e.weight))
            .ok_or_else(|| TopologyError::MissingWeight {
                project: project.to_string(),
                deploy_env: deploy_env.clone(),
            })?;

        let meta = EnvMeta {
            env_type: env_type_of(deploy_env, entry.and_then(|e| e.env_type)),
            weight,
            cache: cache_sizing(weight, sizing),
            compute: compute_sizing(weight, sizing.compute_max),
            multi_region_token: match weight {
                Weight::Heavy => Some(token.to_string()),
                Weight::Light => None,
            },
            tag_deploy: deploy_env != DEV && deploy_env != STAGING,
        };

        tracing::debug!(
            "📇 {}/{}: {} ({:?}), compute {}..{}",
            project,
            deploy_env,
            meta.env_type,
            meta.weight,
            meta.compute.min,
            meta.compute.max
        );
        catalog.insert(deploy_env.clone(), meta);
    }

    Ok(catalog)
}
