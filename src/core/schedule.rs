use crate::domain::model::{DatabaseServer, DeployEnv, EnvMeta, EnvType, PROD};
use serde::Serialize;
use std::collections::BTreeSet;

/// 分類對象：單一 deploy env 或共用的資料庫伺服器
#[derive(Debug, Clone, Copy)]
pub enum ScheduleTarget<'a> {
    DeployEnv { name: &'a str, meta: &'a EnvMeta },
    DatabaseServer(&'a DatabaseServer),
}

impl ScheduleTarget<'_> {
    fn is_prod(&self) -> bool {
        match self {
            ScheduleTarget::DeployEnv { name, .. } => *name == PROD,
            ScheduleTarget::DatabaseServer(server) => server.env_type == EnvType::Prod,
        }
    }

    fn env_type(&self) -> EnvType {
        match self {
            ScheduleTarget::DeployEnv { meta, .. } => meta.env_type,
            ScheduleTarget::DatabaseServer(server) => server.env_type,
        }
    }

    /// 伺服器情境下任一成員命中即成立
    fn is_member_of(&self, set: &BTreeSet<DeployEnv>) -> bool {
        match self {
            ScheduleTarget::DeployEnv { name, .. } => set.contains(*name),
            ScheduleTarget::DatabaseServer(server) => {
                server.members.iter().any(|member| set.contains(member))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    AlwaysOn,
    BusinessHoursWithWeekend,
    BusinessHours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleClass {
    pub is_24x7: bool,
    pub is_not_24x7: bool,
    pub is_weekend: bool,
    pub env_type: EnvType,
}

impl ScheduleClass {
    pub fn kind(&self) -> ScheduleKind {
        if self.is_24x7 {
            ScheduleKind::AlwaysOn
        } else if self.is_weekend {
            ScheduleKind::BusinessHoursWithWeekend
        } else {
            ScheduleKind::BusinessHours
        }
    }
}

pub fn classify(
    target: ScheduleTarget<'_>,
    set_24x7: Option<&BTreeSet<DeployEnv>>,
    set_weekend: Option<&BTreeSet<DeployEnv>>,
    disable_24x7: bool,
) -> ScheduleClass {
    let is_24x7 = if target.is_prod() {
        true
    } else if disable_24x7 {
        false
    } else {
        set_24x7.is_some_and(|set| target.is_member_of(set))
    };
    let is_not_24x7 = !is_24x7;
    let is_weekend = is_not_24x7 && set_weekend.is_some_and(|set| target.is_member_of(set));

    ScheduleClass {
        is_24x7,
        is_not_24x7,
        is_weekend,
        env_type: target.env_type(),
    }
}
