pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::PlanOutput, CliConfig, OutputFormat};

pub use config::topology_config::TopologyConfig;
pub use core::engine::{ResolvedTopology, TopologyEngine};
pub use core::schedule::{classify, ScheduleClass, ScheduleKind, ScheduleTarget};
pub use utils::error::{OverrideSet, Result, TopologyError};
