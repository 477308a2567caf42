pub mod catalog;
pub mod database;
pub mod engine;
pub mod propagation;
pub mod schedule;

pub use crate::domain::model::{Catalog, DatabaseServer, EnvMeta, EnvType};
pub use crate::domain::ports::TopologySource;
pub use crate::utils::error::Result;
