// Domain layer: topology models and the source port. No logic beyond small accessors.

pub mod model;
pub mod ports;
