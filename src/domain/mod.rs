// Domain layer: record models and the ports every pipeline stage is written against.

pub mod model;
pub mod ports;
