// Domain layer: core models, request parameters, results and ports (interfaces).

pub mod model;
pub mod params;
pub mod ports;
pub mod report;
