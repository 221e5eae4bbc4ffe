// Adapters layer: conversions between external formats and the domain model.

pub mod csv_io;
