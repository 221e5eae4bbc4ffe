pub mod aggregate;
pub mod analysis;
pub mod cleaning;
pub mod dates;
pub mod etl;
pub mod pipeline;
pub mod resample;
pub mod stats;

pub use crate::domain::model::{Dataset, Record, TransformResult, Value};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
