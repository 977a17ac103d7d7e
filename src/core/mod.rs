pub mod api_client;
pub mod cleaning;
pub mod etl;
pub mod selection;

pub use crate::app::pipelines::richart_pipeline::RichartPipeline;
pub use crate::domain::model::{ExtractedData, MergedRecord, TransformResult, UploadReport};
pub use crate::domain::ports::{MerchantApi, Pipeline, Storage};
pub use crate::utils::error::Result;
