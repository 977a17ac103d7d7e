pub mod richart_pipeline;
