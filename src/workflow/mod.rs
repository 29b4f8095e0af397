pub mod ingestion;

pub use ingestion::{IngestionPipeline, IngestionReport, QcStage};
