pub mod dedup_store;
pub mod generation_service;
pub mod prompts;
pub mod qc_checks;
pub mod qc_service;
pub mod reject_writer;
pub mod upload_service;

pub use dedup_store::{DedupOutcome, DuplicateStore};
pub use generation_service::{Difficulty, GenerationRequest, GenerationService, QuestionType};
pub use qc_checks::{deep_checks, verify_mcq_format};
pub use qc_service::{QcOutcome, QcService};
pub use reject_writer::RejectWriter;
pub use upload_service::{BankSummary, UploadService, UploadStats};
