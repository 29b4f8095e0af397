//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (命令调度、资源构建)
//!     ↓
//! workflow::IngestionPipeline (一批题目的入库流程)
//!     ↓
//! services (能力层：generation / qc / dedup / upload / reject)
//!     ↓
//! clients (外部服务：LLM / 向量 / 索引 / 题库)
//! ```

pub mod app;

pub use app::{build_embedder, build_index, App};
