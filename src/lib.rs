//! # MCQ Forge
//!
//! 用 LLM 批量生成选择题，解析、查重、质检后上传到题库
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 外部服务层（Clients）
//! - `clients/` - 持有 HTTP 客户端和外部连接，只暴露能力
//! - `LlmClient` - 对话补全（出题 / 质检）
//! - `Embedder` - 文本向量（HTTP 服务或本地哈希）
//! - `QuestionIndex` - 查重索引（Elasticsearch 或本地 JSON 文件）
//! - `BankClient` - 题库平台接口
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `GenerationService` - 出题与重试
//! - `QcService` - 分批质检与格式校验
//! - `DuplicateStore` - 短语匹配 + 向量的查重入库
//! - `UploadService` - 题库查询与上传
//! - `RejectWriter` - 写 rejects.txt
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一批题"的完整处理流程
//! - `IngestionPipeline` - 质检 → 切分 → 解析 → 查重 → 输出
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 按配置构建资源并调度各个命令
//!
//! 文本解析（`parsing/`）与数据模型（`models/`）被各层共享。

pub mod clients;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod parsing;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{PersistedQuestion, QuestionRecord, StoredQuestion};
pub use orchestrator::App;
pub use parsing::{parse_blocks, split_questions};
pub use workflow::{IngestionPipeline, IngestionReport};
