//! 应用编排 - 编排层
//!
//! ## 职责
//!
//! 1. **资源构建**：根据配置创建 HTTP 客户端、LLM、向量服务、索引
//! 2. **命令调度**：出题、入库、质检、题库查询、上传、相似题检索
//! 3. **统计输出**：每个命令结束时打印统计横幅
//!
//! 只做调度和统计，不做具体业务判断

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::clients::{
    build_http_client, BankClient, BankDomain, ChatModel, ElasticIndex, Embedder,
    HashingEmbedder, HttpEmbedder, LlmClient, LocalIndex, QuestionIndex,
};
use crate::config::Config;
use crate::error::{AppResult, ConfigError};
use crate::models::{save_text, StoredQuestion};
use crate::services::{
    BankSummary, DuplicateStore, GenerationRequest, GenerationService, QcOutcome, QcService,
    RejectWriter, UploadService, UploadStats,
};
use crate::utils::logging::{init_log_file, log_stage, print_stats_banner};
use crate::utils::truncate_text;
use crate::workflow::{IngestionPipeline, IngestionReport, QcStage};

/// 按配置创建向量服务
pub fn build_embedder(config: &Config, http: reqwest::Client) -> AppResult<Arc<dyn Embedder>> {
    match config.embedding_backend.as_str() {
        "http" => Ok(Arc::new(HttpEmbedder::new(config, http))),
        "hashing" => Ok(Arc::new(HashingEmbedder::new(config.embedding_dimensions))),
        other => Err(ConfigError::InvalidValue {
            name: "EMBEDDING_BACKEND".to_string(),
            value: other.to_string(),
        }
        .into()),
    }
}

/// 按配置创建查重索引
pub async fn build_index(
    config: &Config,
    http: reqwest::Client,
) -> AppResult<Arc<dyn QuestionIndex>> {
    match config.index_backend.as_str() {
        "elasticsearch" => Ok(Arc::new(ElasticIndex::new(config, http))),
        "local" => Ok(Arc::new(LocalIndex::open(&config.local_index_path).await?)),
        other => Err(ConfigError::InvalidValue {
            name: "INDEX_BACKEND".to_string(),
            value: other.to_string(),
        }
        .into()),
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    http: reqwest::Client,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file, "mcq-forge 运行日志")?;
        let http = build_http_client(&config)?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn chat_model(&self, model_name: &str) -> Arc<dyn ChatModel> {
        Arc::new(LlmClient::with_model(&self.config, model_name))
    }

    async fn duplicate_store(&self) -> Result<DuplicateStore> {
        let embedder = build_embedder(&self.config, self.http.clone())?;
        let index = build_index(&self.config, self.http.clone()).await?;
        let store = DuplicateStore::new(index, embedder, self.config.phrase_slop)
            .with_creator(self.config.creator());
        // 索引不可达时继续执行，逐题查重时计入跳过
        if let Err(e) = store.ensure_ready().await {
            warn!("⚠️  查重索引不可用，本批题目将全部跳过: {}", e);
        }
        Ok(store)
    }

    fn qc_service(&self) -> QcService {
        let reviewer = Arc::new(
            LlmClient::with_model(&self.config, self.config.qc_model_name.clone())
                .with_temperature(0.0),
        );
        QcService::new(reviewer, &self.config)
    }

    /// 出题，原文写入 `raw_output_file`
    pub async fn generate(&self, request: &GenerationRequest) -> Result<PathBuf> {
        let service = GenerationService::new(self.chat_model(&self.config.llm_model_name), &self.config);
        let text = service.generate(request).await?;

        let path = PathBuf::from(&self.config.raw_output_file);
        save_text(&path, &text).await?;
        info!("✓ 题目原文已保存: {}", path.display());
        Ok(path)
    }

    /// 出题后直接入库
    pub async fn generate_and_ingest(
        &self,
        request: &GenerationRequest,
        with_qc: bool,
    ) -> Result<IngestionReport> {
        log_stage(1, 2, "出题");
        let raw_path = self.generate(request).await?;
        log_stage(2, 2, "入库");
        self.ingest(&raw_path, Some(request.num_questions), with_qc, None)
            .await
    }

    /// 入库：质检（可选）→ 切分 → 解析 → 查重 → 输出
    pub async fn ingest(
        &self,
        input: &Path,
        expected: Option<usize>,
        with_qc: bool,
        output: Option<&Path>,
    ) -> Result<IngestionReport> {
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&self.config.unique_output_file));

        let mut pipeline = IngestionPipeline::new(
            self.duplicate_store().await?,
            RejectWriter::with_path(&self.config.reject_log_file),
        )
        .with_creator(self.config.creator());
        if with_qc {
            pipeline = pipeline.with_qc(QcStage {
                service: self.qc_service(),
                output: PathBuf::from(&self.config.qc_output_file),
                log: PathBuf::from(&self.config.qc_log_file),
            });
        }

        let report = pipeline.run_file(input, expected, &output).await?;
        report.print_summary();
        info!("✓ 入库结果已写入: {}", output.display());
        Ok(report)
    }

    /// 单独执行质检
    pub async fn qc(&self, input: &Path) -> QcOutcome {
        let outcome = self
            .qc_service()
            .process_mcqs(
                input,
                Path::new(&self.config.qc_output_file),
                Path::new(&self.config.qc_log_file),
            )
            .await;
        if outcome.success && !outcome.is_clean() {
            info!("质检报告:\n{}", outcome.report);
        }
        outcome
    }

    fn upload_service(&self, domain: BankDomain, token: &str) -> Result<UploadService> {
        let client = BankClient::new(&self.config, self.http.clone(), domain, token)?;
        Ok(UploadService::new(Arc::new(client)))
    }

    /// 查询题库列表
    pub async fn banks(
        &self,
        domain: BankDomain,
        token: &str,
        search: Option<&str>,
    ) -> Result<Vec<BankSummary>> {
        let banks = self.upload_service(domain, token)?.list_banks(search).await?;
        for bank in &banks {
            info!("  {} ({})", bank.qb_name, bank.qb_id);
        }
        Ok(banks)
    }

    /// 上传题目文件到题库
    pub async fn import(
        &self,
        domain: BankDomain,
        token: &str,
        qb_id: &str,
        input: Option<&Path>,
    ) -> Result<UploadStats> {
        let input = input
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&self.config.unique_output_file));
        let stats = self
            .upload_service(domain, token)?
            .import_file(&input, qb_id, self.config.creator())
            .await?;

        print_stats_banner(
            "上传统计",
            &[("上传成功", stats.success), ("上传失败", stats.failed)],
        );
        if stats.failed > 0 {
            warn!("⚠️  {} 道题上传失败，详见日志", stats.failed);
        }
        Ok(stats)
    }

    /// 相似题检索
    pub async fn similar(&self, query: &str, k: usize) -> Result<Vec<StoredQuestion>> {
        let store = self.duplicate_store().await?;
        let results = store.find_similar(query, k).await?;
        for (idx, item) in results.iter().enumerate() {
            info!(
                "  {}. {}",
                idx + 1,
                truncate_text(&item.question.comparison_key(), 80)
            );
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_backends_are_config_errors() {
        let config = Config {
            embedding_backend: "magic".to_string(),
            ..Config::default()
        };
        let err = build_embedder(&config, reqwest::Client::new()).err().unwrap();
        assert!(err.to_string().contains("EMBEDDING_BACKEND"));
    }

    #[tokio::test]
    async fn test_local_backends_build() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            embedding_backend: "hashing".to_string(),
            index_backend: "local".to_string(),
            local_index_path: dir.path().join("idx.json").display().to_string(),
            ..Config::default()
        };
        let embedder = build_embedder(&config, reqwest::Client::new()).unwrap();
        assert_eq!(embedder.dimensions(), 384);
        let index = build_index(&config, reqwest::Client::new()).await.unwrap();
        assert!(index.describe().ends_with("idx.json"));

        let bad = Config {
            index_backend: "sqlite".to_string(),
            ..Config::default()
        };
        assert!(build_index(&bad, reqwest::Client::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_ingest_continues_when_index_is_down() {
        let dir = tempfile::tempdir().unwrap();
        let path = |name: &str| dir.path().join(name).display().to_string();
        let config = Config {
            output_log_file: path("output.txt"),
            reject_log_file: path("rejects.txt"),
            embedding_backend: "hashing".to_string(),
            index_backend: "elasticsearch".to_string(),
            elasticsearch_url: "http://127.0.0.1:9".to_string(),
            http_connect_timeout_secs: 1,
            http_timeout_secs: 2,
            ..Config::default()
        };

        let input = dir.path().join("question_prompt.txt");
        std::fs::write(
            &input,
            "Q1. Which keyword declares a constant in Rust?\n1) let\n2) const\n3) var\n4) static\n\
Correct answer: 2\n---\n\
Q2. What is X?\n1) a\n2) b\n3) c\nCorrect answer: 2\n---\n",
        )
        .unwrap();
        let output = dir.path().join("unique_mcqs.json");

        let app = App::initialize(config).unwrap();
        let report = app.ingest(&input, None, false, Some(&output)).await.unwrap();

        assert_eq!(report.parsed, 1);
        assert_eq!(report.skipped, report.parsed);
        assert_eq!(report.accepted, 0);
        assert_eq!(report.rejects.len(), 1);

        let rejects = std::fs::read_to_string(dir.path().join("rejects.txt")).unwrap();
        assert!(rejects.contains("Found 3 options instead of 4"));
        let written = crate::models::load_questions(&output).await.unwrap();
        assert!(written.is_empty());
    }
}
