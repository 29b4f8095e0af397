//! 入库流程 - 流程层
//!
//! 核心职责：定义"一批原始题目文本"的完整处理流程
//!
//! 流程顺序：
//! 1. （可选）质检：先对原文整体审阅，失败则整个流程中止
//! 2. 切分：原文 → 题块，按期望数量截断
//! 3. 解析：题块 → 题目记录，失败的题写入拒绝日志
//! 4. 查重：逐题短语比对，新题计算向量入库
//! 5. 输出：接收的题目写入 JSON 文件

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::models::{load_text, save_questions, PersistedQuestion, Rejection};
use crate::parsing::{parse_blocks, split_questions};
use crate::services::{DuplicateStore, QcService, RejectWriter};
use crate::utils::logging::print_stats_banner;

/// 报告中展示的拒绝原因条数
const REJECT_SAMPLE: usize = 5;

/// 质检阶段：服务 + 修订文本和报告的输出位置
pub struct QcStage {
    pub service: QcService,
    pub output: PathBuf,
    pub log: PathBuf,
}

/// 入库统计
#[derive(Debug, Clone, Default)]
pub struct IngestionReport {
    pub blocks_found: usize,
    pub parsed: usize,
    pub accepted: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub rejects: Vec<Rejection>,
    pub qc_report: Option<String>,
}

impl IngestionReport {
    /// 前几条拒绝原因
    pub fn reject_sample(&self) -> Vec<String> {
        self.rejects
            .iter()
            .take(REJECT_SAMPLE)
            .map(ToString::to_string)
            .collect()
    }

    pub fn print_summary(&self) {
        print_stats_banner(
            "入库统计",
            &[
                ("找到题块", self.blocks_found),
                ("解析成功", self.parsed),
                ("解析拒绝", self.rejects.len()),
                ("新题入库", self.accepted),
                ("重复跳过", self.duplicates),
                ("索引错误跳过", self.skipped),
            ],
        );
        for line in self.reject_sample() {
            warn!("  ⚠️  {}", line);
        }
        if self.rejects.len() > REJECT_SAMPLE {
            warn!("  ... 另有 {} 条拒绝记录", self.rejects.len() - REJECT_SAMPLE);
        }
    }
}

/// 入库流程
///
/// - 编排切分 → 解析 → 查重 → 输出
/// - 不持有外部连接，只依赖业务能力（services）
pub struct IngestionPipeline {
    store: DuplicateStore,
    rejects: RejectWriter,
    qc: Option<QcStage>,
    created_by: Option<String>,
}

impl IngestionPipeline {
    pub fn new(store: DuplicateStore, rejects: RejectWriter) -> Self {
        Self {
            store,
            rejects,
            qc: None,
            created_by: None,
        }
    }

    /// 在解析前加入质检阶段
    pub fn with_qc(mut self, qc: QcStage) -> Self {
        self.qc = Some(qc);
        self
    }

    /// 输出文件中的题目附带创建者
    pub fn with_creator(mut self, created_by: Option<&str>) -> Self {
        self.created_by = created_by.map(str::to_string);
        self
    }

    pub fn store(&self) -> &DuplicateStore {
        &self.store
    }

    /// 处理文件：有质检阶段时先质检，再处理修订后的文本
    pub async fn run_file(
        &self,
        input: &Path,
        expected: Option<usize>,
        output: &Path,
    ) -> Result<IngestionReport> {
        let (text, qc_report) = match &self.qc {
            Some(stage) => {
                info!("🔍 质检阶段: {}", input.display());
                let outcome = stage
                    .service
                    .process_mcqs(input, &stage.output, &stage.log)
                    .await;
                match outcome.corrected {
                    Some(corrected) if outcome.success => (corrected, Some(outcome.report)),
                    _ => anyhow::bail!("质检失败，入库中止: {}", outcome.report),
                }
            }
            None => (load_text(input).await?, None),
        };

        let mut report = self.run_text(&text, expected, output).await?;
        report.qc_report = qc_report;
        Ok(report)
    }

    /// 处理原始文本
    pub async fn run_text(
        &self,
        raw_text: &str,
        expected: Option<usize>,
        output: &Path,
    ) -> Result<IngestionReport> {
        let split = split_questions(raw_text, expected);
        info!("✓ 切分完成: 找到 {} 个题块", split.found);

        let parsed = parse_blocks(&split.blocks);
        info!(
            "✓ 解析完成: 成功 {}，拒绝 {}",
            parsed.records.len(),
            parsed.rejections.len()
        );
        if let Err(e) = self.rejects.write_all(&parsed.rejections).await {
            warn!("⚠️  拒绝日志写入失败: {:#}", e);
        }

        let parsed_count = parsed.records.len();
        let outcome = self.store.add_unique(parsed.records).await;

        let questions: Vec<PersistedQuestion> = outcome
            .accepted
            .iter()
            .map(|r| PersistedQuestion::from_record(r, self.created_by.as_deref()))
            .collect();
        save_questions(output, &questions)
            .await
            .with_context(|| format!("无法写出入库结果: {}", output.display()))?;

        Ok(IngestionReport {
            blocks_found: split.found,
            parsed: parsed_count,
            accepted: outcome.accepted.len(),
            duplicates: outcome.duplicates,
            skipped: outcome.skipped,
            rejects: parsed.rejections,
            qc_report: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{HashingEmbedder, LocalIndex};
    use crate::models::load_questions;
    use std::sync::Arc;

    fn pipeline(dir: &Path) -> IngestionPipeline {
        let store = DuplicateStore::new(
            Arc::new(LocalIndex::in_memory()),
            Arc::new(HashingEmbedder::new(384)),
            3,
        );
        IngestionPipeline::new(store, RejectWriter::with_path(dir.join("rejects.txt")))
    }

    const RAW: &str = "Sure! Here are the questions.\n\n\
Q1. What keyword defines a function in Rust?\n1) fn\n2) def\n3) func\n4) function\nCorrect answer: 1\nDifficulty: Easy\nTags: rust, syntax\n---\n\
Q2. What is X?\n1) a\n2) b\n3) c\nCorrect answer: 2\n---\n\
Q3. What keyword defines a function in Rust language?\n1) fn\n2) def\n3) func\n4) function\nCorrect answer: 1\n---\n\
Q4. Which macro prints a line to stdout?\n1) print!\n2) println!\n3) write!\n4) format!\nCorrect answer: 2\nDifficulty: Medium\n---\n";

    #[tokio::test]
    async fn test_full_run_counts() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("unique_mcqs.json");
        let pipeline = pipeline(dir.path()).with_creator(Some("u-1"));

        let report = pipeline.run_text(RAW, Some(4), &output).await.unwrap();
        assert_eq!(report.blocks_found, 4);
        assert_eq!(report.parsed, 3);
        assert_eq!(report.rejects.len(), 1);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.skipped, 0);
        assert!(report.reject_sample()[0].contains("Question 2: Found 3 options instead of 4"));

        let written = load_questions(&output).await.unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[1].answer.args, vec!["println!"]);
        assert_eq!(written[0].created_by.as_deref(), Some("u-1"));

        let rejects = std::fs::read_to_string(dir.path().join("rejects.txt")).unwrap();
        assert!(rejects.contains("题目 2"));
    }

    #[tokio::test]
    async fn test_run_file_without_qc() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("question_prompt.txt");
        std::fs::write(&input, RAW).unwrap();
        let output = dir.path().join("out.json");

        let report = pipeline(dir.path())
            .run_file(&input, Some(2), &output)
            .await
            .unwrap();
        assert_eq!(report.blocks_found, 4);
        assert_eq!(report.parsed, 1);
        assert_eq!(report.accepted, 1);
        assert!(report.qc_report.is_none());
    }
}
