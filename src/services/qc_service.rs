//! 质检服务 - 业务能力层
//!
//! 把题目按批发送给审阅模型，校验返回的题目数量和题号，汇总修订后的文本和报告。
//! 任何一批校验失败都会中止整个质检，不保留已完成批次的修订。

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, error, info};

use super::prompts::{build_qc_message, QC_REPORT_MARKER};
use super::qc_checks::{lint_report, verify_mcq_format};
use crate::clients::ChatModel;
use crate::config::Config;
use crate::error::{AppError, AppResult, FileError, QcError};
use crate::models::{load_text, save_text, QuestionBlock};
use crate::parsing::{join_blocks, split_questions};

/// 审阅报告中表示无问题的标记
pub const NO_ISSUES_SENTINEL: &str = "No issues found";

/// 质检结果
#[derive(Debug, Clone)]
pub struct QcOutcome {
    pub success: bool,
    /// 修订后的全文，仅成功时存在
    pub corrected: Option<String>,
    /// 成功时为质检报告，失败时为错误信息
    pub report: String,
}

impl QcOutcome {
    /// 报告中是否声明没有问题（仅用于展示）
    pub fn is_clean(&self) -> bool {
        self.success && self.report.contains(NO_ISSUES_SENTINEL)
    }

    fn failure(message: String) -> Self {
        Self {
            success: false,
            corrected: None,
            report: message,
        }
    }
}

/// 质检服务
///
/// 职责：
/// - 按批调用审阅模型
/// - 校验每批返回的题目数量和题号
/// - 不解析题目字段
pub struct QcService {
    reviewer: Arc<dyn ChatModel>,
    batch_size: usize,
}

impl QcService {
    pub fn new(reviewer: Arc<dyn ChatModel>, config: &Config) -> Self {
        Self {
            reviewer,
            batch_size: config.qc_batch_size.max(1),
        }
    }

    /// 审阅一批题目，返回该批修订后的题块和报告
    async fn review_batch(
        &self,
        batch_no: usize,
        blocks: &[QuestionBlock],
    ) -> AppResult<(Vec<QuestionBlock>, String)> {
        let ordinals: Vec<u32> = blocks.iter().map(|b| b.ordinal).collect();
        info!(
            "🔍 质检第 {} 批: {}",
            batch_no,
            ordinals
                .iter()
                .map(|n| format!("Q{}", n))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let prompt = build_qc_message(&ordinals, &join_blocks(blocks));
        let response = self.reviewer.complete(&prompt, None).await?;

        let (questions_part, report_part) = match response.split_once(QC_REPORT_MARKER) {
            Some((questions, report)) => (questions, Some(report.trim())),
            None => (response.as_str(), None),
        };

        let returned = split_questions(questions_part, None).blocks;
        if returned.len() != blocks.len() {
            error!("第 {} 批审阅结果:\n{}", batch_no, response);
            return Err(QcError::CountMismatch {
                batch: batch_no,
                expected: blocks.len(),
                actual: returned.len(),
            }
            .into());
        }

        for (got, expected) in returned.iter().zip(&ordinals) {
            if got.ordinal != *expected {
                return Err(QcError::OrdinalMismatch {
                    batch: batch_no,
                    expected: *expected,
                    actual: got.ordinal,
                }
                .into());
            }
        }

        let report = format!(
            "Batch {} Report:\n{}\n{}",
            batch_no,
            report_part
                .filter(|r| !r.is_empty())
                .unwrap_or("No QC report provided"),
            lint_report(&returned)
        );
        debug!("第 {} 批质检通过", batch_no);

        Ok((returned, report))
    }

    /// 审阅全文
    ///
    /// # 返回
    /// 返回 (修订后的全文, 质检报告)；任一批失败即整体失败
    pub async fn review(&self, raw_text: &str) -> AppResult<(String, String)> {
        let blocks = split_questions(raw_text, None).blocks;
        if blocks.is_empty() {
            return Err(QcError::FormatInvalid("没有找到 Q<N>. 题目".to_string()).into());
        }
        info!("找到 {} 道题，每批 {} 道", blocks.len(), self.batch_size);

        let mut corrected = Vec::with_capacity(blocks.len());
        let mut reports = Vec::new();

        for (idx, chunk) in blocks.chunks(self.batch_size).enumerate() {
            let (batch_blocks, report) = self.review_batch(idx + 1, chunk).await?;
            corrected.extend(batch_blocks);
            reports.push(report);
        }

        let report = format!("{}\n\n{}", "=".repeat(50), reports.join("\n\n"));
        Ok((join_blocks(&corrected), report))
    }

    async fn run(&self, input: &Path, output: &Path, log: &Path) -> anyhow::Result<(String, String)> {
        let original = load_text(input).await?;
        if original.trim().is_empty() {
            return Err(AppError::from(FileError::Empty {
                path: input.display().to_string(),
            })
            .into());
        }
        verify_mcq_format(&original).context("Input MCQs do not follow the required format")?;

        let (corrected, report) = self.review(&original).await?;
        verify_mcq_format(&corrected).context("Generated MCQs do not follow the required format")?;

        save_text(output, &corrected).await?;
        let log_content = format!(
            "QC Report Generated at {}\n{}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            report
        );
        save_text(log, &log_content).await?;

        Ok((corrected, report))
    }

    /// 对文件执行完整质检
    ///
    /// 只有全部批次通过且格式校验通过时才写出修订文本和报告；
    /// 失败时输入文件和输出文件都保持原样。
    pub async fn process_mcqs(&self, input: &Path, output: &Path, log: &Path) -> QcOutcome {
        info!("开始质检: {}", input.display());
        match self.run(input, output, log).await {
            Ok((corrected, report)) => {
                if report.contains(NO_ISSUES_SENTINEL) {
                    info!("✅ 质检完成，未发现问题");
                } else {
                    info!("✅ 质检完成，部分问题已修正，详见 {}", log.display());
                }
                QcOutcome {
                    success: true,
                    corrected: Some(corrected),
                    report,
                }
            }
            Err(e) => {
                let message = format!("Error in MCQ processing: {:#}", e);
                error!("❌ {}", message);
                QcOutcome::failure(message)
            }
        }
    }
}
