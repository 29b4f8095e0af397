//! 出题服务 - 业务能力层
//!
//! 只负责"调用 LLM 生成题目原文"能力，不解析、不查重

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use super::prompts::{build_generation_messages, PROBLEM_SOLVING_FILTERS};
use crate::clients::ChatModel;
use crate::config::Config;
use crate::error::{AppError, AppResult, LlmError};

/// 难度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(LlmError::InvalidRequest(format!("未知难度: {}", s)).into()),
        }
    }
}

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionType {
    Conceptual,
    Factual,
    ProblemSolving,
    ScenarioBased,
}

impl QuestionType {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Conceptual => "Conceptual",
            QuestionType::Factual => "Factual",
            QuestionType::ProblemSolving => "Problem-solving",
            QuestionType::ScenarioBased => "Scenario-based",
        }
    }
}

impl FromStr for QuestionType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "conceptual" => Ok(QuestionType::Conceptual),
            "factual" => Ok(QuestionType::Factual),
            "problem-solving" => Ok(QuestionType::ProblemSolving),
            "scenario-based" => Ok(QuestionType::ScenarioBased),
            _ => Err(LlmError::InvalidRequest(format!("未知题型: {}", s)).into()),
        }
    }
}

/// 出题请求
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub topic: String,
    pub num_questions: usize,
    pub difficulty: Difficulty,
    pub question_type: QuestionType,
    /// 解题类细分题型，只对 Problem-solving 生效
    pub filters: Vec<String>,
}

impl GenerationRequest {
    /// 从字符串参数构造并校验
    pub fn parse(
        topic: &str,
        num_questions: usize,
        difficulty: &str,
        question_type: &str,
        filters: Vec<String>,
    ) -> AppResult<Self> {
        let request = Self {
            topic: topic.trim().to_string(),
            num_questions,
            difficulty: difficulty.parse()?,
            question_type: question_type.parse()?,
            filters,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.topic.is_empty() {
            return Err(LlmError::InvalidRequest("主题不能为空".to_string()).into());
        }
        if self.num_questions == 0 {
            return Err(LlmError::InvalidRequest("题目数量必须大于 0".to_string()).into());
        }
        if let Some(unknown) = self
            .filters
            .iter()
            .find(|f| !PROBLEM_SOLVING_FILTERS.contains(&f.as_str()))
        {
            return Err(LlmError::InvalidRequest(format!("未知的细分题型: {}", unknown)).into());
        }
        Ok(())
    }
}

/// 出题服务
///
/// 职责：
/// - 构建出题提示词
/// - 调用 LLM，失败时按固定间隔重试
/// - 不解析返回文本
pub struct GenerationService {
    model: Arc<dyn ChatModel>,
    max_retries: usize,
    retry_delay: Duration,
}

impl GenerationService {
    pub fn new(model: Arc<dyn ChatModel>, config: &Config) -> Self {
        Self {
            model,
            max_retries: config.generation_max_retries.max(1),
            retry_delay: Duration::from_secs(config.generation_retry_delay_secs),
        }
    }

    /// 测试或特殊场景下覆盖重试参数
    pub fn with_retry(mut self, max_retries: usize, retry_delay: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// 生成题目原文
    ///
    /// # 返回
    /// 返回 LLM 的原始输出；所有尝试都失败时返回 `LlmError::RetriesExhausted`
    pub async fn generate(&self, request: &GenerationRequest) -> AppResult<String> {
        request.validate()?;

        let (user_message, system_message) = build_generation_messages(
            &request.topic,
            request.num_questions,
            request.difficulty,
            request.question_type,
            &request.filters,
        );

        info!(
            "📝 生成 {} 道 {} / {} 题目: {}",
            request.num_questions,
            request.question_type.as_str(),
            request.difficulty.as_str(),
            request.topic
        );

        let mut last_error = String::new();
        for attempt in 1..=self.max_retries {
            match self
                .model
                .complete(&user_message, Some(&system_message))
                .await
            {
                Ok(text) if !text.trim().is_empty() => {
                    info!("✓ 第 {} 次尝试成功，返回 {} 字符", attempt, text.len());
                    return Ok(text);
                }
                Ok(_) => {
                    last_error = "LLM 返回内容为空".to_string();
                    warn!("⚠️  第 {} 次尝试失败: {}", attempt, last_error);
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!("⚠️  第 {} 次尝试失败: {}", attempt, last_error);
                }
            }

            if attempt < self.max_retries {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        error!("❌ 出题失败，已尝试 {} 次", self.max_retries);
        Err(LlmError::RetriesExhausted {
            attempts: self.max_retries,
            last_error,
        }
        .into())
    }
}
