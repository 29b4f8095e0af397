//! 查重存储 - 业务能力层
//!
//! 对每道新题：先按比对文本做带间隔的短语查找，命中即视为重复；
//! 未命中则计算向量并写入索引，写入成功才算接收。
//! 索引或向量服务出错的题目计入 `skipped`，既不算接收也不算重复。

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clients::{Embedder, QuestionIndex};
use crate::error::{AppResult, IndexError};
use crate::models::{PersistedQuestion, QuestionRecord, StoredQuestion};
use crate::utils::truncate_text;

/// 全量读取的上限
pub const ALL_QUESTIONS_LIMIT: usize = 10_000;

/// 查重结果
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    /// 新写入索引的题目（与输入顺序一致）
    pub accepted: Vec<QuestionRecord>,
    pub duplicates: usize,
    /// 因索引或向量服务错误跳过的题目数
    pub skipped: usize,
}

enum Verdict {
    Accepted,
    Duplicate(String),
}

/// 查重存储
///
/// 职责：
/// - 判断单道题是否与已存题目重复
/// - 写入新题及其向量
/// - 提供按向量相似度检索的只读接口
pub struct DuplicateStore {
    index: Arc<dyn QuestionIndex>,
    embedder: Arc<dyn Embedder>,
    slop: u32,
    created_by: Option<String>,
}

impl DuplicateStore {
    pub fn new(index: Arc<dyn QuestionIndex>, embedder: Arc<dyn Embedder>, slop: u32) -> Self {
        Self {
            index,
            embedder,
            slop,
            created_by: None,
        }
    }

    /// 写入索引的题目附带创建者
    pub fn with_creator(mut self, created_by: Option<&str>) -> Self {
        self.created_by = created_by.map(str::to_string);
        self
    }

    /// 确认索引可用，不存在时创建
    pub async fn ensure_ready(&self) -> AppResult<()> {
        self.index.ensure_ready(self.embedder.dimensions()).await?;
        info!("✓ 查重索引就绪: {}", self.index.describe());
        Ok(())
    }

    async fn check_and_store(&self, record: &QuestionRecord) -> AppResult<Verdict> {
        let key = record.comparison_key();
        if crate::utils::tokenize(&key).is_empty() {
            return Err(IndexError::EmptyKey.into());
        }

        if let Some(existing) = self.index.find_phrase_match(&key, self.slop).await? {
            return Ok(Verdict::Duplicate(existing));
        }

        let vector = self.embedder.embed(&key).await?;
        let persisted = PersistedQuestion::from_record(record, self.created_by.as_deref());
        self.index
            .insert(&StoredQuestion::new(persisted, vector))
            .await?;
        Ok(Verdict::Accepted)
    }

    /// 逐题查重并写入新题
    ///
    /// 单道题的索引错误只记录日志并跳过，不会中断整批
    pub async fn add_unique(&self, records: Vec<QuestionRecord>) -> DedupOutcome {
        let mut outcome = DedupOutcome::default();
        let total = records.len();

        for (idx, record) in records.into_iter().enumerate() {
            let preview = truncate_text(&record.comparison_key(), 50);
            debug!("[题目 {}/{}] 查重: {}", idx + 1, total, preview);

            match self.check_and_store(&record).await {
                Ok(Verdict::Accepted) => {
                    info!("[题目 {}/{}] ✓ 新题已入库: {}", idx + 1, total, preview);
                    outcome.accepted.push(record);
                }
                Ok(Verdict::Duplicate(existing)) => {
                    info!("[题目 {}/{}] ⏭️  重复题已跳过: {}", idx + 1, total, preview);
                    debug!("已存在的题目: {}", truncate_text(&existing, 50));
                    outcome.duplicates += 1;
                }
                Err(e) => {
                    if e.is_unreachable() {
                        warn!("[题目 {}/{}] ⚠️  索引服务不可达，跳过: {}", idx + 1, total, e);
                    } else {
                        warn!("[题目 {}/{}] ⚠️  入库失败，跳过: {}", idx + 1, total, e);
                    }
                    outcome.skipped += 1;
                }
            }
        }

        outcome
    }

    /// 按向量相似度查找相近题目，最多 `k` 道
    pub async fn find_similar(&self, query: &str, k: usize) -> AppResult<Vec<StoredQuestion>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed(query).await?;
        self.index.nearest(&vector, k).await
    }

    /// 读取全部已存题目（最多 10000 道）
    pub async fn all_questions(&self) -> AppResult<Vec<StoredQuestion>> {
        self.index.all(ALL_QUESTIONS_LIMIT).await
    }
}
