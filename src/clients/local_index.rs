//! 本地 JSON 文件索引
//!
//! 不依赖外部服务的 [`QuestionIndex`] 实现：全部题目保存在内存中，每次写入后整体落盘。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::embedding_client::cosine_similarity;
use super::search_index::QuestionIndex;
use crate::error::{AppResult, IndexError};
use crate::models::StoredQuestion;
use crate::utils::phrase_matches;

pub struct LocalIndex {
    path: Option<PathBuf>,
    entries: Mutex<Vec<StoredQuestion>>,
}

fn storage_error(path: &Path, err: impl std::error::Error + Send + Sync + 'static) -> IndexError {
    IndexError::Storage {
        path: path.display().to_string(),
        source: Box::new(err),
    }
}

impl LocalIndex {
    /// 仅保存在内存中的索引
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// 打开（或新建）文件索引
    pub async fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| storage_error(&path, e))?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(storage_error(&path, e).into()),
        };
        info!("本地索引已加载: {} ({} 道题)", path.display(), entries.len());

        Ok(Self {
            path: Some(path),
            entries: Mutex::new(entries),
        })
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    async fn persist(&self, entries: &[StoredQuestion]) -> AppResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = serde_json::to_string(entries).map_err(|e| storage_error(path, e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| storage_error(path, e))?;
        Ok(())
    }
}

#[async_trait]
impl QuestionIndex for LocalIndex {
    fn describe(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => "<memory>".to_string(),
        }
    }

    async fn ensure_ready(&self, _dimensions: usize) -> AppResult<()> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| storage_error(path, e))?;
            }
        }
        Ok(())
    }

    async fn find_phrase_match(&self, key: &str, slop: u32) -> AppResult<Option<String>> {
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .map(|e| e.question.comparison_key())
            .find(|existing| phrase_matches(key, existing, slop)))
    }

    async fn insert(&self, question: &StoredQuestion) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        entries.push(question.clone());
        if let Err(e) = self.persist(&entries).await {
            entries.pop();
            return Err(e);
        }
        debug!("本地索引写入成功，共 {} 道题", entries.len());
        Ok(())
    }

    async fn nearest(&self, vector: &[f32], k: usize) -> AppResult<Vec<StoredQuestion>> {
        let entries = self.entries.lock().await;
        let mut scored: Vec<(f32, &StoredQuestion)> = entries
            .iter()
            .map(|e| (cosine_similarity(vector, &e.question_vector), e))
            .collect();
        // 稳定排序，相同分数保持写入顺序
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        Ok(scored.into_iter().take(k).map(|(_, e)| e.clone()).collect())
    }

    async fn all(&self, limit: usize) -> AppResult<Vec<StoredQuestion>> {
        let entries = self.entries.lock().await;
        Ok(entries.iter().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PersistedQuestion, QuestionRecord};

    fn stored(stem: &str, vector: Vec<f32>) -> StoredQuestion {
        let record = QuestionRecord::new(
            1,
            stem.to_string(),
            None,
            ["a", "b", "c", "d"].map(String::from),
            0,
        )
        .unwrap();
        StoredQuestion::new(PersistedQuestion::from_record(&record, None), vector)
    }

    #[tokio::test]
    async fn test_phrase_lookup() {
        let index = LocalIndex::in_memory();
        index
            .insert(&stored("What is a pointer in C?", vec![1.0, 0.0]))
            .await
            .unwrap();

        let hit = index
            .find_phrase_match("<p>What is a pointer in the C language?</p>", 3)
            .await
            .unwrap();
        assert_eq!(hit.as_deref(), Some("<p>What is a pointer in C?</p>"));

        let miss = index
            .find_phrase_match("<p>What is a closure in Rust?</p>", 3)
            .await
            .unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_nearest_ties_keep_insertion_order() {
        let index = LocalIndex::in_memory();
        index.insert(&stored("first", vec![1.0, 0.0])).await.unwrap();
        index.insert(&stored("second", vec![0.0, 1.0])).await.unwrap();
        index.insert(&stored("third", vec![1.0, 0.0])).await.unwrap();

        let result = index.nearest(&[1.0, 0.0], 3).await.unwrap();
        let keys: Vec<String> = result.iter().map(|s| s.question.comparison_key()).collect();
        assert_eq!(keys, vec!["<p>first</p>", "<p>third</p>", "<p>second</p>"]);

        assert_eq!(index.nearest(&[1.0, 0.0], 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_file_index_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let index = LocalIndex::open(&path).await.unwrap();
        index.ensure_ready(2).await.unwrap();
        assert!(index.is_empty().await);
        index.insert(&stored("persist me", vec![0.5, 0.5])).await.unwrap();

        let reopened = LocalIndex::open(&path).await.unwrap();
        assert_eq!(reopened.len().await, 1);
        assert_eq!(reopened.all(10).await.unwrap()[0].question_vector, vec![0.5, 0.5]);
    }
}
