//! 查重索引
//!
//! [`QuestionIndex`] 抽象持久化的题目索引：短语近似查找、写入、向量近邻和全量读取。
//! [`ElasticIndex`] 通过 Elasticsearch REST 接口实现。

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::http::{read_body, send_error};
use crate::config::Config;
use crate::error::{AppError, AppResult, IndexError};
use crate::models::StoredQuestion;
use crate::utils::phrase_matches;

/// 一次短语查找最多取回的候选数
const PHRASE_CANDIDATES: usize = 20;

/// 题目索引
#[async_trait]
pub trait QuestionIndex: Send + Sync {
    /// 日志中显示的索引位置
    fn describe(&self) -> String;

    /// 索引不存在时按向量维度创建
    async fn ensure_ready(&self, dimensions: usize) -> AppResult<()>;

    /// 查找比对文本与 `key` 近似匹配的已存题目，返回其题干
    async fn find_phrase_match(&self, key: &str, slop: u32) -> AppResult<Option<String>>;

    async fn insert(&self, question: &StoredQuestion) -> AppResult<()>;

    /// 按余弦相似度降序返回最多 `k` 道题，相似度相同时保持写入顺序
    async fn nearest(&self, vector: &[f32], k: usize) -> AppResult<Vec<StoredQuestion>>;

    /// 读取最多 `limit` 道已存题目
    async fn all(&self, limit: usize) -> AppResult<Vec<StoredQuestion>>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: StoredQuestion,
}

/// Elasticsearch 索引
pub struct ElasticIndex {
    client: reqwest::Client,
    base_url: String,
    index_name: String,
}

impl ElasticIndex {
    pub fn new(config: &Config, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: config.elasticsearch_url.trim_end_matches('/').to_string(),
            index_name: config.index_name.clone(),
        }
    }

    fn index_url(&self) -> String {
        format!("{}/{}", self.base_url, self.index_name)
    }

    /// 索引映射：题干全文 + 稠密向量
    pub fn index_mapping(dimensions: usize) -> Value {
        json!({
            "settings": {
                "index": {
                    "number_of_shards": 1,
                    "number_of_replicas": 0
                }
            },
            "mappings": {
                "properties": {
                    "question_data": { "type": "text" },
                    "options": { "type": "nested" },
                    "answer": { "type": "object" },
                    "manual_difficulty": { "type": "keyword" },
                    "tags": { "type": "keyword" },
                    "question_vector": {
                        "type": "dense_vector",
                        "dims": dimensions
                    }
                }
            }
        })
    }

    async fn search(&self, body: &Value) -> AppResult<Vec<StoredQuestion>> {
        let endpoint = format!("{}/_search", self.index_url());
        let response = self
            .client
            .post(&endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| send_error(&endpoint, e))?;
        let txt = read_body(&endpoint, response).await?;
        let parsed: SearchResponse = serde_json::from_str(&txt)?;
        Ok(parsed.hits.hits.into_iter().map(|h| h.source).collect())
    }
}

#[async_trait]
impl QuestionIndex for ElasticIndex {
    fn describe(&self) -> String {
        self.index_url()
    }

    async fn ensure_ready(&self, dimensions: usize) -> AppResult<()> {
        let endpoint = self.index_url();
        let response = self
            .client
            .head(&endpoint)
            .send()
            .await
            .map_err(|e| send_error(&endpoint, e))?;

        if response.status().is_success() {
            info!("索引已存在: {}", self.index_name);
            return Ok(());
        }
        if response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::api_bad_response(
                &endpoint,
                response.status().as_u16(),
                String::new(),
            ));
        }

        let response = self
            .client
            .put(&endpoint)
            .json(&Self::index_mapping(dimensions))
            .send()
            .await
            .map_err(|e| send_error(&endpoint, e))?;
        read_body(&endpoint, response).await?;
        info!("✓ 已创建索引: {} ({} 维向量)", self.index_name, dimensions);
        Ok(())
    }

    async fn find_phrase_match(&self, key: &str, slop: u32) -> AppResult<Option<String>> {
        // 先用全文检索取候选，再在本地做对称的短语比对
        let body = json!({
            "size": PHRASE_CANDIDATES,
            "query": {
                "bool": {
                    "should": [
                        { "match_phrase": { "question_data": { "query": key, "slop": slop } } },
                        { "match": { "question_data": key } }
                    ]
                }
            }
        });
        let candidates = self.search(&body).await?;
        debug!("短语查找候选: {} 条", candidates.len());

        Ok(candidates
            .into_iter()
            .map(|c| c.question.comparison_key())
            .find(|existing| phrase_matches(key, existing, slop)))
    }

    async fn insert(&self, question: &StoredQuestion) -> AppResult<()> {
        let endpoint = format!("{}/_doc?refresh=wait_for", self.index_url());
        let response = self
            .client
            .post(&endpoint)
            .json(question)
            .send()
            .await
            .map_err(|e| send_error(&endpoint, e))?;
        let txt = read_body(&endpoint, response).await?;
        let value: Value = serde_json::from_str(&txt)?;

        match value.get("result").and_then(Value::as_str) {
            Some("created") => Ok(()),
            other => Err(IndexError::InsertRejected {
                result: other.unwrap_or("<missing>").to_string(),
            }
            .into()),
        }
    }

    async fn nearest(&self, vector: &[f32], k: usize) -> AppResult<Vec<StoredQuestion>> {
        let body = json!({
            "size": k,
            "query": {
                "script_score": {
                    "query": { "match_all": {} },
                    "script": {
                        "source": "cosineSimilarity(params.query_vector, 'question_vector') + 1.0",
                        "params": { "query_vector": vector }
                    }
                }
            }
        });
        self.search(&body).await
    }

    async fn all(&self, limit: usize) -> AppResult<Vec<StoredQuestion>> {
        let body = json!({
            "size": limit,
            "query": { "match_all": {} }
        });
        self.search(&body).await
    }
}
