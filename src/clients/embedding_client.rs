//! 向量服务客户端
//!
//! - [`HttpEmbedder`]: OpenAI 风格的 `/embeddings` 端点（如部署 all-MiniLM-L6-v2 的推理服务）
//! - [`HashingEmbedder`]: 本地特征哈希，离线运行和测试使用

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http::{read_body, send_error};
use crate::config::Config;
use crate::error::{AppError, AppResult, ApiError, IndexError};
use crate::utils::tokenize;

/// 文本向量化
#[async_trait]
pub trait Embedder: Send + Sync {
    /// 向量维度
    fn dimensions(&self) -> usize;

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;
}

/// 余弦相似度；任一向量为零向量时返回 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0f32;
    let mut na = 0f32;
    let mut nb = 0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na.sqrt() * nb.sqrt())
    }
}

fn check_dimensions(expected: usize, vector: &[f32]) -> AppResult<()> {
    if vector.len() != expected {
        return Err(IndexError::DimensionMismatch {
            expected,
            actual: vector.len(),
        }
        .into());
    }
    Ok(())
}

/// HTTP 向量服务
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model_name: String,
    dimensions: usize,
}

impl HttpEmbedder {
    pub fn new(config: &Config, client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}/embeddings",
                config.embedding_api_base_url.trim_end_matches('/')
            ),
            api_key: config.embedding_api_key.clone(),
            model_name: config.embedding_model_name.clone(),
            dimensions: config.embedding_dimensions,
        }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        #[derive(Serialize)]
        struct EmbReq<'a> {
            model: &'a str,
            input: [&'a str; 1],
        }
        #[derive(Deserialize)]
        struct EmbData {
            embedding: Vec<f32>,
        }
        #[derive(Deserialize)]
        struct EmbResp {
            data: Vec<EmbData>,
        }

        let body = EmbReq {
            model: &self.model_name,
            input: [text],
        };
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| send_error(&self.endpoint, e))?;
        let txt = read_body(&self.endpoint, response).await?;

        let parsed: EmbResp = serde_json::from_str(&txt)?;
        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                AppError::Api(ApiError::EmptyResponse {
                    endpoint: self.endpoint.clone(),
                })
            })?;
        check_dimensions(self.dimensions, &vector)?;

        debug!("向量化完成: {} 维", vector.len());
        Ok(vector)
    }
}

/// 特征哈希向量
///
/// 每个词（以及相邻词对）经 FNV-1a 哈希映射到一个桶，符号由哈希高位决定，最后做 L2 归一化。
/// 词面相近的文本得到相近的向量，不需要外部服务。
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn fnv1a(bytes: &[u8]) -> u64 {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in bytes {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        hash
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = Self::fnv1a(feature.as_bytes());
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let tokens = tokenize(text);
        let mut vector = vec![0f32; self.dimensions];
        for token in &tokens {
            self.add_feature(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.add_feature(&mut vector, &format!("{} {}", pair[0], pair[1]), 0.5);
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        Ok(self.embed_text(text))
    }
}
