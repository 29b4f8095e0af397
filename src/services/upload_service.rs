//! 上传服务 - 业务能力层
//!
//! 读取查重后的题目文件，逐题补全题库字段并提交。单题失败只计数，不中断。

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use crate::clients::BankApi;
use crate::error::AppResult;
use crate::models::{load_questions, PersistedQuestion};

/// 题库摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankSummary {
    pub qb_name: String,
    pub qb_id: String,
}

/// 上传统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadStats {
    pub success: usize,
    pub failed: usize,
}

/// 补全上传所需字段：题库 ID、创建者；空标签替换为 `[""]`
pub fn prepare_for_upload(
    mut question: PersistedQuestion,
    qb_id: &str,
    created_by: Option<&str>,
) -> PersistedQuestion {
    question.qb_id = Some(qb_id.to_string());
    if let Some(creator) = created_by.filter(|c| !c.trim().is_empty()) {
        question.created_by = Some(creator.to_string());
    }
    if question.tags.is_empty() {
        question.tags = vec![String::new()];
    }
    question
}

/// 从列表接口的返回中提取题库名称和 ID
pub fn parse_bank_list(value: &Value) -> Vec<BankSummary> {
    let Some(items) = value.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let name = item.get("name")?.as_str()?.to_string();
            let id = match item.get("id")? {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            Some(BankSummary {
                qb_name: name,
                qb_id: id,
            })
        })
        .collect()
}

/// 上传服务
pub struct UploadService {
    bank: Arc<dyn BankApi>,
}

impl UploadService {
    pub fn new(bank: Arc<dyn BankApi>) -> Self {
        Self { bank }
    }

    /// 查询题库列表（第一页）
    pub async fn list_banks(&self, search: Option<&str>) -> AppResult<Vec<BankSummary>> {
        let value = self.bank.list_banks(search, 1).await?;
        let banks = parse_bank_list(&value);
        info!("{} 题库: 找到 {} 个", self.bank.domain().name(), banks.len());
        Ok(banks)
    }

    /// 逐题上传
    pub async fn import_questions(
        &self,
        questions: Vec<PersistedQuestion>,
        qb_id: &str,
        created_by: Option<&str>,
    ) -> UploadStats {
        let mut stats = UploadStats::default();
        let total = questions.len();

        for (idx, question) in questions.into_iter().enumerate() {
            let question = prepare_for_upload(question, qb_id, created_by);
            match self.bank.create_question(&question).await {
                Ok(()) => {
                    stats.success += 1;
                    info!("[题目 {}/{}] ✓ 上传成功", idx + 1, total);
                }
                Err(e) => {
                    stats.failed += 1;
                    error!("[题目 {}/{}] ❌ 上传失败: {}", idx + 1, total, e);
                }
            }
        }

        stats
    }

    /// 读取题目文件并上传到指定题库
    pub async fn import_file(
        &self,
        input: &Path,
        qb_id: &str,
        created_by: Option<&str>,
    ) -> anyhow::Result<UploadStats> {
        let questions = load_questions(input).await?;
        info!(
            "开始上传 {} 道题目到 {} 题库 {}",
            questions.len(),
            self.bank.domain().name(),
            qb_id
        );
        Ok(self.import_questions(questions, qb_id, created_by).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::BankDomain;
    use crate::error::AppError;
    use crate::models::{save_questions, QuestionRecord};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// 记录提交内容，第 `fail_at` 次提交返回错误
    struct RecordingBank {
        posted: Mutex<Vec<PersistedQuestion>>,
        fail_at: Option<usize>,
    }

    #[async_trait]
    impl BankApi for RecordingBank {
        fn domain(&self) -> BankDomain {
            BankDomain::Neowise
        }

        async fn list_banks(&self, search: Option<&str>, _page: u32) -> AppResult<Value> {
            Ok(json!({
                "data": [
                    {"name": format!("Bank {}", search.unwrap_or("all")), "id": "qb-1"},
                    {"name": "Numeric", "id": 42},
                    {"id": "no-name"}
                ]
            }))
        }

        async fn create_question(&self, question: &PersistedQuestion) -> AppResult<()> {
            let mut posted = self.posted.lock().unwrap();
            posted.push(question.clone());
            if Some(posted.len()) == self.fail_at {
                return Err(AppError::api_bad_response("create", 500, "boom"));
            }
            Ok(())
        }
    }

    fn question(stem: &str) -> PersistedQuestion {
        let record = QuestionRecord::new(
            1,
            stem.to_string(),
            None,
            ["a", "b", "c", "d"].map(String::from),
            1,
        )
        .unwrap();
        PersistedQuestion::from_record(&record, None)
    }

    #[test]
    fn test_prepare_for_upload() {
        let prepared = prepare_for_upload(question("Q?"), "qb-9", Some("user-1"));
        assert_eq!(prepared.qb_id.as_deref(), Some("qb-9"));
        assert_eq!(prepared.created_by.as_deref(), Some("user-1"));
        assert_eq!(prepared.tags, vec![String::new()]);

        let value = serde_json::to_value(&prepared).unwrap();
        assert!(value.get("question_vector").is_none());
        assert_eq!(value["tags"], json!([""]));
    }

    #[tokio::test]
    async fn test_list_banks_parses_names() {
        let bank = Arc::new(RecordingBank {
            posted: Mutex::new(Vec::new()),
            fail_at: None,
        });
        let banks = UploadService::new(bank).list_banks(Some("java")).await.unwrap();
        assert_eq!(
            banks,
            vec![
                BankSummary {
                    qb_name: "Bank java".into(),
                    qb_id: "qb-1".into()
                },
                BankSummary {
                    qb_name: "Numeric".into(),
                    qb_id: "42".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_import_file_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unique_mcqs.json");
        save_questions(&path, &[question("One?"), question("Two?"), question("Three?")])
            .await
            .unwrap();

        let bank = Arc::new(RecordingBank {
            posted: Mutex::new(Vec::new()),
            fail_at: Some(2),
        });
        let service = UploadService::new(bank.clone());
        let stats = service.import_file(&path, "qb-1", Some("me")).await.unwrap();

        assert_eq!(stats, UploadStats { success: 2, failed: 1 });
        let posted = bank.posted.lock().unwrap();
        assert_eq!(posted.len(), 3);
        assert!(posted.iter().all(|q| q.qb_id.as_deref() == Some("qb-1")));
    }

    #[tokio::test]
    async fn test_import_strips_vector_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("with_vector.json");
        let mut value = serde_json::to_value(vec![question("Vec?")]).unwrap();
        value[0]["question_vector"] = json!([0.1, 0.2]);
        std::fs::write(&path, value.to_string()).unwrap();

        let bank = Arc::new(RecordingBank {
            posted: Mutex::new(Vec::new()),
            fail_at: None,
        });
        let stats = UploadService::new(bank.clone())
            .import_file(&path, "qb-2", None)
            .await
            .unwrap();
        assert_eq!(stats.success, 1);
        let body = serde_json::to_value(&bank.posted.lock().unwrap()[0]).unwrap();
        assert!(body.get("question_vector").is_none());
    }
}
