use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

use mcq_forge::clients::{BankApi, BankDomain, ChatModel, HashingEmbedder, LocalIndex};
use mcq_forge::models::{load_questions, PersistedQuestion};
use mcq_forge::services::{
    DuplicateStore, GenerationRequest, GenerationService, QcService, RejectWriter, UploadService,
};
use mcq_forge::workflow::{IngestionPipeline, QcStage};
use mcq_forge::{AppResult, Config};

const BATCH: &str = "Here are 2 questions on Rust.\n\n\
Q1. Which keyword declares an immutable binding in Rust?\n\
1) let\n2) mut\n3) var\n4) const\n\
Correct answer: 1\nDifficulty: Easy\nSubject: Programming\nTopic: Rust\nSub-topic: Bindings\nTags: rust, variables\n---\n\n\
Q2. Which macro prints a line to standard output in Rust?\n\
1) print!\n2) println!\n3) format!\n4) write!\n\
Correct answer: 2\nDifficulty: Easy\nSubject: Programming\nTopic: Rust\nSub-topic: Macros\nTags: rust, io\n---\n";

/// 固定返回一段文本的模型
struct CannedModel {
    reply: String,
}

#[async_trait]
impl ChatModel for CannedModel {
    fn model_name(&self) -> &str {
        "canned"
    }

    async fn complete(&self, _user: &str, _system: Option<&str>) -> AppResult<String> {
        Ok(self.reply.clone())
    }
}

fn canned(reply: impl Into<String>) -> Arc<dyn ChatModel> {
    Arc::new(CannedModel {
        reply: reply.into(),
    })
}

fn store(index: Arc<LocalIndex>) -> DuplicateStore {
    DuplicateStore::new(index, Arc::new(HashingEmbedder::new(64)), 3)
}

fn pipeline(dir: &Path, index: Arc<LocalIndex>) -> IngestionPipeline {
    IngestionPipeline::new(store(index), RejectWriter::with_path(dir.join("rejects.txt")))
}

#[tokio::test]
async fn test_generate_then_ingest() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();

    let service =
        GenerationService::new(canned(BATCH), &config).with_retry(1, Duration::from_millis(0));
    let request = GenerationRequest::parse("Rust basics", 2, "easy", "conceptual", Vec::new()).unwrap();
    let raw = assert_ok!(service.generate(&request).await);

    let output = dir.path().join("unique_mcqs.json");
    let pipeline = pipeline(dir.path(), Arc::new(LocalIndex::in_memory())).with_creator(Some("u-1"));
    let report = assert_ok!(pipeline.run_text(&raw, Some(2), &output).await);

    assert_eq!(report.blocks_found, 2);
    assert_eq!(report.parsed, 2);
    assert_eq!(report.accepted, 2);
    assert_eq!(report.duplicates, 0);
    assert!(report.rejects.is_empty());

    let written = load_questions(&output).await.unwrap();
    assert_eq!(written.len(), 2);
    assert_eq!(written[0].answer.args, vec!["let".to_string()]);
    assert_eq!(written[1].manual_difficulty, "Easy");
    assert_eq!(written[1].created_by.as_deref(), Some("u-1"));
}

#[tokio::test]
async fn test_local_index_persists_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let index_path = dir.path().join("index.json");
    let output = dir.path().join("out.json");

    let first = Arc::new(LocalIndex::open(&index_path).await.unwrap());
    let report = pipeline(dir.path(), first)
        .run_text(BATCH, None, &output)
        .await
        .unwrap();
    assert_eq!(report.accepted, 2);

    let reopened = Arc::new(LocalIndex::open(&index_path).await.unwrap());
    assert_eq!(reopened.len().await, 2);
    let report = pipeline(dir.path(), reopened)
        .run_text(BATCH, None, &output)
        .await
        .unwrap();
    assert_eq!(report.accepted, 0);
    assert_eq!(report.duplicates, 2);
    assert!(load_questions(&output).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_ingest_with_qc_uses_corrected_text() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("question_prompt.txt");
    tokio::fs::write(&input, BATCH).await.unwrap();

    let corrected = BATCH.replace("standard output", "stdout");
    let reply = format!("{}\n=== QC REPORT ===\nNo issues found", corrected);
    let qc = QcStage {
        service: QcService::new(canned(reply), &Config::default()),
        output: dir.path().join("qced_mcq.txt"),
        log: dir.path().join("qc_logs.txt"),
    };

    let output = dir.path().join("unique_mcqs.json");
    let report = pipeline(dir.path(), Arc::new(LocalIndex::in_memory()))
        .with_qc(qc)
        .run_file(&input, None, &output)
        .await
        .unwrap();

    assert_eq!(report.accepted, 2);
    assert!(report.qc_report.unwrap().contains("No issues found"));

    let written = load_questions(&output).await.unwrap();
    assert!(written[1].question_data.contains("stdout"));
    let log = tokio::fs::read_to_string(dir.path().join("qc_logs.txt"))
        .await
        .unwrap();
    assert!(log.starts_with("QC Report Generated at"));
}

#[tokio::test]
async fn test_failed_qc_aborts_ingestion() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("question_prompt.txt");
    tokio::fs::write(&input, BATCH).await.unwrap();

    // 审阅结果少了一道题
    let reply = BATCH.split("---").next().unwrap().to_string();
    let qc = QcStage {
        service: QcService::new(canned(reply), &Config::default()),
        output: dir.path().join("qced_mcq.txt"),
        log: dir.path().join("qc_logs.txt"),
    };

    let output = dir.path().join("unique_mcqs.json");
    let result = pipeline(dir.path(), Arc::new(LocalIndex::in_memory()))
        .with_qc(qc)
        .run_file(&input, None, &output)
        .await;

    let err = assert_err!(result);
    assert!(format!("{:#}", err).contains("质检失败"));
    assert!(!output.exists());
    assert!(!dir.path().join("qced_mcq.txt").exists());
    assert_eq!(tokio::fs::read_to_string(&input).await.unwrap(), BATCH);
}

/// 记录上传内容的假题库
#[derive(Default)]
struct RecordingBank {
    created: Mutex<Vec<PersistedQuestion>>,
}

#[async_trait]
impl BankApi for RecordingBank {
    fn domain(&self) -> BankDomain {
        BankDomain::Neowise
    }

    async fn list_banks(&self, _search: Option<&str>, _page: u32) -> AppResult<Value> {
        Ok(json!({"data": [{"name": "Rust Basics", "id": 42}]}))
    }

    async fn create_question(&self, question: &PersistedQuestion) -> AppResult<()> {
        self.created.lock().unwrap().push(question.clone());
        Ok(())
    }
}

#[tokio::test]
async fn test_ingest_then_import() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("unique_mcqs.json");
    pipeline(dir.path(), Arc::new(LocalIndex::in_memory()))
        .run_text(BATCH, None, &output)
        .await
        .unwrap();

    let bank = Arc::new(RecordingBank::default());
    let uploads = UploadService::new(bank.clone());

    let banks = uploads.list_banks(Some("rust")).await.unwrap();
    assert_eq!(banks[0].qb_id, "42");

    let stats = uploads
        .import_file(&output, &banks[0].qb_id, Some("creator-9"))
        .await
        .unwrap();
    assert_eq!(stats.success, 2);
    assert_eq!(stats.failed, 0);

    let created = bank.created.lock().unwrap();
    assert!(created
        .iter()
        .all(|q| q.qb_id.as_deref() == Some("42") && q.created_by.as_deref() == Some("creator-9")));
}
