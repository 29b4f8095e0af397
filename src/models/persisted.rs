use serde::{Deserialize, Serialize};

use crate::models::question::{comparison_key, EditorKind, QuestionRecord};

pub const QUESTION_TYPE_MCQ_SINGLE: &str = "mcq_single_correct";

/// 选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionEntry {
    pub text: String,
    #[serde(default)]
    pub media: String,
}

/// 答案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub args: Vec<String>,
    #[serde(default)]
    pub partial: Vec<String>,
}

/// 答案解析
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerExplanation {
    #[serde(default)]
    pub args: Vec<String>,
}

/// 写入输出文件、提交给题库的题目结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedQuestion {
    pub question_type: String,
    pub question_data: String,
    pub options: Vec<OptionEntry>,
    pub answer: Answer,
    pub subject_id: Option<String>,
    pub topic_id: Option<String>,
    pub sub_topic_id: Option<String>,
    pub blooms_taxonomy: Option<String>,
    pub course_outcome: Option<String>,
    pub program_outcome: Option<String>,
    #[serde(default)]
    pub hint: Vec<String>,
    #[serde(default)]
    pub answer_explanation: AnswerExplanation,
    pub manual_difficulty: String,
    pub question_editor_type: u8,
    #[serde(default)]
    pub linked_concepts: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub question_media: Vec<String>,
    #[serde(rename = "createdBy", skip_serializing_if = "Option::is_none", default)]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub qb_id: Option<String>,
}

impl PersistedQuestion {
    /// 从解析结果构造，创建者可选
    pub fn from_record(record: &QuestionRecord, created_by: Option<&str>) -> Self {
        Self {
            question_type: QUESTION_TYPE_MCQ_SINGLE.to_string(),
            question_data: record.question_body(),
            options: record
                .options
                .iter()
                .map(|text| OptionEntry {
                    text: text.clone(),
                    media: String::new(),
                })
                .collect(),
            answer: Answer {
                args: vec![record.correct_answer_text().to_string()],
                partial: Vec::new(),
            },
            subject_id: None,
            topic_id: None,
            sub_topic_id: None,
            blooms_taxonomy: None,
            course_outcome: None,
            program_outcome: None,
            hint: Vec::new(),
            answer_explanation: AnswerExplanation::default(),
            manual_difficulty: record.difficulty.clone(),
            question_editor_type: record.editor_kind().code(),
            linked_concepts: String::new(),
            tags: record.tags.clone(),
            question_media: Vec::new(),
            created_by: created_by.map(str::to_string),
            qb_id: None,
        }
    }

    pub fn editor_kind(&self) -> Option<EditorKind> {
        EditorKind::from_code(self.question_editor_type)
    }

    pub fn comparison_key(&self) -> String {
        comparison_key(&self.question_data)
    }
}

/// 查重索引中保存的题目：题目字段 + 向量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredQuestion {
    #[serde(flatten)]
    pub question: PersistedQuestion,
    pub question_vector: Vec<f32>,
}

impl StoredQuestion {
    pub fn new(question: PersistedQuestion, question_vector: Vec<f32>) -> Self {
        Self {
            question,
            question_vector,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::CodeSnippet;
    use serde_json::json;

    fn sample_record() -> QuestionRecord {
        let mut record = QuestionRecord::new(
            3,
            "What does this print?".to_string(),
            Some(CodeSnippet {
                language: "python".into(),
                code: "print(1 + 1)".into(),
            }),
            ["1", "2", "11", "Error"].map(String::from),
            1,
        )
        .unwrap();
        record.difficulty = "Medium".into();
        record.tags = vec!["python".into(), "arithmetic".into()];
        record
    }

    #[test]
    fn test_persisted_schema_fields() {
        let persisted = PersistedQuestion::from_record(&sample_record(), Some("creator-1"));
        let value = serde_json::to_value(&persisted).unwrap();

        assert_eq!(value["question_type"], "mcq_single_correct");
        assert_eq!(
            value["question_data"],
            "<p>What does this print?</p>\n$$$examlyprint(1 + 1)"
        );
        assert_eq!(value["options"].as_array().unwrap().len(), 4);
        assert_eq!(value["options"][0], json!({"text": "1", "media": ""}));
        assert_eq!(value["answer"], json!({"args": ["2"], "partial": []}));
        assert_eq!(value["manual_difficulty"], "Medium");
        assert_eq!(value["question_editor_type"], 3);
        assert_eq!(value["subject_id"], serde_json::Value::Null);
        assert_eq!(value["answer_explanation"], json!({"args": []}));
        assert_eq!(value["createdBy"], "creator-1");
        assert!(value.get("qb_id").is_none());
    }

    #[test]
    fn test_stored_question_flattens_vector() {
        let persisted = PersistedQuestion::from_record(&sample_record(), None);
        let stored = StoredQuestion::new(persisted.clone(), vec![0.5, 0.25]);
        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["question_vector"], json!([0.5, 0.25]));
        assert_eq!(value["question_data"], persisted.question_data);

        let back: StoredQuestion = serde_json::from_value(value).unwrap();
        assert_eq!(back, stored);
    }
}
