use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 题干与代码段之间的固定分隔标记
pub const CODE_SEPARATOR: &str = "$$$examly";

/// 每道题固定的选项数量
pub const OPTION_COUNT: usize = 4;

/// 默认难度
pub const DEFAULT_DIFFICULTY: &str = "Easy";

/// 原始文本中的一道题
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBlock {
    /// `Q<N>.` 中的题号
    pub ordinal: u32,
    /// 原始文本（已去掉首尾空白）
    pub text: String,
}

/// 题目展示方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditorKind {
    /// 纯文本
    TextOnly,
    /// 含代码
    WithCode,
}

impl EditorKind {
    /// 题库接口使用的编辑器类型编号
    pub fn code(self) -> u8 {
        match self {
            EditorKind::TextOnly => 1,
            EditorKind::WithCode => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(EditorKind::TextOnly),
            3 => Some(EditorKind::WithCode),
            _ => None,
        }
    }
}

/// 题干附带的代码段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSnippet {
    pub language: String,
    pub code: String,
}

/// 解析后的单选题
///
/// 选项固定为 4 个，正确答案以下标保存，只能由解析器构造
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRecord {
    pub ordinal: u32,
    pub stem: String,
    pub code: Option<CodeSnippet>,
    pub options: [String; OPTION_COUNT],
    correct_index: usize,
    /// 难度原样透传，不做枚举校验
    pub difficulty: String,
    pub tags: Vec<String>,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub sub_topic: Option<String>,
}

impl QuestionRecord {
    /// 构造题目记录；答案下标越界时返回 `None`
    pub fn new(
        ordinal: u32,
        stem: String,
        code: Option<CodeSnippet>,
        options: [String; OPTION_COUNT],
        correct_index: usize,
    ) -> Option<Self> {
        if correct_index >= OPTION_COUNT {
            return None;
        }
        Some(Self {
            ordinal,
            stem,
            code,
            options,
            correct_index,
            difficulty: DEFAULT_DIFFICULTY.to_string(),
            tags: Vec::new(),
            subject: None,
            topic: None,
            sub_topic: None,
        })
    }

    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    pub fn correct_answer_text(&self) -> &str {
        &self.options[self.correct_index]
    }

    pub fn editor_kind(&self) -> EditorKind {
        if self.code.is_some() {
            EditorKind::WithCode
        } else {
            EditorKind::TextOnly
        }
    }

    /// 渲染后的题干：`<p>题干</p>`，有代码时追加 `\n$$$examly代码`
    pub fn question_body(&self) -> String {
        let mut body = format!("<p>{}</p>", self.stem);
        if let Some(snippet) = &self.code {
            body.push('\n');
            body.push_str(CODE_SEPARATOR);
            body.push_str(&snippet.code);
        }
        body
    }

    /// 查重用的比对文本
    pub fn comparison_key(&self) -> String {
        comparison_key(&self.question_body())
    }
}

/// 去掉代码段后的题干文本
pub fn comparison_key(question_body: &str) -> String {
    question_body
        .split(CODE_SEPARATOR)
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// 解析失败原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("Invalid question format: missing Q<N>. marker")]
    MissingMarker,
    #[error("Invalid question format: missing question stem")]
    MissingStem,
    #[error("Found {found} options instead of 4")]
    WrongOptionCount { found: usize },
    #[error("No correct answer found")]
    MissingAnswer,
    #[error("Invalid correct answer number: {number}")]
    AnswerOutOfRange { number: u64 },
}

/// 被拒绝的题目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub ordinal: u32,
    pub reason: RejectReason,
    /// 题干预览，方便人工回查
    pub preview: String,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Question {}: {}", self.ordinal, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: Option<CodeSnippet>) -> QuestionRecord {
        QuestionRecord::new(
            1,
            "What is a pointer in C?".to_string(),
            code,
            [
                "A".to_string(),
                "B".to_string(),
                "C".to_string(),
                "D".to_string(),
            ],
            2,
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_out_of_range_answer() {
        let options = ["a", "b", "c", "d"].map(String::from);
        assert!(QuestionRecord::new(1, "x".into(), None, options, 4).is_none());
    }

    #[test]
    fn test_question_body_with_code() {
        let r = record(Some(CodeSnippet {
            language: "c".into(),
            code: "int *p;".into(),
        }));
        assert_eq!(r.question_body(), "<p>What is a pointer in C?</p>\n$$$examlyint *p;");
        assert_eq!(r.editor_kind(), EditorKind::WithCode);
        assert_eq!(r.comparison_key(), "<p>What is a pointer in C?</p>");
    }

    #[test]
    fn test_text_only_record() {
        let r = record(None);
        assert_eq!(r.editor_kind().code(), 1);
        assert_eq!(r.correct_answer_text(), "C");
        assert_eq!(r.difficulty, "Easy");
    }

    #[test]
    fn test_reject_reason_wording() {
        let reason = RejectReason::WrongOptionCount { found: 3 };
        assert!(reason.to_string().contains("3 options instead of 4"));
    }
}
