//! 行扫描器
//!
//! 第一遍：把题目文本逐行归类（题号行、代码围栏、选项行、字段行……），
//! 第二遍由 `record_parser` 按归类结果提取各字段。
//! 扫描器会跟踪代码围栏状态，围栏内的行一律视为代码，不会被误判为选项或字段。

use phf::phf_map;
use regex::Regex;
use std::sync::OnceLock;

/// 题目中可识别的元数据字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    CorrectAnswer,
    Difficulty,
    Subject,
    Topic,
    SubTopic,
    Tags,
}

/// 字段标签（小写）到字段的映射
static FIELD_LABELS: phf::Map<&'static str, Field> = phf_map! {
    "correct answer" => Field::CorrectAnswer,
    "answer" => Field::CorrectAnswer,
    "difficulty" => Field::Difficulty,
    "subject" => Field::Subject,
    "topic" => Field::Topic,
    "sub-topic" => Field::SubTopic,
    "subtopic" => Field::SubTopic,
    "sub topic" => Field::SubTopic,
    "tags" => Field::Tags,
};

/// 单行的归类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `Q<N>. 题干`
    QuestionMarker { ordinal: u32, rest: &'a str },
    /// 代码围栏开始，带可选语言标记
    FenceOpen { language: Option<&'a str> },
    /// 代码围栏结束
    FenceClose,
    /// 围栏内的代码行（保留原始缩进）
    Code(&'a str),
    /// `<数字>) 选项`
    OptionMarker { number: u32, rest: &'a str },
    /// `标签: 值`
    Field { field: Field, value: &'a str },
    /// `---`
    Separator,
    Text(&'a str),
    Blank,
}

/// 带原始文本的扫描结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannedLine<'a> {
    pub kind: LineKind<'a>,
    pub raw: &'a str,
}

fn question_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*Q(\d{1,9})\.\s*(.*)$").expect("valid question marker regex"))
}

fn option_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d{1,9})\)\s*(.*)$").expect("valid option marker regex"))
}

fn language_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_+#.\-]+$").expect("valid language regex"))
}

/// 解析 `Q<N>.` 题号行，返回 (题号, 题号后的文本)
pub fn match_question_marker(line: &str) -> Option<(u32, &str)> {
    let caps = question_marker_re().captures(line)?;
    let ordinal = caps.get(1)?.as_str().parse().ok()?;
    Some((ordinal, caps.get(2).map_or("", |m| m.as_str())))
}

fn match_option_marker(line: &str) -> Option<(u32, &str)> {
    let caps = option_marker_re().captures(line)?;
    let number = caps.get(1)?.as_str().parse().ok()?;
    Some((number, caps.get(2).map_or("", |m| m.as_str())))
}

fn match_field(line: &str) -> Option<(Field, &str)> {
    let cleaned = line.trim().trim_start_matches(['*', '_', '-', ' ']);
    let colon = cleaned.find(':')?;
    let label = cleaned[..colon].trim().trim_end_matches(['*', '_']).trim();
    let field = *FIELD_LABELS.get(label.to_lowercase().as_str())?;
    let value = cleaned[colon + 1..].trim().trim_matches(['*', '_']).trim();
    Some((field, value))
}

fn fence_language(trimmed: &str) -> Option<&str> {
    let tag = trimmed.trim_start_matches('`').trim();
    if !tag.is_empty() && language_re().is_match(tag) {
        Some(tag)
    } else {
        None
    }
}

/// 逐行扫描文本
pub fn scan(text: &str) -> Vec<ScannedLine<'_>> {
    let mut in_fence = false;
    let mut lines = Vec::new();

    for raw in text.lines() {
        let trimmed = raw.trim();

        let kind = if in_fence {
            if trimmed.starts_with("```") {
                in_fence = false;
                LineKind::FenceClose
            } else {
                LineKind::Code(raw)
            }
        } else if trimmed.is_empty() {
            LineKind::Blank
        } else if trimmed.starts_with("```") {
            // 同一行内开合的围栏不改变状态
            if trimmed.len() > 3 && trimmed[3..].contains("```") {
                LineKind::Text(raw)
            } else {
                in_fence = true;
                LineKind::FenceOpen {
                    language: fence_language(trimmed),
                }
            }
        } else if trimmed == "---" {
            LineKind::Separator
        } else if let Some((ordinal, rest)) = match_question_marker(raw) {
            LineKind::QuestionMarker { ordinal, rest }
        } else if let Some((number, rest)) = match_option_marker(raw) {
            // 选项里以 ``` 开头的代码会把后续行带入围栏
            if rest.matches("```").count() % 2 == 1 {
                in_fence = true;
            }
            LineKind::OptionMarker { number, rest }
        } else if let Some((field, value)) = match_field(raw) {
            LineKind::Field { field, value }
        } else {
            LineKind::Text(raw)
        };

        lines.push(ScannedLine { kind, raw });
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<LineKind<'_>> {
        scan(text).into_iter().map(|l| l.kind).collect()
    }

    #[test]
    fn test_classifies_basic_block() {
        let text = "Q1. What is X?\n1) a\n2) b\nCorrect answer: 2\nDifficulty: Hard\nTags: x, y\n---";
        let k = kinds(text);
        assert_eq!(
            k[0],
            LineKind::QuestionMarker {
                ordinal: 1,
                rest: "What is X?"
            }
        );
        assert_eq!(k[1], LineKind::OptionMarker { number: 1, rest: "a" });
        assert_eq!(
            k[3],
            LineKind::Field {
                field: Field::CorrectAnswer,
                value: "2"
            }
        );
        assert_eq!(
            k[4],
            LineKind::Field {
                field: Field::Difficulty,
                value: "Hard"
            }
        );
        assert_eq!(k[6], LineKind::Separator);
    }

    #[test]
    fn test_fence_contents_are_code() {
        let text = "```python\n1) not an option\nTags: not a field\n```";
        let k = kinds(text);
        assert_eq!(
            k[0],
            LineKind::FenceOpen {
                language: Some("python")
            }
        );
        assert_eq!(k[1], LineKind::Code("1) not an option"));
        assert_eq!(k[2], LineKind::Code("Tags: not a field"));
        assert_eq!(k[3], LineKind::FenceClose);
    }

    #[test]
    fn test_untagged_fence_has_no_language() {
        assert_eq!(kinds("```")[0], LineKind::FenceOpen { language: None });
    }

    #[test]
    fn test_option_opening_fence() {
        let text = "1) ```java\nint x = 1;\n```\n2) plain";
        let k = kinds(text);
        assert_eq!(k[1], LineKind::Code("int x = 1;"));
        assert_eq!(k[2], LineKind::FenceClose);
        assert_eq!(k[3], LineKind::OptionMarker { number: 2, rest: "plain" });
    }

    #[test]
    fn test_field_with_markdown_emphasis() {
        assert_eq!(
            match_field("**Correct answer:** 3"),
            Some((Field::CorrectAnswer, "3"))
        );
        assert_eq!(match_field("Sub-topic: Pointers"), Some((Field::SubTopic, "Pointers")));
        assert_eq!(match_field("Topic: Memory"), Some((Field::Topic, "Memory")));
        assert_eq!(match_field("Note: something"), None);
    }
}
