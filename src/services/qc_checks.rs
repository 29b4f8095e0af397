//! 本地质检规则
//!
//! 不调用外部服务的启发式检查，结果附加到质检报告中，不影响流程走向

use crate::error::QcError;
use crate::models::QuestionBlock;
use crate::parsing::sections;

/// 题目文本必须包含的格式元素
const REQUIRED_ELEMENTS: &[&str] = &[
    "Q",
    "1)",
    "2)",
    "3)",
    "4)",
    "Correct answer:",
    "Difficulty:",
    "Subject:",
    "Topic:",
    "Sub-topic:",
    "Tags:",
];

const AMBIGUOUS_WORDS: &[&str] = &["maybe", "possibly", "sometimes", "often", "usually"];
const NEGATIVE_WORDS: &[&str] = &["not", "never", "none", "cannot"];
const COMPLEX_INDICATORS: &[&str] = &["advanced", "complex", "detailed", "in-depth"];
const SEMICOLON_LANGUAGES: &[&str] = &["java", "javascript", "cpp", "c++", "c", "csharp", "c#"];

/// 校验题目文本包含全部格式元素
pub fn verify_mcq_format(text: &str) -> Result<(), QcError> {
    match REQUIRED_ELEMENTS.iter().find(|e| !text.contains(*e)) {
        Some(missing) => Err(QcError::FormatInvalid(format!("缺少 '{}'", missing))),
        None => Ok(()),
    }
}

/// 字符级相似度：2 * LCS / (len(a) + len(b))
fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    for ca in &a {
        let mut row = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                row[j].max(prev[j + 1])
            };
        }
        prev = row;
    }
    2.0 * prev[b.len()] as f64 / (a.len() + b.len()) as f64
}

fn contains_word(text: &str, words: &[&str]) -> bool {
    let lower = text.to_lowercase();
    lower
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .any(|w| words.contains(&w))
}

fn check_code(language: &str, code: &str, issues: &mut Vec<String>) {
    let indents: Vec<&str> = code
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| &l[..l.len() - l.trim_start().len()])
        .collect();
    let uses_tabs = indents.iter().any(|i| i.contains('\t'));
    let uses_spaces = indents.iter().any(|i| i.contains(' '));
    if uses_tabs && uses_spaces {
        issues.push("Inconsistent code indentation".to_string());
    }

    let count = |c: char| code.chars().filter(|x| *x == c).count();
    if count('{') != count('}') || count('(') != count(')') || count('[') != count(']') {
        issues.push("Mismatched brackets or parentheses in code".to_string());
    }

    if SEMICOLON_LANGUAGES.contains(&language.to_lowercase().as_str()) {
        let missing = code.lines().map(str::trim).any(|l| {
            !l.is_empty()
                && !l.ends_with(';')
                && !l.ends_with('{')
                && !l.ends_with('}')
                && !l.ends_with(':')
                && !l.starts_with("//")
                && !l.starts_with('#')
                && !l.starts_with('@')
        });
        if missing {
            issues.push("Missing semicolons in code".to_string());
        }
    }
}

/// 对单道题做启发式检查，返回发现的问题
pub fn deep_checks(question_text: &str) -> Vec<String> {
    let mut issues = Vec::new();
    let Some(parts) = sections(question_text) else {
        issues.push("Missing Q<N>. marker".to_string());
        return issues;
    };

    if let Some(code) = &parts.code {
        check_code(&code.language, &code.code, &mut issues);
    }

    if parts.stem.split_whitespace().count() < 5 {
        issues.push("Question text too short".to_string());
    }
    if parts.stem.matches('?').count() != 1 {
        issues.push("Question should have exactly one question mark".to_string());
    }
    if contains_word(&parts.stem, AMBIGUOUS_WORDS) {
        issues.push("Question contains ambiguous words".to_string());
    }

    if parts.options.len() == 4 {
        let lengths: Vec<usize> = parts.options.iter().map(|o| o.chars().count()).collect();
        let max = lengths.iter().copied().max().unwrap_or(0);
        let min = lengths.iter().copied().min().unwrap_or(0);
        if max > 3 * min {
            issues.push("Options have significantly different lengths".to_string());
        }

        let too_similar = parts.options.iter().enumerate().any(|(i, a)| {
            parts.options[i + 1..]
                .iter()
                .any(|b| similarity_ratio(a, b) > 0.8)
        });
        if too_similar {
            issues.push("Options too similar to each other".to_string());
        }

        let negatives = parts
            .options
            .iter()
            .filter(|o| contains_word(o, NEGATIVE_WORDS))
            .count();
        if negatives > 1 {
            issues.push("Too many negative options".to_string());
        }
    }

    if parts
        .difficulty
        .as_deref()
        .is_some_and(|d| d.eq_ignore_ascii_case("easy"))
        && contains_word(question_text, COMPLEX_INDICATORS)
    {
        issues.push("Question complexity doesn't match Easy difficulty".to_string());
    }

    issues
}

/// 汇总一批题目的本地检查结果
pub fn lint_report(blocks: &[QuestionBlock]) -> String {
    let lines: Vec<String> = blocks
        .iter()
        .filter_map(|block| {
            let issues = deep_checks(&block.text);
            (!issues.is_empty()).then(|| format!("Q{}: {}", block.ordinal, issues.join("; ")))
        })
        .collect();

    if lines.is_empty() {
        "Local checks: no issues".to_string()
    } else {
        format!("Local checks:\n{}", lines.join("\n"))
    }
}
