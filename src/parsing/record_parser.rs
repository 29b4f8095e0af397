//! 单题解析
//!
//! 第二遍：根据扫描结果提取题干、代码段、选项、答案和元数据。
//! 任何一步失败都直接拒绝整道题，不尝试修补。

use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};

use super::scanner::{scan, Field, LineKind, ScannedLine};
use crate::models::question::{CodeSnippet, RejectReason, Rejection, OPTION_COUNT};
use crate::models::{QuestionBlock, QuestionRecord};
use crate::utils::truncate_text;

const PREVIEW_LEN: usize = 80;

/// 一批题块的解析结果
#[derive(Debug, Clone, Default)]
pub struct ParseBatch {
    pub records: Vec<QuestionRecord>,
    pub rejections: Vec<Rejection>,
}

fn fence_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```[A-Za-z0-9_+#.\-]*").expect("valid fence regex"))
}

/// 去掉 markdown 加粗标记和代码围栏
fn clean_inline(text: &str) -> String {
    let without_fences = fence_marker_re().replace_all(text, "");
    without_fences.replace("**", "").trim().to_string()
}

fn field_value<'a>(lines: &[ScannedLine<'a>], wanted: Field) -> Option<&'a str> {
    lines.iter().find_map(|line| match line.kind {
        LineKind::Field { field, value } if field == wanted => Some(value),
        _ => None,
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// 题干：题号行之后，直到代码围栏、选项、字段或分隔行
fn extract_stem(lines: &[ScannedLine<'_>], marker_rest: &str, start: usize) -> (String, usize) {
    let mut parts = vec![marker_rest.trim()];
    let mut idx = start;
    while let Some(line) = lines.get(idx) {
        match line.kind {
            LineKind::Text(text) => parts.push(text.trim()),
            LineKind::Blank => {}
            _ => break,
        }
        idx += 1;
    }
    let stem = parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .replace("**", "")
        .trim()
        .to_string();
    (stem, idx)
}

/// 代码段：选项之前第一个带语言标记的围栏
fn extract_code(lines: &[ScannedLine<'_>], start: usize) -> Option<CodeSnippet> {
    let mut idx = start;
    while let Some(line) = lines.get(idx) {
        match line.kind {
            LineKind::OptionMarker { .. }
            | LineKind::Field { .. }
            | LineKind::Separator
            | LineKind::QuestionMarker { .. } => return None,
            LineKind::FenceOpen {
                language: Some(language),
            } => {
                let code: Vec<&str> = lines[idx + 1..]
                    .iter()
                    .map_while(|l| match l.kind {
                        LineKind::Code(code) => Some(code),
                        _ => None,
                    })
                    .collect();
                return Some(CodeSnippet {
                    language: language.to_string(),
                    code: code.join("\n").trim().to_string(),
                });
            }
            _ => {}
        }
        idx += 1;
    }
    None
}

/// 选项：每个选项延续到下一个选项、字段行或题块结束
fn extract_options(lines: &[ScannedLine<'_>], start: usize) -> Vec<String> {
    let mut options = Vec::new();
    let mut current: Option<String> = None;

    for line in lines.iter().skip(start) {
        match line.kind {
            LineKind::OptionMarker { rest, .. } => {
                if let Some(done) = current.take() {
                    options.push(done);
                }
                current = Some(rest.to_string());
            }
            LineKind::Field { .. } | LineKind::Separator | LineKind::QuestionMarker { .. } => {
                break;
            }
            _ => {
                if let Some(text) = current.as_mut() {
                    text.push('\n');
                    text.push_str(line.raw);
                }
            }
        }
    }
    if let Some(done) = current {
        options.push(done);
    }

    options.iter().map(|o| clean_inline(o)).collect()
}

/// 答案编号（1 开始），返回 0 开始的下标
fn extract_answer(lines: &[ScannedLine<'_>]) -> Result<usize, RejectReason> {
    let value = field_value(lines, Field::CorrectAnswer).ok_or(RejectReason::MissingAnswer)?;
    let digits: String = value
        .trim_start_matches(['(', '['])
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        return Err(RejectReason::MissingAnswer);
    }
    let number: u64 = digits.parse().unwrap_or(u64::MAX);
    if !(1..=OPTION_COUNT as u64).contains(&number) {
        return Err(RejectReason::AnswerOutOfRange { number });
    }
    Ok((number - 1) as usize)
}

fn extract_difficulty(lines: &[ScannedLine<'_>]) -> Option<String> {
    let value = field_value(lines, Field::Difficulty)?;
    let word: String = value
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    (!word.is_empty()).then_some(word)
}

fn extract_tags(lines: &[ScannedLine<'_>]) -> Vec<String> {
    field_value(lines, Field::Tags)
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// 题块各部分的原始切分，不做数量和答案校验
#[derive(Debug, Clone, Default)]
pub struct BlockSections {
    pub stem: String,
    pub code: Option<CodeSnippet>,
    pub options: Vec<String>,
    pub difficulty: Option<String>,
}

/// 切分题块各部分，找不到题号行时返回 `None`
pub fn sections(text: &str) -> Option<BlockSections> {
    let lines = scan(text);
    let (marker_idx, marker_rest) = lines.iter().enumerate().find_map(|(idx, l)| match l.kind {
        LineKind::QuestionMarker { rest, .. } => Some((idx, rest)),
        _ => None,
    })?;
    let (stem, stem_end) = extract_stem(&lines, marker_rest, marker_idx + 1);
    let option_start = lines
        .iter()
        .position(|l| matches!(l.kind, LineKind::OptionMarker { .. }))
        .unwrap_or(lines.len());

    Some(BlockSections {
        stem,
        code: extract_code(&lines, stem_end),
        options: extract_options(&lines, option_start),
        difficulty: extract_difficulty(&lines),
    })
}

/// 解析单个题块
pub fn parse_block(block: &QuestionBlock) -> Result<QuestionRecord, Rejection> {
    let lines = scan(&block.text);
    let reject = |reason: RejectReason, preview: &str| Rejection {
        ordinal: block.ordinal,
        reason,
        preview: truncate_text(preview, PREVIEW_LEN),
    };
    let first_line = block.text.lines().next().unwrap_or_default();

    let marker = lines
        .iter()
        .position(|l| !matches!(l.kind, LineKind::Blank))
        .and_then(|idx| match lines[idx].kind {
            LineKind::QuestionMarker { rest, .. } => Some((idx, rest)),
            _ => None,
        });
    let Some((marker_idx, marker_rest)) = marker else {
        return Err(reject(RejectReason::MissingMarker, first_line));
    };

    let (stem, stem_end) = extract_stem(&lines, marker_rest, marker_idx + 1);
    if stem.is_empty() {
        return Err(reject(RejectReason::MissingStem, first_line));
    }

    let code = extract_code(&lines, stem_end);

    let option_start = lines
        .iter()
        .position(|l| matches!(l.kind, LineKind::OptionMarker { .. }))
        .unwrap_or(lines.len());
    let options = extract_options(&lines, option_start);
    let options: [String; OPTION_COUNT] = options
        .try_into()
        .map_err(|found: Vec<String>| {
            reject(RejectReason::WrongOptionCount { found: found.len() }, &stem)
        })?;

    let correct_index = extract_answer(&lines).map_err(|reason| reject(reason, &stem))?;

    let mut record = QuestionRecord::new(block.ordinal, stem.clone(), code, options, correct_index)
        .ok_or_else(|| {
            reject(
                RejectReason::AnswerOutOfRange {
                    number: correct_index as u64 + 1,
                },
                &stem,
            )
        })?;

    if let Some(difficulty) = extract_difficulty(&lines) {
        record.difficulty = difficulty;
    }
    record.tags = extract_tags(&lines);
    record.subject = non_empty(field_value(&lines, Field::Subject));
    record.topic = non_empty(field_value(&lines, Field::Topic));
    record.sub_topic = non_empty(field_value(&lines, Field::SubTopic));

    Ok(record)
}

/// 解析单个题块，失败时记录原因并返回 `None`
pub fn parse_question(block: &QuestionBlock) -> Option<QuestionRecord> {
    match parse_block(block) {
        Ok(record) => {
            debug!("✓ 题目 {} 解析成功", block.ordinal);
            Some(record)
        }
        Err(rejection) => {
            warn!("⚠️  {} | {}", rejection, rejection.preview);
            None
        }
    }
}

/// 解析一批题块，分别收集成功记录和拒绝原因
pub fn parse_blocks(blocks: &[QuestionBlock]) -> ParseBatch {
    let mut batch = ParseBatch::default();
    for block in blocks {
        match parse_block(block) {
            Ok(record) => batch.records.push(record),
            Err(rejection) => {
                warn!("⚠️  {} | {}", rejection, rejection.preview);
                batch.rejections.push(rejection);
            }
        }
    }
    batch
}
