//! 批量切分
//!
//! 把一整段模型输出按 `Q<N>.` 题号行和 `---` 分隔行切成单题文本块。

use tracing::{debug, warn};

use super::scanner::match_question_marker;
use crate::models::QuestionBlock;

/// 题块之间的分隔行
pub const BLOCK_SEPARATOR: &str = "---";

/// 切分结果
#[derive(Debug, Clone, Default)]
pub struct SplitBatch {
    pub blocks: Vec<QuestionBlock>,
    /// 截断前实际找到的题块数
    pub found: usize,
}

impl SplitBatch {
    pub fn ordinals(&self) -> Vec<u32> {
        self.blocks.iter().map(|b| b.ordinal).collect()
    }
}

struct PendingBlock<'a> {
    ordinal: u32,
    lines: Vec<&'a str>,
}

fn flush(pending: Option<PendingBlock<'_>>, blocks: &mut Vec<QuestionBlock>) {
    let Some(block) = pending else {
        return;
    };
    let text = block.lines.join("\n").trim().to_string();
    if text.is_empty() {
        return;
    }
    blocks.push(QuestionBlock {
        ordinal: block.ordinal,
        text,
    });
}

/// 切分题目文本
///
/// 第一个题号行之前的内容、`---` 与下一个题号行之间的内容都会被丢弃。
/// 传入 `expected` 时：多出的题块截断，少了只记录日志，都不视为错误。
pub fn split_questions(text: &str, expected: Option<usize>) -> SplitBatch {
    let mut blocks = Vec::new();
    let mut pending: Option<PendingBlock<'_>> = None;

    for line in text.lines() {
        if let Some((ordinal, _)) = match_question_marker(line) {
            flush(pending.take(), &mut blocks);
            pending = Some(PendingBlock {
                ordinal,
                lines: vec![line.trim_start()],
            });
        } else if line.trim() == BLOCK_SEPARATOR {
            flush(pending.take(), &mut blocks);
        } else if let Some(block) = pending.as_mut() {
            block.lines.push(line);
        }
    }
    flush(pending, &mut blocks);

    let found = blocks.len();
    debug!("切分得到 {} 个题块", found);

    if let Some(expected) = expected {
        if found > expected {
            warn!(
                "⚠️  题块数量不符: 期望 {}，实际 {}，截断为前 {} 个",
                expected, found, expected
            );
            blocks.truncate(expected);
        } else if found < expected {
            warn!("⚠️  题块数量不符: 期望 {}，实际只找到 {}", expected, found);
        }
    }

    SplitBatch { blocks, found }
}

/// 把题块重新拼接为文本，每块以 `---` 结尾
pub fn join_blocks(blocks: &[QuestionBlock]) -> String {
    blocks
        .iter()
        .map(|b| format!("{}\n{}", b.text, BLOCK_SEPARATOR))
        .collect::<Vec<_>>()
        .join("\n\n")
}
