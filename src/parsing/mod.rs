//! 文本解析层
//!
//! - `splitter`: 整段文本 → 题块
//! - `scanner`: 题块 → 逐行归类
//! - `record_parser`: 归类结果 → 题目记录 / 拒绝原因

pub mod record_parser;
pub mod scanner;
pub mod splitter;

pub use record_parser::{parse_block, parse_blocks, parse_question, sections, BlockSections, ParseBatch};
pub use splitter::{join_blocks, split_questions, SplitBatch, BLOCK_SEPARATOR};
