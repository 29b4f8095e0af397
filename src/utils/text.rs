//! 文本比对工具
//!
//! 查重使用的分词和"带间隔的短语匹配"：
//! 两段文本的词序基本一致，允许少量插入或调换（间隔上限 `slop`）即视为同一道题。

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn html_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid html tag regex"))
}

/// 分词：去掉 HTML 标签，按非字母数字切分并转小写
pub fn tokenize(text: &str) -> Vec<String> {
    html_tag_re()
        .replace_all(text, " ")
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// 判断两段文本是否为短语级近似重复
///
/// 以较短的一段为查询短语，在较长的一段中寻找位置偏移：
/// 每个查询词 i 在目标中的位置 p 对应偏移 p - i，
/// 能为每个词各选一个偏移、且偏移极差不超过 `slop` 时视为匹配。
/// 两段的词数差也不能超过 `slop`。
pub fn phrase_matches(a: &str, b: &str, slop: u32) -> bool {
    let ta = tokenize(a);
    let tb = tokenize(b);
    if ta.is_empty() || tb.is_empty() {
        return false;
    }
    let (query, target) = if ta.len() <= tb.len() {
        (ta, tb)
    } else {
        (tb, ta)
    };
    tokens_match(&query, &target, slop as usize)
}

fn tokens_match(query: &[String], target: &[String], slop: usize) -> bool {
    if target.len() - query.len() > slop {
        return false;
    }

    // 每个词的出现次数必须足够
    let mut available: HashMap<&str, usize> = HashMap::new();
    for token in target {
        *available.entry(token.as_str()).or_default() += 1;
    }
    for token in query {
        match available.get_mut(token.as_str()) {
            Some(count) if *count > 0 => *count -= 1,
            _ => return false,
        }
    }

    let offsets: Vec<Vec<i64>> = query
        .iter()
        .enumerate()
        .map(|(i, term)| {
            target
                .iter()
                .enumerate()
                .filter(|(_, t)| *t == term)
                .map(|(p, _)| p as i64 - i as i64)
                .collect()
        })
        .collect();

    smallest_range(&offsets) <= slop as i64
}

/// 从每个有序列表中各取一个数，使极差最小
fn smallest_range(lists: &[Vec<i64>]) -> i64 {
    let mut cursors = vec![0usize; lists.len()];
    let mut best = i64::MAX;

    loop {
        let mut min_list = 0;
        let mut min_value = i64::MAX;
        let mut max_value = i64::MIN;
        for (idx, list) in lists.iter().enumerate() {
            let value = list[cursors[idx]];
            if value < min_value {
                min_value = value;
                min_list = idx;
            }
            max_value = max_value.max(value);
        }
        best = best.min(max_value - min_value);

        cursors[min_list] += 1;
        if cursors[min_list] >= lists[min_list].len() {
            return best;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_strips_tags() {
        assert_eq!(
            tokenize("<p>What is a Pointer in C?</p>"),
            vec!["what", "is", "a", "pointer", "in", "c"]
        );
        assert!(tokenize("<p></p>").is_empty());
    }

    #[test]
    fn test_identical_text_matches() {
        assert!(phrase_matches("<p>What is Rust?</p>", "What is Rust?", 0));
    }

    #[test]
    fn test_small_insertion_matches() {
        assert!(phrase_matches(
            "<p>What is a pointer in C?</p>",
            "<p>What is a pointer in the C language?</p>",
            3
        ));
    }

    #[test]
    fn test_insertion_beyond_slop_does_not_match() {
        assert!(!phrase_matches(
            "What is a pointer in C?",
            "What is a pointer variable used for in the C language?",
            3
        ));
    }

    #[test]
    fn test_different_questions_do_not_match() {
        assert!(!phrase_matches(
            "What is a pointer in C?",
            "What is a reference in C++?",
            3
        ));
        assert!(!phrase_matches("What is X?", "", 3));
    }

    #[test]
    fn test_swapped_words_within_slop() {
        assert!(phrase_matches("is what a pointer", "what is a pointer", 2));
        assert!(!phrase_matches("is what a pointer", "what is a pointer", 1));
    }

    #[test]
    fn test_repeated_terms_need_enough_occurrences() {
        assert!(!phrase_matches("a a b", "a b c", 3));
    }
}
